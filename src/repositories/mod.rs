pub(crate) mod materials;
pub(crate) mod regions;
pub(crate) mod rounds;
pub(crate) mod scores;
