pub(crate) mod aggregate;
pub(crate) mod compiler;
pub(crate) mod memory_store;
pub(crate) mod notes;
pub(crate) mod pg_store;
pub(crate) mod regions;
pub(crate) mod rendering;
pub(crate) mod score_policy;
pub(crate) mod store;
pub(crate) mod wrong_list;
