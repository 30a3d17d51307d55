pub(crate) mod caching;
pub(crate) mod classes;
pub(crate) mod errors;
pub(crate) mod handlers;
pub(crate) mod materials;
pub(crate) mod router;
pub(crate) mod validation;
pub(crate) mod wrong_questions;
