pub(crate) mod auth;
pub(crate) mod courses;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod questions;
pub(crate) mod rate_limit;
pub(crate) mod router;
pub(crate) mod uploads;
pub(crate) mod validation;
