pub(crate) mod courses;
pub(crate) mod health;
pub(crate) mod questions;
pub(crate) mod users;

/// SQLSTATE raised by PostgreSQL on a unique index violation.
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error().and_then(|db_err| db_err.code()).as_deref() == Some(UNIQUE_VIOLATION)
}
