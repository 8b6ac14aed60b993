//! Store-level error type shared by the repositories and the workflow.

use cms_core::error::CoreError;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Failure of a store operation: either a domain condition or a storage fault.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    /// Unique violations on our `uq_` guards are domain conflicts, not faults.
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                if let Some(message) = db_err.constraint().and_then(conflict_message) {
                    return StoreError::Core(CoreError::Conflict(message.to_string()));
                }
            }
        }
        StoreError::Database(err)
    }
}

fn conflict_message(constraint: &str) -> Option<&'static str> {
    match constraint {
        "uq_cms_pages_identity" => Some("Page identity is already in use by another page"),
        "uq_cms_page_versions_page_version_num" | "uq_cms_page_versions_published" => {
            Some("Page was published concurrently; retry the publish")
        }
        other if other.starts_with("uq_") => Some("Duplicate value violates a unique constraint"),
        _ => None,
    }
}
