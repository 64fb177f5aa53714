use thiserror::Error;

/// Store-level error taxonomy. Authorization failures on existing rows are
/// deliberately folded into `NotFound`: an unauthorized row is
/// indistinguishable from an absent one to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input rejected before any statement ran.
    #[error("invalid {0}")]
    Invalid(&'static str),

    /// Absent row, or an owner predicate the requester failed.
    #[error("not found")]
    NotFound,

    /// Creation-time gate: wrong profile type, or not a member.
    #[error("{0}")]
    Forbidden(&'static str),

    /// UNIQUE or CHECK constraint violation, already translated to a
    /// user-facing message ("already applied to this job", ...).
    #[error("{0}")]
    Conflict(String),

    #[error("internal store failure: {0}")]
    Internal(String),

    #[error(transparent)]
    Db(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, msg) = &e {
            if err.code == rusqlite::ErrorCode::ConstraintViolation {
                return StoreError::Conflict(
                    msg.clone()
                        .unwrap_or_else(|| "constraint violation".to_string()),
                );
            }
        }
        StoreError::Db(e)
    }
}

impl StoreError {
    /// Rewrite a constraint violation into an operation-specific message,
    /// leaving every other error untouched.
    pub(crate) fn on_conflict(self, msg: &str) -> Self {
        match self {
            StoreError::Conflict(_) => StoreError::Conflict(msg.to_string()),
            other => other,
        }
    }
}
