/// Reasons a submission is rejected before it reaches the database.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("`name` is required")]
    MissingName,
    #[error("`name` must not be empty")]
    EmptyName,
    #[error("`score` is required")]
    MissingScore,
    #[error("`score` must be a number, got {value:?}")]
    InvalidScore { value: String },
    #[error("`score` must be a finite number")]
    NonFiniteScore,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("score validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("the score store is not connected")]
    Unavailable,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored record {id} has an invalid timestamp ({millis} ms)")]
    CorruptRecord { id: String, millis: i64 },
}

impl StoreError {
    /// Everything except a rejected submission is a failure of the storage itself.
    pub fn is_persistence(&self) -> bool {
        !matches!(self, Self::Validation(_))
    }

    /// Whether the error means the connection to the database went away.
    pub fn is_connection_loss(&self) -> bool {
        match self {
            Self::Unavailable => true,
            Self::Database(error) => matches!(
                error,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
