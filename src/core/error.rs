use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("Operation {0} not found")]
    OpNotFound(u64),

    #[error("Operation {0} was killed")]
    OperationKilled(u64),

    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// True for the error a killed operation's caller receives, so client
    /// code can tell cancellation apart from an empty result.
    pub fn is_killed(&self) -> bool {
        matches!(self, Self::OperationKilled(_))
    }
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
