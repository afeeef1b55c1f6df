use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid transaction id: {0}")]
    InvalidTransactionId(String),

    #[error("invalid set score {input:?}: {reason}")]
    InvalidSetScore { input: String, reason: String },
}
