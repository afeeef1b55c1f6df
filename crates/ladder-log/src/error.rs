use std::io;

/// Errors produced by the transaction log.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// I/O error while reading or appending.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The last record of the log is unterminated or does not parse.
    #[error("corrupt tail record at offset {offset}: {reason}")]
    CorruptTail { offset: u64, reason: String },
}

/// Convenience alias used throughout the log crate.
pub type Result<T> = std::result::Result<T, LogError>;
