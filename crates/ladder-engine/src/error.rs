use ladder_log::{LogError, TransactionType};
use ladder_types::{PlayerId, Side, TransactionId};

use crate::ranking::RankingError;
use crate::score::ScoreError;

/// Errors produced by ladder operations.
#[derive(Debug, thiserror::Error)]
pub enum LadderError {
    #[error("invalid score: {0}")]
    InvalidScore(#[from] ScoreError),

    #[error("scores say side {computed} won, but the declared winner {declared} is not on that side")]
    InconsistentWinner { declared: PlayerId, computed: Side },

    #[error("invalid match: {0}")]
    InvalidMatch(String),

    #[error("player name must not be empty")]
    InvalidName,

    #[error("player id already exists: {0}")]
    DuplicateId(PlayerId),

    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("transaction {id} is {kind}; only MATCH_RESULT can be invalidated")]
    NotAMatchResult {
        id: TransactionId,
        kind: TransactionType,
    },

    #[error("match {0} has already been invalidated")]
    AlreadyInvalidated(TransactionId),

    #[error("log corruption: {0}")]
    Corruption(String),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error("ladder lock poisoned")]
    LockPoisoned,
}

/// Coarse classification used by callers to decide how to report an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input. Never mutates the log, never worth retrying as-is.
    Validation,
    /// Unknown player or transaction id.
    NotFound,
    /// The log cannot be trusted on the path that hit this.
    Corruption,
    /// Underlying medium failed.
    Io,
    Internal,
}

impl LadderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidScore(_)
            | Self::InconsistentWinner { .. }
            | Self::InvalidMatch(_)
            | Self::InvalidName
            | Self::DuplicateId(_)
            | Self::UnknownPlayer(_)
            | Self::NotAMatchResult { .. }
            | Self::AlreadyInvalidated(_) => ErrorCategory::Validation,
            Self::PlayerNotFound(_) | Self::TransactionNotFound(_) => ErrorCategory::NotFound,
            Self::Corruption(_) | Self::Log(LogError::CorruptTail { .. }) => {
                ErrorCategory::Corruption
            }
            Self::Log(LogError::Io(_)) => ErrorCategory::Io,
            Self::Log(LogError::Serialization(_)) | Self::LockPoisoned => ErrorCategory::Internal,
        }
    }
}

impl From<RankingError> for LadderError {
    fn from(err: RankingError) -> Self {
        match err {
            RankingError::DuplicatePlayer(id) => Self::DuplicateId(id),
            RankingError::UnknownPlayer(id) => Self::UnknownPlayer(id),
            RankingError::InvalidMatch(reason) => Self::InvalidMatch(reason),
        }
    }
}

/// Convenience alias used throughout the engine crate.
pub type Result<T> = std::result::Result<T, LadderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn categories_follow_error_taxonomy() {
        assert_eq!(
            LadderError::DuplicateId("a".into()).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            LadderError::TransactionNotFound(TransactionId::new()).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            LadderError::from(LogError::CorruptTail {
                offset: 0,
                reason: "x".into()
            })
            .category(),
            ErrorCategory::Corruption
        );
        assert_eq!(
            LadderError::from(LogError::Io(io::Error::other("disk"))).category(),
            ErrorCategory::Io
        );
    }

    #[test]
    fn ranking_errors_map_to_engine_errors() {
        let err = LadderError::from(RankingError::UnknownPlayer("ghost".into()));
        assert!(matches!(err, LadderError::UnknownPlayer(id) if id.as_str() == "ghost"));
    }
}
