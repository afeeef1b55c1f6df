use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ladder_types::{MatchOutcome, PlayerId, Standings, TransactionId};

use crate::error::{LogError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPlayerPayload {
    pub player_id: PlayerId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePlayerPayload {
    pub player_id: PlayerId,
}

/// Tombstone reference to an earlier `MATCH_RESULT`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidateMatchPayload {
    pub target: TransactionId,
}

/// Type tag plus type-specific payload.
///
/// On disk this is the `"type"` / `"payload"` pair of a record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    AddPlayer(AddPlayerPayload),
    RemovePlayer(RemovePlayerPayload),
    MatchResult(MatchOutcome),
    InvalidateMatch(InvalidateMatchPayload),
}

/// Payload-free view of [`TransactionKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionType {
    AddPlayer,
    RemovePlayer,
    MatchResult,
    InvalidateMatch,
}

impl TransactionKind {
    pub fn tx_type(&self) -> TransactionType {
        match self {
            Self::AddPlayer(_) => TransactionType::AddPlayer,
            Self::RemovePlayer(_) => TransactionType::RemovePlayer,
            Self::MatchResult(_) => TransactionType::MatchResult,
            Self::InvalidateMatch(_) => TransactionType::InvalidateMatch,
        }
    }

    pub fn as_match(&self) -> Option<&MatchOutcome> {
        match self {
            Self::MatchResult(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Target of an invalidation record.
    pub fn invalidated_target(&self) -> Option<TransactionId> {
        match self {
            Self::InvalidateMatch(p) => Some(p.target),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddPlayer => write!(f, "ADD_PLAYER"),
            Self::RemovePlayer => write!(f, "REMOVE_PLAYER"),
            Self::MatchResult => write!(f, "MATCH_RESULT"),
            Self::InvalidateMatch => write!(f, "INVALIDATE_MATCH"),
        }
    }
}

/// One immutable log record.
///
/// `standings` is the full ladder after this transaction was applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: TransactionKind,
    pub standings: Standings,
}

impl Transaction {
    /// Stamp a new transaction with a fresh id and the current time.
    pub fn new(kind: TransactionKind, standings: Standings) -> Self {
        Self {
            id: TransactionId::new(),
            timestamp: Utc::now(),
            kind,
            standings,
        }
    }

    pub fn tx_type(&self) -> TransactionType {
        self.kind.tx_type()
    }

    /// Encode as one newline-terminated log line.
    pub fn to_line(&self) -> Result<Vec<u8>> {
        let mut line =
            serde_json::to_vec(self).map_err(|e| LogError::Serialization(e.to_string()))?;
        line.push(b'\n');
        Ok(line)
    }

    /// Decode one log line (without its terminator).
    pub fn from_line(line: &[u8]) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_slice(line)
    }
}
