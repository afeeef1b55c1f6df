//! Append-only transaction log for the squash ladder.
//!
//! Every mutation of the ladder is one newline-terminated JSON record. Each
//! record embeds the full standings that result from applying it, so the
//! current ladder is read from the tail alone and the ladder before any
//! historical transaction is one record further back.

pub mod error;
pub mod log;
pub mod record;
pub mod scan;

pub use error::{LogError, Result};
pub use log::{LogConfig, SyncMode, TransactionLog};
pub use record::{
    AddPlayerPayload, InvalidateMatchPayload, RemovePlayerPayload, Transaction, TransactionKind,
    TransactionType,
};
pub use scan::{BackwardScan, ForwardScan, LogRecord};
