//! Transaction-log state engine for the squash ladder.
//!
//! This crate is the heart of the ladder. It provides:
//! - [`ScoreValidator`]: best-of-five, eleven-point, win-by-two scoring rules
//! - [`RankingEngine`]: the pure rank-swap state transition
//! - [`InvalidationEngine`]: rebuilds the ladder around a withdrawn match
//! - [`Ladder`]: the single owner of a log file, with shared reads and
//!   exclusive read-compute-append writes
//! - [`LogAuditor`]: full-history consistency check

pub mod audit;
pub mod error;
pub mod invalidation;
pub mod ladder;
pub mod ranking;
pub mod score;

pub use audit::{AuditReport, LogAuditor, Violation, ViolationKind};
pub use error::{ErrorCategory, LadderError, Result};
pub use invalidation::{InvalidationEngine, InvalidationPlan};
pub use ladder::{Ladder, RecordedMatch};
pub use ranking::{RankingEngine, RankingError};
pub use score::{ScoreError, ScoreValidator};
