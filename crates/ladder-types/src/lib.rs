//! Foundation types for the squash ladder.
//!
//! Every other ladder crate depends on `ladder-types`. The types here carry
//! no I/O and no ranking logic; they describe what the transaction log
//! stores and what the engine hands back to callers.
//!
//! # Key Types
//!
//! - [`PlayerId`]: Caller-supplied or generated player identifier
//! - [`TransactionId`]: UUID v7 transaction identifier
//! - [`Player`] / [`Standings`]: The ranked ladder, best rank first
//! - [`SetScore`] / [`MatchOutcome`]: A played match as submitted
//! - [`Side`]: Which of the two sides of a match won

pub mod error;
pub mod id;
pub mod matches;
pub mod player;

pub use error::TypeError;
pub use id::{PlayerId, TransactionId};
pub use matches::{MatchOutcome, SetScore, Side};
pub use player::{Player, Standings};
