use std::collections::HashSet;

use tracing::{debug, warn};

use ladder_log::{Transaction, TransactionKind, TransactionLog, TransactionType};
use ladder_types::{Standings, TransactionId};

use crate::error::{LadderError, Result};
use crate::ranking::RankingEngine;

/// The ladder as it would stand had a match never been played.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub target: TransactionId,
    /// Standings to embed in the `INVALIDATE_MATCH` record.
    pub standings: Standings,
    /// Transactions re-applied on top of the baseline.
    pub replayed: usize,
}

/// Rebuilds the ladder around a withdrawn match.
///
/// Scans the log newest-first collecting every record after the target,
/// takes the snapshot of the record just before it as the baseline, and
/// replays the collected records oldest-first without the target.
///
/// Earlier invalidations found in the collected records stay in force: the
/// matches they name are skipped during replay, and when such a match is
/// older than the target the scan keeps going until it has been passed, so
/// the baseline never still carries its effect.
///
/// A malformed line anywhere in the replayed window is an error: replaying
/// around it would drop that record's effect from the new snapshot.
pub struct InvalidationEngine;

impl InvalidationEngine {
    pub fn plan(log: &TransactionLog, target: TransactionId) -> Result<InvalidationPlan> {
        let mut tail: Vec<Transaction> = Vec::new();
        let mut invalidated: HashSet<TransactionId> = HashSet::new();
        // Invalidated matches the scan has not reached yet.
        let mut pending: HashSet<TransactionId> = HashSet::new();
        let mut found = false;
        let mut baseline = None;

        let mut scan = log.scan_backward()?;
        for record in scan.by_ref() {
            let record = record?;
            let tx = record.transaction;

            if found && pending.is_empty() {
                baseline = Some((record.offset, tx.standings));
                break;
            }

            if tx.id == target {
                let kind = tx.tx_type();
                if kind != TransactionType::MatchResult {
                    return Err(LadderError::NotAMatchResult { id: target, kind });
                }
                if invalidated.contains(&target) {
                    return Err(LadderError::AlreadyInvalidated(target));
                }
                found = true;
                continue;
            }

            pending.remove(&tx.id);
            if let Some(earlier) = tx.kind.invalidated_target() {
                invalidated.insert(earlier);
                pending.insert(earlier);
            }
            tail.push(tx);
        }

        if !found {
            return Err(LadderError::TransactionNotFound(target));
        }
        if !pending.is_empty() {
            return Err(LadderError::Corruption(format!(
                "{} invalidated match(es) referenced after {target} are missing from the log",
                pending.len()
            )));
        }
        let window_start = baseline.as_ref().map_or(0, |(offset, _)| *offset);
        if let Some(hole) = scan.holes().iter().find(|&&h| h >= window_start) {
            warn!(%target, offset = *hole, "malformed record inside the replay window");
            return Err(LadderError::Corruption(format!(
                "cannot rebuild standings without {target}: unreadable record at byte {hole}"
            )));
        }

        let mut standings = baseline.map(|(_, s)| s).unwrap_or_default();
        let mut replayed = 0;
        for tx in tail.iter().rev() {
            match &tx.kind {
                TransactionKind::InvalidateMatch(_) => continue,
                TransactionKind::MatchResult(_) if invalidated.contains(&tx.id) => continue,
                kind => {
                    standings = RankingEngine::apply(kind, &standings).map_err(|e| {
                        LadderError::Corruption(format!("replaying {} failed: {e}", tx.id))
                    })?;
                    replayed += 1;
                }
            }
        }

        debug!(%target, scanned = tail.len(), replayed, "invalidation planned");
        Ok(InvalidationPlan {
            target,
            standings,
            replayed,
        })
    }
}
