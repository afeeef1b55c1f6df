use std::collections::HashSet;

use tracing::{debug, warn};

use ladder_log::{TransactionKind, TransactionLog};
use ladder_types::{Standings, TransactionId};

use crate::error::Result;
use crate::ranking::{RankingEngine, RankingError};

/// Result of a full-log audit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub record_count: u64,
    pub match_count: u64,
    pub invalidation_count: u64,
    /// Offsets of lines that could not be parsed.
    pub holes: Vec<u64>,
    pub violations: Vec<Violation>,
    /// Set when the tail itself is unreadable, which makes the ladder
    /// unusable until the file is repaired by hand.
    pub tail_error: Option<String>,
}

impl AuditReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty() && self.holes.is_empty() && self.tail_error.is_none()
    }
}

/// A specific inconsistency found in the log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Byte offset of the offending record.
    pub offset: u64,
    pub transaction: Option<TransactionId>,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    DuplicateTransactionId,
    RanksNotDense,
    SnapshotMismatch,
    RejectedTransition,
    DanglingInvalidation,
    RepeatedInvalidation,
}

/// Oldest-first consistency checker.
///
/// Every record's snapshot is compared with what the ranking rules produce
/// from the record before it; invalidations are compared with a replay of
/// everything before them minus the withdrawn matches.
pub struct LogAuditor;

impl LogAuditor {
    pub fn audit(log: &TransactionLog) -> Result<AuditReport> {
        let mut report = AuditReport::default();
        let mut seen_ids = HashSet::new();
        let mut match_ids = HashSet::new();
        let mut invalidated = HashSet::new();
        let mut applied: Vec<(TransactionId, TransactionKind)> = Vec::new();
        let mut prev = Standings::new();

        let mut scan = log.scan_forward()?;
        for record in scan.by_ref() {
            let record = record?;
            let offset = record.offset;
            let tx = record.transaction;
            report.record_count += 1;

            let mut flag = |kind: ViolationKind, description: String| {
                report.violations.push(Violation {
                    offset,
                    transaction: Some(tx.id),
                    kind,
                    description,
                });
            };

            if !seen_ids.insert(tx.id) {
                flag(
                    ViolationKind::DuplicateTransactionId,
                    format!("transaction id {} appears more than once", tx.id),
                );
            }
            if !tx.standings.is_dense() {
                flag(
                    ViolationKind::RanksNotDense,
                    "snapshot ranks are not 1..N in order".into(),
                );
            }

            match &tx.kind {
                TransactionKind::InvalidateMatch(p) => {
                    report.invalidation_count += 1;
                    if !match_ids.contains(&p.target) {
                        flag(
                            ViolationKind::DanglingInvalidation,
                            format!("target {} is not an earlier match result", p.target),
                        );
                    } else if !invalidated.insert(p.target) {
                        flag(
                            ViolationKind::RepeatedInvalidation,
                            format!("match {} was already invalidated", p.target),
                        );
                    }
                    match Self::replay(&applied, &invalidated) {
                        Ok(expected) if expected != tx.standings => flag(
                            ViolationKind::SnapshotMismatch,
                            "snapshot differs from replay without invalidated matches".into(),
                        ),
                        Ok(_) => {}
                        Err(e) => flag(
                            ViolationKind::RejectedTransition,
                            format!("replay without invalidated matches failed: {e}"),
                        ),
                    }
                }
                kind => {
                    if kind.as_match().is_some() {
                        report.match_count += 1;
                        match_ids.insert(tx.id);
                    }
                    match RankingEngine::apply(kind, &prev) {
                        Ok(expected) => {
                            if expected != tx.standings {
                                flag(
                                    ViolationKind::SnapshotMismatch,
                                    format!("{} snapshot differs from rank-swap result", tx.tx_type()),
                                );
                            }
                            applied.push((tx.id, kind.clone()));
                        }
                        Err(e) => flag(
                            ViolationKind::RejectedTransition,
                            format!("{} cannot apply to previous standings: {e}", tx.tx_type()),
                        ),
                    }
                }
            }

            // Later records were computed from this snapshot, right or wrong.
            prev = tx.standings;
        }

        report.holes = scan.holes().to_vec();
        if let Err(e) = log.last() {
            report.tail_error = Some(e.to_string());
        }

        if report.is_valid() {
            debug!(records = report.record_count, "audit passed");
        } else {
            warn!(
                records = report.record_count,
                violations = report.violations.len(),
                holes = report.holes.len(),
                tail_ok = report.tail_error.is_none(),
                "audit found problems"
            );
        }
        Ok(report)
    }

    fn replay(
        applied: &[(TransactionId, TransactionKind)],
        invalidated: &HashSet<TransactionId>,
    ) -> std::result::Result<Standings, RankingError> {
        applied
            .iter()
            .filter(|(id, _)| !invalidated.contains(id))
            .try_fold(Standings::new(), |standings, (_, kind)| {
                RankingEngine::apply(kind, &standings)
            })
    }
}
