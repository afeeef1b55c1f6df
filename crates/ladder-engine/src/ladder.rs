use std::collections::HashSet;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use ladder_log::{
    AddPlayerPayload, InvalidateMatchPayload, LogConfig, RemovePlayerPayload, Transaction,
    TransactionKind, TransactionLog,
};
use ladder_types::{MatchOutcome, Player, PlayerId, Standings, TransactionId};

use crate::audit::{AuditReport, LogAuditor};
use crate::error::{LadderError, Result};
use crate::invalidation::InvalidationEngine;
use crate::ranking::RankingEngine;
use crate::score::ScoreValidator;

/// A match as returned by [`Ladder::list_recent_matches`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordedMatch {
    pub transaction_id: TransactionId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: MatchOutcome,
}

/// The squash ladder, backed by one transaction log.
///
/// Reads share the lock; every mutation holds it exclusively from reading
/// the tail through computing the new standings to the append, so two
/// writers can never build on the same tail.
pub struct Ladder {
    log: RwLock<TransactionLog>,
}

impl Ladder {
    /// Open the log and check that its tail is readable.
    pub fn open(path: &Path, config: LogConfig) -> Result<Self> {
        let log = TransactionLog::open(path, config)?;
        let players = log.read_tail()?.len();
        info!(path = %path.display(), players, "ladder opened");
        Ok(Self {
            log: RwLock::new(log),
        })
    }

    /// Current standings, best rank first.
    pub fn list_players(&self) -> Result<Vec<Player>> {
        Ok(self.standings()?.into_players())
    }

    pub fn standings(&self) -> Result<Standings> {
        Ok(self.read()?.read_tail()?)
    }

    /// Add a player at the bottom of the ladder.
    ///
    /// A missing or empty id is replaced by a generated one.
    pub fn add_player(&self, name: &str, id: Option<PlayerId>) -> Result<Player> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LadderError::InvalidName);
        }
        let player_id = match id {
            Some(id) if !id.as_str().trim().is_empty() => id,
            _ => PlayerId::generate(),
        };

        let kind = TransactionKind::AddPlayer(AddPlayerPayload {
            player_id: player_id.clone(),
            name: name.to_string(),
        });
        let mut log = self.write()?;
        let tx = Self::commit(&mut log, kind)?;

        let player = tx
            .standings
            .get(&player_id)
            .cloned()
            .ok_or_else(|| LadderError::Corruption(format!("{player_id} missing after add")))?;
        info!(id = %player.id, name = %player.name, rank = player.rank, "player added");
        Ok(player)
    }

    pub fn remove_player(&self, id: &PlayerId) -> Result<TransactionId> {
        let kind = TransactionKind::RemovePlayer(RemovePlayerPayload {
            player_id: id.clone(),
        });
        let mut log = self.write()?;
        let tx = Self::commit(&mut log, kind).map_err(|e| match e {
            LadderError::UnknownPlayer(id) => LadderError::PlayerNotFound(id),
            other => other,
        })?;
        info!(%id, tx = %tx.id, "player removed");
        Ok(tx.id)
    }

    /// Validate and record a finished match.
    ///
    /// Score and winner checks run before the lock is taken; a rejected match
    /// never touches the log.
    pub fn record_match(&self, outcome: MatchOutcome) -> Result<TransactionId> {
        RankingEngine::check_sides(&outcome)?;
        let computed = ScoreValidator::validate(&outcome.set_scores)?;
        if outcome.player(computed) != &outcome.winner {
            return Err(LadderError::InconsistentWinner {
                declared: outcome.winner.clone(),
                computed,
            });
        }

        let (winner, sets) = (outcome.winner.clone(), outcome.set_scores.len());
        let mut log = self.write()?;
        let tx = Self::commit(&mut log, TransactionKind::MatchResult(outcome))?;
        info!(tx = %tx.id, %winner, sets, "match recorded");
        Ok(tx.id)
    }

    /// Withdraw a recorded match by appending an `INVALIDATE_MATCH` record
    /// carrying the standings rebuilt without it.
    pub fn invalidate_match(&self, target: TransactionId) -> Result<TransactionId> {
        let mut log = self.write()?;
        // Refuse to build on a corrupt tail; the plan's scan would skip it.
        log.read_tail()?;
        let plan = InvalidationEngine::plan(&log, target)?;
        let tx = Transaction::new(
            TransactionKind::InvalidateMatch(InvalidateMatchPayload { target }),
            plan.standings,
        );
        log.append(&tx)?;
        info!(%target, tx = %tx.id, replayed = plan.replayed, "match invalidated");
        Ok(tx.id)
    }

    /// Newest-first matches that have not been invalidated.
    ///
    /// An invalidation is always newer than its target, so scanning backward
    /// meets the tombstone before the match it hides.
    pub fn list_recent_matches(&self, limit: usize) -> Result<Vec<RecordedMatch>> {
        let log = self.read()?;
        let mut matches = Vec::new();
        if limit == 0 {
            return Ok(matches);
        }

        let mut invalidated = HashSet::new();
        for record in log.scan_backward()? {
            let tx = record?.transaction;
            match tx.kind {
                TransactionKind::InvalidateMatch(p) => {
                    invalidated.insert(p.target);
                }
                TransactionKind::MatchResult(outcome) if !invalidated.contains(&tx.id) => {
                    matches.push(RecordedMatch {
                        transaction_id: tx.id,
                        timestamp: tx.timestamp,
                        outcome,
                    });
                    if matches.len() == limit {
                        break;
                    }
                }
                _ => {}
            }
        }
        debug!(limit, found = matches.len(), "recent matches listed");
        Ok(matches)
    }

    /// Newest-first raw transactions.
    pub fn history(&self, limit: usize) -> Result<Vec<Transaction>> {
        let log = self.read()?;
        log.scan_backward()?
            .take(limit)
            .map(|r| r.map(|record| record.transaction).map_err(LadderError::from))
            .collect()
    }

    /// Check every record in the log against the ranking rules.
    pub fn audit(&self) -> Result<AuditReport> {
        let log = self.read()?;
        LogAuditor::audit(&log)
    }

    fn commit(log: &mut TransactionLog, kind: TransactionKind) -> Result<Transaction> {
        let prior = log.read_tail()?;
        let next = RankingEngine::apply(&kind, &prior).map_err(LadderError::from)?;
        let tx = Transaction::new(kind, next);
        log.append(&tx)?;
        Ok(tx)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TransactionLog>> {
        self.log.read().map_err(|_| LadderError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TransactionLog>> {
        self.log.write().map_err(|_| LadderError::LockPoisoned)
    }
}
