use ladder_log::TransactionKind;
use ladder_types::{MatchOutcome, PlayerId, Side, Standings};

/// Reasons a transaction cannot be applied to a given ladder.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RankingError {
    #[error("player id already exists: {0}")]
    DuplicatePlayer(PlayerId),

    #[error("player not on the ladder: {0}")]
    UnknownPlayer(PlayerId),

    #[error("{0}")]
    InvalidMatch(String),
}

/// The ladder's state transition.
///
/// Pure: the same transaction applied to the same standings always yields
/// the same result. Used both to compute a new write and to replay history.
pub struct RankingEngine;

impl RankingEngine {
    pub fn apply(kind: &TransactionKind, prior: &Standings) -> Result<Standings, RankingError> {
        let mut next = prior.clone();
        match kind {
            TransactionKind::AddPlayer(p) => {
                if next.contains(&p.player_id) {
                    return Err(RankingError::DuplicatePlayer(p.player_id.clone()));
                }
                next.push_bottom(p.player_id.clone(), p.name.clone());
            }
            TransactionKind::RemovePlayer(p) => {
                let index = next
                    .position(&p.player_id)
                    .ok_or_else(|| RankingError::UnknownPlayer(p.player_id.clone()))?;
                next.remove_at(index);
            }
            TransactionKind::MatchResult(outcome) => Self::apply_match(outcome, &mut next)?,
            // Its snapshot was computed by the invalidation itself.
            TransactionKind::InvalidateMatch(_) => {}
        }
        Ok(next)
    }

    /// Rank-swap: a winner ranked below the loser takes the loser's rank and
    /// everyone from the loser's old rank down to just above the winner's
    /// old rank drops one place. Beating a lower-ranked player changes
    /// nothing.
    fn apply_match(outcome: &MatchOutcome, standings: &mut Standings) -> Result<(), RankingError> {
        Self::check_sides(outcome)?;

        let side_a = standings
            .position(&outcome.side_a)
            .ok_or_else(|| RankingError::UnknownPlayer(outcome.side_a.clone()))?;
        let side_b = standings
            .position(&outcome.side_b)
            .ok_or_else(|| RankingError::UnknownPlayer(outcome.side_b.clone()))?;

        let (winner_pos, loser_pos) = match outcome.winner_side() {
            Some(Side::A) => (side_a, side_b),
            _ => (side_b, side_a),
        };

        if winner_pos > loser_pos {
            standings.promote(winner_pos, loser_pos);
        }
        Ok(())
    }

    /// Structural checks on a match that need no ladder state.
    pub fn check_sides(outcome: &MatchOutcome) -> Result<(), RankingError> {
        if outcome.side_a == outcome.side_b {
            return Err(RankingError::InvalidMatch(format!(
                "player {} cannot play against themselves",
                outcome.side_a
            )));
        }
        if outcome.winner_side().is_none() {
            return Err(RankingError::InvalidMatch(format!(
                "winner {} is neither {} nor {}",
                outcome.winner, outcome.side_a, outcome.side_b
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_log::{AddPlayerPayload, InvalidateMatchPayload, RemovePlayerPayload};
    use ladder_types::{SetScore, TransactionId};
    use proptest::prelude::*;

    fn add(id: &str) -> TransactionKind {
        TransactionKind::AddPlayer(AddPlayerPayload {
            player_id: id.into(),
            name: id.to_uppercase(),
        })
    }

    fn remove(id: &str) -> TransactionKind {
        TransactionKind::RemovePlayer(RemovePlayerPayload {
            player_id: id.into(),
        })
    }

    fn win(winner: &str, loser: &str) -> TransactionKind {
        TransactionKind::MatchResult(MatchOutcome {
            side_a: loser.into(),
            side_b: winner.into(),
            winner: winner.into(),
            set_scores: vec![SetScore::new(5, 11); 3],
        })
    }

    fn build(ids: &[&str]) -> Standings {
        ids.iter().fold(Standings::new(), |s, id| {
            RankingEngine::apply(&add(id), &s).unwrap()
        })
    }

    fn order(s: &Standings) -> Vec<&str> {
        s.players().iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn add_appends_at_bottom() {
        let s = build(&["alice", "bob", "charlie"]);
        assert_eq!(order(&s), vec!["alice", "bob", "charlie"]);
        assert_eq!(s.get(&"charlie".into()).unwrap().rank, 3);
    }

    #[test]
    fn duplicate_add_fails() {
        let s = build(&["alice"]);
        assert_eq!(
            RankingEngine::apply(&add("alice"), &s),
            Err(RankingError::DuplicatePlayer("alice".into()))
        );
    }

    #[test]
    fn remove_compacts_ranks() {
        let s = build(&["a", "b", "c", "d"]);
        let s = RankingEngine::apply(&remove("b"), &s).unwrap();
        assert_eq!(order(&s), vec!["a", "c", "d"]);
        assert!(s.is_dense());
    }

    #[test]
    fn remove_unknown_fails() {
        let s = build(&["a"]);
        assert_eq!(
            RankingEngine::apply(&remove("z"), &s),
            Err(RankingError::UnknownPlayer("z".into()))
        );
    }

    #[test]
    fn lower_ranked_winner_takes_loser_rank() {
        let s = build(&["alice", "bob", "charlie"]);
        let s = RankingEngine::apply(&win("charlie", "alice"), &s).unwrap();
        assert_eq!(order(&s), vec!["charlie", "alice", "bob"]);
        assert!(s.is_dense());
    }

    #[test]
    fn higher_ranked_winner_changes_nothing() {
        let s = build(&["alice", "bob", "charlie"]);
        let after = RankingEngine::apply(&win("alice", "charlie"), &s).unwrap();
        assert_eq!(after, s);
    }

    #[test]
    fn match_with_removed_player_fails() {
        let s = build(&["alice", "bob"]);
        let s = RankingEngine::apply(&remove("bob"), &s).unwrap();
        assert_eq!(
            RankingEngine::apply(&win("bob", "alice"), &s),
            Err(RankingError::UnknownPlayer("bob".into()))
        );
    }

    #[test]
    fn match_structure_is_checked() {
        let s = build(&["alice", "bob"]);
        let self_match = TransactionKind::MatchResult(MatchOutcome {
            side_a: "alice".into(),
            side_b: "alice".into(),
            winner: "alice".into(),
            set_scores: vec![],
        });
        assert!(matches!(
            RankingEngine::apply(&self_match, &s),
            Err(RankingError::InvalidMatch(_))
        ));

        let stranger = TransactionKind::MatchResult(MatchOutcome {
            side_a: "alice".into(),
            side_b: "bob".into(),
            winner: "carol".into(),
            set_scores: vec![],
        });
        assert!(matches!(
            RankingEngine::apply(&stranger, &s),
            Err(RankingError::InvalidMatch(_))
        ));
    }

    #[test]
    fn invalidation_is_a_replay_no_op() {
        let s = build(&["alice", "bob"]);
        let kind = TransactionKind::InvalidateMatch(InvalidateMatchPayload {
            target: TransactionId::new(),
        });
        assert_eq!(RankingEngine::apply(&kind, &s).unwrap(), s);
    }

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("p{i}")).collect()
    }

    proptest! {
        #[test]
        fn ranks_stay_dense(
            n in 2usize..12,
            ops in prop::collection::vec((0usize..12, 0usize..12, any::<bool>()), 0..40),
        ) {
            let names = ids(n);
            let mut s = names.iter().fold(Standings::new(), |s, id| {
                RankingEngine::apply(&add(id), &s).unwrap()
            });
            prop_assert!(s.is_dense());

            for (x, y, removal) in ops {
                if s.len() < 2 {
                    break;
                }
                let a = s.players()[x % s.len()].id.clone();
                let b = s.players()[y % s.len()].id.clone();
                let kind = if removal {
                    remove(a.as_str())
                } else if a != b {
                    win(a.as_str(), b.as_str())
                } else {
                    continue;
                };
                s = RankingEngine::apply(&kind, &s).unwrap();
                prop_assert!(s.is_dense());
            }
        }

        #[test]
        fn upset_is_a_block_shift(n in 2usize..15, w in 0usize..15, l in 0usize..15) {
            let (w, l) = (w % n, l % n);
            prop_assume!(w != l);
            let names = ids(n);
            let before = names.iter().fold(Standings::new(), |s, id| {
                RankingEngine::apply(&add(id), &s).unwrap()
            });
            let after = RankingEngine::apply(&win(&names[w], &names[l]), &before).unwrap();

            if w < l {
                prop_assert_eq!(&after, &before);
            } else {
                prop_assert_eq!(after.players()[l].id.as_str(), names[w].as_str());
                for (i, player) in before.players().iter().enumerate() {
                    let new_rank = after.get(&player.id).unwrap().rank;
                    if i >= l && i < w {
                        prop_assert_eq!(new_rank, player.rank + 1);
                    } else if i != w {
                        prop_assert_eq!(new_rank, player.rank);
                    }
                }
            }
        }
    }
}
