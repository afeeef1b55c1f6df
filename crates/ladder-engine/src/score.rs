use ladder_types::{SetScore, Side};

/// Points a set is played to.
pub const POINTS_TO_WIN_SET: u32 = 11;
/// Minimum winning margin within a set.
pub const WINNING_MARGIN: u32 = 2;
/// Sets needed to win a best-of-five match.
pub const SETS_TO_WIN_MATCH: u8 = 3;

/// Reasons a set-score sequence does not describe a finished match.
///
/// Set numbers are 1-based.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("no sets were recorded")]
    NoSets,

    #[error("set {set}: both sides defaulted")]
    BothDefaulted { set: usize },

    #[error("set {set}: a default must be the final set")]
    DefaultNotFinal { set: usize },

    #[error("set {set}: {a}-{b} does not reach 11")]
    ShortOfEleven { set: usize, a: u32, b: u32 },

    #[error("set {set}: {a}-{b} is not won by 2")]
    MarginTooSmall { set: usize, a: u32, b: u32 },

    #[error("too many sets won ({a_sets}-{b_sets})")]
    TooManySets { a_sets: u8, b_sets: u8 },

    #[error("no side won 3 sets ({a_sets}-{b_sets})")]
    Undecided { a_sets: u8, b_sets: u8 },
}

/// Squash scoring rules: sets to 11, win by 2, first to 3 sets.
pub struct ScoreValidator;

impl ScoreValidator {
    /// Decide which side won the match described by `sets`.
    ///
    /// A default ends the match in favour of the side that did not default,
    /// so it may only appear in the last set and its points are not checked.
    /// Otherwise every set counts; the winner is the side that reached 3 sets
    /// first, and neither side may pass 3.
    pub fn validate(sets: &[SetScore]) -> Result<Side, ScoreError> {
        if sets.is_empty() {
            return Err(ScoreError::NoSets);
        }

        let mut a_sets = 0u8;
        let mut b_sets = 0u8;
        let mut decided = None;

        for (i, set) in sets.iter().enumerate() {
            let n = i + 1;

            if set.has_default() {
                if set.a_default && set.b_default {
                    return Err(ScoreError::BothDefaulted { set: n });
                }
                if n != sets.len() {
                    return Err(ScoreError::DefaultNotFinal { set: n });
                }
                return Ok(if set.a_default { Side::B } else { Side::A });
            }

            match Self::set_winner(n, set)? {
                Side::A => a_sets = a_sets.saturating_add(1),
                Side::B => b_sets = b_sets.saturating_add(1),
            }
            if decided.is_none() {
                if a_sets == SETS_TO_WIN_MATCH {
                    decided = Some(Side::A);
                } else if b_sets == SETS_TO_WIN_MATCH {
                    decided = Some(Side::B);
                }
            }
        }

        if a_sets > SETS_TO_WIN_MATCH || b_sets > SETS_TO_WIN_MATCH {
            return Err(ScoreError::TooManySets { a_sets, b_sets });
        }
        decided.ok_or(ScoreError::Undecided { a_sets, b_sets })
    }

    fn set_winner(n: usize, set: &SetScore) -> Result<Side, ScoreError> {
        let (a, b) = (set.a_points, set.b_points);
        if a < POINTS_TO_WIN_SET && b < POINTS_TO_WIN_SET {
            return Err(ScoreError::ShortOfEleven { set: n, a, b });
        }
        if a.abs_diff(b) < WINNING_MARGIN {
            return Err(ScoreError::MarginTooSmall { set: n, a, b });
        }
        Ok(if a > b { Side::A } else { Side::B })
    }
}
