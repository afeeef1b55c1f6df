use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::PlayerId;

/// One of the two sides of a match. Sides carry no challenger/defender
/// meaning; `A` is simply whoever the caller listed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Winner index as reported by score validation: 1 for `A`, 2 for `B`.
    pub fn index(self) -> u8 {
        match self {
            Self::A => 1,
            Self::B => 2,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Points of a single set, with default flags for each side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScore {
    pub a_points: u32,
    pub b_points: u32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub a_default: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub b_default: bool,
}

impl SetScore {
    pub fn new(a_points: u32, b_points: u32) -> Self {
        Self {
            a_points,
            b_points,
            ..Self::default()
        }
    }

    /// A set in which `side` defaulted, with the points reached so far.
    pub fn defaulted(side: Side, a_points: u32, b_points: u32) -> Self {
        Self {
            a_points,
            b_points,
            a_default: side == Side::A,
            b_default: side == Side::B,
        }
    }

    pub fn has_default(&self) -> bool {
        self.a_default || self.b_default
    }
}

impl fmt::Display for SetScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = if self.a_default { "D" } else { "" };
        let b = if self.b_default { "D" } else { "" };
        write!(f, "{}{a}-{}{b}", self.a_points, self.b_points)
    }
}

/// Operator text form: `"11-5"`, `"7D-9"`, `"D-4"`, `"8-D"`.
///
/// A `D` suffix (or a bare `D`) marks the side that defaulted; a bare `D`
/// records zero points for that side.
impl FromStr for SetScore {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| TypeError::InvalidSetScore {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (a, b) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| invalid("expected <points>-<points>"))?;

        let parse_side = |part: &str| -> Result<(u32, bool), TypeError> {
            let part = part.trim();
            let (digits, defaulted) = match part.strip_suffix(['D', 'd']) {
                Some(rest) => (rest.trim(), true),
                None => (part, false),
            };
            if digits.is_empty() {
                return if defaulted {
                    Ok((0, true))
                } else {
                    Err(invalid("missing points"))
                };
            }
            digits
                .parse::<u32>()
                .map(|points| (points, defaulted))
                .map_err(|_| invalid("points must be non-negative integers"))
        };

        let (a_points, a_default) = parse_side(a)?;
        let (b_points, b_default) = parse_side(b)?;
        Ok(Self {
            a_points,
            b_points,
            a_default,
            b_default,
        })
    }
}

/// A match as submitted: the two sides, the declared winner, and the sets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub side_a: PlayerId,
    pub side_b: PlayerId,
    pub winner: PlayerId,
    pub set_scores: Vec<SetScore>,
}

impl MatchOutcome {
    /// The side the declared winner plays on, if the winner is one of the
    /// two players at all.
    pub fn winner_side(&self) -> Option<Side> {
        if self.winner == self.side_a {
            Some(Side::A)
        } else if self.winner == self.side_b {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn player(&self, side: Side) -> &PlayerId {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    /// The losing player, if the declared winner is one of the sides.
    pub fn loser(&self) -> Option<&PlayerId> {
        self.winner_side().map(|side| self.player(side.opponent()))
    }
}
