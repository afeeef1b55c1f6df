use serde::{Deserialize, Serialize};

use crate::id::PlayerId;

/// A player as shown on the ladder.
///
/// `rank` is 1-based: rank 1 is the top of the ladder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub rank: u32,
}

/// The ordered ladder, best rank first.
///
/// Position `i` holds the player ranked `i + 1`. Every transaction record
/// embeds the full `Standings` that result from applying it, so this is also
/// the snapshot type of the log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Standings(Vec<Player>);

impl Standings {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.0
    }

    pub fn into_players(self) -> Vec<Player> {
        self.0
    }

    /// Zero-based ladder position of the given player.
    pub fn position(&self, id: &PlayerId) -> Option<usize> {
        self.0.iter().position(|p| &p.id == id)
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.0.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.position(id).is_some()
    }

    /// Append a player at the bottom of the ladder (rank N+1).
    pub fn push_bottom(&mut self, id: PlayerId, name: String) -> &Player {
        let rank = self.0.len() as u32 + 1;
        self.0.push(Player { id, name, rank });
        &self.0[self.0.len() - 1]
    }

    /// Remove the player at `index`, closing the rank gap below it.
    pub fn remove_at(&mut self, index: usize) -> Player {
        let removed = self.0.remove(index);
        self.renumber_from(index);
        removed
    }

    /// Move the player at `from` up to position `to` (`to < from`), pushing
    /// everyone in `to..from` one place down.
    pub fn promote(&mut self, from: usize, to: usize) {
        debug_assert!(to < from);
        self.0[to..=from].rotate_right(1);
        self.renumber_from(to);
    }

    /// Ranks form exactly 1..=N in position order.
    pub fn is_dense(&self) -> bool {
        self.0
            .iter()
            .enumerate()
            .all(|(i, p)| p.rank == i as u32 + 1)
    }

    fn renumber_from(&mut self, start: usize) {
        for (i, player) in self.0.iter_mut().enumerate().skip(start) {
            player.rank = i as u32 + 1;
        }
    }
}

impl<'a> IntoIterator for &'a Standings {
    type Item = &'a Player;
    type IntoIter = std::slice::Iter<'a, Player>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder(names: &[&str]) -> Standings {
        let mut s = Standings::new();
        for name in names {
            s.push_bottom(PlayerId::from(*name), name.to_string());
        }
        s
    }

    fn order(s: &Standings) -> Vec<&str> {
        s.players().iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn push_bottom_assigns_next_rank() {
        let s = ladder(&["a", "b", "c"]);
        assert_eq!(s.get(&"c".into()).unwrap().rank, 3);
        assert!(s.is_dense());
    }

    #[test]
    fn remove_closes_gap() {
        let mut s = ladder(&["a", "b", "c", "d"]);
        let removed = s.remove_at(1);
        assert_eq!(removed.id.as_str(), "b");
        assert_eq!(order(&s), vec!["a", "c", "d"]);
        assert!(s.is_dense());
    }

    #[test]
    fn promote_shifts_block_down() {
        let mut s = ladder(&["a", "b", "c", "d", "e"]);
        s.promote(3, 1);
        assert_eq!(order(&s), vec!["a", "d", "b", "c", "e"]);
        assert!(s.is_dense());
    }

    #[test]
    fn serializes_as_array() {
        let s = ladder(&["a"]);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"[{"id":"a","name":"a","rank":1}]"#);
    }
}
