//! Peer identification and seating order.
//!
//! ## PeerId
//!
//! Type-safe ring member identifier. Ids are 1-based (`1..=N`), matching
//! the ids written into every envelope and payload.
//!
//! ## PlayerOrder
//!
//! The seating agreed at SETUP: index 0 is the Greater Dalmuti (highest
//! rank), the last index is the Greater Peon (lowest rank). Backed by an
//! `im::Vector` so render snapshots clone in O(1).

use im::Vector;
use serde::{Deserialize, Serialize};

/// Ring member identifier, 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub u8);

impl PeerId {
    /// Create a new peer ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw id.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Iterate over all members of a ring of `num_peers`.
    ///
    /// ```
    /// use dalmuti_ring::core::PeerId;
    ///
    /// let peers: Vec<_> = PeerId::all(4).collect();
    /// assert_eq!(peers.first(), Some(&PeerId::new(1)));
    /// assert_eq!(peers.last(), Some(&PeerId::new(4)));
    /// ```
    pub fn all(num_peers: usize) -> impl Iterator<Item = PeerId> {
        (1..=num_peers as u8).map(PeerId)
    }

    /// Check that this id names a member of a ring of `num_peers`.
    #[must_use]
    pub const fn is_member(self, num_peers: usize) -> bool {
        self.0 >= 1 && (self.0 as usize) <= num_peers
    }

    /// The physical next neighbour on the ring.
    #[must_use]
    pub const fn next(self, num_peers: usize) -> Self {
        Self(self.0 % num_peers as u8 + 1)
    }

    /// The physical previous neighbour on the ring.
    #[must_use]
    pub const fn prev(self, num_peers: usize) -> Self {
        if self.0 == 1 {
            Self(num_peers as u8)
        } else {
            Self(self.0 - 1)
        }
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peer {}", self.0)
    }
}

/// One SETUP clause: a peer and the card value it drew.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub peer: PeerId,
    pub rank: u8,
}

/// Seating order for a round.
///
/// May be reversed at most once per round (Great Revolution); a later
/// reversal request is refused so a re-delivered GREAT_REVOLUTION cannot
/// flip the order back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerOrder {
    seats: Vector<PeerId>,
    reversed: bool,
}

impl PlayerOrder {
    /// Create an order from seats listed highest rank first.
    pub fn new(seats: impl IntoIterator<Item = PeerId>) -> Self {
        let seats: Vector<PeerId> = seats.into_iter().collect();
        assert!(!seats.is_empty(), "Order must seat at least 1 peer");

        Self {
            seats,
            reversed: false,
        }
    }

    /// Seat peers in id order. Used before SETUP has been agreed.
    pub fn identity(num_peers: usize) -> Self {
        Self::new(PeerId::all(num_peers))
    }

    /// Adopt the order carried by a SETUP payload.
    pub fn from_seating(seating: &[Seat]) -> Self {
        Self::new(seating.iter().map(|s| s.peer))
    }

    /// Number of seats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// The Greater Dalmuti.
    #[must_use]
    pub fn first(&self) -> PeerId {
        self.seats[0]
    }

    /// The Greater Peon, the lowest-rank seat.
    #[must_use]
    pub fn last(&self) -> PeerId {
        self.seats[self.seats.len() - 1]
    }

    /// Seat at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<PeerId> {
        self.seats.get(index).copied()
    }

    /// Position of a peer in the order.
    #[must_use]
    pub fn position(&self, peer: PeerId) -> Option<usize> {
        self.seats.iter().position(|&p| p == peer)
    }

    #[must_use]
    pub fn contains(&self, peer: PeerId) -> bool {
        self.position(peer).is_some()
    }

    /// Iterate seats, highest rank first.
    pub fn iter(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.seats.iter().copied()
    }

    /// Seats that come after `peer`, wrapping around, ending with `peer`.
    ///
    /// ```
    /// use dalmuti_ring::core::{PeerId, PlayerOrder};
    ///
    /// let order = PlayerOrder::new([3, 1, 4, 2].map(PeerId::new));
    /// let after: Vec<_> = order.after(PeerId::new(4)).collect();
    /// assert_eq!(after, [2, 3, 1, 4].map(PeerId::new));
    /// ```
    pub fn after(&self, peer: PeerId) -> impl Iterator<Item = PeerId> + '_ {
        let start = self.position(peer).map_or(0, |i| i + 1);
        let len = self.seats.len();
        (0..len).map(move |offset| self.seats[(start + offset) % len])
    }

    /// Reverse the order unless it was already reversed.
    ///
    /// Returns `true` if the order changed.
    pub fn reverse_once(&mut self) -> bool {
        if self.reversed {
            return false;
        }
        self.seats = self.seats.iter().rev().copied().collect();
        self.reversed = true;
        true
    }

    /// Whether a Great Revolution already reversed this order.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Shared handle to the seats, for snapshots.
    #[must_use]
    pub fn seats(&self) -> Vector<PeerId> {
        self.seats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u8]) -> Vec<PeerId> {
        raw.iter().copied().map(PeerId::new).collect()
    }

    #[test]
    fn test_peer_neighbours_wrap() {
        assert_eq!(PeerId::new(4).next(4), PeerId::new(1));
        assert_eq!(PeerId::new(2).next(4), PeerId::new(3));
        assert_eq!(PeerId::new(1).prev(4), PeerId::new(4));
        assert_eq!(PeerId::new(3).prev(4), PeerId::new(2));
    }

    #[test]
    fn test_peer_membership() {
        assert!(PeerId::new(1).is_member(4));
        assert!(PeerId::new(4).is_member(4));
        assert!(!PeerId::new(0).is_member(4));
        assert!(!PeerId::new(5).is_member(4));
        assert_eq!(format!("{}", PeerId::new(3)), "peer 3");
    }

    #[test]
    fn test_order_roles() {
        let order = PlayerOrder::new(ids(&[3, 1, 4, 2]));
        assert_eq!(order.first(), PeerId::new(3));
        assert_eq!(order.last(), PeerId::new(2));
        assert_eq!(order.position(PeerId::new(4)), Some(2));
        assert_eq!(order.position(PeerId::new(9)), None);
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_order_after_wraps_and_ends_with_self() {
        let order = PlayerOrder::new(ids(&[3, 1, 4, 2]));
        let after: Vec<_> = order.after(PeerId::new(2)).collect();
        assert_eq!(after, ids(&[3, 1, 4, 2]));
    }

    #[test]
    fn test_reverse_only_once() {
        let mut order = PlayerOrder::new(ids(&[3, 1, 4, 2]));
        assert!(order.reverse_once());
        assert_eq!(order.iter().collect::<Vec<_>>(), ids(&[2, 4, 1, 3]));
        assert!(order.is_reversed());

        assert!(!order.reverse_once());
        assert_eq!(order.iter().collect::<Vec<_>>(), ids(&[2, 4, 1, 3]));
    }

    #[test]
    fn test_order_from_seating() {
        let seating = [
            Seat { peer: PeerId::new(3), rank: 1 },
            Seat { peer: PeerId::new(1), rank: 2 },
        ];
        let order = PlayerOrder::from_seating(&seating);
        assert_eq!(order.iter().collect::<Vec<_>>(), ids(&[3, 1]));
        assert!(!order.is_reversed());
    }

    #[test]
    #[should_panic(expected = "Order must seat at least 1 peer")]
    fn test_empty_order_rejected() {
        let _ = PlayerOrder::new(Vec::new());
    }
}
