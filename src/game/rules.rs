//! Play legality.
//!
//! A play is a non-empty set of cards of one rank, to which any number of
//! Jesters may be added. Opening a trick, anything goes. Following, the
//! play must have as many cards as the table and a strictly better (lower)
//! rank.

use serde::{Deserialize, Serialize};

use crate::cards::{Card, CardSet, Hand};
use crate::core::PeerId;
use crate::error::PlayError;

/// Cards standing in the current trick.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    cards: CardSet,
    owner: Option<PeerId>,
}

impl Table {
    /// An empty table: the next player opens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is on the table.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.owner.is_none()
    }

    /// The peer whose cards are standing.
    #[must_use]
    pub fn owner(&self) -> Option<PeerId> {
        self.owner
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Cards a follower must match.
    #[must_use]
    pub fn count(&self) -> usize {
        self.cards.len()
    }

    /// Rank a follower must beat.
    #[must_use]
    pub fn rank(&self) -> Option<u8> {
        effective_rank(&self.cards)
    }

    /// `owner` now holds the trick with `cards`.
    pub fn set(&mut self, owner: PeerId, cards: CardSet) {
        self.owner = Some(owner);
        self.cards = cards;
    }

    /// End the trick.
    pub fn clear(&mut self) {
        self.owner = None;
        self.cards.clear();
    }
}

/// Rank a set of cards plays as.
///
/// Jesters take the rank of the other cards; a set of only Jesters plays as
/// rank 13. `None` for an empty set or one that mixes ranks.
///
/// ```
/// use dalmuti_ring::cards::Card;
/// use dalmuti_ring::game::effective_rank;
///
/// assert_eq!(effective_rank(&[Card::Knight, Card::Jester]), Some(6));
/// assert_eq!(effective_rank(&[Card::Jester, Card::Jester]), Some(13));
/// assert_eq!(effective_rank(&[Card::Knight, Card::Cook]), None);
/// ```
#[must_use]
pub fn effective_rank(cards: &[Card]) -> Option<u8> {
    if cards.is_empty() {
        return None;
    }
    let mut natural = cards.iter().filter(|c| !c.is_wild()).map(|c| c.rank());
    match natural.next() {
        None => Some(Card::Jester.rank()),
        Some(rank) if natural.all(|r| r == rank) => Some(rank),
        Some(_) => None,
    }
}

/// Check a non-empty play against the table.
pub fn check_play(cards: &[Card], table: &Table) -> Result<(), PlayError> {
    let rank = effective_rank(cards).ok_or(PlayError::MixedRanks)?;
    if table.is_open() {
        return Ok(());
    }
    if cards.len() != table.count() {
        return Err(PlayError::WrongCount {
            expected: table.count(),
            got: cards.len(),
        });
    }
    let table_rank = table.rank().unwrap_or(Card::Jester.rank());
    if rank >= table_rank {
        return Err(PlayError::NotLower {
            got: rank,
            table: table_rank,
        });
    }
    Ok(())
}

/// Whether `cards` may be played on `table`.
#[must_use]
pub fn is_legal_play(cards: &[Card], table: &Table) -> bool {
    !cards.is_empty() && check_play(cards, table).is_ok()
}

/// Validate a local choice before it is sent. An empty choice is a pass,
/// which is allowed unless the table is open.
pub fn validate_choice(hand: &Hand, table: &Table, cards: &[Card]) -> Result<(), PlayError> {
    if cards.is_empty() {
        return if table.is_open() {
            Err(PlayError::MustOpen)
        } else {
            Ok(())
        };
    }
    if !hand.contains_all(cards) {
        return Err(PlayError::NotInHand);
    }
    check_play(cards, table)
}

/// Validate the cards a Dalmuti hands back as tax.
pub fn validate_tax_return(hand: &Hand, cards: &[Card], count: usize) -> Result<(), PlayError> {
    if cards.len() != count {
        return Err(PlayError::WrongTaxCount {
            expected: count,
            got: cards.len(),
        });
    }
    if !hand.contains_all(cards) {
        return Err(PlayError::NotInHand);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(ranks: &[u8]) -> CardSet {
        ranks.iter().filter_map(|&r| Card::from_rank(r)).collect()
    }

    fn table(owner: u8, ranks: &[u8]) -> Table {
        let mut table = Table::new();
        table.set(PeerId::new(owner), cards(ranks));
        table
    }

    #[test]
    fn test_effective_rank() {
        assert_eq!(effective_rank(&cards(&[5, 5, 13])), Some(5));
        assert_eq!(effective_rank(&cards(&[13])), Some(13));
        assert_eq!(effective_rank(&cards(&[5, 6])), None);
        assert_eq!(effective_rank(&[]), None);
    }

    #[test]
    fn test_open_table_accepts_any_single_rank() {
        let open = Table::new();
        assert!(is_legal_play(&cards(&[12, 12, 12]), &open));
        assert!(is_legal_play(&cards(&[13, 13]), &open));
        assert!(!is_legal_play(&cards(&[3, 4]), &open));
        assert!(!is_legal_play(&[], &open));
    }

    #[test]
    fn test_follow_needs_count_and_lower_rank() {
        let t = table(2, &[8, 8]);
        assert!(is_legal_play(&cards(&[7, 7]), &t));
        assert!(is_legal_play(&cards(&[3, 13]), &t));
        assert_eq!(
            check_play(&cards(&[7]), &t),
            Err(PlayError::WrongCount { expected: 2, got: 1 })
        );
        assert_eq!(
            check_play(&cards(&[8, 8]), &t),
            Err(PlayError::NotLower { got: 8, table: 8 })
        );
        assert_eq!(
            check_play(&cards(&[9, 13]), &t),
            Err(PlayError::NotLower { got: 9, table: 8 })
        );
    }

    #[test]
    fn test_all_wild_table_is_rank_thirteen() {
        let t = table(1, &[13]);
        assert!(is_legal_play(&cards(&[12]), &t));
        assert!(!is_legal_play(&cards(&[13]), &t));
    }

    #[test]
    fn test_validate_choice() {
        let hand = Hand::from_cards(cards(&[1, 1, 6]));
        let open = Table::new();
        assert_eq!(validate_choice(&hand, &open, &[]), Err(PlayError::MustOpen));
        assert_eq!(
            validate_choice(&hand, &open, &cards(&[2])),
            Err(PlayError::NotInHand)
        );
        assert_eq!(validate_choice(&hand, &open, &cards(&[1, 1])), Ok(()));

        let t = table(4, &[4]);
        assert_eq!(validate_choice(&hand, &t, &[]), Ok(()));
        assert_eq!(
            validate_choice(&hand, &t, &cards(&[6])),
            Err(PlayError::NotLower { got: 6, table: 4 })
        );
    }

    #[test]
    fn test_validate_tax_return() {
        let hand = Hand::from_cards(cards(&[1, 6, 13]));
        assert_eq!(validate_tax_return(&hand, &cards(&[6, 13]), 2), Ok(()));
        assert_eq!(
            validate_tax_return(&hand, &cards(&[6]), 2),
            Err(PlayError::WrongTaxCount { expected: 2, got: 1 })
        );
        assert_eq!(
            validate_tax_return(&hand, &cards(&[2, 6]), 2),
            Err(PlayError::NotInHand)
        );
    }

    #[test]
    fn test_table_lifecycle() {
        let mut t = Table::new();
        assert!(t.is_open());
        t.set(PeerId::new(3), cards(&[2, 2]));
        assert_eq!(t.owner(), Some(PeerId::new(3)));
        assert_eq!(t.rank(), Some(2));
        t.clear();
        assert!(t.is_open());
        assert_eq!(t.count(), 0);
    }
}
