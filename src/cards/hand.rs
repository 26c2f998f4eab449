//! A peer's hand.
//!
//! Always sorted ascending by value, so the best cards come first. Grows
//! through the deal and tax intake, shrinks through plays and tax payment.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::Card;

/// A small multiset of cards: one play, one tax payment, one deal slice.
pub type CardSet = SmallVec<[Card; 4]>;

/// Sorted multiset of cards held by one peer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A hand holding these cards.
    ///
    /// ```
    /// use dalmuti_ring::cards::{Card, Hand};
    ///
    /// let hand = Hand::from_cards([Card::Jester, Card::Archbishop]);
    /// assert_eq!(hand.cards(), &[Card::Archbishop, Card::Jester]);
    /// ```
    #[must_use]
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut hand = Self::new();
        hand.add_cards(cards);
        hand
    }

    /// Add cards, keeping the hand sorted.
    pub fn add_cards(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
        self.cards.sort_unstable();
    }

    /// Whether every card of `cards` (with multiplicity) is held.
    #[must_use]
    pub fn contains_all(&self, cards: &[Card]) -> bool {
        Card::ALL.iter().all(|&card| {
            let wanted = cards.iter().filter(|&&c| c == card).count();
            wanted <= self.count(card)
        })
    }

    /// Remove `cards` from the hand.
    ///
    /// All or nothing: returns `false` and leaves the hand untouched if
    /// any card is missing.
    pub fn remove_all(&mut self, cards: &[Card]) -> bool {
        if !self.contains_all(cards) {
            return false;
        }
        for card in cards {
            if let Some(index) = self.cards.iter().position(|c| c == card) {
                self.cards.remove(index);
            }
        }
        true
    }

    /// The `n` lowest-value cards.
    #[must_use]
    pub fn best(&self, n: usize) -> CardSet {
        self.cards.iter().take(n).copied().collect()
    }

    /// The `n` highest-value cards, best of them first.
    #[must_use]
    pub fn worst(&self, n: usize) -> CardSet {
        let start = self.cards.len().saturating_sub(n);
        self.cards[start..].iter().copied().collect()
    }

    /// Copies of `card` held.
    #[must_use]
    pub fn count(&self, card: Card) -> usize {
        self.cards.iter().filter(|&&c| c == card).count()
    }

    /// Jesters held.
    #[must_use]
    pub fn wild_count(&self) -> usize {
        self.count(Card::Jester)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Drop every card.
    pub fn clear(&mut self) {
        self.cards.clear();
    }
}
