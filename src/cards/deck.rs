//! The dealer's deck.
//!
//! Built fresh for every round and fully consumed by the seating draw and
//! the deal. Index 0 is the bottom, the last index is the top, so drawing
//! pops from the end.

use super::Card;
use crate::core::GameRng;

/// Cards in a complete deck.
pub const DECK_SIZE: usize = 80;

/// An ordered pile of cards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A complete, unshuffled deck: `r` copies of rank `r` plus two Jesters.
    ///
    /// ```
    /// use dalmuti_ring::cards::{Card, Deck, DECK_SIZE};
    ///
    /// let deck = Deck::new();
    /// assert_eq!(deck.len(), DECK_SIZE);
    /// assert_eq!(deck.count(Card::Dalmuti), 1);
    /// assert_eq!(deck.count(Card::Peasant), 12);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        let cards = Card::ALL
            .iter()
            .flat_map(|&card| std::iter::repeat(card).take(card.copies()))
            .collect();
        Self { cards }
    }

    /// A deck holding exactly these cards, bottom first.
    #[must_use]
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    /// Shuffle in place.
    pub fn shuffle(&mut self, rng: &mut GameRng) {
        rng.shuffle(&mut self.cards);
    }

    /// Take the top card.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Take up to `n` cards from the top, in draw order.
    pub fn draw_many(&mut self, n: usize) -> Vec<Card> {
        let keep = self.cards.len().saturating_sub(n);
        let mut drawn = self.cards.split_off(keep);
        drawn.reverse();
        drawn
    }

    /// Copies of `card` left in the deck.
    #[must_use]
    pub fn count(&self, card: Card) -> usize {
        self.cards.iter().filter(|&&c| c == card).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Remaining cards, bottom first.
    #[must_use]
    pub fn into_cards(self) -> Vec<Card> {
        self.cards
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}
