//! Deck and hand model.
//!
//! ## Key Types
//!
//! - `Card`: One of the thirteen ranks (Jester is wild)
//! - `Deck`: The dealer's 80-card pile, shuffled per round
//! - `Hand`: A peer's cards, kept sorted best first
//! - `CardSet`: Small inline multiset used for plays and tax payments

pub mod card;
pub mod deck;
pub mod hand;

pub use card::Card;
pub use deck::{Deck, DECK_SIZE};
pub use hand::{CardSet, Hand};
