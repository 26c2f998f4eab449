//! The thirteen card ranks.
//!
//! A card is identified by its rank alone: value 1 (the Dalmuti) is the
//! best, value 12 (the Peasant) the worst, and the two Jesters (13) are
//! wild. Ordering follows the value, so sorting a hand ascending puts the
//! best cards first.

use serde::{Deserialize, Serialize};

use crate::error::PayloadError;

/// A Great Dalmuti card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Card {
    Dalmuti = 1,
    Archbishop = 2,
    EarlMarshal = 3,
    Baroness = 4,
    Abbess = 5,
    Knight = 6,
    Seamstress = 7,
    Mason = 8,
    Cook = 9,
    Shepherdess = 10,
    Stonecutter = 11,
    Peasant = 12,
    Jester = 13,
}

impl Card {
    /// Every rank, best first.
    pub const ALL: [Card; 13] = [
        Card::Dalmuti,
        Card::Archbishop,
        Card::EarlMarshal,
        Card::Baroness,
        Card::Abbess,
        Card::Knight,
        Card::Seamstress,
        Card::Mason,
        Card::Cook,
        Card::Shepherdess,
        Card::Stonecutter,
        Card::Peasant,
        Card::Jester,
    ];

    /// Numeric rank, 1..=13.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Card for a numeric rank.
    #[must_use]
    pub fn from_rank(rank: u8) -> Option<Card> {
        Card::ALL.get(usize::from(rank).checked_sub(1)?).copied()
    }

    /// Jesters stand in for any rank.
    #[must_use]
    pub const fn is_wild(self) -> bool {
        matches!(self, Card::Jester)
    }

    /// How many copies of this card a full deck holds.
    #[must_use]
    pub const fn copies(self) -> usize {
        match self {
            Card::Jester => 2,
            other => other as usize,
        }
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> u8 {
        card.rank()
    }
}

impl TryFrom<u8> for Card {
    type Error = PayloadError;

    fn try_from(rank: u8) -> Result<Self, Self::Error> {
        Card::from_rank(rank).ok_or_else(|| PayloadError::BadCard(rank.to_string()))
    }
}

impl std::str::FromStr for Card {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u8>()
            .ok()
            .and_then(Card::from_rank)
            .ok_or_else(|| PayloadError::BadCard(trimmed.to_string()))
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_round_trip() {
        for card in Card::ALL {
            assert_eq!(Card::from_rank(card.rank()), Some(card));
        }
        assert_eq!(Card::from_rank(0), None);
        assert_eq!(Card::from_rank(14), None);
    }

    #[test]
    fn test_ordering_follows_value() {
        assert!(Card::Dalmuti < Card::Archbishop);
        assert!(Card::Peasant < Card::Jester);
    }

    #[test]
    fn test_only_jester_is_wild() {
        let wild: Vec<_> = Card::ALL.iter().filter(|c| c.is_wild()).collect();
        assert_eq!(wild, vec![&Card::Jester]);
    }

    #[test]
    fn test_copies_total_eighty() {
        let total: usize = Card::ALL.iter().map(|c| c.copies()).sum();
        assert_eq!(total, 80);
        assert_eq!(Card::Peasant.copies(), 12);
        assert_eq!(Card::Jester.copies(), 2);
    }

    #[test]
    fn test_parse() {
        assert_eq!(" 7".parse::<Card>(), Ok(Card::Seamstress));
        assert_eq!("13".parse::<Card>(), Ok(Card::Jester));
        assert_eq!("x".parse::<Card>(), Err(PayloadError::BadCard("x".into())));
        assert_eq!("0".parse::<Card>(), Err(PayloadError::BadCard("0".into())));
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&Card::Knight).unwrap();
        assert_eq!(json, "6");
        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Card::Knight);
    }
}
