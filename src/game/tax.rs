//! Tax exchange roles.
//!
//! Four seats take part, in this order:
//!
//! 1. Lesser Peon pays its best card to the Lesser Dalmuti.
//! 2. Lesser Dalmuti returns one card and passes the token to the Greater Peon.
//! 3. Greater Peon pays its two best cards to the Greater Dalmuti.
//! 4. Greater Dalmuti returns two cards and announces ROUND_READY.

use crate::core::{PeerId, PlayerOrder};

/// A seat that takes part in the tax exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaxRole {
    GreaterDalmuti,
    LesserDalmuti,
    LesserPeon,
    GreaterPeon,
}

/// Whether a step pays tribute (best cards, forced) or returns cards
/// (chosen freely).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaxKind {
    Tribute,
    Return,
}

/// Where the token goes once a step is done.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AfterTax {
    PassTo(PeerId),
    /// Last step: broadcast ROUND_READY and keep the token.
    RoundReady,
}

/// One seat's part in the exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaxStep {
    pub role: TaxRole,
    pub kind: TaxKind,
    pub count: usize,
    pub to: PeerId,
    pub then: AfterTax,
}

/// The four tax seats of a seating order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaxRoles {
    pub greater_dalmuti: PeerId,
    pub lesser_dalmuti: PeerId,
    pub lesser_peon: PeerId,
    pub greater_peon: PeerId,
}

impl TaxRoles {
    /// Roles for `order`, which must seat at least four peers.
    ///
    /// ```
    /// use dalmuti_ring::core::{PeerId, PlayerOrder};
    /// use dalmuti_ring::game::TaxRoles;
    ///
    /// let order = PlayerOrder::new([3, 1, 4, 2].map(PeerId::new));
    /// let roles = TaxRoles::from_order(&order).unwrap();
    /// assert_eq!(roles.lesser_dalmuti, PeerId::new(1));
    /// assert_eq!(roles.greater_peon, PeerId::new(2));
    /// ```
    #[must_use]
    pub fn from_order(order: &PlayerOrder) -> Option<Self> {
        let n = order.len();
        if n < 4 {
            return None;
        }
        Some(Self {
            greater_dalmuti: order.get(0)?,
            lesser_dalmuti: order.get(1)?,
            lesser_peon: order.get(n - 2)?,
            greater_peon: order.get(n - 1)?,
        })
    }

    /// The role `peer` plays, if any.
    #[must_use]
    pub fn role_of(&self, peer: PeerId) -> Option<TaxRole> {
        if peer == self.greater_dalmuti {
            Some(TaxRole::GreaterDalmuti)
        } else if peer == self.lesser_dalmuti {
            Some(TaxRole::LesserDalmuti)
        } else if peer == self.lesser_peon {
            Some(TaxRole::LesserPeon)
        } else if peer == self.greater_peon {
            Some(TaxRole::GreaterPeon)
        } else {
            None
        }
    }

    /// What `peer` does when the token reaches it.
    #[must_use]
    pub fn step_for(&self, peer: PeerId) -> Option<TaxStep> {
        let role = self.role_of(peer)?;
        let step = match role {
            TaxRole::LesserPeon => TaxStep {
                role,
                kind: TaxKind::Tribute,
                count: 1,
                to: self.lesser_dalmuti,
                then: AfterTax::PassTo(self.lesser_dalmuti),
            },
            TaxRole::LesserDalmuti => TaxStep {
                role,
                kind: TaxKind::Return,
                count: 1,
                to: self.lesser_peon,
                then: AfterTax::PassTo(self.greater_peon),
            },
            TaxRole::GreaterPeon => TaxStep {
                role,
                kind: TaxKind::Tribute,
                count: 2,
                to: self.greater_dalmuti,
                then: AfterTax::PassTo(self.greater_dalmuti),
            },
            TaxRole::GreaterDalmuti => TaxStep {
                role,
                kind: TaxKind::Return,
                count: 2,
                to: self.greater_peon,
                then: AfterTax::RoundReady,
            },
        };
        Some(step)
    }
}
