//! Round phases.
//!
//! ```text
//! Setup -> Deal -> RevolutionPoll -+-> TaxExchange -> Play -> RoundComplete
//!           ^                      |                   ^          |
//!           |                      +-------------------+          |
//!           +-----------------------------------------------------+
//! ```
//!
//! `Phase::react` is total over (phase, envelope kind): every kind a peer
//! can receive is either applied to state, ends the phase, or is ignored.

use serde::{Deserialize, Serialize};

use crate::wire::MessageType;

/// A phase of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Seating draw. First round only.
    Setup,
    Deal,
    /// The token visits each peer once; a double-Jester holder may revolt.
    RevolutionPoll,
    /// Skipped after a revolution.
    TaxExchange,
    Play,
    RoundComplete,
}

/// What a peer waiting in a phase does with an envelope kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reaction {
    /// Update local state and keep waiting.
    Apply,
    /// The phase is over.
    Advance,
    /// Not meaningful here; relay and keep waiting.
    Ignore,
}

impl Phase {
    /// Reaction of a non-acting peer in this phase to `kind`.
    ///
    /// ```
    /// use dalmuti_ring::game::{Phase, Reaction};
    /// use dalmuti_ring::wire::MessageType;
    ///
    /// assert_eq!(Phase::TaxExchange.react(MessageType::RoundReady), Reaction::Advance);
    /// assert_eq!(Phase::TaxExchange.react(MessageType::PlayCards), Reaction::Ignore);
    /// ```
    #[must_use]
    pub fn react(self, kind: MessageType) -> Reaction {
        use MessageType as M;

        match (self, kind) {
            (Phase::Setup, M::Setup) | (Phase::Deal, M::Deal) => Reaction::Advance,

            (Phase::RevolutionPoll, M::Revolution | M::GreatRevolution | M::Token) => Reaction::Apply,
            (Phase::RevolutionPoll, M::RoundReady) => Reaction::Advance,

            (Phase::TaxExchange, M::GiveCards | M::Token) => Reaction::Apply,
            (Phase::TaxExchange, M::RoundReady) => Reaction::Advance,

            (
                Phase::Play,
                M::PlayCards | M::Pass | M::RoundFinished | M::HandEmpty | M::Token,
            ) => Reaction::Apply,

            _ => Reaction::Ignore,
        }
    }

    /// The phase that follows this one.
    #[must_use]
    pub fn after(self, had_revolution: bool) -> Phase {
        match self {
            Phase::Setup => Phase::Deal,
            Phase::Deal => Phase::RevolutionPoll,
            Phase::RevolutionPoll if had_revolution => Phase::Play,
            Phase::RevolutionPoll => Phase::TaxExchange,
            Phase::TaxExchange => Phase::Play,
            Phase::Play => Phase::RoundComplete,
            Phase::RoundComplete => Phase::Deal,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::Deal => "deal",
            Phase::RevolutionPoll => "revolution poll",
            Phase::TaxExchange => "tax exchange",
            Phase::Play => "play",
            Phase::RoundComplete => "round complete",
        };
        f.write_str(name)
    }
}
