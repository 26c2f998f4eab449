//! # dalmuti-ring
//!
//! The Great Dalmuti played by N peers over a token ring, with no central
//! server.
//!
//! ## Design Principles
//!
//! 1. **Ring only**: Each peer sends to its next neighbour and receives from
//!    its previous one. Everything else is relaying.
//!
//! 2. **Token as the lock**: Only the token holder originates turn-bound
//!    broadcasts. Hand-off is addressed by peer id, not by ring position.
//!
//! 3. **Idempotent handlers**: Delivery is at-least-once; every state change
//!    survives seeing the same envelope twice.
//!
//! ## Architecture
//!
//! - **Full-circle broadcast**: A broadcast is confirmed when it comes back
//!   to its origin, and resent when it does not.
//!
//! - **Explicit phases**: `Phase::react` is total over (phase, kind), so an
//!   unexpected envelope is a case, not an accident.
//!
//! - **Persistent snapshots**: Renderers get `im` vectors that clone in O(1).
//!
//! ## Modules
//!
//! - `core`: Peer ids, seating order, configuration, RNG
//! - `cards`: Cards, the deck, hands
//! - `wire`: Envelope frame codec and typed payloads
//! - `ring`: Links, the relaying transport, token hand-off
//! - `game`: Phase machine, rules, tax, collaborators, the game peer
//! - `error`: Error types for every layer

pub mod core;
pub mod cards;
pub mod wire;
pub mod ring;
pub mod game;
pub mod error;

// Re-export commonly used types
pub use crate::core::{
    GameRng, PeerAddress, PeerConfig, PeerId, PlayerOrder, RingConfig, Seat, TimingConfig,
};

pub use crate::cards::{Card, CardSet, Deck, Hand};

pub use crate::wire::{Envelope, Message, MessageType};

pub use crate::ring::{memory_ring, Link, MemoryLink, Ring, StopSignal, TokenState, UdpLink};

pub use crate::game::{
    CardChooser, DealPolicy, GamePeer, GamePeerBuilder, GreedyChooser, Phase, Reaction,
    Renderer, RoundOutcome, SeatingPolicy, Snapshot, Table,
};

pub use crate::error::{CodecError, ConfigError, PayloadError, PlayError, RingError};
