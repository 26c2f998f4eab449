//! Core types: peer ids, seating order, configuration, RNG.
//!
//! These are shared by the wire codec, the ring transport and the game
//! state machine.

pub mod peer;
pub mod rng;
pub mod config;

pub use peer::{PeerId, PlayerOrder, Seat};
pub use rng::GameRng;
pub use config::{PeerAddress, PeerConfig, RingConfig, TimingConfig, MAX_PEERS, MIN_PEERS};
