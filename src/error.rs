//! Error types for every layer of the ring.
//!
//! Frame-sync problems (`CodecError`) are swallowed by the transport and
//! only logged. Everything else propagates with `?` up to the caller of
//! `GamePeer::run`.

use std::io;

use crate::core::PeerId;

/// Failure to turn bytes into an envelope (or back).
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("frame does not start with the start sentinel")]
    BadStartMarker,

    #[error("frame does not end with the end sentinel (got {0:#b})")]
    BadEndMarker(u16),

    #[error("unknown message type code {0}")]
    UnknownType(u8),

    #[error("origin {0} is not a valid peer id")]
    BadOrigin(u8),

    #[error("frame could not be decoded: {0}")]
    Frame(#[from] bincode::Error),
}

/// Failure to parse the textual payload of a known message type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("bad peer id {0:?}")]
    BadPeer(String),

    #[error("bad card {0:?}")]
    BadCard(String),

    #[error("bad rank {0:?}")]
    BadRank(String),

    #[error("missing {delimiter:?} in {clause:?}")]
    MissingDelimiter { delimiter: char, clause: String },

    #[error("card list {0:?} is not bracketed")]
    Unbracketed(String),
}

/// A local card choice that may not be sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayError {
    #[error("chosen cards are not all in hand")]
    NotInHand,

    #[error("cards of more than one rank")]
    MixedRanks,

    #[error("table needs {expected} cards, got {got}")]
    WrongCount { expected: usize, got: usize },

    #[error("rank {got} does not beat the table rank {table}")]
    NotLower { got: u8, table: u8 },

    #[error("the opener of a trick may not pass")]
    MustOpen,

    #[error("tax return needs exactly {expected} cards, got {got}")]
    WrongTaxCount { expected: usize, got: usize },
}

/// Failure to load or validate a ring configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] io::Error),

    #[error("cannot parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ring needs between {min} and {max} peers, got {got}")]
    PeerCount { min: usize, max: usize, got: usize },

    #[error("{0} is not a member of the ring")]
    UnknownPeer(PeerId),

    #[error("peer list has {listed} entries for {expected} peers")]
    PeerList { listed: usize, expected: usize },

    #[error("{0} must be non-zero")]
    Zero(&'static str),
}

/// Failure of the ring transport.
#[derive(Debug, thiserror::Error)]
pub enum RingError {
    #[error("link i/o: {0}")]
    Io(#[from] io::Error),

    #[error("cannot encode envelope: {0}")]
    Encode(#[from] CodecError),

    #[error("{0} tried to hand off a token it does not hold")]
    TokenNotHeld(PeerId),

    #[error("stopped")]
    Stopped,
}
