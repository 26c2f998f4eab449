//! Envelope codec.
//!
//! `Envelope` is what travels the ring: a frame with sentinels, origin,
//! type code, textual payload and receipt bitmask. `Message` is the typed
//! view of the payload that the game logic works with.

pub mod envelope;
pub mod message;

pub use envelope::{Envelope, MessageType, END_SENTINEL, MAX_FRAME_LEN, START_SENTINEL};
pub use message::Message;
