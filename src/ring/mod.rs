//! Ring transport and token coordination.
//!
//! ## Key Types
//!
//! - `Link`: Unreliable datagram edge to the ring neighbours (`UdpLink`, `MemoryLink`)
//! - `Ring`: Relaying, retrying transport with full-circle broadcast confirmation
//! - `TokenState`: The per-peer token flag; hand-off lives on `Ring`
//! - `StopSignal`: Cancels blocking receives from outside the peer

pub mod link;
pub mod token;
pub mod transport;

pub use link::{memory_ring, Link, MemoryLink, UdpLink};
pub use token::TokenState;
pub use transport::{Ring, StopSignal};
