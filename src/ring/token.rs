//! Token coordinator.
//!
//! The token is the only mutual-exclusion primitive: a peer may originate a
//! turn-constrained broadcast only while it holds it. Hand-off is a single
//! TOKEN envelope addressed by peer id, relayed by everyone else, so the
//! target need not be the physical next neighbour.

use tracing::debug;

use super::link::Link;
use super::transport::Ring;
use crate::core::PeerId;
use crate::error::RingError;
use crate::wire::{Envelope, Message, MessageType};

/// Whether the local peer holds the token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenState {
    held: bool,
}

impl TokenState {
    #[must_use]
    pub const fn new(held: bool) -> Self {
        Self { held }
    }

    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.held
    }

    pub fn acquire(&mut self) {
        self.held = true;
    }

    pub fn release(&mut self) {
        self.held = false;
    }
}

impl<L: Link> Ring<L> {
    /// Pass the token to `target`.
    ///
    /// Handing it to ourselves is not a hop: the token stays put and a
    /// TOKEN_SETTLED broadcast tells everyone where it is. Otherwise the
    /// TOKEN envelope is sent and the token is released at once, without
    /// waiting for the target to pick it up.
    pub fn give_token(&mut self, target: PeerId) -> Result<(), RingError> {
        if !self.token.is_held() {
            return Err(RingError::TokenNotHeld(self.id()));
        }
        if target == self.id() {
            debug!(peer = %self.id(), "token settled in place");
            self.broadcast(&Message::TokenSettled)?;
            return Ok(());
        }

        let envelope = Envelope::new(self.id(), &Message::Token { to: target });
        self.send(&envelope)?;
        self.token.release();
        debug!(peer = %self.id(), to = %target, "token handed off");
        Ok(())
    }

    /// Wait until the token's new position is known to everyone.
    ///
    /// The peer that finds itself holding the token announces it with a
    /// TOKEN_SETTLED broadcast; everyone else returns on seeing that
    /// announcement.
    pub fn wait_token_settle(&mut self) -> Result<(), RingError> {
        loop {
            if self.has_token() {
                self.broadcast(&Message::TokenSettled)?;
                return Ok(());
            }
            let envelope = self.receive_and_relay()?;
            if envelope.kind == MessageType::TokenSettled {
                debug!(peer = %self.id(), holder = %envelope.origin, "token settled");
                return Ok(());
            }
        }
    }

    /// Move the token to `target` and wait until every peer has seen it
    /// settle there.
    ///
    /// Every peer calls this at the same protocol step; only the current
    /// holder actually sends anything.
    pub fn reseat_token(&mut self, target: PeerId) -> Result<(), RingError> {
        if self.has_token() {
            self.give_token(target)?;
            if self.has_token() {
                return Ok(());
            }
        }
        self.wait_token_settle()
    }
}
