//! Ring transport.
//!
//! Every peer sends only to its next neighbour and receives only from its
//! previous one. Traffic that is not addressed to a peer is relayed
//! unchanged, so all peers observe envelopes in the same relative order.
//!
//! A broadcast is acknowledged when the envelope has travelled the whole
//! circle and come back to its origin. Until then the origin keeps
//! receiving (and relaying anything foreign), resending the identical frame
//! whenever `retry_budget` consecutive receive attempts come up empty.
//!
//! Receives never give up on their own: each attempt is bounded by
//! `recv_timeout`, and attempts repeat until an envelope arrives or the
//! `StopSignal` is raised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::link::Link;
use super::token::TokenState;
use crate::core::{PeerConfig, PeerId, TimingConfig};
use crate::error::RingError;
use crate::wire::{Envelope, Message, MessageType};

/// Shared flag that makes every blocking ring operation return
/// `RingError::Stopped`.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Peers notice at their next receive attempt.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One peer's endpoint on the ring.
#[derive(Debug)]
pub struct Ring<L> {
    id: PeerId,
    num_peers: usize,
    timing: TimingConfig,
    link: L,
    pub(super) token: TokenState,
    stop: StopSignal,
}

impl<L: Link> Ring<L> {
    /// Join the ring described by `config`. Only the dealer starts with
    /// the token.
    pub fn new(config: &PeerConfig, link: L) -> Self {
        Self {
            id: config.id,
            num_peers: config.num_peers,
            timing: config.timing,
            link,
            token: TokenState::new(config.is_dealer()),
            stop: StopSignal::new(),
        }
    }

    /// Use an externally owned stop signal.
    #[must_use]
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    #[must_use]
    pub fn id(&self) -> PeerId {
        self.id
    }

    #[must_use]
    pub fn num_peers(&self) -> usize {
        self.num_peers
    }

    #[must_use]
    pub fn timing(&self) -> TimingConfig {
        self.timing
    }

    /// Whether this peer holds the token.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_held()
    }

    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    fn check_stop(&self) -> Result<(), RingError> {
        if self.stop.is_stopped() {
            Err(RingError::Stopped)
        } else {
            Ok(())
        }
    }

    /// Encode and send one envelope to the next neighbour.
    pub fn send(&mut self, envelope: &Envelope) -> Result<(), RingError> {
        let frame = envelope.encode()?;
        self.link.send(&frame)
    }

    /// Relay an envelope to the next neighbour, unchanged.
    pub fn forward(&mut self, envelope: &Envelope) -> Result<(), RingError> {
        trace!(peer = %self.id, origin = %envelope.origin, kind = ?envelope.kind, "forward");
        self.send(envelope)
    }

    /// Make one receive attempt.
    ///
    /// Frames that fail to decode are dropped. A TOKEN addressed to this
    /// peer grants the token; any other TOKEN is passed on immediately.
    /// Either way the envelope is returned.
    pub fn poll(&mut self, timeout: Duration) -> Result<Option<Envelope>, RingError> {
        let Some(bytes) = self.link.recv(timeout)? else {
            return Ok(None);
        };
        let envelope = match Envelope::decode(&bytes) {
            Ok(envelope) => envelope,
            Err(err) => {
                trace!(peer = %self.id, error = %err, len = bytes.len(), "discarding frame");
                return Ok(None);
            }
        };

        if envelope.kind == MessageType::Token {
            match envelope.message() {
                Ok(Message::Token { to }) if to == self.id => {
                    debug!(peer = %self.id, from = %envelope.origin, "token acquired");
                    self.token.acquire();
                }
                Ok(_) => self.forward(&envelope)?,
                Err(err) => {
                    warn!(peer = %self.id, error = %err, "discarding malformed token");
                    return Ok(None);
                }
            }
        }
        Ok(Some(envelope))
    }

    /// Block until a valid envelope arrives.
    pub fn receive(&mut self) -> Result<Envelope, RingError> {
        let timeout = self.timing.recv_timeout();
        loop {
            self.check_stop()?;
            if let Some(envelope) = self.poll(timeout)? {
                return Ok(envelope);
            }
        }
    }

    /// Mark our receipt and pass the envelope on, unless we hold the token
    /// or originated it.
    fn relay(&mut self, envelope: &mut Envelope) -> Result<(), RingError> {
        envelope.mark_received(self.id, self.num_peers);
        if !self.has_token() && envelope.origin != self.id {
            self.forward(envelope)?;
        }
        Ok(())
    }

    /// Receive one envelope, relay it, and hand it to the caller.
    ///
    /// Every envelope comes back with our receipt bit set. TOKEN envelopes
    /// were already dealt with by [`Ring::poll`] and are not relayed again.
    pub fn receive_and_relay(&mut self) -> Result<Envelope, RingError> {
        let mut envelope = self.receive()?;
        envelope.mark_received(self.id, self.num_peers);
        if envelope.kind != MessageType::Token {
            self.relay(&mut envelope)?;
        }
        Ok(envelope)
    }

    /// Originate `message` and wait for it to come back around the ring.
    ///
    /// Returns the returning copy, whose receipt mask shows every member.
    pub fn broadcast(&mut self, message: &Message) -> Result<Envelope, RingError> {
        let mut sent = Envelope::new(self.id, message);
        sent.mark_received(self.id, self.num_peers);
        let frame = sent.encode()?;
        let timeout = self.timing.recv_timeout();

        debug!(peer = %self.id, kind = ?sent.kind, payload = %sent.payload, "broadcast");
        self.link.send(&frame)?;

        let mut idle = 0;
        loop {
            self.check_stop()?;
            match self.poll(timeout)? {
                None => {
                    idle += 1;
                    if idle >= self.timing.retry_budget {
                        warn!(peer = %self.id, kind = ?sent.kind, "no echo, resending");
                        self.link.send(&frame)?;
                        idle = 0;
                    }
                }
                Some(envelope) if envelope.kind == MessageType::Token => {}
                Some(envelope) if envelope.is_echo_of(&sent) => {
                    debug!(
                        peer = %self.id,
                        kind = ?envelope.kind,
                        receipts = envelope.receipts,
                        "broadcast confirmed"
                    );
                    return Ok(envelope);
                }
                Some(mut envelope) => self.relay(&mut envelope)?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::memory_ring;
    use crate::ring::MemoryLink;

    fn ring_of(n: usize) -> Vec<Ring<MemoryLink>> {
        let timing = TimingConfig::default().with_recv_timeout_ms(5);
        memory_ring(n)
            .into_iter()
            .enumerate()
            .map(|(i, link)| {
                let config = PeerConfig::new(PeerId::new(i as u8 + 1), n).with_timing(timing);
                Ring::new(&config, link)
            })
            .collect()
    }

    #[test]
    fn test_only_dealer_starts_with_token() {
        let rings = ring_of(4);
        let holders: Vec<_> = rings.iter().filter(|r| r.has_token()).map(|r| r.id()).collect();
        assert_eq!(holders, vec![PeerId::new(1)]);
    }

    #[test]
    fn test_poll_drops_garbage() {
        let mut links = memory_ring(4);
        links[3].send(b"\x00garbage").unwrap();
        let config = PeerConfig::new(PeerId::new(1), 4);
        let mut ring = Ring::new(&config, links.remove(0));
        assert!(ring.poll(Duration::from_millis(20)).unwrap().is_none());
    }

    #[test]
    fn test_token_for_self_is_kept() {
        let mut rings = ring_of(4);
        let token = Envelope::new(PeerId::new(2), &Message::Token { to: PeerId::new(3) });
        rings[1].send(&token).unwrap();

        let got = rings[2].receive().unwrap();
        assert_eq!(got.kind, MessageType::Token);
        assert!(rings[2].has_token());
        assert!(rings[3].poll(Duration::from_millis(20)).unwrap().is_none());
    }

    #[test]
    fn test_token_for_other_passes_through() {
        let mut rings = ring_of(4);
        let token = Envelope::new(PeerId::new(1), &Message::Token { to: PeerId::new(4) });
        rings[0].send(&token).unwrap();

        rings[1].receive().unwrap();
        assert!(!rings[1].has_token());
        rings[2].receive().unwrap();
        rings[3].receive().unwrap();
        assert!(rings[3].has_token());
    }

    #[test]
    fn test_relayed_token_carries_receipt() {
        let mut rings = ring_of(4);
        let token = Envelope::new(PeerId::new(1), &Message::Token { to: PeerId::new(4) });
        rings[0].send(&token).unwrap();

        let passing = rings[1].receive_and_relay().unwrap();
        assert_eq!(passing.kind, MessageType::Token);
        assert!(passing.received_by(PeerId::new(2), 4));

        rings[2].receive().unwrap();
        let kept = rings[3].receive_and_relay().unwrap();
        assert!(kept.received_by(PeerId::new(4), 4));
        assert!(rings[3].has_token());
    }

    #[test]
    fn test_holder_does_not_relay() {
        let mut rings = ring_of(4);
        let env = Envelope::new(PeerId::new(4), &Message::Pass);
        rings[3].send(&env).unwrap();

        let got = rings[0].receive_and_relay().unwrap();
        assert!(got.received_by(PeerId::new(1), 4));
        assert!(rings[1].poll(Duration::from_millis(20)).unwrap().is_none());
    }

    #[test]
    fn test_receive_honours_stop() {
        let mut rings = ring_of(4);
        rings[1].stop_signal().stop();
        assert!(matches!(rings[1].receive(), Err(RingError::Stopped)));
    }
}
