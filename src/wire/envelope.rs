//! The fixed-shape wire envelope and its frame codec.
//!
//! A frame is the bincode encoding (fixed-width integers) of six fields:
//! start sentinel, origin id, type code, payload text, receipt bitmask and
//! end sentinel. The first byte of every valid frame is therefore the start
//! sentinel, which lets a receiver reject torn or foreign datagrams before
//! attempting to decode them.

use bincode::Options;
use serde::{Deserialize, Serialize};

use super::Message;
use crate::core::{PeerId, MAX_PEERS};
use crate::error::{CodecError, PayloadError};

/// First byte of every frame.
pub const START_SENTINEL: u8 = 0b0111_0101;

/// Trailing marker of every frame.
pub const END_SENTINEL: u16 = 0b01_1101_0101;

/// Upper bound on an encoded frame.
pub const MAX_FRAME_LEN: usize = 4096;

/// The closed set of envelope kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    PlayCards = 1,
    Pass = 2,
    Token = 3,
    Setup = 4,
    Deal = 5,
    Revolution = 6,
    GreatRevolution = 7,
    RoundReady = 8,
    GiveCards = 9,
    TokenSettled = 10,
    RoundFinished = 11,
    HandEmpty = 12,
}

impl MessageType {
    pub const ALL: [MessageType; 12] = [
        MessageType::PlayCards,
        MessageType::Pass,
        MessageType::Token,
        MessageType::Setup,
        MessageType::Deal,
        MessageType::Revolution,
        MessageType::GreatRevolution,
        MessageType::RoundReady,
        MessageType::GiveCards,
        MessageType::TokenSettled,
        MessageType::RoundFinished,
        MessageType::HandEmpty,
    ];

    /// Wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Kind for a wire code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<MessageType> {
        MessageType::ALL.get(usize::from(code).checked_sub(1)?).copied()
    }
}

/// On-the-wire record.
#[derive(Serialize, Deserialize)]
struct Frame {
    start: u8,
    origin: u8,
    kind: u8,
    payload: String,
    receipts: u32,
    end: u16,
}

fn frame_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_FRAME_LEN as u64)
        .with_fixint_encoding()
        .allow_trailing_bytes()
}

/// One protocol message in transit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Peer that created the message.
    pub origin: PeerId,
    pub kind: MessageType,
    /// Type-specific text, see [`Message::to_payload`].
    pub payload: String,
    /// Bit `1 << (N - p)` is set once peer `p` has seen the envelope.
    /// Diagnostic: nothing in the protocol waits on it.
    pub receipts: u32,
}

impl Envelope {
    /// Wrap a message created by `origin`.
    #[must_use]
    pub fn new(origin: PeerId, message: &Message) -> Self {
        Self {
            origin,
            kind: message.kind(),
            payload: message.to_payload(),
            receipts: 0,
        }
    }

    /// Decode the payload.
    pub fn message(&self) -> Result<Message, PayloadError> {
        Message::parse(self.kind, &self.payload)
    }

    /// Receipt bit of `peer` in a ring of `num_peers`.
    #[must_use]
    pub fn receipt_bit(peer: PeerId, num_peers: usize) -> u32 {
        let shift = num_peers.saturating_sub(usize::from(peer.get()));
        1u32.checked_shl(shift as u32).unwrap_or(0)
    }

    /// Mask with every member's bit set.
    #[must_use]
    pub fn full_mask(num_peers: usize) -> u32 {
        if num_peers >= 32 {
            u32::MAX
        } else {
            (1u32 << num_peers) - 1
        }
    }

    /// Record that `peer` has seen this envelope.
    pub fn mark_received(&mut self, peer: PeerId, num_peers: usize) {
        self.receipts |= Self::receipt_bit(peer, num_peers);
    }

    #[must_use]
    pub fn received_by(&self, peer: PeerId, num_peers: usize) -> bool {
        self.receipts & Self::receipt_bit(peer, num_peers) != 0
    }

    /// Whether every member has seen this envelope.
    #[must_use]
    pub fn is_fully_received(&self, num_peers: usize) -> bool {
        self.receipts & Self::full_mask(num_peers) == Self::full_mask(num_peers)
    }

    /// Same origin, kind and payload: `self` is a copy of `sent` that came
    /// back around the ring.
    #[must_use]
    pub fn is_echo_of(&self, sent: &Envelope) -> bool {
        self.origin == sent.origin && self.kind == sent.kind && self.payload == sent.payload
    }

    /// Encode to a frame.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let frame = Frame {
            start: START_SENTINEL,
            origin: self.origin.get(),
            kind: self.kind.code(),
            payload: self.payload.clone(),
            receipts: self.receipts,
            end: END_SENTINEL,
        };
        Ok(frame_options().serialize(&frame)?)
    }

    /// Decode a frame, rejecting anything not framed by both sentinels.
    ///
    /// ```
    /// use dalmuti_ring::core::PeerId;
    /// use dalmuti_ring::wire::{Envelope, Message};
    ///
    /// let env = Envelope::new(PeerId::new(2), &Message::Token { to: PeerId::new(4) });
    /// let bytes = env.encode().unwrap();
    /// assert_eq!(Envelope::decode(&bytes).unwrap(), env);
    /// assert!(Envelope::decode(&bytes[1..]).is_err());
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<Envelope, CodecError> {
        if bytes.first() != Some(&START_SENTINEL) {
            return Err(CodecError::BadStartMarker);
        }
        let frame: Frame = frame_options().deserialize(bytes)?;
        if frame.end != END_SENTINEL {
            return Err(CodecError::BadEndMarker(frame.end));
        }
        let kind = MessageType::from_code(frame.kind).ok_or(CodecError::UnknownType(frame.kind))?;
        if frame.origin == 0 || usize::from(frame.origin) > MAX_PEERS {
            return Err(CodecError::BadOrigin(frame.origin));
        }

        Ok(Envelope {
            origin: PeerId::new(frame.origin),
            kind,
            payload: frame.payload,
            receipts: frame.receipts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_to(id: u8) -> Envelope {
        Envelope::new(PeerId::new(1), &Message::Token { to: PeerId::new(id) })
    }

    #[test]
    fn test_sentinels_are_distinct() {
        assert_ne!(u16::from(START_SENTINEL), END_SENTINEL);
    }

    #[test]
    fn test_type_codes() {
        for kind in MessageType::ALL {
            assert_eq!(MessageType::from_code(kind.code()), Some(kind));
        }
        assert_eq!(MessageType::PlayCards.code(), 1);
        assert_eq!(MessageType::HandEmpty.code(), 12);
        assert_eq!(MessageType::from_code(0), None);
        assert_eq!(MessageType::from_code(13), None);
    }

    #[test]
    fn test_frame_starts_with_sentinel() {
        let bytes = token_to(3).encode().unwrap();
        assert_eq!(bytes[0], START_SENTINEL);
    }

    #[test]
    fn test_round_trip_keeps_receipts() {
        let mut env = token_to(3);
        env.mark_received(PeerId::new(2), 4);
        let back = Envelope::decode(&env.encode().unwrap()).unwrap();
        assert_eq!(back, env);
        assert!(back.received_by(PeerId::new(2), 4));
        assert!(!back.received_by(PeerId::new(1), 4));
    }

    #[test]
    fn test_rejects_bad_start() {
        let mut bytes = token_to(3).encode().unwrap();
        bytes[0] = 0;
        assert!(matches!(Envelope::decode(&bytes), Err(CodecError::BadStartMarker)));
        assert!(matches!(Envelope::decode(&[]), Err(CodecError::BadStartMarker)));
    }

    #[test]
    fn test_rejects_bad_end() {
        let mut bytes = token_to(3).encode().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(Envelope::decode(&bytes), Err(CodecError::BadEndMarker(_))));
    }

    #[test]
    fn test_rejects_truncated_frame() {
        let bytes = token_to(3).encode().unwrap();
        assert!(matches!(
            Envelope::decode(&bytes[..bytes.len() - 3]),
            Err(CodecError::Frame(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_type() {
        let mut bytes = token_to(3).encode().unwrap();
        bytes[2] = 42;
        assert!(matches!(Envelope::decode(&bytes), Err(CodecError::UnknownType(42))));
    }

    #[test]
    fn test_receipt_bits() {
        assert_eq!(Envelope::receipt_bit(PeerId::new(1), 4), 0b1000);
        assert_eq!(Envelope::receipt_bit(PeerId::new(4), 4), 0b0001);
        assert_eq!(Envelope::full_mask(4), 0b1111);
        assert_eq!(Envelope::full_mask(32), u32::MAX);
        assert_eq!(Envelope::receipt_bit(PeerId::new(1), 32), 1 << 31);

        let mut env = token_to(2);
        for peer in PeerId::all(4) {
            assert!(!env.is_fully_received(4));
            env.mark_received(peer, 4);
        }
        assert!(env.is_fully_received(4));
    }

    #[test]
    fn test_echo_matching() {
        let sent = Envelope::new(PeerId::new(1), &Message::RoundReady);
        let mut echo = sent.clone();
        echo.receipts = 0b1111;
        assert!(echo.is_echo_of(&sent));

        let other = Envelope::new(PeerId::new(1), &Message::Pass);
        assert!(!other.is_echo_of(&sent));
        assert!(!token_to(2).is_echo_of(&token_to(3)));
    }

    #[test]
    fn test_message_accessor() {
        let env = token_to(4);
        assert_eq!(env.payload, "4");
        assert_eq!(env.message().unwrap(), Message::Token { to: PeerId::new(4) });
    }
}
