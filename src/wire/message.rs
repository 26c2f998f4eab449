//! Typed protocol messages and their textual payloads.
//!
//! The payload grammar is fixed for interop with existing peers:
//!
//! | kind | payload |
//! |---|---|
//! | SETUP | `id:rank,id:rank,...` best rank first |
//! | DEAL | `id:[card,...];id:[card,...];...` |
//! | GIVE_CARDS | `target:[card,...]` |
//! | PLAY_CARDS | `owner:[card,...]` |
//! | TOKEN | destination id |
//! | everything else | empty |
//!
//! Parsers tolerate whitespace around every token.

use smallvec::SmallVec;

use super::MessageType;
use crate::cards::{Card, CardSet};
use crate::core::{PeerId, Seat};
use crate::error::PayloadError;

/// One protocol message with its payload decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Cards now standing on the table, and who put them there.
    PlayCards { owner: PeerId, cards: CardSet },
    Pass,
    /// Token addressed to `to`.
    Token { to: PeerId },
    /// The seating draw, best rank first.
    Setup(Vec<Seat>),
    /// Every peer's hand, in seating order.
    Deal(Vec<(PeerId, Vec<Card>)>),
    Revolution,
    GreatRevolution,
    RoundReady,
    /// Tax cards for `target`.
    GiveCards { target: PeerId, cards: CardSet },
    TokenSettled,
    /// The trick was reclaimed by its owner; the table clears.
    RoundFinished,
    /// The origin ran out of cards.
    HandEmpty,
}

impl Message {
    /// Wire type of this message.
    #[must_use]
    pub fn kind(&self) -> MessageType {
        match self {
            Message::PlayCards { .. } => MessageType::PlayCards,
            Message::Pass => MessageType::Pass,
            Message::Token { .. } => MessageType::Token,
            Message::Setup(_) => MessageType::Setup,
            Message::Deal(_) => MessageType::Deal,
            Message::Revolution => MessageType::Revolution,
            Message::GreatRevolution => MessageType::GreatRevolution,
            Message::RoundReady => MessageType::RoundReady,
            Message::GiveCards { .. } => MessageType::GiveCards,
            Message::TokenSettled => MessageType::TokenSettled,
            Message::RoundFinished => MessageType::RoundFinished,
            Message::HandEmpty => MessageType::HandEmpty,
        }
    }

    /// Render the textual payload.
    ///
    /// ```
    /// use dalmuti_ring::cards::Card;
    /// use dalmuti_ring::core::PeerId;
    /// use dalmuti_ring::wire::Message;
    ///
    /// let msg = Message::GiveCards {
    ///     target: PeerId::new(3),
    ///     cards: [Card::Archbishop, Card::Jester].into_iter().collect(),
    /// };
    /// assert_eq!(msg.to_payload(), "3:[2,13]");
    /// ```
    #[must_use]
    pub fn to_payload(&self) -> String {
        match self {
            Message::PlayCards { owner, cards } => {
                format!("{}:{}", owner.get(), card_list(cards))
            }
            Message::GiveCards { target, cards } => {
                format!("{}:{}", target.get(), card_list(cards))
            }
            Message::Token { to } => to.get().to_string(),
            Message::Setup(seating) => seating
                .iter()
                .map(|seat| format!("{}:{}", seat.peer.get(), seat.rank))
                .collect::<Vec<_>>()
                .join(","),
            Message::Deal(slices) => slices
                .iter()
                .map(|(peer, cards)| format!("{}:{}", peer.get(), card_list(cards)))
                .collect::<Vec<_>>()
                .join(";"),
            Message::Pass
            | Message::Revolution
            | Message::GreatRevolution
            | Message::RoundReady
            | Message::TokenSettled
            | Message::RoundFinished
            | Message::HandEmpty => String::new(),
        }
    }

    /// Decode the payload of a `kind` envelope.
    ///
    /// Payloads of the empty-payload kinds are not inspected.
    pub fn parse(kind: MessageType, payload: &str) -> Result<Message, PayloadError> {
        let msg = match kind {
            MessageType::PlayCards => {
                let (owner, cards) = parse_addressed(payload)?;
                Message::PlayCards {
                    owner,
                    cards: SmallVec::from_vec(cards),
                }
            }
            MessageType::GiveCards => {
                let (target, cards) = parse_addressed(payload)?;
                Message::GiveCards {
                    target,
                    cards: SmallVec::from_vec(cards),
                }
            }
            MessageType::Token => Message::Token {
                to: parse_peer(payload)?,
            },
            MessageType::Setup => Message::Setup(
                payload
                    .split(',')
                    .map(parse_seat)
                    .collect::<Result<_, _>>()?,
            ),
            MessageType::Deal => Message::Deal(
                payload
                    .split(';')
                    .map(parse_addressed)
                    .collect::<Result<_, _>>()?,
            ),
            MessageType::Pass => Message::Pass,
            MessageType::Revolution => Message::Revolution,
            MessageType::GreatRevolution => Message::GreatRevolution,
            MessageType::RoundReady => Message::RoundReady,
            MessageType::TokenSettled => Message::TokenSettled,
            MessageType::RoundFinished => Message::RoundFinished,
            MessageType::HandEmpty => Message::HandEmpty,
        };
        Ok(msg)
    }
}

fn card_list(cards: &[Card]) -> String {
    let inner: Vec<String> = cards.iter().map(Card::to_string).collect();
    format!("[{}]", inner.join(","))
}

fn parse_peer(text: &str) -> Result<PeerId, PayloadError> {
    let trimmed = text.trim();
    match trimmed.parse::<u8>() {
        Ok(id) if id > 0 => Ok(PeerId::new(id)),
        _ => Err(PayloadError::BadPeer(trimmed.to_string())),
    }
}

fn split_clause(clause: &str) -> Result<(&str, &str), PayloadError> {
    clause
        .split_once(':')
        .ok_or_else(|| PayloadError::MissingDelimiter {
            delimiter: ':',
            clause: clause.trim().to_string(),
        })
}

fn parse_seat(clause: &str) -> Result<Seat, PayloadError> {
    let (peer, rank) = split_clause(clause)?;
    let rank = rank.trim();
    Ok(Seat {
        peer: parse_peer(peer)?,
        rank: rank
            .parse()
            .map_err(|_| PayloadError::BadRank(rank.to_string()))?,
    })
}

fn parse_cards(text: &str) -> Result<Vec<Card>, PayloadError> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| PayloadError::Unbracketed(trimmed.to_string()))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner.split(',').map(|card| card.parse::<Card>()).collect()
}

fn parse_addressed(clause: &str) -> Result<(PeerId, Vec<Card>), PayloadError> {
    let (peer, cards) = split_clause(clause)?;
    Ok((parse_peer(peer)?, parse_cards(cards)?))
}
