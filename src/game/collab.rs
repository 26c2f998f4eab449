//! Collaborators plugged into a game peer.
//!
//! The state machine never decides anything a player would decide, and
//! never draws anything itself. It asks:
//!
//! - a `CardChooser` which cards to play, whether to revolt, and which
//!   cards to hand back as tax;
//! - a `SeatingPolicy` how the next round is seated;
//!
//! and it shows a `Renderer` a read-only `Snapshot` at every phase entry.

use im::Vector;
use serde::Serialize;
use tracing::info;

use super::phase::Phase;
use super::rules::Table;
use crate::cards::{Card, CardSet, Hand};
use crate::core::{PeerId, PlayerOrder};

// =============================================================================
// Card Chooser
// =============================================================================

/// Source of a player's decisions.
///
/// Choices are validated by the caller; an invalid one is asked for again
/// a few times before the greedy default is used instead.
pub trait CardChooser: Send {
    /// Cards to put on `table`. Empty means pass.
    fn choose_cards(&mut self, hand: &Hand, table: &Table) -> CardSet;

    /// Whether to call a revolution while holding both Jesters. `great` is
    /// set when the caller sits in the lowest seat.
    fn choose_revolution(&mut self, hand: &Hand, great: bool) -> bool;

    /// `count` cards to return to the peon who paid tax.
    fn choose_tax_return(&mut self, hand: &Hand, count: usize) -> CardSet;
}

/// Rule-following default player.
///
/// Opens with its worst rank, follows with the worst set that still beats
/// the table, and spends Jesters only when nothing else works.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyChooser {
    revolt: bool,
}

impl GreedyChooser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Call a revolution whenever possible.
    #[must_use]
    pub fn with_revolt(mut self, revolt: bool) -> Self {
        self.revolt = revolt;
        self
    }

    /// The greedy play for `hand` on `table`.
    ///
    /// ```
    /// use dalmuti_ring::cards::{Card, Hand};
    /// use dalmuti_ring::game::{GreedyChooser, Table};
    ///
    /// let hand = Hand::from_cards([Card::Dalmuti, Card::Knight, Card::Knight]);
    /// let play = GreedyChooser::greedy_play(&hand, &Table::new());
    /// assert_eq!(play.as_slice(), &[Card::Knight, Card::Knight]);
    /// ```
    #[must_use]
    pub fn greedy_play(hand: &Hand, table: &Table) -> CardSet {
        if table.is_open() {
            return Self::opening(hand);
        }

        let need = table.count();
        let beat = table.rank().unwrap_or(Card::Jester.rank());
        let wild = hand.wild_count();
        let candidates = || {
            Card::ALL
                .into_iter()
                .rev()
                .filter(move |c| !c.is_wild() && c.rank() < beat)
        };

        if let Some(card) = candidates().find(|&c| hand.count(c) >= need) {
            return std::iter::repeat(card).take(need).collect();
        }
        if let Some(card) = candidates().find(|&c| {
            let natural = hand.count(c);
            natural > 0 && natural + wild >= need
        }) {
            let natural = hand.count(card);
            let mut play: CardSet = std::iter::repeat(card).take(natural).collect();
            play.extend(std::iter::repeat(Card::Jester).take(need - natural));
            return play;
        }
        CardSet::new()
    }

    fn opening(hand: &Hand) -> CardSet {
        let worst = hand.cards().iter().rev().find(|c| !c.is_wild()).copied();
        match worst {
            Some(card) => std::iter::repeat(card).take(hand.count(card)).collect(),
            None => hand.cards().iter().copied().collect(),
        }
    }
}

impl CardChooser for GreedyChooser {
    fn choose_cards(&mut self, hand: &Hand, table: &Table) -> CardSet {
        Self::greedy_play(hand, table)
    }

    fn choose_revolution(&mut self, _hand: &Hand, _great: bool) -> bool {
        self.revolt
    }

    fn choose_tax_return(&mut self, hand: &Hand, count: usize) -> CardSet {
        hand.worst(count)
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// What a peer knows at one moment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub peer: PeerId,
    pub round: u32,
    pub phase: Phase,
    pub hand: Vector<Card>,
    pub order: Vector<PeerId>,
    pub table: Table,
    pub finish_order: Vector<PeerId>,
    pub has_token: bool,
    pub had_revolution: bool,
}

/// Display sink. Gets no way to influence the game.
pub trait Renderer: Send {
    fn render(&mut self, snapshot: &Snapshot);
}

/// Renders nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _snapshot: &Snapshot) {}
}

/// Logs each snapshot at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingRenderer;

impl Renderer for TracingRenderer {
    fn render(&mut self, s: &Snapshot) {
        let hand: Vec<u8> = s.hand.iter().map(|c| c.rank()).collect();
        let order: Vec<u8> = s.order.iter().map(|p| p.get()).collect();
        let finished: Vec<u8> = s.finish_order.iter().map(|p| p.get()).collect();
        info!(
            peer = %s.peer,
            round = s.round,
            phase = %s.phase,
            token = s.has_token,
            revolution = s.had_revolution,
            ?hand,
            ?order,
            ?finished,
            "phase entered"
        );
    }
}

// =============================================================================
// Seating Policy
// =============================================================================

/// Seats the next round from the finish order of the last one.
pub trait SeatingPolicy: Send {
    fn next_order(&mut self, finish_order: &[PeerId]) -> PlayerOrder;
}

/// First out is the next Greater Dalmuti, last out the next Greater Peon.
#[derive(Clone, Copy, Debug, Default)]
pub struct FinishOrderSeating;

impl SeatingPolicy for FinishOrderSeating {
    fn next_order(&mut self, finish_order: &[PeerId]) -> PlayerOrder {
        PlayerOrder::new(finish_order.iter().copied())
    }
}
