//! The game peer: one ring member playing rounds of The Great Dalmuti.
//!
//! Every phase is a loop of the same shape. While this peer holds the token
//! and still has something to do in the phase, it acts (broadcasts, then
//! hands the token on). Otherwise it waits on [`Ring::receive_and_relay`]
//! and feeds each envelope through [`Phase::react`].
//!
//! The token path through one round:
//!
//! - SETUP/DEAL: the dealer holds the token and broadcasts.
//! - REVOLUTION_POLL: the token visits every peer once in ring order,
//!   starting at the dealer. The last one hands it to the Greater Dalmuti,
//!   who announces ROUND_READY.
//! - TAX_EXCHANGE: the token is re-seated at the Lesser Peon and follows
//!   the tax steps to the Greater Dalmuti, who announces ROUND_READY again.
//! - PLAY: the token follows the seating order, skipping finished peers.
//! - Between rounds the last actor re-seats the token at the dealer.

use im::Vector;
use rustc_hash::FxHashSet;
use tracing::{debug, info, trace, warn};

use super::collab::{
    CardChooser, FinishOrderSeating, GreedyChooser, NullRenderer, Renderer, SeatingPolicy,
    Snapshot,
};
use super::dealer::{DealPolicy, ShuffledDealer};
use super::phase::{Phase, Reaction};
use super::rules::{validate_choice, validate_tax_return, Table};
use super::tax::{AfterTax, TaxKind, TaxRoles};
use crate::cards::{Card, CardSet, Hand};
use crate::core::{PeerConfig, PeerId, PlayerOrder, Seat};
use crate::error::{ConfigError, RingError};
use crate::ring::{Link, Ring, StopSignal};
use crate::wire::Message;

/// Local choices asked for before falling back to the greedy default.
pub const MAX_CHOICE_ATTEMPTS: usize = 3;

/// Result of one finished round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundOutcome {
    pub round: u32,
    /// Seating the round was played in, after any Great Revolution.
    pub order: PlayerOrder,
    /// Peers in the order their hands emptied.
    pub finish_order: Vec<PeerId>,
    pub had_revolution: bool,
}

/// An envelope that matters in the current phase.
struct Incoming {
    reaction: Reaction,
    origin: PeerId,
    message: Message,
}

/// Configures a [`GamePeer`].
///
/// ```
/// use dalmuti_ring::core::{PeerConfig, PeerId};
/// use dalmuti_ring::game::{GamePeerBuilder, GreedyChooser};
/// use dalmuti_ring::ring::memory_ring;
///
/// let link = memory_ring(4).remove(0);
/// let peer = GamePeerBuilder::new(PeerConfig::new(PeerId::new(1), 4))
///     .with_chooser(GreedyChooser::new().with_revolt(true))
///     .build(link)
///     .unwrap();
/// assert!(peer.has_token());
/// ```
pub struct GamePeerBuilder {
    config: PeerConfig,
    chooser: Box<dyn CardChooser>,
    renderer: Box<dyn Renderer>,
    seating: Box<dyn SeatingPolicy>,
    dealer: Box<dyn DealPolicy>,
    stop: Option<StopSignal>,
}

impl GamePeerBuilder {
    /// Defaults: greedy chooser, no rendering, finish-order seating and a
    /// dealer shuffling with the configured seed.
    pub fn new(config: PeerConfig) -> Self {
        let dealer = ShuffledDealer::new(config.seed);
        Self {
            config,
            chooser: Box::new(GreedyChooser::new()),
            renderer: Box::new(NullRenderer),
            seating: Box::new(FinishOrderSeating),
            dealer: Box::new(dealer),
            stop: None,
        }
    }

    #[must_use]
    pub fn with_chooser(mut self, chooser: impl CardChooser + 'static) -> Self {
        self.chooser = Box::new(chooser);
        self
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    #[must_use]
    pub fn with_seating(mut self, seating: impl SeatingPolicy + 'static) -> Self {
        self.seating = Box::new(seating);
        self
    }

    /// Only consulted when this peer is the dealer.
    #[must_use]
    pub fn with_dealer(mut self, dealer: impl DealPolicy + 'static) -> Self {
        self.dealer = Box::new(dealer);
        self
    }

    #[must_use]
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Validate the config and join the ring over `link`.
    pub fn build<L: Link>(self, link: L) -> Result<GamePeer<L>, ConfigError> {
        self.config.validate()?;

        let mut ring = Ring::new(&self.config, link);
        if let Some(stop) = self.stop {
            ring = ring.with_stop_signal(stop);
        }

        Ok(GamePeer {
            order: PlayerOrder::identity(self.config.num_peers),
            config: self.config,
            ring,
            chooser: self.chooser,
            renderer: self.renderer,
            seating: self.seating,
            dealer: self.dealer,
            round: 0,
            phase: Phase::Setup,
            hand: Hand::new(),
            table: Table::new(),
            finish_order: Vector::new(),
            had_revolution: false,
            credited: FxHashSet::default(),
        })
    }
}

/// One ring member's game state and driver.
pub struct GamePeer<L> {
    config: PeerConfig,
    ring: Ring<L>,
    chooser: Box<dyn CardChooser>,
    renderer: Box<dyn Renderer>,
    seating: Box<dyn SeatingPolicy>,
    dealer: Box<dyn DealPolicy>,

    round: u32,
    phase: Phase,
    order: PlayerOrder,
    hand: Hand,
    table: Table,
    finish_order: Vector<PeerId>,
    had_revolution: bool,

    /// GIVE_CARDS already credited, by (round, origin).
    credited: FxHashSet<(u32, PeerId)>,
}

impl<L: Link> GamePeer<L> {
    // === Accessors ===

    #[must_use]
    pub fn id(&self) -> PeerId {
        self.config.id
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    #[must_use]
    pub fn order(&self) -> &PlayerOrder {
        &self.order
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn had_revolution(&self) -> bool {
        self.had_revolution
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.ring.has_token()
    }

    /// Current state, as handed to the renderer.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            peer: self.id(),
            round: self.round,
            phase: self.phase,
            hand: self.hand.cards().iter().copied().collect(),
            order: self.order.seats(),
            table: self.table.clone(),
            finish_order: self.finish_order.clone(),
            has_token: self.ring.has_token(),
            had_revolution: self.had_revolution,
        }
    }

    // === Driver ===

    /// Play every configured round.
    pub fn run(&mut self) -> Result<Vec<RoundOutcome>, RingError> {
        let rounds = self.config.rounds;
        let mut outcomes = Vec::with_capacity(rounds as usize);

        for round in 1..=rounds {
            let outcome = self.play_round(round)?;
            if round < rounds {
                self.order = self.seating.next_order(&outcome.finish_order);
                self.ring.reseat_token(self.config.dealer)?;
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Play one round, from the seating draw (first round) or the deal.
    pub fn play_round(&mut self, round: u32) -> Result<RoundOutcome, RingError> {
        self.round = round;
        let mut phase = if round == 1 { Phase::Setup } else { Phase::Deal };

        loop {
            self.enter(phase);
            match phase {
                Phase::Setup => self.setup()?,
                Phase::Deal => self.deal()?,
                Phase::RevolutionPoll => self.revolution_poll()?,
                Phase::TaxExchange => self.tax_exchange()?,
                Phase::Play => self.play()?,
                Phase::RoundComplete => return Ok(self.complete_round()),
            }
            phase = phase.after(self.had_revolution);
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        info!(peer = %self.id(), round = self.round, %phase, token = self.ring.has_token(), "entering phase");
        let snapshot = self.snapshot();
        self.renderer.render(&snapshot);
    }

    /// Wait for the next envelope the current phase cares about.
    ///
    /// Our own traffic coming back, kinds the phase ignores and payloads
    /// that do not parse are relayed and skipped.
    fn next_incoming(&mut self) -> Result<Incoming, RingError> {
        loop {
            let envelope = self.ring.receive_and_relay()?;
            if envelope.origin == self.id() {
                trace!(peer = %self.id(), kind = ?envelope.kind, "own envelope returned");
                continue;
            }
            let reaction = self.phase.react(envelope.kind);
            if reaction == Reaction::Ignore {
                trace!(peer = %self.id(), phase = %self.phase, kind = ?envelope.kind, "ignored");
                continue;
            }
            match envelope.message() {
                Ok(message) => {
                    return Ok(Incoming {
                        reaction,
                        origin: envelope.origin,
                        message,
                    })
                }
                Err(err) => {
                    warn!(
                        peer = %self.id(),
                        origin = %envelope.origin,
                        kind = ?envelope.kind,
                        error = %err,
                        "malformed payload"
                    );
                }
            }
        }
    }

    // === Setup ===

    fn setup(&mut self) -> Result<(), RingError> {
        if self.config.is_dealer() {
            let seating = self.dealer.seat(self.config.num_peers);
            self.ring.broadcast(&Message::Setup(seating.clone()))?;
            self.adopt_seating(&seating);
            return Ok(());
        }

        loop {
            let incoming = self.next_incoming()?;
            if let Message::Setup(seating) = incoming.message {
                if self.adopt_seating(&seating) {
                    return Ok(());
                }
            }
        }
    }

    fn adopt_seating(&mut self, seating: &[Seat]) -> bool {
        let n = self.config.num_peers;
        let mut seen = FxHashSet::default();
        let valid = seating.len() == n
            && seating
                .iter()
                .all(|seat| seat.peer.is_member(n) && seen.insert(seat.peer));
        if !valid {
            warn!(peer = %self.id(), ?seating, "seating is not a permutation of the ring");
            return false;
        }

        self.order = PlayerOrder::from_seating(seating);
        debug!(peer = %self.id(), order = ?self.order.seats(), "seating adopted");
        true
    }

    // === Deal ===

    fn reset_round(&mut self) {
        self.hand.clear();
        self.table.clear();
        self.finish_order.clear();
        self.had_revolution = false;
    }

    fn deal(&mut self) -> Result<(), RingError> {
        self.reset_round();

        if self.config.is_dealer() {
            let slices = self.dealer.deal(self.round, &self.order);
            self.ring.broadcast(&Message::Deal(slices.clone()))?;
            self.take_slice(&slices);
            return Ok(());
        }

        loop {
            let incoming = self.next_incoming()?;
            if let Message::Deal(slices) = incoming.message {
                if self.take_slice(&slices) {
                    return Ok(());
                }
            }
        }
    }

    fn take_slice(&mut self, slices: &[(PeerId, Vec<Card>)]) -> bool {
        let me = self.id();
        match slices.iter().find(|(peer, _)| *peer == me) {
            Some((_, cards)) => {
                self.hand = Hand::from_cards(cards.iter().copied());
                debug!(peer = %me, cards = self.hand.len(), "hand dealt");
                true
            }
            None => {
                warn!(peer = %me, "deal has no slice for this peer");
                false
            }
        }
    }

    // === Revolution poll ===

    fn revolution_poll(&mut self) -> Result<(), RingError> {
        let me = self.id();
        let n = self.config.num_peers;
        let last_poller = self.config.dealer.prev(n);
        let mut polled = false;

        loop {
            if self.ring.has_token() {
                if polled {
                    // Token came back: we are the Greater Dalmuti.
                    self.ring.broadcast(&Message::RoundReady)?;
                    return Ok(());
                }
                polled = true;
                self.offer_revolution()?;

                if me != last_poller {
                    self.ring.give_token(me.next(n))?;
                    continue;
                }
                self.ring.give_token(self.order.first())?;
                if self.ring.has_token() {
                    self.ring.broadcast(&Message::RoundReady)?;
                    return Ok(());
                }
                continue;
            }

            let incoming = self.next_incoming()?;
            match (incoming.reaction, incoming.message) {
                (Reaction::Advance, _) => return Ok(()),
                (_, Message::Revolution) => {
                    info!(peer = %me, by = %incoming.origin, "revolution");
                    self.had_revolution = true;
                }
                (_, Message::GreatRevolution) => {
                    info!(peer = %me, by = %incoming.origin, "great revolution");
                    self.order.reverse_once();
                    self.had_revolution = true;
                }
                _ => {}
            }
        }
    }

    fn offer_revolution(&mut self) -> Result<(), RingError> {
        if self.hand.wild_count() < 2 {
            return Ok(());
        }
        let great = self.id() == self.order.last();
        if !self.chooser.choose_revolution(&self.hand, great) {
            return Ok(());
        }

        if great {
            self.order.reverse_once();
            self.ring.broadcast(&Message::GreatRevolution)?;
        } else {
            self.ring.broadcast(&Message::Revolution)?;
        }
        info!(peer = %self.id(), great, "called a revolution");
        self.had_revolution = true;
        Ok(())
    }

    // === Tax exchange ===

    fn tax_exchange(&mut self) -> Result<(), RingError> {
        let Some(roles) = TaxRoles::from_order(&self.order) else {
            warn!(peer = %self.id(), "ring too small for tax roles");
            return Ok(());
        };
        self.ring.reseat_token(roles.lesser_peon)?;

        let me = self.id();
        let mut acted = false;
        loop {
            if self.ring.has_token() && !acted {
                if let Some(step) = roles.step_for(me) {
                    acted = true;
                    let chosen = match step.kind {
                        TaxKind::Tribute => self.hand.best(step.count),
                        TaxKind::Return => self.choose_tax_return(step.count),
                    };
                    let cards = self.withdraw(chosen);
                    debug!(peer = %me, to = %step.to, ?cards, role = ?step.role, "paying tax");
                    self.ring.broadcast(&Message::GiveCards {
                        target: step.to,
                        cards,
                    })?;

                    match step.then {
                        AfterTax::PassTo(next) => self.ring.give_token(next)?,
                        AfterTax::RoundReady => {
                            self.ring.broadcast(&Message::RoundReady)?;
                            return Ok(());
                        }
                    }
                    continue;
                }
            }

            let incoming = self.next_incoming()?;
            match (incoming.reaction, incoming.message) {
                (Reaction::Advance, _) => return Ok(()),
                (_, Message::GiveCards { target, cards }) => {
                    self.credit_cards(incoming.origin, target, &cards);
                }
                _ => {}
            }
        }
    }

    fn choose_tax_return(&mut self, count: usize) -> CardSet {
        for attempt in 1..=MAX_CHOICE_ATTEMPTS {
            let cards = self.chooser.choose_tax_return(&self.hand, count);
            match validate_tax_return(&self.hand, &cards, count) {
                Ok(()) => return cards,
                Err(err) => warn!(peer = %self.id(), attempt, error = %err, "invalid tax return"),
            }
        }
        self.hand.worst(count)
    }

    /// Take in tax cards addressed to us, at most once per sender per round.
    fn credit_cards(&mut self, origin: PeerId, target: PeerId, cards: &[Card]) -> bool {
        if target != self.id() {
            return false;
        }
        if !self.credited.insert((self.round, origin)) {
            debug!(peer = %self.id(), from = %origin, "tax already credited");
            return false;
        }
        self.hand.add_cards(cards.iter().copied());
        debug!(peer = %self.id(), from = %origin, ?cards, "tax received");
        true
    }

    // === Play ===

    fn is_finished(&self, peer: PeerId) -> bool {
        self.finish_order.contains(&peer)
    }

    fn play_complete(&self) -> bool {
        self.finish_order.len() >= self.config.num_peers
    }

    /// Append `peer` to the finish order. Once all but one have finished,
    /// the last one is appended too.
    fn record_finish(&mut self, peer: PeerId) {
        if self.is_finished(peer) {
            return;
        }
        self.finish_order.push_back(peer);
        info!(peer = %self.id(), finished = %peer, place = self.finish_order.len(), "hand emptied");

        if self.finish_order.len() + 1 == self.config.num_peers {
            let remaining = self.order.iter().find(|p| !self.finish_order.contains(p));
            if let Some(last) = remaining {
                self.finish_order.push_back(last);
            }
        }
    }

    /// Next peer to receive the token in PLAY: the next seat that can still
    /// play, or that owns the table and must close the trick.
    fn next_actor(&self) -> PeerId {
        let owner = self.table.owner();
        self.order
            .after(self.id())
            .find(|&p| !self.is_finished(p) || Some(p) == owner)
            .unwrap_or_else(|| self.id())
    }

    fn play(&mut self) -> Result<(), RingError> {
        loop {
            if self.play_complete() {
                return Ok(());
            }
            if self.ring.has_token() {
                self.take_turn()?;
                continue;
            }

            let incoming = self.next_incoming()?;
            match incoming.message {
                Message::PlayCards { owner, cards } => self.table.set(owner, cards),
                Message::RoundFinished => self.table.clear(),
                Message::HandEmpty => self.record_finish(incoming.origin),
                _ => {}
            }
        }
    }

    fn take_turn(&mut self) -> Result<(), RingError> {
        let me = self.id();

        if self.table.owner() == Some(me) {
            debug!(peer = %me, "trick won");
            self.ring.broadcast(&Message::RoundFinished)?;
            self.table.clear();
        }

        if !self.is_finished(me) {
            let chosen = self.choose_play();
            let cards = self.withdraw(chosen);
            if cards.is_empty() {
                debug!(peer = %me, "pass");
                self.ring.broadcast(&Message::Pass)?;
            } else {
                debug!(peer = %me, ?cards, "play");
                self.table.set(me, cards.clone());
                self.ring.broadcast(&Message::PlayCards { owner: me, cards })?;
            }

            if self.hand.is_empty() {
                self.ring.broadcast(&Message::HandEmpty)?;
                self.record_finish(me);
            }
        }

        if self.play_complete() {
            return Ok(());
        }
        let next = self.next_actor();
        self.ring.give_token(next)
    }

    /// Take `cards` out of the hand. Cards the hand does not hold are never
    /// sent: an empty set comes back instead and the hand is untouched.
    fn withdraw(&mut self, cards: CardSet) -> CardSet {
        if self.hand.remove_all(&cards) {
            cards
        } else {
            warn!(peer = %self.id(), ?cards, hand = ?self.hand.cards(), "cards not in hand");
            CardSet::new()
        }
    }

    fn choose_play(&mut self) -> CardSet {
        for attempt in 1..=MAX_CHOICE_ATTEMPTS {
            let cards = self.chooser.choose_cards(&self.hand, &self.table);
            match validate_choice(&self.hand, &self.table, &cards) {
                Ok(()) => return cards,
                Err(err) => warn!(peer = %self.id(), attempt, error = %err, "invalid play"),
            }
        }
        GreedyChooser::greedy_play(&self.hand, &self.table)
    }

    // === Round complete ===

    fn complete_round(&mut self) -> RoundOutcome {
        let outcome = RoundOutcome {
            round: self.round,
            order: self.order.clone(),
            finish_order: self.finish_order.iter().copied().collect(),
            had_revolution: self.had_revolution,
        };
        info!(
            peer = %self.id(),
            round = outcome.round,
            finish = ?outcome.finish_order,
            revolution = outcome.had_revolution,
            "round complete"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::{memory_ring, MemoryLink};

    fn peer(id: u8) -> GamePeer<MemoryLink> {
        let link = memory_ring(4).remove(0);
        GamePeerBuilder::new(PeerConfig::new(PeerId::new(id), 4))
            .build(link)
            .unwrap()
    }

    fn set(ranks: &[u8]) -> CardSet {
        ranks.iter().filter_map(|&r| Card::from_rank(r)).collect()
    }

    fn ids(raw: &[u8]) -> Vec<PeerId> {
        raw.iter().copied().map(PeerId::new).collect()
    }

    #[test]
    fn test_builder_rejects_bad_config() {
        let link = memory_ring(4).remove(0);
        let result = GamePeerBuilder::new(PeerConfig::new(PeerId::new(1), 3)).build(link);
        assert!(matches!(result, Err(ConfigError::PeerCount { got: 3, .. })));
    }

    #[test]
    fn test_give_cards_credited_once() {
        let mut p = peer(3);
        p.round = 1;
        p.hand = Hand::from_cards(set(&[1, 1, 6]));

        assert!(p.credit_cards(PeerId::new(2), PeerId::new(3), &set(&[2, 13])));
        assert!(!p.credit_cards(PeerId::new(2), PeerId::new(3), &set(&[2, 13])));
        assert_eq!(p.hand().cards(), set(&[1, 1, 2, 6, 13]).as_slice());

        // Next round the same sender may pay again.
        p.round = 2;
        assert!(p.credit_cards(PeerId::new(2), PeerId::new(3), &set(&[4])));
        assert_eq!(p.hand().len(), 6);
    }

    #[test]
    fn test_give_cards_for_others_ignored() {
        let mut p = peer(1);
        p.round = 1;
        assert!(!p.credit_cards(PeerId::new(2), PeerId::new(3), &set(&[2, 13])));
        assert!(p.hand().is_empty());
    }

    #[test]
    fn test_withdraw_only_held_cards() {
        let mut p = peer(2);
        p.hand = Hand::from_cards(set(&[1, 6, 6]));

        assert!(p.withdraw(set(&[2])).is_empty());
        assert!(p.withdraw(set(&[6, 6, 6])).is_empty());
        assert_eq!(p.hand().cards(), set(&[1, 6, 6]).as_slice());

        assert_eq!(p.withdraw(set(&[6, 1])), set(&[6, 1]));
        assert_eq!(p.hand().cards(), set(&[6]).as_slice());
        assert!(p.withdraw(CardSet::new()).is_empty());
    }

    #[test]
    fn test_last_finisher_appended() {
        let mut p = peer(1);
        p.order = PlayerOrder::new(ids(&[3, 1, 4, 2]));
        p.record_finish(PeerId::new(4));
        p.record_finish(PeerId::new(4));
        p.record_finish(PeerId::new(1));
        assert!(!p.play_complete());

        p.record_finish(PeerId::new(2));
        assert!(p.play_complete());
        assert_eq!(p.finish_order.iter().copied().collect::<Vec<_>>(), ids(&[4, 1, 2, 3]));
    }

    #[test]
    fn test_next_actor_skips_finished() {
        let mut p = peer(3);
        p.order = PlayerOrder::new(ids(&[3, 1, 4, 2]));
        p.finish_order.push_back(PeerId::new(1));
        assert_eq!(p.next_actor(), PeerId::new(4));

        p.finish_order.push_back(PeerId::new(4));
        assert_eq!(p.next_actor(), PeerId::new(2));
    }

    #[test]
    fn test_next_actor_returns_to_finished_owner() {
        let mut p = peer(2);
        p.order = PlayerOrder::new(ids(&[3, 1, 4, 2]));
        p.finish_order.push_back(PeerId::new(3));
        p.table.set(PeerId::new(3), set(&[1]));
        assert_eq!(p.next_actor(), PeerId::new(3));

        p.table.clear();
        assert_eq!(p.next_actor(), PeerId::new(1));
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut p = peer(2);
        p.hand = Hand::from_cards(set(&[7, 2]));
        let snap = p.snapshot();
        assert_eq!(snap.peer, PeerId::new(2));
        assert_eq!(snap.hand.iter().map(|c| c.rank()).collect::<Vec<_>>(), vec![2, 7]);
        assert!(!snap.has_token);
        assert_eq!(snap.phase, Phase::Setup);
    }
}
