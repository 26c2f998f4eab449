//! Dealer-side card handling: the seating draw and the per-round deal.

use crate::cards::{Card, Deck};
use crate::core::{GameRng, PeerId, PlayerOrder, Seat};

/// How the dealer seats the first round and deals every round.
pub trait DealPolicy: Send {
    /// One card per peer, best first. Card `i` of the draw belongs to peer
    /// `i + 1`; ties keep id order.
    fn seat(&mut self, num_peers: usize) -> Vec<Seat>;

    /// Every peer's hand for `round`, listed in `order`.
    fn deal(&mut self, round: u32, order: &PlayerOrder) -> Vec<(PeerId, Vec<Card>)>;
}

/// Deals from a freshly shuffled full deck each time.
#[derive(Clone, Debug)]
pub struct ShuffledDealer {
    rng: GameRng,
}

impl ShuffledDealer {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: GameRng::new(seed),
        }
    }

    fn shuffled(&self, context: &str) -> Deck {
        let mut deck = Deck::new();
        deck.shuffle(&mut self.rng.for_context(context));
        deck
    }
}

impl DealPolicy for ShuffledDealer {
    fn seat(&mut self, num_peers: usize) -> Vec<Seat> {
        let drawn = self.shuffled("setup").draw_many(num_peers);
        let mut seating: Vec<Seat> = PeerId::all(num_peers)
            .zip(drawn)
            .map(|(peer, card)| Seat {
                peer,
                rank: card.rank(),
            })
            .collect();
        seating.sort_by_key(|seat| seat.rank);
        seating
    }

    fn deal(&mut self, round: u32, order: &PlayerOrder) -> Vec<(PeerId, Vec<Card>)> {
        let cards = self.shuffled(&format!("deal-{round}")).into_cards();
        deal_round_robin(cards, order)
    }
}

/// Deal `cards` one at a time around `order`, starting with its first seat.
///
/// ```
/// use dalmuti_ring::cards::Card;
/// use dalmuti_ring::core::{PeerId, PlayerOrder};
/// use dalmuti_ring::game::dealer::deal_round_robin;
///
/// let order = PlayerOrder::new([2, 1].map(PeerId::new));
/// let hands = deal_round_robin(vec![Card::Cook, Card::Dalmuti, Card::Mason], &order);
/// assert_eq!(hands[0], (PeerId::new(2), vec![Card::Mason, Card::Cook]));
/// assert_eq!(hands[1], (PeerId::new(1), vec![Card::Dalmuti]));
/// ```
#[must_use]
pub fn deal_round_robin(cards: Vec<Card>, order: &PlayerOrder) -> Vec<(PeerId, Vec<Card>)> {
    let mut hands: Vec<(PeerId, Vec<Card>)> = order.iter().map(|peer| (peer, Vec::new())).collect();
    let seats = hands.len();
    for (i, card) in cards.into_iter().enumerate() {
        hands[i % seats].1.push(card);
    }
    for (_, hand) in &mut hands {
        hand.sort_unstable();
    }
    hands
}
