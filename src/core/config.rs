//! Ring configuration.
//!
//! One JSON file describes the whole ring; each process picks its own
//! entry by id:
//!
//! ```json
//! {
//!   "num_peers": 4,
//!   "dealer": 1,
//!   "peers": [
//!     { "id": 1, "listen": "127.0.0.1:9001", "next": "127.0.0.1:9002" },
//!     { "id": 2, "listen": "127.0.0.1:9002", "next": "127.0.0.1:9003" },
//!     { "id": 3, "listen": "127.0.0.1:9003", "next": "127.0.0.1:9004" },
//!     { "id": 4, "listen": "127.0.0.1:9004", "next": "127.0.0.1:9001" }
//!   ]
//! }
//! ```
//!
//! `dealer`, `rounds`, `seed` and `timing` are optional.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::PeerId;
use crate::error::ConfigError;

/// Smallest ring that has four distinct tax roles.
pub const MIN_PEERS: usize = 4;

/// Largest ring the receipt bitmask can describe.
pub const MAX_PEERS: usize = 32;

/// Receive timeout and resend policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How long a single blocking receive waits before giving up.
    /// Receives are retried indefinitely; this only bounds one attempt.
    pub recv_timeout_ms: u64,

    /// Empty receive attempts a broadcast tolerates before resending.
    pub retry_budget: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            recv_timeout_ms: 1000,
            retry_budget: 5,
        }
    }
}

impl TimingConfig {
    /// Per-attempt receive timeout.
    #[must_use]
    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms)
    }

    /// Set the per-attempt receive timeout.
    #[must_use]
    pub fn with_recv_timeout_ms(mut self, ms: u64) -> Self {
        self.recv_timeout_ms = ms;
        self
    }

    /// Set the resend budget.
    #[must_use]
    pub fn with_retry_budget(mut self, budget: u32) -> Self {
        self.retry_budget = budget;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.recv_timeout_ms == 0 {
            return Err(ConfigError::Zero("recv_timeout_ms"));
        }
        if self.retry_budget == 0 {
            return Err(ConfigError::Zero("retry_budget"));
        }
        Ok(())
    }
}

/// Everything one peer needs to know about the game it takes part in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConfig {
    /// This peer.
    pub id: PeerId,

    /// Ring size.
    pub num_peers: usize,

    /// Peer that shuffles, seats and deals. Starts with the token.
    pub dealer: PeerId,

    /// Rounds to play before stopping.
    pub rounds: u32,

    /// Dealer's shuffle seed.
    pub seed: u64,

    pub timing: TimingConfig,
}

impl PeerConfig {
    /// Create a config with defaults for everything but identity and size.
    pub fn new(id: PeerId, num_peers: usize) -> Self {
        Self {
            id,
            num_peers,
            dealer: PeerId::new(1),
            rounds: 1,
            seed: 0,
            timing: TimingConfig::default(),
        }
    }

    #[must_use]
    pub fn with_dealer(mut self, dealer: PeerId) -> Self {
        self.dealer = dealer;
        self
    }

    #[must_use]
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Whether this peer deals.
    #[must_use]
    pub fn is_dealer(&self) -> bool {
        self.id == self.dealer
    }

    /// Check ring size, membership and timing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PEERS..=MAX_PEERS).contains(&self.num_peers) {
            return Err(ConfigError::PeerCount {
                min: MIN_PEERS,
                max: MAX_PEERS,
                got: self.num_peers,
            });
        }
        if !self.id.is_member(self.num_peers) {
            return Err(ConfigError::UnknownPeer(self.id));
        }
        if !self.dealer.is_member(self.num_peers) {
            return Err(ConfigError::UnknownPeer(self.dealer));
        }
        if self.rounds == 0 {
            return Err(ConfigError::Zero("rounds"));
        }
        self.timing.validate()
    }
}

/// Network endpoints of one ring member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerAddress {
    pub id: PeerId,
    /// Where this peer receives from its previous neighbour.
    pub listen: SocketAddr,
    /// Where this peer sends to reach its next neighbour.
    pub next: SocketAddr,
}

/// The ring file shared by all peers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RingConfig {
    pub num_peers: usize,

    #[serde(default = "default_dealer")]
    pub dealer: PeerId,

    #[serde(default = "default_rounds")]
    pub rounds: u32,

    #[serde(default)]
    pub seed: u64,

    #[serde(default)]
    pub timing: TimingConfig,

    pub peers: Vec<PeerAddress>,
}

fn default_dealer() -> PeerId {
    PeerId::new(1)
}

fn default_rounds() -> u32 {
    1
}

impl RingConfig {
    /// Parse a ring file from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: RingConfig = serde_json::from_str(text)?;
        if config.peers.len() != config.num_peers {
            return Err(ConfigError::PeerList {
                listed: config.peers.len(),
                expected: config.num_peers,
            });
        }
        Ok(config)
    }

    /// Read and parse a ring file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Extract one peer's view of the ring.
    pub fn peer(&self, id: PeerId) -> Result<(PeerConfig, PeerAddress), ConfigError> {
        let address = self
            .peers
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(ConfigError::UnknownPeer(id))?;

        let config = PeerConfig::new(id, self.num_peers)
            .with_dealer(self.dealer)
            .with_rounds(self.rounds)
            .with_seed(self.seed)
            .with_timing(self.timing);
        config.validate()?;

        Ok((config, address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RING: &str = r#"{
        "num_peers": 4,
        "seed": 9,
        "timing": { "recv_timeout_ms": 250 },
        "peers": [
            { "id": 1, "listen": "127.0.0.1:9001", "next": "127.0.0.1:9002" },
            { "id": 2, "listen": "127.0.0.1:9002", "next": "127.0.0.1:9003" },
            { "id": 3, "listen": "127.0.0.1:9003", "next": "127.0.0.1:9004" },
            { "id": 4, "listen": "127.0.0.1:9004", "next": "127.0.0.1:9001" }
        ]
    }"#;

    #[test]
    fn test_default_timing() {
        let timing = TimingConfig::default();
        assert_eq!(timing.recv_timeout(), Duration::from_secs(1));
        assert_eq!(timing.retry_budget, 5);
    }

    #[test]
    fn test_ring_file_defaults() {
        let ring = RingConfig::from_json(RING).unwrap();
        assert_eq!(ring.dealer, PeerId::new(1));
        assert_eq!(ring.rounds, 1);
        assert_eq!(ring.seed, 9);
        assert_eq!(ring.timing.recv_timeout_ms, 250);
        assert_eq!(ring.timing.retry_budget, 5);
    }

    #[test]
    fn test_peer_view() {
        let ring = RingConfig::from_json(RING).unwrap();
        let (config, address) = ring.peer(PeerId::new(4)).unwrap();

        assert_eq!(config.id, PeerId::new(4));
        assert_eq!(config.num_peers, 4);
        assert!(!config.is_dealer());
        assert_eq!(address.next, "127.0.0.1:9001".parse().unwrap());
    }

    #[test]
    fn test_unknown_peer() {
        let ring = RingConfig::from_json(RING).unwrap();
        assert!(matches!(
            ring.peer(PeerId::new(7)),
            Err(ConfigError::UnknownPeer(p)) if p == PeerId::new(7)
        ));
    }

    #[test]
    fn test_peer_list_must_match_size() {
        let text = RING.replace("\"num_peers\": 4", "\"num_peers\": 5");
        assert!(matches!(
            RingConfig::from_json(&text),
            Err(ConfigError::PeerList { listed: 4, expected: 5 })
        ));
    }

    #[test]
    fn test_validate_ring_size() {
        let small = PeerConfig::new(PeerId::new(1), 3);
        assert!(matches!(small.validate(), Err(ConfigError::PeerCount { got: 3, .. })));

        let ok = PeerConfig::new(PeerId::new(1), 4);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timing() {
        let config = PeerConfig::new(PeerId::new(1), 4)
            .with_timing(TimingConfig::default().with_retry_budget(0));
        assert!(matches!(config.validate(), Err(ConfigError::Zero("retry_budget"))));
    }

    #[test]
    fn test_builder_pattern() {
        let config = PeerConfig::new(PeerId::new(2), 5)
            .with_dealer(PeerId::new(2))
            .with_rounds(3)
            .with_seed(77);

        assert!(config.is_dealer());
        assert_eq!(config.rounds, 3);
        assert_eq!(config.seed, 77);
    }

    #[test]
    fn test_serialization() {
        let config = PeerConfig::new(PeerId::new(2), 5).with_seed(11);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PeerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
