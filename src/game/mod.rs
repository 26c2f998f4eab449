//! Game phase state machine.
//!
//! ## Key Types
//!
//! - `Phase`: Setup, Deal, RevolutionPoll, TaxExchange, Play, RoundComplete
//! - `GamePeer`: Drives one peer through every phase over a `Ring`
//! - `Table`: The standing trick; legality lives in `rules`
//! - `TaxRoles`: The four seats of the tax exchange
//! - `CardChooser`, `Renderer`, `SeatingPolicy`, `DealPolicy`: Collaborators

pub mod collab;
pub mod dealer;
pub mod peer;
pub mod phase;
pub mod rules;
pub mod tax;

pub use collab::{
    CardChooser, FinishOrderSeating, GreedyChooser, NullRenderer, Renderer, SeatingPolicy,
    Snapshot, TracingRenderer,
};
pub use dealer::{DealPolicy, ShuffledDealer};
pub use peer::{GamePeer, GamePeerBuilder, RoundOutcome, MAX_CHOICE_ATTEMPTS};
pub use phase::{Phase, Reaction};
pub use rules::{check_play, effective_rank, is_legal_play, validate_choice, Table};
pub use tax::{AfterTax, TaxKind, TaxRole, TaxRoles, TaxStep};
