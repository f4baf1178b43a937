//! fairwager - provably-fair wagering engine
//!
//! The operator commits to a hidden seed before a bet exists; the ledger
//! supplies a public seed after placement. Outcomes of the roll and slot games
//! are derived from both, so neither side can steer them and anyone can audit
//! a settled bet from its revealed seeds.

pub mod access;
pub mod casino;
pub mod commitment;
pub mod config;
pub mod errors;
pub mod events;
pub mod games;
pub mod jackpot;
pub mod ledger;
pub mod logging;
pub mod payment;
pub mod rng;
pub mod service;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use access::{AccessControl, OwnerAccess};
pub use casino::{Casino, PoolSnapshot, PoolState, RefundReceipt, RollSettlement, SlotSettlement};
pub use commitment::{Commitment, CommitmentSigner, CommitmentVerifier, Ed25519Verifier};
pub use config::{CasinoConfig, ConfigLoader};
pub use errors::{CasinoError, CasinoResult};
pub use events::CasinoEvent;
pub use games::{GameKind, GameType, Identity, Multiplier, RollSpec, SlotMachine};
pub use jackpot::JackpotLottery;
pub use ledger::{InMemoryLedger, Ledger};
pub use service::CasinoService;
