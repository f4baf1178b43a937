//! Events emitted on every state transition, for external indexers

use crate::games::roll::GameType;
use crate::games::types::{hex_bytes, Identity, SeedHash};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CasinoEvent {
    RollNewBet {
        #[serde(with = "hex_bytes")]
        seed_hash: SeedHash,
        game_type: GameType,
        bettor: Identity,
        amount: u64,
        mask: u64,
        threshold: u64,
        referrer: Option<Identity>,
    },
    RollHandleBet {
        #[serde(with = "hex_bytes")]
        seed_hash: SeedHash,
        game_type: GameType,
        bettor: Identity,
        amount: u64,
        roll: u64,
        #[serde(with = "hex_bytes")]
        hidden_seed: [u8; 32],
        #[serde(with = "hex_bytes")]
        public_seed: [u8; 32],
        multiplier_num: u64,
        multiplier_den: u64,
        winnings: u64,
    },
    RollRefundBet {
        #[serde(with = "hex_bytes")]
        seed_hash: SeedHash,
        game_type: GameType,
        bettor: Identity,
        amount: u64,
    },
    SlotNewBet {
        #[serde(with = "hex_bytes")]
        seed_hash: SeedHash,
        bettor: Identity,
        amount: u64,
        referrer: Option<Identity>,
    },
    SlotHandleBet {
        #[serde(with = "hex_bytes")]
        seed_hash: SeedHash,
        bettor: Identity,
        amount: u64,
        symbols: String,
        #[serde(with = "hex_bytes")]
        hidden_seed: [u8; 32],
        #[serde(with = "hex_bytes")]
        public_seed: [u8; 32],
        multiplier_num: u64,
        multiplier_den: u64,
        winnings: u64,
    },
    SlotRefundBet {
        #[serde(with = "hex_bytes")]
        seed_hash: SeedHash,
        bettor: Identity,
        amount: u64,
    },
    Jackpot {
        beneficiary: Identity,
        amount: u64,
        #[serde(with = "hex_bytes")]
        hidden_seed: [u8; 32],
        #[serde(with = "hex_bytes")]
        public_seed: [u8; 32],
        jackpot_magic: u64,
    },
    Payment {
        beneficiary: Identity,
        amount: u64,
        tag: String,
    },
    FailedPayment {
        beneficiary: Identity,
        amount: u64,
        tag: String,
    },
}

impl CasinoEvent {
    /// Snake-case event name, as it appears in the serialized tag
    pub fn name(&self) -> &'static str {
        match self {
            CasinoEvent::RollNewBet { .. } => "roll_new_bet",
            CasinoEvent::RollHandleBet { .. } => "roll_handle_bet",
            CasinoEvent::RollRefundBet { .. } => "roll_refund_bet",
            CasinoEvent::SlotNewBet { .. } => "slot_new_bet",
            CasinoEvent::SlotHandleBet { .. } => "slot_handle_bet",
            CasinoEvent::SlotRefundBet { .. } => "slot_refund_bet",
            CasinoEvent::Jackpot { .. } => "jackpot",
            CasinoEvent::Payment { .. } => "payment",
            CasinoEvent::FailedPayment { .. } => "failed_payment",
        }
    }
}

/// Append-only record of emitted events
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<CasinoEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: CasinoEvent) {
        tracing::trace!(event = event.name(), "Event emitted");
        self.events.push(event);
    }

    pub fn events(&self) -> &[CasinoEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&CasinoEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Hand all buffered events to the caller
    pub fn drain(&mut self) -> Vec<CasinoEvent> {
        std::mem::take(&mut self.events)
    }
}
