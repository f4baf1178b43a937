//! Ledger collaborator
//!
//! The engine only needs a monotonically increasing position, the public seed
//! recorded at recent positions, and custody of the pooled balance. An
//! in-memory ledger is provided for simulations and tests.

use crate::games::types::Identity;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

/// Positions whose public seed can still be attested
pub const DEFAULT_LOOKBACK_WINDOW: u64 = 256;

const BLOCK_DOMAIN: &[u8] = b"FAIRWAGER_BLOCK_V1";

/// Transfer failures reported by the ledger
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },

    #[error("Beneficiary {0} rejected the transfer")]
    Rejected(Identity),
}

/// What the engine consumes from the ledger
pub trait Ledger: Send {
    /// Position currently being built; bets placed now anchor here
    fn current_position(&self) -> u64;

    /// How many past positions can still be attested
    fn lookback_window(&self) -> u64;

    /// Public seed sealed at `position`, if it can still be attested
    fn public_seed_at(&self, position: u64) -> Option<[u8; 32]>;

    /// Funds held in custody by the engine
    fn balance(&self) -> u64;

    /// Credit value attached to a call by `from`
    fn deposit(&mut self, from: &Identity, amount: u64);

    /// Move custody funds to `to`
    fn transfer(&mut self, to: &Identity, amount: u64) -> Result<(), TransferError>;
}

/// Hash-chained in-memory ledger
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    genesis: [u8; 32],
    block_hashes: Vec<[u8; 32]>,
    lookback_window: u64,
    balance: u64,
    accounts: HashMap<Identity, u64>,
    rejecting: HashSet<Identity>,
}

impl InMemoryLedger {
    pub fn new(genesis: [u8; 32], lookback_window: u64) -> Self {
        Self {
            genesis,
            block_hashes: Vec::new(),
            lookback_window,
            balance: 0,
            accounts: HashMap::new(),
            rejecting: HashSet::new(),
        }
    }

    /// Seal the current position and open the next one
    pub fn seal(&mut self) -> [u8; 32] {
        let position = self.block_hashes.len() as u64;
        let previous = self.block_hashes.last().copied().unwrap_or(self.genesis);

        let mut hasher = Sha256::new();
        hasher.update(BLOCK_DOMAIN);
        hasher.update(previous);
        hasher.update(position.to_be_bytes());
        let hash: [u8; 32] = hasher.finalize().into();

        self.block_hashes.push(hash);
        hash
    }

    /// Seal `positions` positions in a row
    pub fn advance(&mut self, positions: u64) {
        for _ in 0..positions {
            self.seal();
        }
    }

    /// Add house bankroll
    pub fn fund(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Total received by `identity` through transfers
    pub fn account_balance(&self, identity: &Identity) -> u64 {
        self.accounts.get(identity).copied().unwrap_or(0)
    }

    /// Make every transfer to `identity` fail
    pub fn reject_transfers_to(&mut self, identity: Identity) {
        self.rejecting.insert(identity);
    }

    /// Sealed hash at `position` regardless of the lookback window
    pub fn block_hash(&self, position: u64) -> Option<[u8; 32]> {
        self.block_hashes.get(position as usize).copied()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new([0u8; 32], DEFAULT_LOOKBACK_WINDOW)
    }
}

impl Ledger for InMemoryLedger {
    fn current_position(&self) -> u64 {
        self.block_hashes.len() as u64
    }

    fn lookback_window(&self) -> u64 {
        self.lookback_window
    }

    fn public_seed_at(&self, position: u64) -> Option<[u8; 32]> {
        let current = self.current_position();
        if position >= current || current - position > self.lookback_window {
            return None;
        }
        self.block_hash(position)
    }

    fn balance(&self) -> u64 {
        self.balance
    }

    fn deposit(&mut self, from: &Identity, amount: u64) {
        tracing::trace!(from = %from, amount, "Deposit");
        self.balance = self.balance.saturating_add(amount);
    }

    fn transfer(&mut self, to: &Identity, amount: u64) -> Result<(), TransferError> {
        if self.rejecting.contains(to) {
            return Err(TransferError::Rejected(*to));
        }
        if amount > self.balance {
            return Err(TransferError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        *self.accounts.entry(*to).or_insert(0) += amount;
        Ok(())
    }
}
