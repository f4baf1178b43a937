//! Test fixtures shared by unit tests, integration tests and benchmarks
//!
//! Everything here is deterministic: hidden seeds come from a counter and
//! the ledger chain from a zero genesis, so outcomes can be recomputed
//! off-line.

use crate::access::OwnerAccess;
use crate::casino::{Casino, RollSettlement, SlotSettlement};
use crate::commitment::{Commitment, CommitmentSigner};
use crate::config::CasinoConfig;
use crate::errors::{BetError, CasinoResult};
use crate::games::roll::RollSpec;
use crate::games::types::{GameKind, Identity, SeedHash};
use crate::jackpot::JackpotLottery;
use crate::ledger::{InMemoryLedger, Ledger};
use sha2::{Digest, Sha256};

const SEED_DOMAIN: &[u8] = b"fairwager-test-seed";

/// Commitments issued by the harness stay valid this many positions
pub const COMMITMENT_TTL: u64 = 100;

/// Deterministic hidden seed number `n`
pub fn hidden_seed(n: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(SEED_DOMAIN);
    hasher.update(n.to_be_bytes());
    hasher.finalize().into()
}

/// An engine wired to an in-memory ledger, an owner, a player and two signers
pub struct TestHarness {
    pub casino: Casino<InMemoryLedger>,
    pub owner: Identity,
    pub player: Identity,
    pub roll_signer: CommitmentSigner,
    pub slot_signer: CommitmentSigner,
    next_seed: u64,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Default configuration with both signers installed
    pub fn new() -> Self {
        Self::with_config(&CasinoConfig::default())
    }

    /// Custom configuration with both signers installed
    pub fn with_config(config: &CasinoConfig) -> Self {
        let mut harness = Self::build(config);
        let owner = harness.owner;
        let roll_key = harness.roll_signer.verifying_key().to_bytes();
        let slot_key = harness.slot_signer.verifying_key().to_bytes();
        harness
            .casino
            .set_signer(&owner, GameKind::Roll, &roll_key)
            .expect("roll signer rejected");
        harness
            .casino
            .set_signer(&owner, GameKind::Slot, &slot_key)
            .expect("slot signer rejected");
        harness
    }

    /// Default configuration without any signer
    pub fn unsigned() -> Self {
        Self::build(&CasinoConfig::default())
    }

    fn build(config: &CasinoConfig) -> Self {
        let owner = Identity::from_label("owner");
        let ledger = InMemoryLedger::new([0u8; 32], config.ledger.lookback_window);
        let casino = Casino::new(config, ledger, Box::new(OwnerAccess::new(owner)))
            .expect("test configuration rejected");

        Self {
            casino,
            owner,
            player: Identity::from_label("player"),
            roll_signer: CommitmentSigner::from_secret(&[0x11; 32]),
            slot_signer: CommitmentSigner::from_secret(&[0x22; 32]),
            next_seed: 0,
        }
    }

    /// Swap in a lottery with arbitrary odds
    pub fn with_jackpot_lottery(mut self, lottery: JackpotLottery) -> Self {
        self.casino = self.casino.with_jackpot_lottery(lottery);
        self
    }

    pub fn next_hidden_seed(&mut self) -> [u8; 32] {
        let seed = hidden_seed(self.next_seed);
        self.next_seed += 1;
        seed
    }

    /// Commitment for `hidden` valid for [`COMMITMENT_TTL`] positions
    pub fn commit(&self, game: GameKind, hidden: &[u8; 32]) -> Commitment {
        let expiry = self.casino.ledger().current_position() + COMMITMENT_TTL;
        match game {
            GameKind::Roll => self.roll_signer.commit(hidden, expiry),
            GameKind::Slot => self.slot_signer.commit(hidden, expiry),
        }
    }

    /// Place a roll bet for the player with a fresh seed
    pub fn place_roll(&mut self, spec: RollSpec, amount: u64) -> CasinoResult<([u8; 32], SeedHash)> {
        let hidden = self.next_hidden_seed();
        let commitment = self.commit(GameKind::Roll, &hidden);
        let player = self.player;
        self.casino.place_roll_bet(&player, amount, spec, &commitment, None)?;
        Ok((hidden, commitment.seed_hash))
    }

    /// Place a slot bet for the player with a fresh seed
    pub fn place_slot(&mut self, amount: u64) -> CasinoResult<([u8; 32], SeedHash)> {
        let hidden = self.next_hidden_seed();
        let commitment = self.commit(GameKind::Slot, &hidden);
        let player = self.player;
        self.casino.place_slot_bet(&player, amount, &commitment, None)?;
        Ok((hidden, commitment.seed_hash))
    }

    /// Hash sealed at `position`, whether or not it is still attestable
    pub fn public_seed(&self, position: u64) -> [u8; 32] {
        self.casino.ledger().block_hash(position).unwrap_or([0u8; 32])
    }

    /// Handle a roll bet as the owner, using the seed sealed at its anchor
    pub fn handle_roll(&mut self, hidden: &[u8; 32]) -> CasinoResult<RollSettlement> {
        let key = crate::games::types::seed_hash(hidden);
        let anchor = self
            .casino
            .roll_bet(&key)
            .map(|bet| bet.anchor_position)
            .ok_or(BetError::BetNotFound)?;
        let public = self.public_seed(anchor);
        let owner = self.owner;
        self.casino.handle_roll_bet(&owner, hidden, &public)
    }

    /// Handle a slot bet as the owner, using the seed sealed at its anchor
    pub fn handle_slot(&mut self, hidden: &[u8; 32]) -> CasinoResult<SlotSettlement> {
        let key = crate::games::types::seed_hash(hidden);
        let anchor = self
            .casino
            .slot_bet(&key)
            .map(|bet| bet.anchor_position)
            .ok_or(BetError::BetNotFound)?;
        let public = self.public_seed(anchor);
        let owner = self.owner;
        self.casino.handle_slot_bet(&owner, hidden, &public)
    }

    /// Seal positions until refunds open for a bet anchored at `anchor`
    pub fn expire_window(&mut self, anchor: u64) {
        let window = self.casino.ledger().lookback_window();
        let current = self.casino.ledger().current_position();
        let target = anchor + window + 1;
        if current < target {
            self.casino.ledger_mut().advance(target - current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_installs_both_signers() {
        let harness = TestHarness::new();
        assert_eq!(
            harness.casino.signer_key(GameKind::Roll),
            Some(harness.roll_signer.verifying_key().to_bytes())
        );
        assert_eq!(
            harness.casino.signer_key(GameKind::Slot),
            Some(harness.slot_signer.verifying_key().to_bytes())
        );

        let unsigned = TestHarness::unsigned();
        assert_eq!(unsigned.casino.signer_key(GameKind::Roll), None);
        assert_eq!(unsigned.casino.signer_key(GameKind::Slot), None);
    }

    #[test]
    fn test_hidden_seeds_are_distinct() {
        let mut harness = TestHarness::new();
        let first = harness.next_hidden_seed();
        let second = harness.next_hidden_seed();
        assert_eq!(first, hidden_seed(0));
        assert_ne!(first, second);
    }
}
