//! Bet ledger and fund custody
//!
//! [`Casino`] owns the pool state and both bet books. Every operation runs to
//! completion on `&mut self`; callers that are not already serialised by a
//! ledger should go through [`crate::service::CasinoService`].

mod bets;
mod pool;
mod wagers;

pub use bets::{BetBook, RollBet, SlotBet};
pub use pool::PoolState;
pub use wagers::{RefundReceipt, RollSettlement, SlotSettlement};

use crate::access::AccessControl;
use crate::commitment::{self, Commitment, CommitmentVerifier, Ed25519Verifier};
use crate::config::{self, CasinoConfig};
use crate::errors::{BetError, CasinoError, CasinoResult, ConfigurationError, FundsError};
use crate::events::{CasinoEvent, EventLog};
use crate::games::slot::SlotMachine;
use crate::games::types::{GameKind, Identity, PayoutSchedule, SeedHash};
use crate::jackpot::JackpotLottery;
use crate::ledger::Ledger;
use crate::payment::{PaymentDispatcher, PaymentStatus, TAG_WITHDRAW};
use serde::Serialize;

/// Economics and stake limits of one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameSettings {
    pub schedule: PayoutSchedule,
    pub min_bet: u64,
    pub max_bet: u64,
    pub min_bet_floor: u64,
}

impl GameSettings {
    fn check_amount(&self, amount: u64) -> Result<(), BetError> {
        if amount < self.min_bet || amount > self.max_bet {
            return Err(BetError::InvalidAmount {
                amount,
                min: self.min_bet,
                max: self.max_bet,
            });
        }
        Ok(())
    }
}

/// Point-in-time view of the custody state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub balance: u64,
    /// What a jackpot hit would pay: bettor share plus operator top-ups
    pub jackpot_pool: u64,
    pub bettor_jackpot: u64,
    pub extra_jackpot: u64,
    pub locked_in_bets: u64,
    pub free_funds: u64,
    pub open_roll_bets: usize,
    pub open_slot_bets: usize,
}

/// The wagering engine
pub struct Casino<L: Ledger> {
    ledger: L,
    access: Box<dyn AccessControl>,
    roll: GameSettings,
    slot: GameSettings,
    machine: SlotMachine,
    lottery: JackpotLottery,
    pool: PoolState,
    roll_bets: BetBook<RollBet>,
    slot_bets: BetBook<SlotBet>,
    roll_signer: Option<Box<dyn CommitmentVerifier>>,
    slot_signer: Option<Box<dyn CommitmentVerifier>>,
    events: EventLog,
}

impl<L: Ledger> Casino<L> {
    /// Build an engine from a validated configuration
    pub fn new(config: &CasinoConfig, ledger: L, access: Box<dyn AccessControl>) -> CasinoResult<Self> {
        config.validate()?;

        Ok(Self {
            ledger,
            access,
            roll: GameSettings {
                schedule: config.roll.schedule(),
                min_bet: config.roll.min_bet,
                max_bet: config.roll.max_bet,
                min_bet_floor: config.roll.min_bet_floor(),
            },
            slot: GameSettings {
                schedule: config.slot.schedule(),
                min_bet: config.slot.min_bet,
                max_bet: config.slot.max_bet,
                min_bet_floor: config.slot.min_bet_floor(),
            },
            machine: config.slot.machine()?,
            lottery: JackpotLottery::new(config.jackpot.magic)?,
            pool: PoolState::default(),
            roll_bets: BetBook::default(),
            slot_bets: BetBook::default(),
            roll_signer: None,
            slot_signer: None,
            events: EventLog::new(),
        })
    }

    /// Replace the jackpot lottery, bypassing the magic band
    pub fn with_jackpot_lottery(mut self, lottery: JackpotLottery) -> Self {
        self.lottery = lottery;
        self
    }

    // Queries

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn pool(&self) -> &PoolState {
        &self.pool
    }

    pub fn free_funds(&self) -> u64 {
        self.pool.free_funds(self.ledger.balance())
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            balance: self.ledger.balance(),
            jackpot_pool: self.pool.jackpot_pool(),
            bettor_jackpot: self.pool.bettor_jackpot(),
            extra_jackpot: self.pool.extra_jackpot(),
            locked_in_bets: self.pool.locked_in_bets(),
            free_funds: self.free_funds(),
            open_roll_bets: self.roll_bets.len(),
            open_slot_bets: self.slot_bets.len(),
        }
    }

    pub fn settings(&self, game: GameKind) -> &GameSettings {
        match game {
            GameKind::Roll => &self.roll,
            GameKind::Slot => &self.slot,
        }
    }

    pub fn machine(&self) -> &SlotMachine {
        &self.machine
    }

    pub fn jackpot_magic(&self) -> u64 {
        self.lottery.magic()
    }

    pub fn roll_bet(&self, key: &SeedHash) -> Option<&RollBet> {
        self.roll_bets.get(key)
    }

    pub fn slot_bet(&self, key: &SeedHash) -> Option<&SlotBet> {
        self.slot_bets.get(key)
    }

    pub fn signer_key(&self, game: GameKind) -> Option<[u8; 32]> {
        self.signer(game).map(|verifier| verifier.authority_key())
    }

    pub fn events(&self) -> &[CasinoEvent] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<CasinoEvent> {
        self.events.drain()
    }

    // Admin operations

    /// Trust the Ed25519 key `key` for commitments of `game`
    pub fn set_signer(&mut self, caller: &Identity, game: GameKind, key: &[u8; 32]) -> CasinoResult<()> {
        let verifier = Ed25519Verifier::from_bytes(key)?;
        self.set_verifier(caller, game, Box::new(verifier))
    }

    /// Install a commitment verifier for `game`; both games must use distinct authorities
    pub fn set_verifier(
        &mut self,
        caller: &Identity,
        game: GameKind,
        verifier: Box<dyn CommitmentVerifier>,
    ) -> CasinoResult<()> {
        self.require_authority(caller)?;
        if self.signer_key(game.other()) == Some(verifier.authority_key()) {
            return Err(ConfigurationError::SignerCollision.into());
        }

        tracing::info!(game = %game, key = %hex::encode(verifier.authority_key()), "Commitment signer set");
        match game {
            GameKind::Roll => self.roll_signer = Some(verifier),
            GameKind::Slot => self.slot_signer = Some(verifier),
        }
        Ok(())
    }

    pub fn set_bet_range(&mut self, caller: &Identity, game: GameKind, min: u64, max: u64) -> CasinoResult<()> {
        self.require_authority(caller)?;
        let settings = match game {
            GameKind::Roll => &mut self.roll,
            GameKind::Slot => &mut self.slot,
        };
        config::validate_bet_range(min, max, settings.min_bet_floor)?;
        settings.min_bet = min;
        settings.max_bet = max;
        tracing::info!(game = %game, min, max, "Bet range updated");
        Ok(())
    }

    pub fn set_jackpot_magic(&mut self, caller: &Identity, magic: u64) -> CasinoResult<()> {
        self.require_authority(caller)?;
        self.lottery.set_magic(magic)?;
        tracing::info!(magic, "Jackpot magic updated");
        Ok(())
    }

    pub fn set_reel(&mut self, caller: &Identity, n: usize, symbols: &[u8]) -> CasinoResult<()> {
        self.require_machine_edit(caller)?;
        self.machine.set_reel(n, symbols)?;
        Ok(())
    }

    pub fn set_pay_line(
        &mut self,
        caller: &Identity,
        n: usize,
        symbols: &[u8],
        num: u64,
        den: u64,
    ) -> CasinoResult<()> {
        self.require_machine_edit(caller)?;
        self.machine.set_pay_line(n, symbols, num, den)?;
        Ok(())
    }

    pub fn set_special_pay_line(
        &mut self,
        caller: &Identity,
        n: usize,
        symbol: u8,
        num: u64,
        den: u64,
        positions: &[usize],
    ) -> CasinoResult<()> {
        self.require_machine_edit(caller)?;
        self.machine.set_special_pay_line(n, symbol, num, den, positions)?;
        Ok(())
    }

    /// Pay out surplus funds
    pub fn withdraw(&mut self, caller: &Identity, beneficiary: &Identity, amount: u64) -> CasinoResult<PaymentStatus> {
        self.require_authority(caller)?;
        let free = self.free_funds();
        if amount > free {
            return Err(FundsError::InsufficientFreeFunds { requested: amount, available: free }.into());
        }
        Ok(self.pay(beneficiary, amount, TAG_WITHDRAW))
    }

    /// Move surplus funds into the jackpot pool
    pub fn increase_jackpot(&mut self, caller: &Identity, amount: u64) -> CasinoResult<()> {
        self.require_authority(caller)?;
        let free = self.free_funds();
        if amount > free {
            return Err(FundsError::InsufficientFreeFunds { requested: amount, available: free }.into());
        }
        self.pool.add_extra_jackpot(amount);
        tracing::info!(amount, pool = self.pool.jackpot_pool(), "Jackpot increased");
        Ok(())
    }

    // Shared helpers

    fn signer(&self, game: GameKind) -> Option<&dyn CommitmentVerifier> {
        match game {
            GameKind::Roll => self.roll_signer.as_deref(),
            GameKind::Slot => self.slot_signer.as_deref(),
        }
    }

    fn require_authority(&self, caller: &Identity) -> CasinoResult<()> {
        if !self.access.is_authority(caller) {
            tracing::warn!(caller = %caller, "Rejected admin call");
            return Err(CasinoError::AccessDenied);
        }
        Ok(())
    }

    fn require_machine_edit(&self, caller: &Identity) -> CasinoResult<()> {
        self.require_authority(caller)?;
        if !self.slot_bets.is_empty() {
            return Err(ConfigurationError::PendingBets.into());
        }
        Ok(())
    }

    /// Placement checks shared by both games: access, then the commitment
    fn check_placement(&self, game: GameKind, caller: &Identity, commitment: &Commitment) -> CasinoResult<()> {
        if !self.access.may_place(caller) {
            return Err(CasinoError::AccessDenied);
        }
        let verifier = self
            .signer(game)
            .ok_or(ConfigurationError::SignerNotSet(game))?;
        commitment::verify_commitment(verifier, commitment, self.ledger.current_position())?;
        Ok(())
    }

    /// The public seed must come from the anchor position and still be attestable
    fn check_reveal(&self, anchor: u64, public_seed: &[u8; 32]) -> Result<(), BetError> {
        let current = self.ledger.current_position();
        if current <= anchor {
            return Err(BetError::PublicSeedUnverifiable { anchor });
        }
        let window = self.ledger.lookback_window();
        if current - anchor > window {
            return Err(BetError::QueryWindowExpired { anchor, current, window });
        }
        match self.ledger.public_seed_at(anchor) {
            Some(attested) if attested == *public_seed => Ok(()),
            _ => Err(BetError::PublicSeedUnverifiable { anchor }),
        }
    }

    /// Refunds open only once the reveal window has closed
    fn check_refundable(&self, anchor: u64) -> Result<(), BetError> {
        let refundable_at = anchor
            .saturating_add(self.ledger.lookback_window())
            .saturating_add(1);
        if self.ledger.current_position() < refundable_at {
            return Err(BetError::CannotRefundYet { refundable_at });
        }
        Ok(())
    }

    /// Pay from funds not earmarked for stakes or the jackpot
    fn pay(&mut self, beneficiary: &Identity, amount: u64, tag: &str) -> PaymentStatus {
        let spendable = self.free_funds();
        PaymentDispatcher::new(&mut self.ledger, &mut self.events).send(beneficiary, amount, spendable, tag)
    }

    /// Pay the whole jackpot pool to `beneficiary` and reset it
    fn settle_jackpot(&mut self, beneficiary: &Identity, hidden_seed: &[u8; 32], public_seed: &[u8; 32]) -> u64 {
        let amount = self.pool.take_jackpot();
        tracing::info!(beneficiary = %beneficiary, amount, "Jackpot hit");
        self.pay(beneficiary, amount, crate::payment::TAG_JACKPOT);
        self.events.emit(CasinoEvent::Jackpot {
            beneficiary: *beneficiary,
            amount,
            hidden_seed: *hidden_seed,
            public_seed: *public_seed,
            jackpot_magic: self.lottery.magic(),
        });
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::roll::RollSpec;
    use crate::testing::TestHarness;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = CasinoConfig::default();
        config.jackpot.magic = 10;
        let result = Casino::new(
            &config,
            crate::ledger::InMemoryLedger::default(),
            Box::new(crate::access::OwnerAccess::new(Identity::from_label("owner"))),
        );
        assert!(matches!(
            result,
            Err(CasinoError::Configuration(ConfigurationError::InvalidJackpotMagic { .. }))
        ));
    }

    #[test]
    fn test_signers_must_differ() {
        let mut harness = TestHarness::new();
        let owner = harness.owner;
        let roll_key = harness.roll_signer.verifying_key().to_bytes();

        let result = harness.casino.set_signer(&owner, GameKind::Slot, &roll_key);
        assert!(matches!(
            result,
            Err(CasinoError::Configuration(ConfigurationError::SignerCollision))
        ));

        // the same key may be re-set on its own game
        assert!(harness.casino.set_signer(&owner, GameKind::Roll, &roll_key).is_ok());
    }

    #[test]
    fn test_admin_calls_require_authority() {
        let mut harness = TestHarness::new();
        let player = harness.player;

        assert!(matches!(
            harness.casino.set_jackpot_magic(&player, 5_000),
            Err(CasinoError::AccessDenied)
        ));
        assert!(matches!(
            harness.casino.set_bet_range(&player, GameKind::Roll, 1_000_000, 2_000_000),
            Err(CasinoError::AccessDenied)
        ));
        assert!(matches!(
            harness.casino.withdraw(&player, &player, 1),
            Err(CasinoError::AccessDenied)
        ));
        assert!(matches!(
            harness.casino.set_reel(&player, 0, b"3"),
            Err(CasinoError::AccessDenied)
        ));
    }

    #[test]
    fn test_placement_without_signer_fails() {
        let mut harness = TestHarness::unsigned();
        let (_, commitment) = harness.roll_signer.issue(100);
        let player = harness.player;

        let result = harness
            .casino
            .place_roll_bet(&player, 1_000_000, RollSpec::coin(1), &commitment, None);
        assert!(matches!(
            result,
            Err(CasinoError::Configuration(ConfigurationError::SignerNotSet(GameKind::Roll)))
        ));
    }

    #[test]
    fn test_set_bet_range_rules() {
        let mut harness = TestHarness::new();
        let owner = harness.owner;
        let floor = harness.casino.settings(GameKind::Roll).min_bet_floor;

        assert!(matches!(
            harness.casino.set_bet_range(&owner, GameKind::Roll, floor - 1, floor * 2),
            Err(CasinoError::Configuration(ConfigurationError::InvalidMinBet { .. }))
        ));
        assert!(matches!(
            harness.casino.set_bet_range(&owner, GameKind::Roll, floor + 1, floor),
            Err(CasinoError::Configuration(ConfigurationError::InvalidBetRange { .. }))
        ));
        harness.casino.set_bet_range(&owner, GameKind::Roll, floor, floor).unwrap();
        assert_eq!(harness.casino.settings(GameKind::Roll).max_bet, floor);
    }

    #[test]
    fn test_withdraw_exact_free_funds() {
        let mut harness = TestHarness::new();
        let owner = harness.owner;
        harness.casino.ledger_mut().fund(10_000_000);
        harness.place_roll(RollSpec::coin(1), 1_000_000).unwrap();

        let free = harness.casino.free_funds();
        let result = harness.casino.withdraw(&owner, &owner, free + 1);
        assert!(matches!(
            result,
            Err(CasinoError::Funds(FundsError::InsufficientFreeFunds { .. }))
        ));

        let status = harness.casino.withdraw(&owner, &owner, free).unwrap();
        assert!(status.is_sent());
        assert_eq!(harness.casino.free_funds(), 0);
        assert_eq!(harness.casino.ledger().account_balance(&owner), free);
    }

    #[test]
    fn test_increase_jackpot_uses_free_funds() {
        let mut harness = TestHarness::new();
        let owner = harness.owner;
        harness.casino.ledger_mut().fund(5_000);

        assert!(harness.casino.increase_jackpot(&owner, 5_001).is_err());
        harness.casino.increase_jackpot(&owner, 5_000).unwrap();

        assert_eq!(harness.casino.pool().extra_jackpot(), 5_000);
        assert_eq!(harness.casino.pool().jackpot_pool(), 5_000);
        assert_eq!(harness.casino.free_funds(), 0);

        let snapshot = harness.casino.snapshot();
        assert_eq!(snapshot.jackpot_pool, 5_000);
        assert_eq!(snapshot.bettor_jackpot, 0);
        assert_eq!(snapshot.extra_jackpot, 5_000);
    }

    #[test]
    fn test_machine_edits_blocked_by_open_slot_bets() {
        let mut harness = TestHarness::new();
        let owner = harness.owner;
        let (hidden, _) = harness.place_slot(5_000_000).unwrap();

        assert!(matches!(
            harness.casino.set_pay_line(&owner, 0, b"3", 1, 1),
            Err(CasinoError::Configuration(ConfigurationError::PendingBets))
        ));

        harness.casino.ledger_mut().advance(1);
        harness.handle_slot(&hidden).unwrap();
        assert!(harness.casino.set_pay_line(&owner, 0, b"3", 1, 1).is_ok());
    }

    #[test]
    fn test_set_jackpot_magic_band() {
        let mut harness = TestHarness::new();
        let owner = harness.owner;
        assert!(harness.casino.set_jackpot_magic(&owner, 3_332).is_err());
        harness.casino.set_jackpot_magic(&owner, 3_333).unwrap();
        assert_eq!(harness.casino.jackpot_magic(), 3_333);
    }
}
