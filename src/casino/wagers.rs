use super::{Casino, RollBet, SlotBet};
use crate::commitment::Commitment;
use crate::errors::{BetError, CasinoResult};
use crate::events::CasinoEvent;
use crate::games::roll::{self, RollOutcome, RollSpec};
use crate::games::slot::SpinOutcome;
use crate::games::types::{seed_hash, GameKind, Identity, SeedHash};
use crate::ledger::Ledger;
use crate::payment::{PaymentStatus, TAG_ROLL_REFUND, TAG_SLOT_REFUND, TAG_SLOT_WIN};
use serde::Serialize;

/// Result of handling a roll bet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollSettlement {
    pub seed_hash: SeedHash,
    pub bettor: Identity,
    pub amount: u64,
    pub outcome: RollOutcome,
    pub winnings: u64,
    pub payment: PaymentStatus,
    /// Jackpot paid on a hit
    pub jackpot: Option<u64>,
}

/// Result of handling a slot bet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSettlement {
    pub seed_hash: SeedHash,
    pub bettor: Identity,
    pub amount: u64,
    pub outcome: SpinOutcome,
    pub winnings: u64,
    pub payment: PaymentStatus,
    pub jackpot: Option<u64>,
}

/// Result of refunding a bet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundReceipt {
    pub seed_hash: SeedHash,
    pub bettor: Identity,
    pub amount: u64,
    pub payment: PaymentStatus,
}

impl<L: Ledger> Casino<L> {
    /// Place a roll bet of `amount` against the operator's commitment
    pub fn place_roll_bet(
        &mut self,
        caller: &Identity,
        amount: u64,
        spec: RollSpec,
        commitment: &Commitment,
        referrer: Option<Identity>,
    ) -> CasinoResult<()> {
        self.check_placement(GameKind::Roll, caller, commitment)?;
        let key = commitment.seed_hash;
        if self.roll_bets.is_known(&key) {
            return Err(BetError::BetAlreadyExists.into());
        }
        self.roll.check_amount(amount)?;
        spec.validate()?;

        let contribution = self.roll.schedule.jackpot_contribution(amount);
        self.pool.lock_stake(amount, contribution)?;
        self.ledger.deposit(caller, amount);

        let bet = RollBet {
            spec,
            amount,
            anchor_position: self.ledger.current_position(),
            bettor: *caller,
            referrer,
        };
        self.events.emit(CasinoEvent::RollNewBet {
            seed_hash: key,
            game_type: spec.game_type,
            bettor: *caller,
            amount,
            mask: bet.mask(),
            threshold: bet.threshold(),
            referrer,
        });
        tracing::info!(
            seed_hash = %hex::encode(key),
            game_type = %spec.game_type,
            bettor = %caller,
            amount,
            anchor = bet.anchor_position,
            "Roll bet placed"
        );
        self.roll_bets.insert(key, bet)?;
        Ok(())
    }

    /// Reveal the hidden seed of a roll bet and settle it
    pub fn handle_roll_bet(
        &mut self,
        caller: &Identity,
        hidden_seed: &[u8; 32],
        public_seed: &[u8; 32],
    ) -> CasinoResult<RollSettlement> {
        self.require_authority(caller)?;
        let key = seed_hash(hidden_seed);
        let bet = self.roll_bets.get(&key).ok_or(BetError::BetNotFound)?;
        self.check_reveal(bet.anchor_position, public_seed)?;

        let outcome = roll::roll(&bet.spec, hidden_seed, public_seed);
        let winnings = self.roll.schedule.winnings(bet.amount, outcome.multiplier)?;
        let jackpot_hit = self.lottery.draw(hidden_seed, public_seed);

        let bet = self.roll_bets.take(&key).ok_or(BetError::BetNotFound)?;
        self.pool.release_stake(bet.amount);
        let payment = self.pay(&bet.bettor, winnings, bet.game_type().label());

        self.events.emit(CasinoEvent::RollHandleBet {
            seed_hash: key,
            game_type: bet.game_type(),
            bettor: bet.bettor,
            amount: bet.amount,
            roll: outcome.roll,
            hidden_seed: *hidden_seed,
            public_seed: *public_seed,
            multiplier_num: outcome.multiplier.num,
            multiplier_den: outcome.multiplier.den,
            winnings,
        });
        tracing::info!(
            seed_hash = %hex::encode(key),
            roll = outcome.roll,
            multiplier = %outcome.multiplier,
            winnings,
            "Roll bet handled"
        );

        let jackpot = jackpot_hit.then(|| self.settle_jackpot(&bet.bettor, hidden_seed, public_seed));

        Ok(RollSettlement {
            seed_hash: key,
            bettor: bet.bettor,
            amount: bet.amount,
            outcome,
            winnings,
            payment,
            jackpot,
        })
    }

    /// Return the stake of a roll bet whose reveal window has passed
    pub fn refund_roll_bet(&mut self, key: &SeedHash) -> CasinoResult<RefundReceipt> {
        let bet = self.roll_bets.get(key).ok_or(BetError::BetNotFound)?;
        if bet.amount == 0 {
            return Err(BetError::BetAlreadyHandled.into());
        }
        self.check_refundable(bet.anchor_position)?;

        let contribution = self.roll.schedule.jackpot_contribution(bet.amount);
        self.pool.reverse_stake(bet.amount, contribution)?;
        let bet = self.roll_bets.take(key).ok_or(BetError::BetNotFound)?;
        let payment = self.pay(&bet.bettor, bet.amount, TAG_ROLL_REFUND);

        self.events.emit(CasinoEvent::RollRefundBet {
            seed_hash: *key,
            game_type: bet.game_type(),
            bettor: bet.bettor,
            amount: bet.amount,
        });
        tracing::info!(seed_hash = %hex::encode(key), amount = bet.amount, "Roll bet refunded");

        Ok(RefundReceipt {
            seed_hash: *key,
            bettor: bet.bettor,
            amount: bet.amount,
            payment,
        })
    }

    /// Place a slot bet of `amount` against the operator's commitment
    pub fn place_slot_bet(
        &mut self,
        caller: &Identity,
        amount: u64,
        commitment: &Commitment,
        referrer: Option<Identity>,
    ) -> CasinoResult<()> {
        self.check_placement(GameKind::Slot, caller, commitment)?;
        let key = commitment.seed_hash;
        if self.slot_bets.is_known(&key) {
            return Err(BetError::BetAlreadyExists.into());
        }
        self.slot.check_amount(amount)?;

        let contribution = self.slot.schedule.jackpot_contribution(amount);
        self.pool.lock_stake(amount, contribution)?;
        self.ledger.deposit(caller, amount);

        let bet = SlotBet {
            amount,
            anchor_position: self.ledger.current_position(),
            bettor: *caller,
            referrer,
        };
        self.events.emit(CasinoEvent::SlotNewBet {
            seed_hash: key,
            bettor: *caller,
            amount,
            referrer,
        });
        tracing::info!(
            seed_hash = %hex::encode(key),
            bettor = %caller,
            amount,
            anchor = bet.anchor_position,
            "Slot bet placed"
        );
        self.slot_bets.insert(key, bet)?;
        Ok(())
    }

    /// Reveal the hidden seed of a slot bet and settle it
    pub fn handle_slot_bet(
        &mut self,
        caller: &Identity,
        hidden_seed: &[u8; 32],
        public_seed: &[u8; 32],
    ) -> CasinoResult<SlotSettlement> {
        self.require_authority(caller)?;
        let key = seed_hash(hidden_seed);
        let bet = self.slot_bets.get(&key).ok_or(BetError::BetNotFound)?;
        self.check_reveal(bet.anchor_position, public_seed)?;

        let outcome = self.machine.spin(hidden_seed, public_seed)?;
        let winnings = self.slot.schedule.winnings(bet.amount, outcome.multiplier)?;
        let jackpot_hit = self.lottery.draw(hidden_seed, public_seed);

        let bet = self.slot_bets.take(&key).ok_or(BetError::BetNotFound)?;
        self.pool.release_stake(bet.amount);
        let payment = self.pay(&bet.bettor, winnings, TAG_SLOT_WIN);

        self.events.emit(CasinoEvent::SlotHandleBet {
            seed_hash: key,
            bettor: bet.bettor,
            amount: bet.amount,
            symbols: outcome.symbols_string(),
            hidden_seed: *hidden_seed,
            public_seed: *public_seed,
            multiplier_num: outcome.multiplier.num,
            multiplier_den: outcome.multiplier.den,
            winnings,
        });
        tracing::info!(
            seed_hash = %hex::encode(key),
            symbols = %outcome.symbols_string(),
            multiplier = %outcome.multiplier,
            winnings,
            "Slot bet handled"
        );

        let jackpot = jackpot_hit.then(|| self.settle_jackpot(&bet.bettor, hidden_seed, public_seed));

        Ok(SlotSettlement {
            seed_hash: key,
            bettor: bet.bettor,
            amount: bet.amount,
            outcome,
            winnings,
            payment,
            jackpot,
        })
    }

    /// Return the stake of a slot bet whose reveal window has passed
    pub fn refund_slot_bet(&mut self, key: &SeedHash) -> CasinoResult<RefundReceipt> {
        let bet = self.slot_bets.get(key).ok_or(BetError::BetNotFound)?;
        if bet.amount == 0 {
            return Err(BetError::BetAlreadyHandled.into());
        }
        self.check_refundable(bet.anchor_position)?;

        let contribution = self.slot.schedule.jackpot_contribution(bet.amount);
        self.pool.reverse_stake(bet.amount, contribution)?;
        let bet = self.slot_bets.take(key).ok_or(BetError::BetNotFound)?;
        let payment = self.pay(&bet.bettor, bet.amount, TAG_SLOT_REFUND);

        self.events.emit(CasinoEvent::SlotRefundBet {
            seed_hash: *key,
            bettor: bet.bettor,
            amount: bet.amount,
        });
        tracing::info!(seed_hash = %hex::encode(key), amount = bet.amount, "Slot bet refunded");

        Ok(RefundReceipt {
            seed_hash: *key,
            bettor: bet.bettor,
            amount: bet.amount,
            payment,
        })
    }
}
