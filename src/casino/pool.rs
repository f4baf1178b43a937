use crate::errors::{FundsError, PayoutError};
use serde::{Deserialize, Serialize};

/// Custody bookkeeping over the engine's ledger balance.
///
/// `jackpot` holds the bettor-funded share of the jackpot pool and
/// `extra_jackpot` the operator top-ups; a jackpot hit pays both.
/// Free funds are `balance - jackpot - extra_jackpot - locked_in_bets`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    jackpot: u64,
    extra_jackpot: u64,
    locked_in_bets: u64,
}

impl PoolState {
    /// Bettor-funded share of the jackpot pool
    pub fn bettor_jackpot(&self) -> u64 {
        self.jackpot
    }

    pub fn extra_jackpot(&self) -> u64 {
        self.extra_jackpot
    }

    /// Amount a jackpot hit would pay right now
    pub fn jackpot_pool(&self) -> u64 {
        self.jackpot.saturating_add(self.extra_jackpot)
    }

    pub fn locked_in_bets(&self) -> u64 {
        self.locked_in_bets
    }

    /// Funds earmarked for open stakes and the jackpot pool
    pub fn obligations(&self) -> u64 {
        self.jackpot_pool().saturating_add(self.locked_in_bets)
    }

    pub fn free_funds(&self, balance: u64) -> u64 {
        balance.saturating_sub(self.obligations())
    }

    /// Placement: lock the stake and move its contribution into the jackpot
    pub(crate) fn lock_stake(&mut self, amount: u64, contribution: u64) -> Result<(), PayoutError> {
        let locked = self
            .locked_in_bets
            .checked_add(amount)
            .ok_or(PayoutError::ArithmeticOverflow)?;
        let jackpot = self
            .jackpot
            .checked_add(contribution)
            .ok_or(PayoutError::ArithmeticOverflow)?;
        self.locked_in_bets = locked;
        self.jackpot = jackpot;
        Ok(())
    }

    /// Settlement: the stake is no longer locked
    pub(crate) fn release_stake(&mut self, amount: u64) {
        self.locked_in_bets = self.locked_in_bets.saturating_sub(amount);
    }

    /// Refund: undo a placement exactly
    pub(crate) fn reverse_stake(&mut self, amount: u64, contribution: u64) -> Result<(), FundsError> {
        if self.jackpot < contribution {
            return Err(FundsError::JackpotUnderflow {
                jackpot: self.jackpot,
                required: contribution,
            });
        }
        self.jackpot -= contribution;
        self.locked_in_bets = self.locked_in_bets.saturating_sub(amount);
        Ok(())
    }

    pub(crate) fn add_extra_jackpot(&mut self, amount: u64) {
        self.extra_jackpot = self.extra_jackpot.saturating_add(amount);
    }

    /// Jackpot hit: empty the whole pool and return what it held
    pub(crate) fn take_jackpot(&mut self) -> u64 {
        let pool = self.jackpot_pool();
        self.jackpot = 0;
        self.extra_jackpot = 0;
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_and_release() {
        let mut pool = PoolState::default();
        pool.lock_stake(1_000, 10).unwrap();
        assert_eq!(pool.locked_in_bets(), 1_000);
        assert_eq!(pool.bettor_jackpot(), 10);
        assert_eq!(pool.free_funds(1_500), 490);

        pool.release_stake(1_000);
        assert_eq!(pool.locked_in_bets(), 0);
        assert_eq!(pool.bettor_jackpot(), 10);
    }

    #[test]
    fn test_reverse_restores_exactly() {
        let mut pool = PoolState::default();
        pool.lock_stake(500, 5).unwrap();
        let before = pool;
        pool.lock_stake(1_000, 10).unwrap();
        pool.reverse_stake(1_000, 10).unwrap();
        assert_eq!(pool, before);
    }

    #[test]
    fn test_reverse_guards_jackpot_underflow() {
        let mut pool = PoolState::default();
        pool.lock_stake(1_000, 10).unwrap();
        pool.take_jackpot();

        assert_eq!(
            pool.reverse_stake(1_000, 10),
            Err(FundsError::JackpotUnderflow { jackpot: 0, required: 10 })
        );
        assert_eq!(pool.locked_in_bets(), 1_000);
    }

    #[test]
    fn test_take_jackpot_includes_extra() {
        let mut pool = PoolState::default();
        pool.lock_stake(1_000, 10).unwrap();
        pool.add_extra_jackpot(90);
        assert_eq!(pool.jackpot_pool(), 100);
        assert_eq!(pool.free_funds(1_000), 0);

        assert_eq!(pool.take_jackpot(), 100);
        assert_eq!(pool.jackpot_pool(), 0);
        assert_eq!(pool.locked_in_bets(), 1_000);
    }

    #[test]
    fn test_lock_overflow_leaves_state_untouched() {
        let mut pool = PoolState::default();
        pool.lock_stake(u64::MAX, 0).unwrap();
        assert_eq!(pool.lock_stake(1, 1), Err(PayoutError::ArithmeticOverflow));
        assert_eq!(pool.bettor_jackpot(), 0);
    }
}
