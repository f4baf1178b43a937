//! Shared handle for callers outside a serialising ledger
//!
//! Every call takes the engine lock for its whole duration, so pool state and
//! bet books change atomically and in a total order.

use crate::casino::{Casino, PoolSnapshot, RefundReceipt, RollSettlement, SlotSettlement};
use crate::commitment::Commitment;
use crate::errors::CasinoResult;
use crate::events::CasinoEvent;
use crate::games::roll::RollSpec;
use crate::games::types::{Identity, SeedHash};
use crate::ledger::Ledger;
use crate::payment::PaymentStatus;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct CasinoService<L: Ledger> {
    inner: Arc<Mutex<Casino<L>>>,
}

impl<L: Ledger> Clone for CasinoService<L> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<L: Ledger> CasinoService<L> {
    pub fn new(casino: Casino<L>) -> Self {
        Self { inner: Arc::new(Mutex::new(casino)) }
    }

    fn lock(&self) -> MutexGuard<'_, Casino<L>> {
        // operations validate before mutating, so a poisoned engine is still consistent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with exclusive access to the engine
    pub fn with<R>(&self, f: impl FnOnce(&mut Casino<L>) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn place_roll_bet(
        &self,
        caller: &Identity,
        amount: u64,
        spec: RollSpec,
        commitment: &Commitment,
        referrer: Option<Identity>,
    ) -> CasinoResult<()> {
        self.lock().place_roll_bet(caller, amount, spec, commitment, referrer)
    }

    pub fn handle_roll_bet(
        &self,
        caller: &Identity,
        hidden_seed: &[u8; 32],
        public_seed: &[u8; 32],
    ) -> CasinoResult<RollSettlement> {
        self.lock().handle_roll_bet(caller, hidden_seed, public_seed)
    }

    pub fn refund_roll_bet(&self, key: &SeedHash) -> CasinoResult<RefundReceipt> {
        self.lock().refund_roll_bet(key)
    }

    pub fn place_slot_bet(
        &self,
        caller: &Identity,
        amount: u64,
        commitment: &Commitment,
        referrer: Option<Identity>,
    ) -> CasinoResult<()> {
        self.lock().place_slot_bet(caller, amount, commitment, referrer)
    }

    pub fn handle_slot_bet(
        &self,
        caller: &Identity,
        hidden_seed: &[u8; 32],
        public_seed: &[u8; 32],
    ) -> CasinoResult<SlotSettlement> {
        self.lock().handle_slot_bet(caller, hidden_seed, public_seed)
    }

    pub fn refund_slot_bet(&self, key: &SeedHash) -> CasinoResult<RefundReceipt> {
        self.lock().refund_slot_bet(key)
    }

    pub fn withdraw(&self, caller: &Identity, beneficiary: &Identity, amount: u64) -> CasinoResult<PaymentStatus> {
        self.lock().withdraw(caller, beneficiary, amount)
    }

    pub fn increase_jackpot(&self, caller: &Identity, amount: u64) -> CasinoResult<()> {
        self.lock().increase_jackpot(caller, amount)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.lock().snapshot()
    }

    pub fn drain_events(&self) -> Vec<CasinoEvent> {
        self.lock().drain_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::GameKind;
    use crate::testing::TestHarness;
    use std::thread;

    #[test]
    fn test_concurrent_placements_are_serialised() {
        let harness = TestHarness::new();
        let player = harness.player;
        let commitments: Vec<Commitment> = (0..32u64)
            .map(|n| harness.commit(GameKind::Roll, &crate::testing::hidden_seed(n)))
            .collect();
        let service = CasinoService::new(harness.casino);

        let handles: Vec<_> = commitments
            .chunks(8)
            .map(|chunk| {
                let service = service.clone();
                let chunk = chunk.to_vec();
                thread::spawn(move || {
                    for commitment in chunk {
                        service
                            .place_roll_bet(&player, 1_000_000, RollSpec::coin(1), &commitment, None)
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = service.snapshot();
        assert_eq!(snapshot.open_roll_bets, 32);
        assert_eq!(snapshot.locked_in_bets, 32_000_000);
        assert_eq!(snapshot.bettor_jackpot, 32 * 10_000);
        assert_eq!(snapshot.balance, 32_000_000);
    }

    #[test]
    fn test_duplicate_placement_across_threads_rejected_once() {
        let harness = TestHarness::new();
        let player = harness.player;
        let commitment = harness.commit(GameKind::Roll, &crate::testing::hidden_seed(7));
        let service = CasinoService::new(harness.casino);

        let results: Vec<bool> = (0..4)
            .map(|_| {
                let service = service.clone();
                let commitment = commitment.clone();
                thread::spawn(move || {
                    service
                        .place_roll_bet(&player, 1_000_000, RollSpec::coin(2), &commitment, None)
                        .is_ok()
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
        assert_eq!(service.snapshot().locked_in_bets, 1_000_000);
    }
}
