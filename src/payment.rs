//! Send-and-log payment dispatch
//!
//! Payments never abort a settlement. A failed transfer is recorded as a
//! `FailedPayment` event and the funds stay in custody as free funds.

use crate::events::{CasinoEvent, EventLog};
use crate::games::types::Identity;
use crate::ledger::{Ledger, TransferError};
use serde::Serialize;

pub const TAG_SLOT_WIN: &str = "slot";
pub const TAG_ROLL_REFUND: &str = "roll.refund";
pub const TAG_SLOT_REFUND: &str = "slot.refund";
pub const TAG_JACKPOT: &str = "casino.jackpot";
pub const TAG_WITHDRAW: &str = "casino.withdraw";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Sent,
    Failed,
}

impl PaymentStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, PaymentStatus::Sent)
    }
}

/// Dispatches payments out of ledger custody
pub struct PaymentDispatcher<'a, L: Ledger + ?Sized> {
    ledger: &'a mut L,
    events: &'a mut EventLog,
}

impl<'a, L: Ledger + ?Sized> PaymentDispatcher<'a, L> {
    pub fn new(ledger: &'a mut L, events: &'a mut EventLog) -> Self {
        Self { ledger, events }
    }

    /// Pay `amount` to `beneficiary` as long as it fits within `spendable`
    pub fn send(
        &mut self,
        beneficiary: &Identity,
        amount: u64,
        spendable: u64,
        tag: &str,
    ) -> PaymentStatus {
        let result = if amount > spendable {
            Err(TransferError::InsufficientBalance { requested: amount, available: spendable })
        } else {
            self.ledger.transfer(beneficiary, amount)
        };

        match result {
            Ok(()) => {
                tracing::info!(beneficiary = %beneficiary, amount, tag, "Payment sent");
                self.events.emit(CasinoEvent::Payment {
                    beneficiary: *beneficiary,
                    amount,
                    tag: tag.to_string(),
                });
                PaymentStatus::Sent
            }
            Err(e) => {
                tracing::warn!(beneficiary = %beneficiary, amount, tag, error = %e, "Payment failed");
                self.events.emit(CasinoEvent::FailedPayment {
                    beneficiary: *beneficiary,
                    amount,
                    tag: tag.to_string(),
                });
                PaymentStatus::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;

    #[test]
    fn test_successful_payment_is_logged() {
        let mut ledger = InMemoryLedger::default();
        let mut events = EventLog::new();
        let alice = Identity::from_label("alice");
        ledger.fund(100);

        let status = PaymentDispatcher::new(&mut ledger, &mut events).send(&alice, 30, 100, TAG_WITHDRAW);

        assert_eq!(status, PaymentStatus::Sent);
        assert_eq!(ledger.account_balance(&alice), 30);
        assert!(matches!(events.last(), Some(CasinoEvent::Payment { amount: 30, .. })));
    }

    #[test]
    fn test_rejected_payment_keeps_funds() {
        let mut ledger = InMemoryLedger::default();
        let mut events = EventLog::new();
        let bob = Identity::from_label("bob");
        ledger.fund(100);
        ledger.reject_transfers_to(bob);

        let status = PaymentDispatcher::new(&mut ledger, &mut events).send(&bob, 30, 100, TAG_SLOT_WIN);

        assert_eq!(status, PaymentStatus::Failed);
        assert_eq!(ledger.balance(), 100);
        assert!(matches!(
            events.last(),
            Some(CasinoEvent::FailedPayment { amount: 30, tag, .. }) if tag == "slot"
        ));
    }

    #[test]
    fn test_payment_over_spendable_is_not_attempted() {
        let mut ledger = InMemoryLedger::default();
        let mut events = EventLog::new();
        let alice = Identity::from_label("alice");
        ledger.fund(100);

        let status = PaymentDispatcher::new(&mut ledger, &mut events).send(&alice, 60, 50, TAG_JACKPOT);

        assert!(!status.is_sent());
        assert_eq!(ledger.balance(), 100);
        assert_eq!(ledger.account_balance(&alice), 0);
    }
}
