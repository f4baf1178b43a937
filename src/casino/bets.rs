use crate::errors::BetError;
use crate::games::roll::{GameType, RollSpec};
use crate::games::types::{Identity, SeedHash};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Placed roll bet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollBet {
    pub spec: RollSpec,
    pub amount: u64,
    pub anchor_position: u64,
    pub bettor: Identity,
    pub referrer: Option<Identity>,
}

impl RollBet {
    pub fn game_type(&self) -> GameType {
        self.spec.game_type
    }

    pub fn mask(&self) -> u64 {
        self.spec.shape.mask()
    }

    pub fn threshold(&self) -> u64 {
        self.spec.shape.threshold()
    }
}

/// Placed slot bet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotBet {
    pub amount: u64,
    pub anchor_position: u64,
    pub bettor: Identity,
    pub referrer: Option<Identity>,
}

/// Open bets of one game, keyed by seed hash.
///
/// Keys of settled or refunded bets are remembered so a key can never be
/// placed twice.
#[derive(Debug, Clone)]
pub struct BetBook<B> {
    open: HashMap<SeedHash, B>,
    consumed: HashSet<SeedHash>,
}

impl<B> Default for BetBook<B> {
    fn default() -> Self {
        Self {
            open: HashMap::new(),
            consumed: HashSet::new(),
        }
    }
}

impl<B> BetBook<B> {
    pub fn get(&self, key: &SeedHash) -> Option<&B> {
        self.open.get(key)
    }

    /// Whether the key is open or was used before
    pub fn is_known(&self, key: &SeedHash) -> bool {
        self.open.contains_key(key) || self.consumed.contains(key)
    }

    pub fn insert(&mut self, key: SeedHash, bet: B) -> Result<(), BetError> {
        if self.is_known(&key) {
            return Err(BetError::BetAlreadyExists);
        }
        self.open.insert(key, bet);
        Ok(())
    }

    /// Remove an open bet for good
    pub fn take(&mut self, key: &SeedHash) -> Option<B> {
        let bet = self.open.remove(key)?;
        self.consumed.insert(*key);
        Some(bet)
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SeedHash, &B)> {
        self.open.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_bet(amount: u64) -> SlotBet {
        SlotBet {
            amount,
            anchor_position: 3,
            bettor: Identity::from_label("player"),
            referrer: None,
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let mut book = BetBook::default();
        book.insert([1u8; 32], slot_bet(100)).unwrap();
        assert_eq!(book.get(&[1u8; 32]), Some(&slot_bet(100)));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut book = BetBook::default();
        book.insert([1u8; 32], slot_bet(100)).unwrap();
        assert_eq!(book.insert([1u8; 32], slot_bet(200)), Err(BetError::BetAlreadyExists));
        assert_eq!(book.get(&[1u8; 32]).map(|b| b.amount), Some(100));
    }

    #[test]
    fn test_consumed_key_cannot_return() {
        let mut book = BetBook::default();
        book.insert([1u8; 32], slot_bet(100)).unwrap();
        assert!(book.take(&[1u8; 32]).is_some());
        assert!(book.take(&[1u8; 32]).is_none());
        assert!(book.is_empty());
        assert_eq!(book.insert([1u8; 32], slot_bet(100)), Err(BetError::BetAlreadyExists));
    }

    #[test]
    fn test_roll_bet_shape_accessors() {
        let bet = RollBet {
            spec: RollSpec::percent(40),
            amount: 1,
            anchor_position: 0,
            bettor: Identity::from_label("player"),
            referrer: None,
        };
        assert_eq!(bet.mask(), 0);
        assert_eq!(bet.threshold(), 40);
        assert_eq!(bet.game_type(), GameType::Percent);
    }
}
