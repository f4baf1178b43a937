//! Jackpot lottery drawn on every handled bet
//!
//! The draw reuses the bet's seed pair under the `jackpot` nonce and hits when
//! the value reduced modulo the magic is zero, so the odds are `1 / magic`.

use crate::errors::ConfigurationError;
use crate::rng::{self, JACKPOT_NONCE};

pub const MIN_JACKPOT_MAGIC: u64 = 3_333;
pub const MAX_JACKPOT_MAGIC: u64 = 333_333_333;
pub const DEFAULT_JACKPOT_MAGIC: u64 = 333_333;

/// Reject magic values outside the allowed band
pub fn validate_magic(magic: u64) -> Result<(), ConfigurationError> {
    if !(MIN_JACKPOT_MAGIC..=MAX_JACKPOT_MAGIC).contains(&magic) {
        return Err(ConfigurationError::InvalidJackpotMagic {
            value: magic,
            min: MIN_JACKPOT_MAGIC,
            max: MAX_JACKPOT_MAGIC,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JackpotLottery {
    magic: u64,
}

impl Default for JackpotLottery {
    fn default() -> Self {
        Self { magic: DEFAULT_JACKPOT_MAGIC }
    }
}

impl JackpotLottery {
    pub fn new(magic: u64) -> Result<Self, ConfigurationError> {
        validate_magic(magic)?;
        Ok(Self { magic })
    }

    /// Lottery with arbitrary odds, for simulations and tests.
    /// A zero magic is raised to 1.
    pub fn unchecked(magic: u64) -> Self {
        Self { magic: magic.max(1) }
    }

    pub fn magic(&self) -> u64 {
        self.magic
    }

    pub fn set_magic(&mut self, magic: u64) -> Result<(), ConfigurationError> {
        validate_magic(magic)?;
        self.magic = magic;
        Ok(())
    }

    /// Whether the seed pair wins the jackpot
    pub fn draw(&self, hidden_seed: &[u8; 32], public_seed: &[u8; 32]) -> bool {
        rng::derive_with_nonce(hidden_seed, public_seed, self.magic, JACKPOT_NONCE) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(n: u64) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        bytes
    }

    #[test]
    fn test_magic_band() {
        assert!(JackpotLottery::new(MIN_JACKPOT_MAGIC).is_ok());
        assert!(JackpotLottery::new(MAX_JACKPOT_MAGIC).is_ok());
        assert_eq!(
            JackpotLottery::new(MIN_JACKPOT_MAGIC - 1),
            Err(ConfigurationError::InvalidJackpotMagic {
                value: 3_332,
                min: MIN_JACKPOT_MAGIC,
                max: MAX_JACKPOT_MAGIC,
            })
        );
        assert!(JackpotLottery::new(MAX_JACKPOT_MAGIC + 1).is_err());
    }

    #[test]
    fn test_set_magic_keeps_previous_on_error() {
        let mut lottery = JackpotLottery::default();
        assert!(lottery.set_magic(1).is_err());
        assert_eq!(lottery.magic(), DEFAULT_JACKPOT_MAGIC);
        lottery.set_magic(5_000).unwrap();
        assert_eq!(lottery.magic(), 5_000);
    }

    #[test]
    fn test_unit_magic_always_hits() {
        let lottery = JackpotLottery::unchecked(1);
        for n in 0..20 {
            assert!(lottery.draw(&seed(n), &[2u8; 32]));
        }
        assert_eq!(JackpotLottery::unchecked(0).magic(), 1);
    }

    #[test]
    fn test_draw_known_vectors() {
        let lottery = JackpotLottery::new(MIN_JACKPOT_MAGIC).unwrap();
        // derive_with_nonce([1;32], [2;32], 3333, "jackpot") == 3152
        assert!(!lottery.draw(&[1u8; 32], &[2u8; 32]));
        assert!(lottery.draw(&seed(6_541), &[2u8; 32]));
    }
}
