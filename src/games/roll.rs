//! Roll game family: coin, 3x3 grid and percent dice
//!
//! Coin and grid bets pick winning outcomes with a bitmask; percent bets win
//! when the roll lands under a threshold. The payout is the fair inverse of
//! the winning probability before edge and jackpot cut.

use crate::errors::BetError;
use crate::games::types::Multiplier;
use crate::rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a roll bet selects its winning outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetMode {
    Mask,
    Threshold,
}

/// Static parameters of one roll game type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameTypeDescriptor {
    pub modulus: u64,
    pub label: &'static str,
    pub mode: BetMode,
    pub mask_range: (u64, u64),
    pub threshold_range: (u64, u64),
}

const COIN: GameTypeDescriptor = GameTypeDescriptor {
    modulus: 2,
    label: "roll.coin",
    mode: BetMode::Mask,
    mask_range: (1, 2),
    threshold_range: (0, 0),
};

const GRID_3X3: GameTypeDescriptor = GameTypeDescriptor {
    modulus: 9,
    label: "roll.square_3x3",
    mode: BetMode::Mask,
    mask_range: (1, 510),
    threshold_range: (0, 0),
};

const PERCENT: GameTypeDescriptor = GameTypeDescriptor {
    modulus: 100,
    label: "roll.roll",
    mode: BetMode::Threshold,
    mask_range: (0, 0),
    threshold_range: (1, 99),
};

/// Roll game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Coin,
    Grid3x3,
    Percent,
}

impl GameType {
    pub const ALL: [GameType; 3] = [GameType::Coin, GameType::Grid3x3, GameType::Percent];

    pub fn descriptor(&self) -> &'static GameTypeDescriptor {
        match self {
            GameType::Coin => &COIN,
            GameType::Grid3x3 => &GRID_3X3,
            GameType::Percent => &PERCENT,
        }
    }

    pub fn modulus(&self) -> u64 {
        self.descriptor().modulus
    }

    /// Payment tag used when settling a bet of this type
    pub fn label(&self) -> &'static str {
        self.descriptor().label
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::Coin => write!(f, "coin"),
            GameType::Grid3x3 => write!(f, "grid3x3"),
            GameType::Percent => write!(f, "percent"),
        }
    }
}

impl std::str::FromStr for GameType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "coin" => Ok(GameType::Coin),
            "grid3x3" | "grid" | "square_3x3" => Ok(GameType::Grid3x3),
            "percent" | "roll" => Ok(GameType::Percent),
            other => Err(format!("unknown roll game type: {}", other)),
        }
    }
}

/// The active bet-shape parameter of a roll bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "value")]
pub enum BetShape {
    /// Bit `i` set means outcome `i` wins
    Mask(u64),
    /// Outcomes strictly below the threshold win
    Threshold(u64),
}

impl BetShape {
    pub fn mask(&self) -> u64 {
        match self {
            BetShape::Mask(mask) => *mask,
            BetShape::Threshold(_) => 0,
        }
    }

    pub fn threshold(&self) -> u64 {
        match self {
            BetShape::Threshold(threshold) => *threshold,
            BetShape::Mask(_) => 0,
        }
    }
}

/// A validated roll bet specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollSpec {
    pub game_type: GameType,
    pub shape: BetShape,
}

impl RollSpec {
    pub fn coin(mask: u64) -> Self {
        Self { game_type: GameType::Coin, shape: BetShape::Mask(mask) }
    }

    pub fn grid(mask: u64) -> Self {
        Self { game_type: GameType::Grid3x3, shape: BetShape::Mask(mask) }
    }

    pub fn percent(threshold: u64) -> Self {
        Self { game_type: GameType::Percent, shape: BetShape::Threshold(threshold) }
    }

    /// Check the shape against the type's configured ranges
    pub fn validate(&self) -> Result<(), BetError> {
        let descriptor = self.game_type.descriptor();
        let (mask_min, mask_max) = descriptor.mask_range;
        let (threshold_min, threshold_max) = descriptor.threshold_range;

        match (descriptor.mode, self.shape) {
            (BetMode::Mask, BetShape::Mask(mask)) if mask >= mask_min && mask <= mask_max => Ok(()),
            (BetMode::Mask, BetShape::Mask(mask)) => Err(BetError::InvalidMask { mask }),
            (BetMode::Mask, BetShape::Threshold(threshold)) => {
                Err(BetError::InvalidThreshold { threshold })
            }
            (BetMode::Threshold, BetShape::Threshold(threshold))
                if threshold >= threshold_min && threshold <= threshold_max =>
            {
                Ok(())
            }
            (BetMode::Threshold, BetShape::Threshold(threshold)) => {
                Err(BetError::InvalidThreshold { threshold })
            }
            (BetMode::Threshold, BetShape::Mask(mask)) => Err(BetError::InvalidMask { mask }),
        }
    }
}

/// Result of a roll: the drawn value and the earned multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub roll: u64,
    pub multiplier: Multiplier,
}

impl RollOutcome {
    pub fn is_win(&self) -> bool {
        !self.multiplier.is_zero()
    }
}

/// Multiplier earned by `shape` when the roll is `rnd`
pub fn multiplier_for(game_type: GameType, shape: BetShape, rnd: u64) -> Multiplier {
    let modulus = game_type.modulus();
    match shape {
        BetShape::Mask(mask) => {
            let hit = mask.checked_shr(rnd as u32).map_or(false, |bits| bits & 1 == 1);
            if hit {
                Multiplier::new(modulus, mask.count_ones() as u64)
            } else {
                Multiplier::ZERO
            }
        }
        BetShape::Threshold(threshold) => {
            if rnd < threshold {
                Multiplier::new(modulus, threshold)
            } else {
                Multiplier::ZERO
            }
        }
    }
}

/// Derive the roll from the seed pair and price it
pub fn roll(spec: &RollSpec, hidden_seed: &[u8; 32], public_seed: &[u8; 32]) -> RollOutcome {
    let rnd = rng::derive(hidden_seed, public_seed, spec.game_type.modulus());
    let multiplier = multiplier_for(spec.game_type, spec.shape, rnd);
    tracing::debug!(
        game_type = %spec.game_type,
        roll = rnd,
        multiplier = %multiplier,
        "Roll derived"
    );
    RollOutcome { roll: rnd, multiplier }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors() {
        assert_eq!(GameType::Coin.modulus(), 2);
        assert_eq!(GameType::Grid3x3.modulus(), 9);
        assert_eq!(GameType::Percent.modulus(), 100);
        assert_eq!(GameType::Grid3x3.label(), "roll.square_3x3");
        assert_eq!(GameType::Percent.descriptor().threshold_range, (1, 99));
    }

    #[test]
    fn test_coin_mask_bit_zero() {
        assert_eq!(multiplier_for(GameType::Coin, BetShape::Mask(1), 0), Multiplier::new(2, 1));
        assert_eq!(multiplier_for(GameType::Coin, BetShape::Mask(1), 1), Multiplier::ZERO);
    }

    #[test]
    fn test_grid_mask_pays_modulus_over_popcount() {
        // bits 1, 4, 7
        let mask = 0b1001_0010;
        assert_eq!(multiplier_for(GameType::Grid3x3, BetShape::Mask(mask), 4), Multiplier::new(9, 3));
        assert_eq!(multiplier_for(GameType::Grid3x3, BetShape::Mask(mask), 0), Multiplier::ZERO);
    }

    #[test]
    fn test_percent_threshold_is_strict() {
        let shape = BetShape::Threshold(50);
        assert_eq!(multiplier_for(GameType::Percent, shape, 49), Multiplier::new(100, 50));
        assert_eq!(multiplier_for(GameType::Percent, shape, 50), Multiplier::ZERO);
    }

    #[test]
    fn test_roll_uses_seed_pair() {
        // derive([1;32], [2;32], 100) == 17
        let outcome = roll(&RollSpec::percent(18), &[1u8; 32], &[2u8; 32]);
        assert_eq!(outcome.roll, 17);
        assert_eq!(outcome.multiplier, Multiplier::new(100, 18));
        assert!(outcome.is_win());

        let outcome = roll(&RollSpec::percent(17), &[1u8; 32], &[2u8; 32]);
        assert!(!outcome.is_win());
    }

    #[test]
    fn test_validate_mask_ranges() {
        assert!(RollSpec::coin(1).validate().is_ok());
        assert!(RollSpec::coin(2).validate().is_ok());
        assert_eq!(RollSpec::coin(0).validate(), Err(BetError::InvalidMask { mask: 0 }));
        assert_eq!(RollSpec::coin(3).validate(), Err(BetError::InvalidMask { mask: 3 }));
        assert!(RollSpec::grid(510).validate().is_ok());
        assert_eq!(RollSpec::grid(511).validate(), Err(BetError::InvalidMask { mask: 511 }));
    }

    #[test]
    fn test_validate_threshold_ranges() {
        assert!(RollSpec::percent(1).validate().is_ok());
        assert!(RollSpec::percent(99).validate().is_ok());
        assert_eq!(
            RollSpec::percent(0).validate(),
            Err(BetError::InvalidThreshold { threshold: 0 })
        );
        assert_eq!(
            RollSpec::percent(100).validate(),
            Err(BetError::InvalidThreshold { threshold: 100 })
        );
    }

    #[test]
    fn test_validate_rejects_wrong_mode() {
        let spec = RollSpec { game_type: GameType::Coin, shape: BetShape::Threshold(1) };
        assert_eq!(spec.validate(), Err(BetError::InvalidThreshold { threshold: 1 }));

        let spec = RollSpec { game_type: GameType::Percent, shape: BetShape::Mask(1) };
        assert_eq!(spec.validate(), Err(BetError::InvalidMask { mask: 1 }));
    }

    #[test]
    fn test_game_type_parses() {
        assert_eq!("coin".parse::<GameType>(), Ok(GameType::Coin));
        assert_eq!("Grid3x3".parse::<GameType>(), Ok(GameType::Grid3x3));
        assert!("dice".parse::<GameType>().is_err());
    }
}
