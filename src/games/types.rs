use crate::errors::{CasinoResult, ConfigurationError, PayoutError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 of a hidden seed; identifies a bet
pub type SeedHash = [u8; 32];

/// Payout sent for a losing bet so every settlement leaves a trace on the ledger
pub const NOMINAL_PAYOUT: u64 = 1;

/// Game families served by the engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Roll,
    Slot,
}

impl GameKind {
    /// The other game family
    pub fn other(&self) -> GameKind {
        match self {
            GameKind::Roll => GameKind::Slot,
            GameKind::Slot => GameKind::Roll,
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Roll => write!(f, "roll"),
            GameKind::Slot => write!(f, "slot"),
        }
    }
}

/// Ledger identity of a bettor, beneficiary or operator
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(#[serde(with = "hex_bytes")] pub [u8; 32]);

impl Identity {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Deterministic identity derived from a human readable label
    pub fn from_label(label: &str) -> Self {
        Self(Sha256::digest(label.as_bytes()).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({}..)", &hex::encode(self.0)[..8])
    }
}

/// Hash a hidden seed into its bet key
pub fn seed_hash(hidden_seed: &[u8; 32]) -> SeedHash {
    Sha256::digest(hidden_seed).into()
}

/// Rational payout multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multiplier {
    pub num: u64,
    pub den: u64,
}

impl Multiplier {
    pub const ZERO: Multiplier = Multiplier { num: 0, den: 1 };

    pub fn new(num: u64, den: u64) -> Self {
        Self { num, den }
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    /// Mediant-rule addition: `n1/d1 + n2/d2 = (n2*d1 + n1*d2) / (d1*d2)`
    pub fn checked_add(self, other: Multiplier) -> Result<Multiplier, PayoutError> {
        let lhs = other
            .num
            .checked_mul(self.den)
            .ok_or(PayoutError::ArithmeticOverflow)?;
        let rhs = self
            .num
            .checked_mul(other.den)
            .ok_or(PayoutError::ArithmeticOverflow)?;
        let num = lhs.checked_add(rhs).ok_or(PayoutError::ArithmeticOverflow)?;
        let den = other
            .den
            .checked_mul(self.den)
            .ok_or(PayoutError::ArithmeticOverflow)?;
        Ok(Multiplier { num, den })
    }

    /// Numerator multiplied by `count`, denominator unchanged
    pub fn scaled(self, count: u64) -> Result<Multiplier, PayoutError> {
        let num = self.num.checked_mul(count).ok_or(PayoutError::ArithmeticOverflow)?;
        Ok(Multiplier { num, den: self.den })
    }

    /// Approximate value for display only
    pub fn as_f64(&self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        self.num as f64 / self.den as f64
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Per-game economics applied to every settled bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutSchedule {
    pub house_edge_percent: u64,
    pub jackpot_percent: u64,
    pub settlement_cost: u64,
}

impl PayoutSchedule {
    /// Share of the stake that stays with the bettor after edge and jackpot cut
    fn retained_percent(&self) -> u64 {
        100u64.saturating_sub(self.house_edge_percent.saturating_add(self.jackpot_percent))
    }

    /// Stake share moved into the jackpot pool at placement
    pub fn jackpot_contribution(&self, amount: u64) -> u64 {
        (amount as u128 * self.jackpot_percent as u128 / 100) as u64
    }

    /// Amount paid for `amount` staked at `multiplier`.
    ///
    /// Losing bets receive [`NOMINAL_PAYOUT`]. Winning bets receive
    /// `amount * num / den * (100 - edge - jackpot) / 100 - settlement_cost`,
    /// computed multiply-before-divide in 128-bit arithmetic.
    pub fn winnings(&self, amount: u64, multiplier: Multiplier) -> CasinoResult<u64> {
        if multiplier.is_zero() {
            return Ok(NOMINAL_PAYOUT);
        }

        let gross = (amount as u128)
            .checked_mul(multiplier.num as u128)
            .and_then(|v| v.checked_div(multiplier.den as u128))
            .and_then(|v| v.checked_mul(self.retained_percent() as u128))
            .map(|v| v / 100)
            .ok_or(PayoutError::ArithmeticOverflow)?;
        let gross = u64::try_from(gross).map_err(|_| PayoutError::ArithmeticOverflow)?;

        gross.checked_sub(self.settlement_cost).ok_or_else(|| {
            ConfigurationError::SettlementCostExceedsWinnings {
                winnings: gross,
                cost: self.settlement_cost,
            }
            .into()
        })
    }
}

/// Serde helper encoding fixed-size byte arrays as hex strings
pub mod hex_bytes {
    use super::*;

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom(format!("expected {} bytes", N)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CasinoError;

    fn roll_schedule() -> PayoutSchedule {
        PayoutSchedule {
            house_edge_percent: 1,
            jackpot_percent: 1,
            settlement_cost: 500_000,
        }
    }

    #[test]
    fn test_mediant_addition_from_zero() {
        let total = Multiplier::ZERO.checked_add(Multiplier::new(6, 10)).unwrap();
        assert_eq!(total, Multiplier::new(6, 10));

        let total = total.checked_add(Multiplier::new(3, 10).scaled(2).unwrap()).unwrap();
        assert_eq!(total, Multiplier::new(120, 100));
    }

    #[test]
    fn test_mediant_overflow_is_reported() {
        let big = Multiplier::new(u64::MAX, 1);
        assert_eq!(
            big.checked_add(Multiplier::new(1, 2)),
            Err(PayoutError::ArithmeticOverflow)
        );
    }

    #[test]
    fn test_losing_bet_pays_nominal_unit() {
        let paid = roll_schedule().winnings(1_000_000_000, Multiplier::ZERO).unwrap();
        assert_eq!(paid, NOMINAL_PAYOUT);
    }

    #[test]
    fn test_winnings_multiply_before_divide() {
        // 1_000_000_000 * 100 / 99 = 1_010_101_010, * 98 / 100 = 989_898_989
        let paid = roll_schedule()
            .winnings(1_000_000_000, Multiplier::new(100, 99))
            .unwrap();
        assert_eq!(paid, 989_898_989 - 500_000);
    }

    #[test]
    fn test_oversized_percentages_retain_nothing() {
        let schedule = PayoutSchedule {
            house_edge_percent: u64::MAX,
            jackpot_percent: 1,
            settlement_cost: 0,
        };
        assert_eq!(schedule.winnings(1_000_000, Multiplier::new(2, 1)), Ok(0));
    }

    #[test]
    fn test_winnings_below_cost_is_configuration_error() {
        let result = roll_schedule().winnings(100, Multiplier::new(2, 1));
        assert!(matches!(
            result,
            Err(CasinoError::Configuration(
                ConfigurationError::SettlementCostExceedsWinnings { winnings: 196, cost: 500_000 }
            ))
        ));
    }

    #[test]
    fn test_jackpot_contribution() {
        assert_eq!(roll_schedule().jackpot_contribution(1_000_000), 10_000);
        assert_eq!(roll_schedule().jackpot_contribution(99), 0);
    }

    #[test]
    fn test_identity_serializes_as_hex() {
        let id = Identity::new([0xab; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
