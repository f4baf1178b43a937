//! Error types for the wagering engine
//!
//! Every fallible operation returns [`CasinoResult`]. Errors are grouped by the
//! concern that raised them so callers can tell a configuration mistake from a
//! protocol rejection or a custody invariant.

use crate::games::types::GameKind;

/// Root error type for all engine operations
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CasinoError {
    /// Caller lacks the rights required by the operation
    #[error("Access denied")]
    AccessDenied,

    /// Invalid ranges, tables, keys or magic values
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Expired or forged commitments
    #[error("Commitment error: {0}")]
    Commitment(#[from] CommitmentError),

    /// Bet lifecycle rejections
    #[error("Bet error: {0}")]
    Bet(#[from] BetError),

    /// Custody invariant rejections
    #[error("Funds error: {0}")]
    Funds(#[from] FundsError),

    /// Arithmetic failures while computing a payout
    #[error("Payout error: {0}")]
    Payout(#[from] PayoutError),
}

/// Configuration and validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Roll and slot signers must differ")]
    SignerCollision,

    #[error("No commitment signer configured for {0}")]
    SignerNotSet(GameKind),

    #[error("Invalid jackpot magic {value}, expected [{min}, {max}]")]
    InvalidJackpotMagic { value: u64, min: u64, max: u64 },

    #[error("Invalid minimum bet {min}, floor is {floor}")]
    InvalidMinBet { min: u64, floor: u64 },

    #[error("Invalid bet range [{min}, {max}]")]
    InvalidBetRange { min: u64, max: u64 },

    #[error("Invalid reel number {0}")]
    InvalidReelNumber(usize),

    #[error("Reel symbols must not be empty")]
    InvalidReelLength,

    #[error("Reel contains the reserved sentinel symbol")]
    InvalidReelSymbol,

    #[error("Invalid pay line number {0}")]
    InvalidPayLineNumber(usize),

    #[error("Combination symbols must not be empty")]
    InvalidCombinationLength,

    #[error("Combination contains the reserved sentinel symbol")]
    InvalidCombinationSymbol,

    #[error("Invalid special combination symbol")]
    InvalidSpecialSymbol,

    #[error("Invalid special combination positions")]
    InvalidSpecialPositions,

    #[error("Multiplier denominator must be non-zero")]
    InvalidMultiplier,

    #[error("All slot bets must be handled before changing the machine")]
    PendingBets,

    #[error("Winnings {winnings} do not cover settlement cost {cost}")]
    SettlementCostExceedsWinnings { winnings: u64, cost: u64 },
}

/// Commitment verification errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitmentError {
    #[error("Commitment expired at position {expiry}, current position is {current}")]
    CommitmentExpired { expiry: u64, current: u64 },

    #[error("Invalid commitment signature")]
    InvalidSignature,

    #[error("Malformed authority key")]
    MalformedKey,
}

/// Bet lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BetError {
    #[error("Bet already exists")]
    BetAlreadyExists,

    #[error("Bet does not exist")]
    BetNotFound,

    #[error("Bet already handled")]
    BetAlreadyHandled,

    #[error("Invalid bet amount {amount}, expected [{min}, {max}]")]
    InvalidAmount { amount: u64, min: u64, max: u64 },

    #[error("Invalid bet mask {mask}")]
    InvalidMask { mask: u64 },

    #[error("Invalid bet threshold {threshold}")]
    InvalidThreshold { threshold: u64 },

    #[error("Public seed cannot be attested for anchor position {anchor}")]
    PublicSeedUnverifiable { anchor: u64 },

    #[error("Query window of {window} positions expired (anchor {anchor}, current {current})")]
    QueryWindowExpired { anchor: u64, current: u64, window: u64 },

    #[error("Bet cannot be refunded before position {refundable_at}")]
    CannotRefundYet { refundable_at: u64 },
}

/// Fund custody errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FundsError {
    #[error("Insufficient free funds: requested {requested}, available {available}")]
    InsufficientFreeFunds { requested: u64, available: u64 },

    #[error("Jackpot {jackpot} is below the required {required}")]
    JackpotUnderflow { jackpot: u64, required: u64 },
}

/// Payout arithmetic errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayoutError {
    #[error("Arithmetic overflow while computing payout")]
    ArithmeticOverflow,
}

/// Result type alias for engine operations
pub type CasinoResult<T> = Result<T, CasinoError>;

impl CasinoError {
    /// Whether the bet stays placed after this error, leaving a retry path open
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            CasinoError::Commitment(_)
                | CasinoError::Bet(BetError::PublicSeedUnverifiable { .. })
                | CasinoError::Bet(BetError::QueryWindowExpired { .. })
                | CasinoError::Bet(BetError::CannotRefundYet { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_errors_convert_into_root() {
        let err: CasinoError = BetError::BetNotFound.into();
        assert!(matches!(err, CasinoError::Bet(BetError::BetNotFound)));

        let err: CasinoError = FundsError::InsufficientFreeFunds { requested: 2, available: 1 }.into();
        assert_eq!(
            err.to_string(),
            "Funds error: Insufficient free funds: requested 2, available 1"
        );
    }

    #[test]
    fn test_protocol_error_classification() {
        let expired: CasinoError = BetError::QueryWindowExpired { anchor: 1, current: 300, window: 256 }.into();
        assert!(expired.is_protocol_error());

        let invalid: CasinoError = CommitmentError::InvalidSignature.into();
        assert!(invalid.is_protocol_error());

        let funds: CasinoError = FundsError::JackpotUnderflow { jackpot: 0, required: 1 }.into();
        assert!(!funds.is_protocol_error());
        assert!(!CasinoError::AccessDenied.is_protocol_error());
    }
}
