//! Error Types for the Stakewell Protocol
//!
//! Every validator check is a fail-closed, whole-transaction abort: a
//! violated predicate voids the transaction with no partial state change.
//! The typed variants exist for debugging and tooling; on-ledger the only
//! observable effect of any of them is "transaction rejected".

use crate::types::{AssetName, PolicyId};

/// Result type alias for Stakewell validation
pub type StakewellResult<T> = Result<T, StakewellError>;

/// Main error enum for all Stakewell validation failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakewellError {
    /// Missing/non-finite validity bound, or window exceeding the cap
    MalformedTime { reason: TimeErrorReason },

    /// Required signature or cross-validator co-spend absent
    Unauthorized { reason: &'static str },

    /// An NFT check failed on policy and/or name
    IdentityMismatch {
        expected_policy: PolicyId,
        expected_name: AssetName,
    },

    /// A continuing output is missing, misplaced, or mutates a field it
    /// must preserve
    ContinuityViolation { field: &'static str },

    /// Withdrawal exceeds balance, treasury insufficient for a claim, or
    /// value/datum desynchronization
    AmountInvariantViolation { reason: AmountErrorReason },

    /// An expected reference input, continuing output, or co-validator
    /// input is absent
    NotFound { what: &'static str },
}

/// Reasons for time derivation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeErrorReason {
    /// Lower validity bound is open or infinite
    NonFiniteLowerBound,
    /// Upper validity bound is open or infinite
    NonFiniteUpperBound,
    /// Upper bound precedes lower bound
    InvertedBounds,
    /// Validity window wider than the 10-minute cap
    WindowTooWide { window_ms: u64 },
}

/// Reasons for amount invariant failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountErrorReason {
    /// Zero amount where a positive quantity is required
    ZeroAmount,
    /// Requested quantity exceeds the available balance
    ExceedsBalance { available: u64, requested: u64 },
    /// Treasury cannot cover the computed rewards
    TreasuryInsufficient { available: u64, required: u64 },
    /// Treasury balance would drop below committed liabilities
    BelowCommitted { balance: u64, committed: u64 },
    /// Held token quantity diverges from the datum's bookkeeping field
    ValueDatumMismatch { in_value: u64, in_datum: u64 },
    /// A balance did not change by the required quantity
    DeltaMismatch { expected: u64, actual: u64 },
    /// Amount below the pool's configured minimum
    BelowMinimum { amount: u64, minimum: u64 },
    /// Yield rate outside (0, 10_000] basis points
    RateOutOfRange { rate: u64 },
    /// Token quantities not conserved across the transaction
    ConservationViolated { inputs: u64, outputs: u64 },
    /// Arithmetic overflow during reward or balance math
    Overflow,
}

impl StakewellError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedTime { .. } => "E010_MALFORMED_TIME",
            Self::Unauthorized { .. } => "E020_UNAUTHORIZED",
            Self::IdentityMismatch { .. } => "E030_IDENTITY_MISMATCH",
            Self::ContinuityViolation { .. } => "E040_CONTINUITY_VIOLATION",
            Self::AmountInvariantViolation { .. } => "E050_AMOUNT_INVARIANT",
            Self::NotFound { .. } => "E060_NOT_FOUND",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            StakewellError::MalformedTime {
                reason: TimeErrorReason::NonFiniteLowerBound,
            },
            StakewellError::Unauthorized { reason: "test" },
            StakewellError::IdentityMismatch {
                expected_policy: [0u8; 28],
                expected_name: Vec::new(),
            },
            StakewellError::ContinuityViolation { field: "test" },
            StakewellError::AmountInvariantViolation {
                reason: AmountErrorReason::ZeroAmount,
            },
            StakewellError::NotFound { what: "test" },
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }
}
