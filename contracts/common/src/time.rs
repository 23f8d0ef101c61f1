//! Time Derivation
//!
//! There is no trusted clock on-ledger; the transaction's validity interval
//! is the only time evidence a validator has. Both defenses below are
//! required together: capping the window width alone still lets a submitter
//! shift the whole interval into the past, and picking a bound alone lets
//! them stretch the window until the bound is wherever they want it.

use crate::constants::time::MAX_VALIDITY_WINDOW_MS;
use crate::errors::{StakewellError, StakewellResult, TimeErrorReason};
use crate::types::{TimeBound, ValidityInterval};

/// Derive a single "current time" from a validity interval.
///
/// Fails unless both bounds are finite and the window is at most
/// [`MAX_VALIDITY_WINDOW_MS`] wide. Returns the upper bound: the latest
/// admissible instant is the conservative choice for reward accrual, since
/// it minimizes over-accrual when the window is gamed toward its edges.
pub fn derive_current_time(validity: &ValidityInterval) -> StakewellResult<u64> {
    let lower = match validity.lower_bound {
        TimeBound::Finite(t) => t,
        TimeBound::Unbounded => {
            return Err(StakewellError::MalformedTime {
                reason: TimeErrorReason::NonFiniteLowerBound,
            })
        }
    };
    let upper = match validity.upper_bound {
        TimeBound::Finite(t) => t,
        TimeBound::Unbounded => {
            return Err(StakewellError::MalformedTime {
                reason: TimeErrorReason::NonFiniteUpperBound,
            })
        }
    };

    if upper < lower {
        return Err(StakewellError::MalformedTime {
            reason: TimeErrorReason::InvertedBounds,
        });
    }
    let window_ms = upper - lower;
    if window_ms > MAX_VALIDITY_WINDOW_MS {
        return Err(StakewellError::MalformedTime {
            reason: TimeErrorReason::WindowTooWide { window_ms },
        });
    }

    Ok(upper)
}
