//! Reward Mathematics
//!
//! Integer arithmetic throughout. The reward formula applies a single floor
//! division at the end so rounding error never compounds.

use crate::constants::rewards::REWARD_DENOMINATOR;
use crate::constants::time::MS_PER_DAY;
use crate::errors::{AmountErrorReason, StakewellError, StakewellResult};

/// Whole days elapsed between the last claim and `now`, floored. Elapsed
/// time saturates at zero so a stale-but-admissible window cannot produce a
/// negative duration.
pub fn days_elapsed(last_claim: u64, now: u64) -> u64 {
    now.saturating_sub(last_claim) / MS_PER_DAY
}

/// Pending rewards: floor(stake * yield_bps * days / (365 * 10_000)).
///
/// # Arguments
/// * `staked_amount` - quantity of stake token held by the position
/// * `yield_rate_bps` - annual yield in basis points
/// * `last_claim` - POSIX ms of the previous claim
/// * `now` - derived current time, POSIX ms
pub fn calculate_rewards(
    staked_amount: u64,
    yield_rate_bps: u64,
    last_claim: u64,
    now: u64,
) -> StakewellResult<u64> {
    if staked_amount == 0 {
        return Ok(0);
    }

    let days = days_elapsed(last_claim, now);

    let reward = (staked_amount as u128)
        .checked_mul(yield_rate_bps as u128)
        .ok_or(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::Overflow,
        })?
        .checked_mul(days as u128)
        .ok_or(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::Overflow,
        })?
        / REWARD_DENOMINATOR;

    Ok(reward.min(u64::MAX as u128) as u64)
}
