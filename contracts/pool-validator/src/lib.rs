//! Pool State Machine Validator
//!
//! Governs the pool configuration UTXO: one per pool, carrying the pool
//! identity NFT, the pool parameters, and the reward-token treasury.
//!
//! ## Validation function, not a smart contract
//!
//! This is a pure predicate over a transaction snapshot. Every spend of the
//! pool UTXO re-validates from scratch: the spent input must hold the pool
//! NFT its own datum names (the NFT's non-forgeability is what makes the
//! datum trustworthy), and every transition fails closed - any datum field
//! not explicitly permitted to change must be identical in the continuing
//! output.
//!
//! The `AuthorizeUnstakeOrClaim` path is the cross-validator hinge: the pool
//! validator never moves treasury funds on its own account, but when a
//! position-side claim draws reward tokens, the treasury UTXO is spent here
//! while the staking validator is required among the same transaction's
//! inputs. Neither validator trusts the other's existence; each only trusts
//! the transaction shape.

use stakewell_common::{
    asset_quantity, find_continuing_output, find_own_input, nft_burned, require_asset,
    require_signature, script_input_present, AmountErrorReason, PoolRecord, PoolRedeemer, Redeemer,
    ScriptContext, ScriptPurpose, StakewellError, StakewellResult, Transaction, TxInput, TxOut,
};

/// Registry-compatible entry point
pub fn entry(ctx: &ScriptContext, redeemer: &Redeemer) -> StakewellResult<()> {
    match redeemer {
        Redeemer::Pool(redeemer) => validate(ctx, redeemer),
        _ => Err(StakewellError::Unauthorized {
            reason: "pool validator received a foreign redeemer",
        }),
    }
}

/// Main validation entry point for spending a pool UTXO
pub fn validate(ctx: &ScriptContext, redeemer: &PoolRedeemer) -> StakewellResult<()> {
    let own_ref = match ctx.purpose {
        ScriptPurpose::Spending(out_ref) => out_ref,
        ScriptPurpose::Minting(_) => {
            return Err(StakewellError::Unauthorized {
                reason: "pool validator only runs for spending",
            })
        }
    };

    let own = find_own_input(ctx.tx, &own_ref)?;
    let datum = own.resolved.pool_record().ok_or(StakewellError::NotFound {
        what: "pool datum on spent input",
    })?;

    // The pool NFT proves the datum is legitimate
    require_asset(
        &own.resolved.value,
        &datum.pool_nft.policy,
        &datum.pool_nft.name,
    )?;

    match redeemer {
        PoolRedeemer::FundTreasury { amount } => {
            validate_fund_treasury(ctx.tx, own, datum, *amount)
        }
        PoolRedeemer::WithdrawTreasury {
            amount,
            outstanding_rewards,
        } => validate_withdraw_treasury(ctx.tx, own, datum, *amount, *outstanding_rewards),
        PoolRedeemer::UpdateYield { new_yield_rate_bps } => {
            validate_update_yield(ctx.tx, own, datum, *new_yield_rate_bps)
        }
        PoolRedeemer::PausePool => validate_set_paused(ctx.tx, own, datum, true),
        PoolRedeemer::ResumePool => validate_set_paused(ctx.tx, own, datum, false),
        PoolRedeemer::ForceRefund => validate_force_refund(ctx.tx, own, datum),
        PoolRedeemer::AuthorizeUnstakeOrClaim => validate_authorize_draw(ctx.tx, own, datum),
        PoolRedeemer::ClosePool => validate_close_pool(ctx.tx, datum),
    }
}

// ============ Transition Checks ============

/// Validate adding reward tokens to the treasury (owner only)
fn validate_fund_treasury(
    tx: &Transaction,
    own: &TxInput,
    datum: &PoolRecord,
    amount: u64,
) -> StakewellResult<()> {
    // 1. Owner must sign
    require_signature(tx, &datum.owner_key, "pool owner signature required")?;
    require_positive(amount)?;

    // 2. Continuing output with the pool NFT, datum byte-identical
    let (cont, new_datum) = continuing_pool(tx, own, datum)?;
    if new_datum != datum {
        return Err(StakewellError::ContinuityViolation {
            field: "pool datum must not change on FundTreasury",
        });
    }

    // 3. Reward balance increased by at least the declared amount
    let old_rewards = treasury_balance(&own.resolved, datum);
    let new_rewards = treasury_balance(cont, datum);
    let expected = old_rewards
        .checked_add(amount)
        .ok_or(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::Overflow,
        })?;
    if new_rewards < expected {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::DeltaMismatch {
                expected,
                actual: new_rewards,
            },
        });
    }

    Ok(())
}

/// Validate withdrawing reward tokens from the treasury (owner only).
///
/// The continuing balance must stay at or above `outstanding_rewards`, the
/// liability bound over all open positions asserted by the redeemer: the
/// treasury can never be drained below committed rewards.
fn validate_withdraw_treasury(
    tx: &Transaction,
    own: &TxInput,
    datum: &PoolRecord,
    amount: u64,
    outstanding_rewards: u64,
) -> StakewellResult<()> {
    // 1. Owner must sign
    require_signature(tx, &datum.owner_key, "pool owner signature required")?;
    require_positive(amount)?;

    // 2. Continuing output, datum byte-identical
    let (cont, new_datum) = continuing_pool(tx, own, datum)?;
    if new_datum != datum {
        return Err(StakewellError::ContinuityViolation {
            field: "pool datum must not change on WithdrawTreasury",
        });
    }

    // 3. Reward balance decreased by the declared amount at most
    let old_rewards = treasury_balance(&own.resolved, datum);
    let new_rewards = treasury_balance(cont, datum);
    let max_remaining =
        old_rewards
            .checked_sub(amount)
            .ok_or(StakewellError::AmountInvariantViolation {
                reason: AmountErrorReason::ExceedsBalance {
                    available: old_rewards,
                    requested: amount,
                },
            })?;
    if new_rewards > old_rewards || old_rewards - new_rewards > amount {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::DeltaMismatch {
                expected: max_remaining,
                actual: new_rewards,
            },
        });
    }

    // 4. Never below outstanding committed rewards
    if new_rewards < outstanding_rewards {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::BelowCommitted {
                balance: new_rewards,
                committed: outstanding_rewards,
            },
        });
    }

    Ok(())
}

/// Validate a yield rate change (owner only); only `yield_rate_bps` may
/// differ in the continuing datum
fn validate_update_yield(
    tx: &Transaction,
    own: &TxInput,
    datum: &PoolRecord,
    new_yield_rate_bps: u64,
) -> StakewellResult<()> {
    require_signature(tx, &datum.owner_key, "pool owner signature required")?;

    if new_yield_rate_bps == 0
        || new_yield_rate_bps > stakewell_common::constants::limits::MAX_YIELD_RATE_BPS
    {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::RateOutOfRange {
                rate: new_yield_rate_bps,
            },
        });
    }

    let (_, new_datum) = continuing_pool(tx, own, datum)?;
    if *new_datum != datum.with_yield_rate(new_yield_rate_bps) {
        return Err(StakewellError::ContinuityViolation {
            field: "only yield_rate_bps may change on UpdateYield",
        });
    }

    Ok(())
}

/// Validate flipping the pause gate (owner only), legal direction only
fn validate_set_paused(
    tx: &Transaction,
    own: &TxInput,
    datum: &PoolRecord,
    paused: bool,
) -> StakewellResult<()> {
    require_signature(tx, &datum.owner_key, "pool owner signature required")?;

    if datum.paused == paused {
        return Err(StakewellError::ContinuityViolation {
            field: "pause transition must flip the paused flag",
        });
    }

    let (_, new_datum) = continuing_pool(tx, own, datum)?;
    if *new_datum != datum.with_paused(paused) {
        return Err(StakewellError::ContinuityViolation {
            field: "only paused may change on PausePool/ResumePool",
        });
    }

    Ok(())
}

/// Validate the pool side of a unilateral position refund (owner only,
/// paused pool). The position's unclaimed rewards are forfeited - accepted
/// behavior, not a defect.
fn validate_force_refund(tx: &Transaction, own: &TxInput, datum: &PoolRecord) -> StakewellResult<()> {
    require_signature(tx, &datum.owner_key, "pool owner signature required")?;

    if !datum.paused {
        return Err(StakewellError::Unauthorized {
            reason: "pool must be paused for force refund",
        });
    }
    // The position being refunded runs its own ForceRefund predicate
    if !script_input_present(tx, &datum.staking_validator_hash) {
        return Err(StakewellError::Unauthorized {
            reason: "staking validator must be spent to refund a position",
        });
    }

    let (cont, new_datum) = continuing_pool(tx, own, datum)?;
    if new_datum != datum {
        return Err(StakewellError::ContinuityViolation {
            field: "pool datum must not change on ForceRefund",
        });
    }

    // Refunds return the position's own stake; the treasury stays whole
    let old_rewards = treasury_balance(&own.resolved, datum);
    let new_rewards = treasury_balance(cont, datum);
    if new_rewards < old_rewards {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::DeltaMismatch {
                expected: old_rewards,
                actual: new_rewards,
            },
        });
    }

    Ok(())
}

/// Validate the co-authorization path for position-side treasury draws.
///
/// The pool moves no funds of its own will here: the staking validator must
/// be spent in the same transaction, proving the position logic concurred.
/// The exact draw amount is enforced position-side; this side pins the datum
/// and forbids any balance increase games.
fn validate_authorize_draw(tx: &Transaction, own: &TxInput, datum: &PoolRecord) -> StakewellResult<()> {
    if !script_input_present(tx, &datum.staking_validator_hash) {
        return Err(StakewellError::Unauthorized {
            reason: "staking validator must be spent to draw from the treasury",
        });
    }

    let (cont, new_datum) = continuing_pool(tx, own, datum)?;
    if new_datum != datum {
        return Err(StakewellError::ContinuityViolation {
            field: "pool datum must not change on AuthorizeUnstakeOrClaim",
        });
    }

    let old_rewards = treasury_balance(&own.resolved, datum);
    let new_rewards = treasury_balance(cont, datum);
    if new_rewards > old_rewards {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::DeltaMismatch {
                expected: old_rewards,
                actual: new_rewards,
            },
        });
    }

    Ok(())
}

/// Validate closing the pool: owner-signed, paused, identity token burned.
///
/// `total_staked` is not consulted - it is advisory, and if all position
/// UTXOs are gone there are no stakers. Burning the NFT is what makes the
/// pool permanently unusable.
fn validate_close_pool(tx: &Transaction, datum: &PoolRecord) -> StakewellResult<()> {
    require_signature(tx, &datum.owner_key, "pool owner signature required")?;

    if !datum.paused {
        return Err(StakewellError::Unauthorized {
            reason: "pool must be paused before closing",
        });
    }
    if !nft_burned(&tx.mint, &datum.pool_nft.policy, &datum.pool_nft.name) {
        return Err(StakewellError::ContinuityViolation {
            field: "pool identity token must be burned on ClosePool",
        });
    }

    Ok(())
}

// ============ Helpers ============

fn require_positive(amount: u64) -> StakewellResult<()> {
    if amount == 0 {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::ZeroAmount,
        });
    }
    Ok(())
}

fn treasury_balance(output: &TxOut, datum: &PoolRecord) -> u64 {
    asset_quantity(
        &output.value,
        &datum.reward_token.policy,
        &datum.reward_token.name,
    )
}

fn continuing_pool<'a>(
    tx: &'a Transaction,
    own: &TxInput,
    datum: &PoolRecord,
) -> StakewellResult<(&'a TxOut, &'a PoolRecord)> {
    let cont = find_continuing_output(
        &tx.outputs,
        &own.resolved.address,
        &datum.pool_nft.policy,
        &datum.pool_nft.name,
    )?;
    let new_datum = cont.pool_record().ok_or(StakewellError::NotFound {
        what: "pool datum on continuing output",
    })?;
    Ok((cont, new_datum))
}

// ============ Tests ============
