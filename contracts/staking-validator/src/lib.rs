//! Position State Machine Validator
//!
//! Governs user staking positions. Each position is a separate UTXO at this
//! validator holding the user's staked tokens, the CIP-68 reference token,
//! and the position record.
//!
//! No validator hashes are baked in: every spending path locates its pool
//! through the pool identity NFT - as a reference input for read-only paths
//! (Deposit, Withdraw, ForceRefund) and as a spent input for treasury draws
//! (Claim, Compound), where consuming the pool UTXO is exactly what forces
//! the pool validator's `AuthorizeUnstakeOrClaim` predicate to co-run.
//!
//! Registration has no prior position input, so it cannot be a spending
//! path; [`validate_register`] is the creation predicate, enforced jointly
//! with the position identity policy's minting check.

use stakewell_common::{
    asset_quantity, cip68_reference_name, cip68_user_name, derive_current_time,
    find_continuing_output, find_output_with_asset, find_own_input, find_pool_record,
    find_pool_record_spent, math, nft_burned, paid_to_key, require_asset, require_signature,
    AmountErrorReason, AssetClass, PoolRecord, PositionId, PositionRecord, Redeemer, ScriptContext,
    ScriptPurpose, StakewellError, StakewellResult, StakingRedeemer, Transaction, TxInput, TxOut,
};

/// Registry-compatible entry point
pub fn entry(ctx: &ScriptContext, redeemer: &Redeemer) -> StakewellResult<()> {
    match redeemer {
        Redeemer::Staking(redeemer) => validate(ctx, redeemer),
        _ => Err(StakewellError::Unauthorized {
            reason: "staking validator received a foreign redeemer",
        }),
    }
}

/// Main validation entry point for spending a position UTXO
pub fn validate(ctx: &ScriptContext, redeemer: &StakingRedeemer) -> StakewellResult<()> {
    let own_ref = match ctx.purpose {
        ScriptPurpose::Spending(out_ref) => out_ref,
        ScriptPurpose::Minting(_) => {
            return Err(StakewellError::Unauthorized {
                reason: "staking validator only runs for spending",
            })
        }
    };

    let own = find_own_input(ctx.tx, &own_ref)?;
    let datum = own.resolved.position_record().ok_or(StakewellError::NotFound {
        what: "position datum on spent input",
    })?;

    match redeemer {
        StakingRedeemer::Register { .. } => Err(StakewellError::Unauthorized {
            reason: "register creates a position, it cannot spend one",
        }),
        StakingRedeemer::Deposit { amount } => validate_deposit(ctx.tx, own, datum, *amount),
        StakingRedeemer::Withdraw { amount } => validate_withdraw(ctx.tx, own, datum, *amount),
        StakingRedeemer::Claim => validate_claim(ctx.tx, own, datum),
        StakingRedeemer::Compound => validate_compound(ctx.tx, own, datum),
        StakingRedeemer::ForceRefund => validate_force_refund(ctx.tx, datum),
    }
}

// ============ Creation Predicate ============

/// Validate the shape of a registration transaction.
///
/// There is no prior position input: the transaction must reference an
/// active, unpaused pool, mint exactly the CIP-68 pair, and create the
/// position output at the pool's staking validator holding exactly the
/// initial deposit plus the reference token, with both timestamps set to
/// the derived current time.
pub fn validate_register(
    tx: &Transaction,
    position_id: &PositionId,
    pool_nft: &AssetClass,
    initial_deposit: u64,
) -> StakewellResult<()> {
    // 1. Pool must be visible and open for new stakes
    let pool = find_pool_record(tx, &pool_nft.policy, &pool_nft.name)?;
    if pool.paused {
        return Err(StakewellError::Unauthorized {
            reason: "pool is paused - no new stakes allowed",
        });
    }
    if initial_deposit < pool.min_stake {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::BelowMinimum {
                amount: initial_deposit,
                minimum: pool.min_stake,
            },
        });
    }

    // 2. Derive the registration time from the validity interval
    let now = derive_current_time(&tx.validity)?;

    // 3. The reference token must land at the staking validator with the
    //    new position record
    let reference_name = cip68_reference_name(position_id);
    let created = find_output_with_asset(
        &tx.outputs,
        |address| address.is_script(&pool.staking_validator_hash),
        &pool.position_policy,
        &reference_name,
    )?;
    let datum = created.position_record().ok_or(StakewellError::NotFound {
        what: "position datum on created output",
    })?;

    if datum.pool_nft != *pool_nft {
        return Err(StakewellError::IdentityMismatch {
            expected_policy: pool_nft.policy,
            expected_name: pool_nft.name.clone(),
        });
    }
    if datum.position_id != *position_id {
        return Err(StakewellError::ContinuityViolation {
            field: "position_id must match the minted pair",
        });
    }
    if datum.staked_amount != initial_deposit {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::DeltaMismatch {
                expected: initial_deposit,
                actual: datum.staked_amount,
            },
        });
    }
    datum.validate_initial(now, pool.min_stake)?;

    // 4. Held stake tokens equal the datum's bookkeeping exactly
    check_value_matches_datum(created, pool, datum.staked_amount)?;

    // 5. Exactly the reference/user pair is minted for this position
    let user_name = cip68_user_name(position_id);
    if !stakewell_common::nft_minted(&tx.mint, &pool.position_policy, &reference_name)
        || !stakewell_common::nft_minted(&tx.mint, &pool.position_policy, &user_name)
    {
        return Err(StakewellError::IdentityMismatch {
            expected_policy: pool.position_policy,
            expected_name: reference_name,
        });
    }

    // 6. The registrant owns the position they are creating
    require_signature(tx, &datum.owner_key, "position owner signature required")?;

    // 7. The user token goes to the owner's wallet
    find_output_with_asset(
        &tx.outputs,
        |address| address.is_key(&datum.owner_key),
        &pool.position_policy,
        &user_name,
    )?;

    Ok(())
}

// ============ Spending Transitions ============

/// Validate adding tokens to an existing position.
///
/// `last_claim_time` is deliberately NOT reset: one running clock per
/// position, so deposits cannot be used to dodge time-based accounting.
fn validate_deposit(
    tx: &Transaction,
    own: &TxInput,
    datum: &PositionRecord,
    amount: u64,
) -> StakewellResult<()> {
    // 1. User must sign
    require_signature(tx, &datum.owner_key, "position owner signature required")?;
    if amount == 0 {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::ZeroAmount,
        });
    }

    // 2. Pool must be open (read via reference input)
    let pool = find_pool_record(tx, &datum.pool_nft.policy, &datum.pool_nft.name)?;
    if pool.paused {
        return Err(StakewellError::Unauthorized {
            reason: "pool is paused - no deposits allowed",
        });
    }

    // 3. Identity proof on the spent input
    let reference_name = cip68_reference_name(&datum.position_id);
    require_asset(&own.resolved.value, &pool.position_policy, &reference_name)?;

    // 4. Continuing output: staked_amount grows by exactly the deposit,
    //    everything else (the claim clock included) untouched
    let (cont, new_datum) = continuing_position(tx, own, pool, datum)?;
    let new_stake =
        datum
            .staked_amount
            .checked_add(amount)
            .ok_or(StakewellError::AmountInvariantViolation {
                reason: AmountErrorReason::Overflow,
            })?;
    if *new_datum != datum.with_stake(new_stake) {
        return Err(StakewellError::ContinuityViolation {
            field: "deposit may only change staked_amount",
        });
    }

    // 5. Value and datum never diverge
    check_value_matches_datum(cont, pool, new_stake)?;

    Ok(())
}

/// Validate removing tokens from a position. `amount == staked_amount` is a
/// full exit and must burn the CIP-68 pair; anything less keeps a continuing
/// output with the pair intact.
fn validate_withdraw(
    tx: &Transaction,
    own: &TxInput,
    datum: &PositionRecord,
    amount: u64,
) -> StakewellResult<()> {
    // 1. User must sign
    require_signature(tx, &datum.owner_key, "position owner signature required")?;
    if amount == 0 {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::ZeroAmount,
        });
    }
    if amount > datum.staked_amount {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::ExceedsBalance {
                available: datum.staked_amount,
                requested: amount,
            },
        });
    }

    // 2. Pool read (withdrawals stay allowed while paused)
    let pool = find_pool_record(tx, &datum.pool_nft.policy, &datum.pool_nft.name)?;
    let reference_name = cip68_reference_name(&datum.position_id);
    require_asset(&own.resolved.value, &pool.position_policy, &reference_name)?;

    if amount == datum.staked_amount {
        // 3a. Full exit: both identity tokens burned, matched by policy AND
        //     name, no continuing output
        let user_name = cip68_user_name(&datum.position_id);
        if !nft_burned(&tx.mint, &pool.position_policy, &reference_name)
            || !nft_burned(&tx.mint, &pool.position_policy, &user_name)
        {
            return Err(StakewellError::ContinuityViolation {
                field: "full withdraw must burn the position identity pair",
            });
        }
        return Ok(());
    }

    // 3b. Partial: continuing output with the pair intact and the
    //     decremented amount
    let (cont, new_datum) = continuing_position(tx, own, pool, datum)?;
    let new_stake = datum.staked_amount - amount;
    if *new_datum != datum.with_stake(new_stake) {
        return Err(StakewellError::ContinuityViolation {
            field: "withdraw may only change staked_amount",
        });
    }
    check_value_matches_datum(cont, pool, new_stake)?;

    Ok(())
}

/// Validate claiming pending rewards.
///
/// The pool treasury UTXO must be SPENT (not merely referenced) so the pool
/// validator's `AuthorizeUnstakeOrClaim` predicate co-runs; the draw must
/// equal the computed rewards exactly, and the claim clock advances to the
/// derived current time. A claim with zero elapsed days is valid: rewards
/// are zero, nothing moves, the clock still updates.
fn validate_claim(tx: &Transaction, own: &TxInput, datum: &PositionRecord) -> StakewellResult<()> {
    // 1. User must sign
    require_signature(tx, &datum.owner_key, "position owner signature required")?;

    // 2. Treasury draw requires the pool among spent inputs
    let (pool_input, pool) =
        find_pool_record_spent(tx, &datum.pool_nft.policy, &datum.pool_nft.name)?;

    let reference_name = cip68_reference_name(&datum.position_id);
    require_asset(&own.resolved.value, &pool.position_policy, &reference_name)?;

    // 3. Time and rewards
    let now = derive_current_time(&tx.validity)?;
    if now < datum.last_claim_time {
        return Err(StakewellError::ContinuityViolation {
            field: "last_claim_time may not move backward",
        });
    }
    let rewards = math::calculate_rewards(
        datum.staked_amount,
        pool.yield_rate_bps,
        datum.last_claim_time,
        now,
    )?;

    // 4. Reward cap: the treasury must cover the claim
    let treasury = treasury_balance(&pool_input.resolved, pool);
    if rewards > treasury {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::TreasuryInsufficient {
                available: treasury,
                required: rewards,
            },
        });
    }

    // 5. The draw out of the continuing pool output equals the rewards
    //    exactly
    check_exact_draw(tx, pool_input, pool, rewards)?;

    // 6. The owner is paid the full rewards
    if rewards > 0
        && !paid_to_key(
            tx,
            &datum.owner_key,
            &pool.reward_token.policy,
            &pool.reward_token.name,
            rewards,
        )
    {
        return Err(StakewellError::NotFound {
            what: "reward payout to position owner",
        });
    }

    // 7. Continuing position: clock advanced, lifetime total bumped,
    //    stake untouched
    let (cont, new_datum) = continuing_position(tx, own, pool, datum)?;
    if *new_datum != datum.with_claim(now, rewards) {
        return Err(StakewellError::ContinuityViolation {
            field: "claim may only advance last_claim_time and total_claimed",
        });
    }
    check_value_matches_datum(cont, pool, datum.staked_amount)?;

    Ok(())
}

/// Validate restaking pending rewards instead of paying them out. Only
/// sound when the pool pays rewards in the stake token itself.
fn validate_compound(tx: &Transaction, own: &TxInput, datum: &PositionRecord) -> StakewellResult<()> {
    // 1. User must sign
    require_signature(tx, &datum.owner_key, "position owner signature required")?;

    // 2. Treasury draw requires the pool among spent inputs
    let (pool_input, pool) =
        find_pool_record_spent(tx, &datum.pool_nft.policy, &datum.pool_nft.name)?;

    // 3. Restaking reward units only makes sense when the assets coincide
    if pool.stake_token != pool.reward_token {
        return Err(StakewellError::IdentityMismatch {
            expected_policy: pool.stake_token.policy,
            expected_name: pool.stake_token.name.clone(),
        });
    }

    let reference_name = cip68_reference_name(&datum.position_id);
    require_asset(&own.resolved.value, &pool.position_policy, &reference_name)?;

    // 4. Time and rewards; compounding zero is pure noise
    let now = derive_current_time(&tx.validity)?;
    if now < datum.last_claim_time {
        return Err(StakewellError::ContinuityViolation {
            field: "last_claim_time may not move backward",
        });
    }
    let rewards = math::calculate_rewards(
        datum.staked_amount,
        pool.yield_rate_bps,
        datum.last_claim_time,
        now,
    )?;
    if rewards == 0 {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::ZeroAmount,
        });
    }

    // 5. Treasury must cover the restaked rewards, drawn exactly
    let treasury = treasury_balance(&pool_input.resolved, pool);
    if rewards > treasury {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::TreasuryInsufficient {
                available: treasury,
                required: rewards,
            },
        });
    }
    check_exact_draw(tx, pool_input, pool, rewards)?;

    // 6. Continuing position: stake grown by the rewards, clock advanced
    let (cont, new_datum) = continuing_position(tx, own, pool, datum)?;
    if *new_datum != datum.with_compound(now, rewards) {
        return Err(StakewellError::ContinuityViolation {
            field: "compound may only grow the stake and advance the clock",
        });
    }
    check_value_matches_datum(cont, pool, new_datum.staked_amount)?;

    Ok(())
}

/// Validate a pool-owner initiated refund of the whole position.
///
/// Owner-initiated, no user signature: the pool must be paused, the
/// reference token goes to the burn-address script (matched by policy AND
/// name - a forged token with a matching name cannot satisfy the check),
/// and the staked tokens go back to the position owner. Pending rewards are
/// forfeited; stakers should claim before a pool is paused.
fn validate_force_refund(tx: &Transaction, datum: &PositionRecord) -> StakewellResult<()> {
    // 1. Pool must be paused
    let pool = find_pool_record(tx, &datum.pool_nft.policy, &datum.pool_nft.name)?;
    if !pool.paused {
        return Err(StakewellError::Unauthorized {
            reason: "pool must be paused for force refund",
        });
    }

    // 2. Pool owner signs, not the user
    require_signature(tx, &pool.owner_key, "pool owner signature required")?;

    // 3. Reference token retired to the burn-address script
    let reference_name = cip68_reference_name(&datum.position_id);
    find_output_with_asset(
        &tx.outputs,
        |address| address.is_script(&pool.burn_address_hash),
        &pool.position_policy,
        &reference_name,
    )?;

    // 4. Staked tokens returned to the position owner
    if !paid_to_key(
        tx,
        &datum.owner_key,
        &pool.stake_token.policy,
        &pool.stake_token.name,
        datum.staked_amount,
    ) {
        return Err(StakewellError::NotFound {
            what: "stake refund to position owner",
        });
    }

    Ok(())
}

// ============ Helpers ============

fn treasury_balance(output: &TxOut, pool: &PoolRecord) -> u64 {
    asset_quantity(
        &output.value,
        &pool.reward_token.policy,
        &pool.reward_token.name,
    )
}

/// The continuing pool output must exist and its reward balance must drop
/// by exactly `rewards`
fn check_exact_draw(
    tx: &Transaction,
    pool_input: &TxInput,
    pool: &PoolRecord,
    rewards: u64,
) -> StakewellResult<()> {
    let pool_cont = find_continuing_output(
        &tx.outputs,
        &pool_input.resolved.address,
        &pool.pool_nft.policy,
        &pool.pool_nft.name,
    )?;
    let before = treasury_balance(&pool_input.resolved, pool);
    let after = treasury_balance(pool_cont, pool);
    let drawn = before.saturating_sub(after);
    if after > before || drawn != rewards {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::DeltaMismatch {
                expected: rewards,
                actual: drawn,
            },
        });
    }
    Ok(())
}

fn continuing_position<'a>(
    tx: &'a Transaction,
    own: &TxInput,
    pool: &PoolRecord,
    datum: &PositionRecord,
) -> StakewellResult<(&'a TxOut, &'a PositionRecord)> {
    let reference_name = cip68_reference_name(&datum.position_id);
    let cont = find_continuing_output(
        &tx.outputs,
        &own.resolved.address,
        &pool.position_policy,
        &reference_name,
    )?;
    let new_datum = cont.position_record().ok_or(StakewellError::NotFound {
        what: "position datum on continuing output",
    })?;
    Ok((cont, new_datum))
}

/// The stake tokens held by the output must equal the datum's bookkeeping
/// field exactly - value and datum never diverge
fn check_value_matches_datum(
    output: &TxOut,
    pool: &PoolRecord,
    expected_stake: u64,
) -> StakewellResult<()> {
    let held = asset_quantity(
        &output.value,
        &pool.stake_token.policy,
        &pool.stake_token.name,
    );
    if held != expected_stake {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::ValueDatumMismatch {
                in_value: held,
                in_datum: expected_stake,
            },
        });
    }
    Ok(())
}


// ============ Tests ============
