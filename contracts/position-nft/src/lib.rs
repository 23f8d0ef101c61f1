//! Position Identity Minting Policy
//!
//! CIP-68 style paired tokens per staking position:
//! - reference token (label 100): kept at the staking validator with the
//!   position record
//! - user token (label 222): held in the staker's wallet as the ownership
//!   handle
//!
//! Both names share the 32-byte position id and differ only by label.
//! Minting validates the full registration shape against the pool record
//! located through the pool identity NFT; burning requires the staking (or
//! pool) validator among the spent inputs, so token destruction can never
//! bypass the position logic.

use stakewell_common::{
    asset_quantity, cip68_reference_name, cip68_user_name, derive_current_time,
    find_output_with_asset, find_pool_record, pool_validator_hash_for, require_signature,
    script_input_present, AmountErrorReason, AssetClass, AssetName, BTreeMap, PolicyId, PositionId,
    PositionNftRedeemer, Redeemer, ScriptContext, ScriptPurpose, StakewellError, StakewellResult,
    Transaction,
};

/// Registry-compatible entry point
pub fn entry(ctx: &ScriptContext, redeemer: &Redeemer) -> StakewellResult<()> {
    match redeemer {
        Redeemer::PositionNft(redeemer) => validate(ctx, redeemer),
        _ => Err(StakewellError::Unauthorized {
            reason: "position identity policy received a foreign redeemer",
        }),
    }
}

/// Main validation entry point for minting/burning under this policy
pub fn validate(ctx: &ScriptContext, redeemer: &PositionNftRedeemer) -> StakewellResult<()> {
    let policy_id = match ctx.purpose {
        ScriptPurpose::Minting(policy) => policy,
        ScriptPurpose::Spending(_) => {
            return Err(StakewellError::Unauthorized {
                reason: "position identity policy only runs for minting",
            })
        }
    };

    let minted = ctx
        .tx
        .mint
        .assets_of(&policy_id)
        .ok_or(StakewellError::NotFound {
            what: "mint entries for position identity policy",
        })?;

    match redeemer {
        PositionNftRedeemer::MintPosition {
            position_id,
            pool_nft,
        } => validate_mint(ctx.tx, policy_id, minted, position_id, pool_nft),
        PositionNftRedeemer::BurnPosition {
            position_id,
            pool_nft,
        } => validate_burn(ctx.tx, policy_id, minted, position_id, pool_nft),
    }
}

/// Validate minting the reference/user pair for a new position. The whole
/// registration shape is checked here: the mint is only satisfiable as part
/// of a well-formed Register transaction.
fn validate_mint(
    tx: &Transaction,
    policy_id: PolicyId,
    minted: &BTreeMap<AssetName, i64>,
    position_id: &PositionId,
    pool_nft: &AssetClass,
) -> StakewellResult<()> {
    // 1. Locate the pool; this policy must be the one the pool datum names,
    //    or a foreign policy could impersonate positions of this pool
    let pool = find_pool_record(tx, &pool_nft.policy, &pool_nft.name)?;
    if pool.position_policy != policy_id {
        return Err(StakewellError::IdentityMismatch {
            expected_policy: pool.position_policy,
            expected_name: cip68_reference_name(position_id),
        });
    }
    if pool.paused {
        return Err(StakewellError::Unauthorized {
            reason: "pool is paused - no new stakes allowed",
        });
    }

    // 2. Exactly the pair, nothing else: one reference, one user token
    let reference_name = cip68_reference_name(position_id);
    let user_name = cip68_user_name(position_id);
    if minted.len() != 2
        || minted.get(&reference_name) != Some(&1)
        || minted.get(&user_name) != Some(&1)
    {
        return Err(StakewellError::IdentityMismatch {
            expected_policy: policy_id,
            expected_name: reference_name,
        });
    }

    // 3. The reference token lands at the staking validator with a sane
    //    initial position record
    let now = derive_current_time(&tx.validity)?;
    let created = find_output_with_asset(
        &tx.outputs,
        |address| address.is_script(&pool.staking_validator_hash),
        &policy_id,
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
    datum.validate_initial(now, pool.min_stake)?;

    // 4. Held stake tokens equal the datum's bookkeeping exactly
    let held = asset_quantity(
        &created.value,
        &pool.stake_token.policy,
        &pool.stake_token.name,
    );
    if held != datum.staked_amount {
        return Err(StakewellError::AmountInvariantViolation {
            reason: AmountErrorReason::ValueDatumMismatch {
                in_value: held,
                in_datum: datum.staked_amount,
            },
        });
    }

    // 5. The registrant signs and receives the user token
    require_signature(tx, &datum.owner_key, "position owner signature required")?;
    find_output_with_asset(
        &tx.outputs,
        |address| address.is_key(&datum.owner_key),
        &policy_id,
        &user_name,
    )?;

    Ok(())
}

/// Validate burning the pair on full exit: the staking validator (or the
/// pool validator, during closure sweeps) must be spent in the same
/// transaction, and exactly the pair is destroyed.
fn validate_burn(
    tx: &Transaction,
    policy_id: PolicyId,
    minted: &BTreeMap<AssetName, i64>,
    position_id: &PositionId,
    pool_nft: &AssetClass,
) -> StakewellResult<()> {
    // 1. Authorization comes from the validators, whose hashes live in the
    //    pool datum and the pool UTXO's own address - nothing is baked in
    let pool = find_pool_record(tx, &pool_nft.policy, &pool_nft.name)?;
    let pool_hash = pool_validator_hash_for(tx, &pool_nft.policy, &pool_nft.name)?;
    if !script_input_present(tx, &pool.staking_validator_hash)
        && !script_input_present(tx, &pool_hash)
    {
        return Err(StakewellError::Unauthorized {
            reason: "pool or staking validator must authorize the burn",
        });
    }

    // 2. Exactly the pair burned, matched by policy AND name
    let reference_name = cip68_reference_name(position_id);
    let user_name = cip68_user_name(position_id);
    if minted.len() != 2
        || minted.get(&reference_name) != Some(&-1)
        || minted.get(&user_name) != Some(&-1)
    {
        return Err(StakewellError::IdentityMismatch {
            expected_policy: policy_id,
            expected_name: reference_name,
        });
    }

    Ok(())
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use stakewell_common::{
        Address, Mint, OutputRef, PoolRecord, PositionRecord, RecordDatum, TxInput, TxOut,
        ValidityInterval, Value,
    };

    const USER: [u8; 28] = [1u8; 28];
    const STAKING_HASH: [u8; 28] = [10u8; 28];
    const POOL_HASH: [u8; 28] = [11u8; 28];
    const POOL_NFT_POLICY: [u8; 28] = [20u8; 28];
    const STAKE_POLICY: [u8; 28] = [21u8; 28];
    const POSITION_POLICY: [u8; 28] = [23u8; 28];
    const POSITION_ID: [u8; 32] = [7u8; 32];

    const T0: u64 = 1_700_000_000_000;

    fn pool_record() -> PoolRecord {
        PoolRecord {
            pool_nft: AssetClass::new(POOL_NFT_POLICY, vec![0xAA; 32]),
            stake_token: AssetClass::new(STAKE_POLICY, b"STAKE".to_vec()),
            reward_token: AssetClass::new([22u8; 28], b"REWARD".to_vec()),
            yield_rate_bps: 500,
            min_stake: 1_000,
            owner_key: [2u8; 28],
            pool_creator_key: [3u8; 28],
            total_staked: 0,
            staking_validator_hash: STAKING_HASH,
            position_policy: POSITION_POLICY,
            burn_address_hash: [12u8; 28],
            paused: false,
        }
    }

    fn position_record(staked: u64) -> PositionRecord {
        PositionRecord {
            pool_nft: pool_record().pool_nft,
            owner_key: USER,
            position_id: POSITION_ID,
            staked_amount: staked,
            staked_at: T0,
            last_claim_time: T0,
            total_claimed: 0,
        }
    }

    fn pool_reference(pool: &PoolRecord) -> TxInput {
        TxInput::new(
            OutputRef::new([2u8; 32], 0),
            TxOut::new(
                Address::script(POOL_HASH),
                Value::from_asset(pool.pool_nft.policy, pool.pool_nft.name.clone(), 1),
            )
            .with_datum(RecordDatum::Pool(pool.clone())),
        )
    }

    fn position_out(datum: &PositionRecord, pool: &PoolRecord) -> TxOut {
        let mut value = Value::from_asset(POSITION_POLICY, cip68_reference_name(&POSITION_ID), 1);
        value.add_asset(
            pool.stake_token.policy,
            pool.stake_token.name.clone(),
            datum.staked_amount,
        );
        TxOut::new(Address::script(STAKING_HASH), value)
            .with_datum(RecordDatum::Position(datum.clone()))
    }

    fn mint_tx(pool: &PoolRecord, datum: &PositionRecord) -> Transaction {
        let mut mint = Mint::new();
        mint.set(POSITION_POLICY, cip68_reference_name(&POSITION_ID), 1);
        mint.set(POSITION_POLICY, cip68_user_name(&POSITION_ID), 1);

        Transaction {
            id: [9u8; 32],
            reference_inputs: vec![pool_reference(pool)],
            outputs: vec![
                position_out(datum, pool),
                TxOut::new(
                    Address::pub_key(USER),
                    Value::from_asset(POSITION_POLICY, cip68_user_name(&POSITION_ID), 1),
                ),
            ],
            mint,
            signatories: vec![USER],
            validity: ValidityInterval::finite(T0 - 60_000, T0),
            ..Default::default()
        }
    }

    fn run(tx: &Transaction, redeemer: PositionNftRedeemer) -> StakewellResult<()> {
        let ctx = ScriptContext::minting(tx, POSITION_POLICY);
        validate(&ctx, &redeemer)
    }

    fn mint_redeemer() -> PositionNftRedeemer {
        PositionNftRedeemer::MintPosition {
            position_id: POSITION_ID,
            pool_nft: AssetClass::new(POOL_NFT_POLICY, vec![0xAA; 32]),
        }
    }

    #[test]
    fn test_mint_position_success() {
        let pool = pool_record();
        let datum = position_record(5_000);
        let tx = mint_tx(&pool, &datum);

        let result = run(&tx, mint_redeemer());
        assert!(result.is_ok(), "should succeed: {:?}", result);
    }

    #[test]
    fn test_mint_position_paused_pool() {
        let pool = pool_record().with_paused(true);
        let datum = position_record(5_000);
        let tx = mint_tx(&pool, &datum);

        assert!(matches!(
            run(&tx, mint_redeemer()),
            Err(StakewellError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_mint_position_requires_exact_pair() {
        let pool = pool_record();
        let datum = position_record(5_000);

        // Missing user token
        let mut tx = mint_tx(&pool, &datum);
        let mut mint = Mint::new();
        mint.set(POSITION_POLICY, cip68_reference_name(&POSITION_ID), 1);
        tx.mint = mint;
        assert!(matches!(
            run(&tx, mint_redeemer()),
            Err(StakewellError::IdentityMismatch { .. })
        ));

        // Duplicated reference token
        let mut tx = mint_tx(&pool, &datum);
        let mut mint = Mint::new();
        mint.set(POSITION_POLICY, cip68_reference_name(&POSITION_ID), 2);
        mint.set(POSITION_POLICY, cip68_user_name(&POSITION_ID), 1);
        tx.mint = mint;
        assert!(matches!(
            run(&tx, mint_redeemer()),
            Err(StakewellError::IdentityMismatch { .. })
        ));
    }

    #[test]
    fn test_mint_position_value_datum_divergence() {
        let pool = pool_record();
        let datum = position_record(5_000);
        let mut tx = mint_tx(&pool, &datum);

        // Datum says 5_000 but only 4_000 stake tokens arrive
        tx.outputs[0]
            .value
            .assets
            .get_mut(&STAKE_POLICY)
            .unwrap()
            .insert(b"STAKE".to_vec(), 4_000);

        assert!(matches!(
            run(&tx, mint_redeemer()),
            Err(StakewellError::AmountInvariantViolation {
                reason: AmountErrorReason::ValueDatumMismatch {
                    in_value: 4_000,
                    in_datum: 5_000,
                },
            })
        ));
    }

    #[test]
    fn test_mint_position_user_token_must_reach_owner() {
        let pool = pool_record();
        let datum = position_record(5_000);
        let mut tx = mint_tx(&pool, &datum);
        // User token sent to someone else's wallet
        tx.outputs[1].address = Address::pub_key([99u8; 28]);

        assert!(run(&tx, mint_redeemer()).is_err());
    }

    #[test]
    fn test_mint_position_foreign_policy_rejected() {
        let mut pool = pool_record();
        pool.position_policy = [99u8; 28]; // pool trusts a different policy
        let datum = position_record(5_000);
        let tx = mint_tx(&pool, &datum);

        assert!(matches!(
            run(&tx, mint_redeemer()),
            Err(StakewellError::IdentityMismatch { .. })
        ));
    }

    #[test]
    fn test_burn_position_requires_validator_co_spend() {
        let pool = pool_record();
        let mut mint = Mint::new();
        mint.set(POSITION_POLICY, cip68_reference_name(&POSITION_ID), -1);
        mint.set(POSITION_POLICY, cip68_user_name(&POSITION_ID), -1);

        // No staking/pool validator input
        let tx = Transaction {
            reference_inputs: vec![pool_reference(&pool)],
            mint: mint.clone(),
            ..Default::default()
        };
        let result = run(
            &tx,
            PositionNftRedeemer::BurnPosition {
                position_id: POSITION_ID,
                pool_nft: pool.pool_nft.clone(),
            },
        );
        assert!(matches!(result, Err(StakewellError::Unauthorized { .. })));

        // With the position UTXO spent the burn is authorized
        let datum = position_record(5_000);
        let tx = Transaction {
            inputs: vec![TxInput::new(
                OutputRef::new([3u8; 32], 0),
                position_out(&datum, &pool),
            )],
            reference_inputs: vec![pool_reference(&pool)],
            mint,
            ..Default::default()
        };
        let result = run(
            &tx,
            PositionNftRedeemer::BurnPosition {
                position_id: POSITION_ID,
                pool_nft: pool.pool_nft,
            },
        );
        assert!(result.is_ok(), "should succeed: {:?}", result);
    }

    #[test]
    fn test_burn_position_partial_pair_rejected() {
        let pool = pool_record();
        let datum = position_record(5_000);

        // Only the reference token burned
        let mut mint = Mint::new();
        mint.set(POSITION_POLICY, cip68_reference_name(&POSITION_ID), -1);

        let tx = Transaction {
            inputs: vec![TxInput::new(
                OutputRef::new([3u8; 32], 0),
                position_out(&datum, &pool),
            )],
            reference_inputs: vec![pool_reference(&pool)],
            mint,
            ..Default::default()
        };
        let result = run(
            &tx,
            PositionNftRedeemer::BurnPosition {
                position_id: POSITION_ID,
                pool_nft: pool.pool_nft,
            },
        );
        assert!(matches!(
            result,
            Err(StakewellError::IdentityMismatch { .. })
        ));
    }
}
