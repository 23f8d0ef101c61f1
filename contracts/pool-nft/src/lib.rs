//! Pool Identity Minting Policy
//!
//! Only tokens from this policy are trusted by the pool validator as pool
//! identities. The token name is the SHA-256 of the first input's
//! transaction id: that input is consumable exactly once, so the name can
//! never be minted a second time.
//!
//! Minting is gated by the platform authority record, presented as a
//! reference input: the transaction must be signed by the record's
//! `pool_creator_key`, and the freshly created pool datum must carry that
//! same key as its audit trail.
//!
//! Burning carries no checks of its own beyond refusing positive
//! quantities: the pool NFT can only leave the pool UTXO by spending it,
//! which forces the pool validator's ClosePool predicate (owner signature,
//! paused pool) in the same transaction.

use stakewell_common::{
    asset_quantity, find_authority_record, one_shot_token_name, require_signature, AssetName,
    PolicyId, PoolNftRedeemer, Redeemer, ScriptContext, ScriptPurpose, StakewellError,
    StakewellResult, Transaction,
};

/// Registry-compatible entry point
pub fn entry(ctx: &ScriptContext, redeemer: &Redeemer) -> StakewellResult<()> {
    match redeemer {
        Redeemer::PoolNft(redeemer) => validate(ctx, redeemer),
        _ => Err(StakewellError::Unauthorized {
            reason: "pool identity policy received a foreign redeemer",
        }),
    }
}

/// Main validation entry point for minting/burning under this policy
pub fn validate(ctx: &ScriptContext, redeemer: &PoolNftRedeemer) -> StakewellResult<()> {
    let policy_id = match ctx.purpose {
        ScriptPurpose::Minting(policy) => policy,
        ScriptPurpose::Spending(_) => {
            return Err(StakewellError::Unauthorized {
                reason: "pool identity policy only runs for minting",
            })
        }
    };

    match redeemer {
        PoolNftRedeemer::MintPool {
            output_index,
            pool_validator_hash,
            authority_nft,
        } => validate_mint(
            ctx.tx,
            policy_id,
            *output_index,
            pool_validator_hash,
            authority_nft,
        ),
        PoolNftRedeemer::BurnPool => validate_burn(ctx.tx, policy_id),
    }
}

fn validate_mint(
    tx: &Transaction,
    policy_id: PolicyId,
    output_index: u32,
    pool_validator_hash: &[u8; 28],
    authority_nft: &stakewell_common::AssetClass,
) -> StakewellResult<()> {
    // 1. The platform authority record must be visible and its designated
    //    pool creator must have signed
    let authority = find_authority_record(tx, &authority_nft.policy, &authority_nft.name)?;
    require_signature(
        tx,
        &authority.pool_creator_key,
        "platform pool creator signature required",
    )?;

    // 2. One-shot token name from the first consumed input
    let first_input = tx.inputs.first().ok_or(StakewellError::NotFound {
        what: "transaction input for one-shot naming",
    })?;
    let token_name: AssetName = one_shot_token_name(&first_input.out_ref).to_vec();

    // 3. Exactly one token of exactly that name
    let minted = tx.mint.assets_of(&policy_id).ok_or(StakewellError::NotFound {
        what: "mint entries for pool identity policy",
    })?;
    if minted.len() != 1 || minted.get(&token_name) != Some(&1) {
        return Err(StakewellError::IdentityMismatch {
            expected_policy: policy_id,
            expected_name: token_name,
        });
    }

    // 4. The NFT lands at the pool validator named by the redeemer
    let target = tx
        .outputs
        .get(output_index as usize)
        .ok_or(StakewellError::NotFound {
            what: "mint target output",
        })?;
    if !target.address.is_script(pool_validator_hash) {
        return Err(StakewellError::ContinuityViolation {
            field: "pool record must sit at the pool validator",
        });
    }
    if asset_quantity(&target.value, &policy_id, &token_name) != 1 {
        return Err(StakewellError::IdentityMismatch {
            expected_policy: policy_id,
            expected_name: token_name,
        });
    }

    // 5. The target carries a sane initial pool record naming this NFT
    let datum = target.pool_record().ok_or(StakewellError::NotFound {
        what: "pool datum on mint target",
    })?;
    datum.validate_initial(&policy_id, &token_name)?;

    // 6. The audit-trail key matches the authority that allowed this pool
    if datum.pool_creator_key != authority.pool_creator_key {
        return Err(StakewellError::Unauthorized {
            reason: "pool_creator_key must match the platform authority record",
        });
    }

    Ok(())
}

fn validate_burn(tx: &Transaction, policy_id: PolicyId) -> StakewellResult<()> {
    let minted = tx.mint.assets_of(&policy_id).ok_or(StakewellError::NotFound {
        what: "mint entries for pool identity policy",
    })?;
    for quantity in minted.values() {
        if *quantity >= 0 {
            return Err(StakewellError::Unauthorized {
                reason: "burn redeemer cannot mint",
            });
        }
    }
    Ok(())
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use stakewell_common::{
        Address, AssetClass, Mint, OutputRef, PlatformAuthorityRecord, PoolRecord, RecordDatum,
        TxInput, TxOut, Value,
    };

    const CREATOR: [u8; 28] = [1u8; 28];
    const ADMIN: [u8; 28] = [2u8; 28];
    const POOL_OWNER: [u8; 28] = [3u8; 28];
    const POOL_HASH: [u8; 28] = [10u8; 28];
    const POOL_NFT_POLICY: [u8; 28] = [20u8; 28];
    const AUTHORITY_POLICY: [u8; 28] = [30u8; 28];

    fn authority_record() -> PlatformAuthorityRecord {
        PlatformAuthorityRecord {
            pool_creator_key: CREATOR,
            platform_admin_key: ADMIN,
            authority_nft: AssetClass::new(AUTHORITY_POLICY, vec![0xBB; 32]),
        }
    }

    fn authority_reference() -> TxInput {
        let record = authority_record();
        TxInput::new(
            OutputRef::new([5u8; 32], 0),
            TxOut::new(
                Address::pub_key(ADMIN),
                Value::from_asset(AUTHORITY_POLICY, vec![0xBB; 32], 1),
            )
            .with_datum(RecordDatum::Authority(record)),
        )
    }

    fn seed_input() -> TxInput {
        TxInput::new(
            OutputRef::new([6u8; 32], 0),
            TxOut::new(Address::pub_key(CREATOR), Value::new().with_lovelace(5_000_000)),
        )
    }

    fn pool_record(token_name: &[u8]) -> PoolRecord {
        PoolRecord {
            pool_nft: AssetClass::new(POOL_NFT_POLICY, token_name.to_vec()),
            stake_token: AssetClass::new([21u8; 28], b"STAKE".to_vec()),
            reward_token: AssetClass::new([22u8; 28], b"REWARD".to_vec()),
            yield_rate_bps: 500,
            min_stake: 1_000,
            owner_key: POOL_OWNER,
            pool_creator_key: CREATOR,
            total_staked: 0,
            staking_validator_hash: [11u8; 28],
            position_policy: [23u8; 28],
            burn_address_hash: [12u8; 28],
            paused: false,
        }
    }

    fn mint_tx() -> (Transaction, AssetName) {
        let seed = seed_input();
        let token_name = one_shot_token_name(&seed.out_ref).to_vec();

        let mut mint = Mint::new();
        mint.set(POOL_NFT_POLICY, token_name.clone(), 1);

        let pool_out = TxOut::new(
            Address::script(POOL_HASH),
            Value::from_asset(POOL_NFT_POLICY, token_name.clone(), 1),
        )
        .with_datum(RecordDatum::Pool(pool_record(&token_name)));

        let tx = Transaction {
            id: [9u8; 32],
            inputs: vec![seed],
            reference_inputs: vec![authority_reference()],
            outputs: vec![pool_out],
            mint,
            signatories: vec![CREATOR],
            ..Default::default()
        };
        (tx, token_name)
    }

    fn run_mint(tx: &Transaction) -> StakewellResult<()> {
        let ctx = ScriptContext::minting(tx, POOL_NFT_POLICY);
        validate(
            &ctx,
            &PoolNftRedeemer::MintPool {
                output_index: 0,
                pool_validator_hash: POOL_HASH,
                authority_nft: AssetClass::new(AUTHORITY_POLICY, vec![0xBB; 32]),
            },
        )
    }

    #[test]
    fn test_mint_pool_success() {
        let (tx, _) = mint_tx();
        let result = run_mint(&tx);
        assert!(result.is_ok(), "should succeed: {:?}", result);
    }

    #[test]
    fn test_mint_pool_requires_creator_signature() {
        let (mut tx, _) = mint_tx();
        tx.signatories = vec![POOL_OWNER];

        assert!(matches!(
            run_mint(&tx),
            Err(StakewellError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_mint_pool_requires_authority_reference() {
        let (mut tx, _) = mint_tx();
        tx.reference_inputs.clear();

        assert!(matches!(run_mint(&tx), Err(StakewellError::NotFound { .. })));
    }

    #[test]
    fn test_mint_pool_wrong_token_name() {
        let (mut tx, _) = mint_tx();
        // Mint a name not derived from the first input
        let mut mint = Mint::new();
        mint.set(POOL_NFT_POLICY, vec![0xCC; 32], 1);
        tx.mint = mint;

        assert!(matches!(
            run_mint(&tx),
            Err(StakewellError::IdentityMismatch { .. })
        ));
    }

    #[test]
    fn test_mint_pool_extra_tokens_rejected() {
        let (mut tx, token_name) = mint_tx();
        let mut mint = Mint::new();
        mint.set(POOL_NFT_POLICY, token_name, 1);
        mint.set(POOL_NFT_POLICY, b"EXTRA".to_vec(), 1);
        tx.mint = mint;

        assert!(matches!(
            run_mint(&tx),
            Err(StakewellError::IdentityMismatch { .. })
        ));
    }

    #[test]
    fn test_mint_pool_wrong_address() {
        let (mut tx, _) = mint_tx();
        tx.outputs[0].address = Address::script([99u8; 28]);

        assert!(matches!(
            run_mint(&tx),
            Err(StakewellError::ContinuityViolation { .. })
        ));
    }

    #[test]
    fn test_mint_pool_rejects_paused_or_staked_datum() {
        let (tx, token_name) = mint_tx();

        let mut paused = tx.clone();
        let record = pool_record(&token_name).with_paused(true);
        paused.outputs[0].datum = Some(RecordDatum::Pool(record));
        assert!(run_mint(&paused).is_err());

        let mut staked = tx;
        let record = pool_record(&token_name).with_total_staked(1);
        staked.outputs[0].datum = Some(RecordDatum::Pool(record));
        assert!(run_mint(&staked).is_err());
    }

    #[test]
    fn test_mint_pool_audit_key_must_match_authority() {
        let (mut tx, token_name) = mint_tx();
        let mut record = pool_record(&token_name);
        record.pool_creator_key = [99u8; 28];
        tx.outputs[0].datum = Some(RecordDatum::Pool(record));

        assert!(matches!(
            run_mint(&tx),
            Err(StakewellError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_burn_rejects_positive_quantities() {
        let mut mint = Mint::new();
        mint.set(POOL_NFT_POLICY, vec![0xAA; 32], -1);
        let tx = Transaction {
            mint,
            ..Default::default()
        };
        let ctx = ScriptContext::minting(&tx, POOL_NFT_POLICY);
        assert!(validate(&ctx, &PoolNftRedeemer::BurnPool).is_ok());

        let mut mint = Mint::new();
        mint.set(POOL_NFT_POLICY, vec![0xAA; 32], 1);
        let tx = Transaction {
            mint,
            ..Default::default()
        };
        let ctx = ScriptContext::minting(&tx, POOL_NFT_POLICY);
        assert!(matches!(
            validate(&ctx, &PoolNftRedeemer::BurnPool),
            Err(StakewellError::Unauthorized { .. })
        ));
    }
}
