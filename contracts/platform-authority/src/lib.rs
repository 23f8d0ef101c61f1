//! Platform Authority Minting Policy
//!
//! One-shot NFT identifying the canonical platform authority record - the
//! root of pool-creation authority. The token name is the SHA-256 of the
//! first input's transaction id; consuming that input is what makes the
//! policy satisfiable exactly once, platform-wide, forever. What proves a
//! record is THE authority is the token's presence, not any reproducible
//! datum content.

use stakewell_common::{
    asset_quantity, holds_asset, one_shot_token_name, require_signature, AssetName,
    AuthorityRedeemer, PlatformAuthorityRecord, PolicyId, Redeemer, ScriptContext, ScriptPurpose,
    StakewellError, StakewellResult, Transaction,
};

/// Registry-compatible entry point
pub fn entry(ctx: &ScriptContext, redeemer: &Redeemer) -> StakewellResult<()> {
    match redeemer {
        Redeemer::Authority(redeemer) => validate(ctx, redeemer),
        _ => Err(StakewellError::Unauthorized {
            reason: "platform authority policy received a foreign redeemer",
        }),
    }
}

/// Main validation entry point for minting/burning under this policy
pub fn validate(ctx: &ScriptContext, redeemer: &AuthorityRedeemer) -> StakewellResult<()> {
    let policy_id = match ctx.purpose {
        ScriptPurpose::Minting(policy) => policy,
        ScriptPurpose::Spending(_) => {
            return Err(StakewellError::Unauthorized {
                reason: "platform authority policy only runs for minting",
            })
        }
    };

    match redeemer {
        AuthorityRedeemer::MintAuthority { output_index } => {
            validate_mint(ctx.tx, policy_id, *output_index)
        }
        AuthorityRedeemer::BurnAuthority => validate_burn(ctx.tx, policy_id),
    }
}

fn validate_mint(tx: &Transaction, policy_id: PolicyId, output_index: u32) -> StakewellResult<()> {
    // 1. One-shot token name from the first consumed input
    let first_input = tx.inputs.first().ok_or(StakewellError::NotFound {
        what: "transaction input for one-shot naming",
    })?;
    let token_name: AssetName = one_shot_token_name(&first_input.out_ref).to_vec();

    // 2. Exactly one token of exactly that name
    let minted = tx.mint.assets_of(&policy_id).ok_or(StakewellError::NotFound {
        what: "mint entries for platform authority policy",
    })?;
    if minted.len() != 1 || minted.get(&token_name) != Some(&1) {
        return Err(StakewellError::IdentityMismatch {
            expected_policy: policy_id,
            expected_name: token_name,
        });
    }

    // 3. The target output holds the NFT and a self-consistent record
    let target = tx
        .outputs
        .get(output_index as usize)
        .ok_or(StakewellError::NotFound {
            what: "mint target output",
        })?;
    if asset_quantity(&target.value, &policy_id, &token_name) != 1 {
        return Err(StakewellError::IdentityMismatch {
            expected_policy: policy_id,
            expected_name: token_name,
        });
    }
    let datum = target.authority_record().ok_or(StakewellError::NotFound {
        what: "authority datum on mint target",
    })?;
    if datum.authority_nft.policy != policy_id || datum.authority_nft.name != token_name {
        return Err(StakewellError::IdentityMismatch {
            expected_policy: policy_id,
            expected_name: token_name,
        });
    }

    Ok(())
}

/// Burning retires the platform (migration path): only negative quantities,
/// and the platform admin named by the spent authority record must sign.
fn validate_burn(tx: &Transaction, policy_id: PolicyId) -> StakewellResult<()> {
    let minted = tx.mint.assets_of(&policy_id).ok_or(StakewellError::NotFound {
        what: "mint entries for platform authority policy",
    })?;
    for quantity in minted.values() {
        if *quantity >= 0 {
            return Err(StakewellError::Unauthorized {
                reason: "burn redeemer cannot mint",
            });
        }
    }

    let record = spent_authority_record(tx, &policy_id).ok_or(StakewellError::NotFound {
        what: "authority record among spent inputs",
    })?;
    require_signature(tx, &record.platform_admin_key, "platform admin signature required")?;

    Ok(())
}

fn spent_authority_record<'a>(
    tx: &'a Transaction,
    policy_id: &PolicyId,
) -> Option<&'a PlatformAuthorityRecord> {
    tx.inputs.iter().find_map(|input| {
        let record = input.resolved.authority_record()?;
        if record.authority_nft.policy == *policy_id
            && holds_asset(
                &input.resolved.value,
                &record.authority_nft.policy,
                &record.authority_nft.name,
            )
        {
            Some(record)
        } else {
            None
        }
    })
}

// ============ Tests ============
