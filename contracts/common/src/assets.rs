//! NFT Identity Matching and Transaction Shape Primitives
//!
//! Every check here matches BOTH the minting policy and the token name,
//! never either alone: a name-only or policy-only check admits substitution
//! of a forged asset that coincidentally shares one field.

use crate::constants::cip68;
use crate::errors::{StakewellError, StakewellResult};
use crate::types::{
    Address, AssetName, Credential, KeyHash, Mint, OutputRef, PlatformAuthorityRecord, PolicyId,
    PoolRecord, PositionId, ScriptHash, Transaction, TxInput, TxOut, Value,
};
use crate::Vec;
use sha2::{Digest, Sha256};

/// True when `value` holds at least one unit of the asset, matched by
/// policy AND name
pub fn holds_asset(value: &Value, policy: &PolicyId, name: &[u8]) -> bool {
    value.asset(policy, name) >= 1
}

/// Quantity of the asset in `value` (0 when absent)
pub fn asset_quantity(value: &Value, policy: &PolicyId, name: &[u8]) -> u64 {
    value.asset(policy, name)
}

/// Require at least one unit of the asset in `value`
pub fn require_asset(value: &Value, policy: &PolicyId, name: &[u8]) -> StakewellResult<()> {
    if holds_asset(value, policy, name) {
        return Ok(());
    }
    Err(StakewellError::IdentityMismatch {
        expected_policy: *policy,
        expected_name: name.to_vec(),
    })
}

/// Find the output satisfying both the address predicate and the asset
/// check.
///
/// An output matching the address but carrying the wrong (or no) token is an
/// `IdentityMismatch`; no address match at all is `NotFound`. The
/// distinction matters: a forged token with a matching name but wrong policy
/// must surface as an identity failure, never as "found".
pub fn find_output_with_asset<'a, P>(
    outputs: &'a [TxOut],
    address_predicate: P,
    policy: &PolicyId,
    name: &[u8],
) -> StakewellResult<&'a TxOut>
where
    P: Fn(&Address) -> bool,
{
    let mut address_matched = false;
    for output in outputs {
        if !address_predicate(&output.address) {
            continue;
        }
        address_matched = true;
        if holds_asset(&output.value, policy, name) {
            return Ok(output);
        }
    }

    if address_matched {
        Err(StakewellError::IdentityMismatch {
            expected_policy: *policy,
            expected_name: name.to_vec(),
        })
    } else {
        Err(StakewellError::NotFound {
            what: "output at expected address",
        })
    }
}

/// Find the continuing output: same address, carrying the identity token
pub fn find_continuing_output<'a>(
    outputs: &'a [TxOut],
    address: &Address,
    policy: &PolicyId,
    name: &[u8],
) -> StakewellResult<&'a TxOut> {
    for output in outputs {
        if output.address == *address && holds_asset(&output.value, policy, name) {
            return Ok(output);
        }
    }
    Err(StakewellError::NotFound {
        what: "continuing output",
    })
}

/// True when the transaction is signed by `key`
pub fn signed_by(tx: &Transaction, key: &KeyHash) -> bool {
    tx.signatories.iter().any(|signer| signer == key)
}

/// Require a signature from `key`; `role` names the missing signer in the
/// rejection
pub fn require_signature(tx: &Transaction, key: &KeyHash, role: &'static str) -> StakewellResult<()> {
    if signed_by(tx, key) {
        return Ok(());
    }
    Err(StakewellError::Unauthorized { reason: role })
}

/// True when an input locked by the given validator script is being spent.
/// This is the cross-validator authorization evidence: a spent script input
/// means that validator's predicate also runs on this transaction.
pub fn script_input_present(tx: &Transaction, hash: &ScriptHash) -> bool {
    tx.inputs
        .iter()
        .any(|input| input.resolved.address.is_script(hash))
}

/// Find the input being spent by the currently evaluating validator
pub fn find_own_input<'a>(tx: &'a Transaction, own_ref: &OutputRef) -> StakewellResult<&'a TxInput> {
    tx.inputs
        .iter()
        .find(|input| input.out_ref == *own_ref)
        .ok_or(StakewellError::NotFound { what: "own input" })
}

/// True when some output pays at least `amount` of the asset to the wallet
/// of `key`
pub fn paid_to_key(
    tx: &Transaction,
    key: &KeyHash,
    policy: &PolicyId,
    name: &[u8],
    amount: u64,
) -> bool {
    if amount == 0 {
        return true;
    }
    tx.outputs
        .iter()
        .any(|output| output.address.is_key(key) && asset_quantity(&output.value, policy, name) >= amount)
}

/// True when the mint field creates exactly one unit of the asset
pub fn nft_minted(mint: &Mint, policy: &PolicyId, name: &[u8]) -> bool {
    mint.quantity(policy, name) == 1
}

/// True when the mint field destroys exactly one unit of the asset
pub fn nft_burned(mint: &Mint, policy: &PolicyId, name: &[u8]) -> bool {
    mint.quantity(policy, name) == -1
}

/// One-shot token name: SHA-256 of the consumed input's transaction id.
/// The input can only ever be spent once, so no second mint can reproduce
/// the name - the standard anti-replay pattern for "mint exactly one, ever".
pub fn one_shot_token_name(first_input: &OutputRef) -> [u8; 32] {
    let digest = Sha256::digest(first_input.tx_id);
    digest.into()
}

/// CIP-68 reference token name: label 100 prefix + position id
pub fn cip68_reference_name(position_id: &PositionId) -> AssetName {
    let mut name = Vec::with_capacity(4 + position_id.len());
    name.extend_from_slice(&cip68::REFERENCE_LABEL);
    name.extend_from_slice(position_id);
    name
}

/// CIP-68 user token name: label 222 prefix + position id
pub fn cip68_user_name(position_id: &PositionId) -> AssetName {
    let mut name = Vec::with_capacity(4 + position_id.len());
    name.extend_from_slice(&cip68::USER_LABEL);
    name.extend_from_slice(position_id);
    name
}

fn pool_record_of<'a>(input: &'a TxInput, policy: &PolicyId, name: &[u8]) -> Option<&'a PoolRecord> {
    if !holds_asset(&input.resolved.value, policy, name) {
        return None;
    }
    input.resolved.pool_record()
}

/// Find the pool record by its identity token, searching reference inputs
/// first and spent inputs second.
///
/// Read-only paths (Deposit, Withdraw, ForceRefund) reference the pool;
/// treasury-draw paths (Claim, Compound) spend it. The NFT's uniqueness
/// guarantees whichever UTXO carries it is the correct pool.
pub fn find_pool_record<'a>(
    tx: &'a Transaction,
    policy: &PolicyId,
    name: &[u8],
) -> StakewellResult<&'a PoolRecord> {
    for reference in &tx.reference_inputs {
        if let Some(record) = pool_record_of(reference, policy, name) {
            return Ok(record);
        }
    }
    for input in &tx.inputs {
        if let Some(record) = pool_record_of(input, policy, name) {
            return Ok(record);
        }
    }
    Err(StakewellError::NotFound {
        what: "pool record in inputs or reference inputs",
    })
}

/// Find the pool record among SPENT inputs only, returning the carrying
/// input as well. Treasury draws require the pool UTXO to be consumed so
/// its validator co-runs; a pool that is merely referenced is not enough.
pub fn find_pool_record_spent<'a>(
    tx: &'a Transaction,
    policy: &PolicyId,
    name: &[u8],
) -> StakewellResult<(&'a TxInput, &'a PoolRecord)> {
    for input in &tx.inputs {
        if let Some(record) = pool_record_of(input, policy, name) {
            return Ok((input, record));
        }
    }
    // Distinguish "pool only referenced" (a co-spend authorization failure)
    // from "pool nowhere in sight"
    if tx
        .reference_inputs
        .iter()
        .any(|reference| pool_record_of(reference, policy, name).is_some())
    {
        return Err(StakewellError::Unauthorized {
            reason: "pool treasury must be spent, not merely referenced",
        });
    }
    Err(StakewellError::NotFound {
        what: "pool record among spent inputs",
    })
}

/// Validator hash of the UTXO carrying the pool identity token, from spent
/// or reference inputs
pub fn pool_validator_hash_for(
    tx: &Transaction,
    policy: &PolicyId,
    name: &[u8],
) -> StakewellResult<ScriptHash> {
    for input in tx.inputs.iter().chain(tx.reference_inputs.iter()) {
        if holds_asset(&input.resolved.value, policy, name) {
            if let Credential::Script(hash) = input.resolved.address.payment {
                return Ok(hash);
            }
        }
    }
    Err(StakewellError::NotFound {
        what: "pool UTXO at a validator address",
    })
}

/// Find the platform authority record by its identity token among reference
/// inputs
pub fn find_authority_record<'a>(
    tx: &'a Transaction,
    policy: &PolicyId,
    name: &[u8],
) -> StakewellResult<&'a PlatformAuthorityRecord> {
    for reference in &tx.reference_inputs {
        if holds_asset(&reference.resolved.value, policy, name) {
            if let Some(record) = reference.resolved.authority_record() {
                return Ok(record);
            }
        }
    }
    Err(StakewellError::NotFound {
        what: "platform authority record among reference inputs",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetClass;

    const POLICY: PolicyId = [1u8; 28];
    const OTHER_POLICY: PolicyId = [2u8; 28];

    fn nft_value(policy: PolicyId, name: &[u8]) -> Value {
        Value::from_asset(policy, name.to_vec(), 1)
    }

    #[test]
    fn test_holds_asset_requires_both_fields() {
        let value = nft_value(POLICY, b"POOL");

        assert!(holds_asset(&value, &POLICY, b"POOL"));
        // Matching name, wrong policy
        assert!(!holds_asset(&value, &OTHER_POLICY, b"POOL"));
        // Matching policy, wrong name
        assert!(!holds_asset(&value, &POLICY, b"FAKE"));
    }

    #[test]
    fn test_find_output_forged_token_is_identity_mismatch() {
        let burn_script = [9u8; 28];
        // Output at the right address carrying a token with the right name
        // under the wrong policy
        let outputs = [TxOut::new(
            Address::script(burn_script),
            nft_value(OTHER_POLICY, b"POOL"),
        )];

        let result =
            find_output_with_asset(&outputs, |a| a.is_script(&burn_script), &POLICY, b"POOL");
        assert!(matches!(
            result,
            Err(StakewellError::IdentityMismatch { .. })
        ));

        // No output at the address at all
        let result = find_output_with_asset(&[], |a| a.is_script(&burn_script), &POLICY, b"POOL");
        assert!(matches!(result, Err(StakewellError::NotFound { .. })));
    }

    #[test]
    fn test_find_continuing_output_checks_address_and_token() {
        let addr = Address::script([3u8; 28]);
        let outputs = [
            TxOut::new(Address::script([4u8; 28]), nft_value(POLICY, b"POOL")),
            TxOut::new(addr, nft_value(POLICY, b"POOL")),
        ];

        let found = find_continuing_output(&outputs, &addr, &POLICY, b"POOL").unwrap();
        assert_eq!(found.address, addr);

        assert!(find_continuing_output(&outputs, &addr, &OTHER_POLICY, b"POOL").is_err());
    }

    #[test]
    fn test_one_shot_token_name_depends_on_tx_id() {
        let a = OutputRef::new([1u8; 32], 0);
        let b = OutputRef::new([2u8; 32], 0);

        assert_eq!(one_shot_token_name(&a), one_shot_token_name(&a));
        assert_ne!(one_shot_token_name(&a), one_shot_token_name(&b));
    }

    #[test]
    fn test_cip68_names_share_suffix_differ_by_label() {
        let position_id = [7u8; 32];
        let reference = cip68_reference_name(&position_id);
        let user = cip68_user_name(&position_id);

        assert_eq!(&reference[..4], &cip68::REFERENCE_LABEL);
        assert_eq!(&user[..4], &cip68::USER_LABEL);
        assert_eq!(&reference[4..], &user[4..]);
        assert_ne!(reference, user);
    }

    #[test]
    fn test_script_input_present() {
        let staking_hash = [5u8; 28];
        let tx = Transaction {
            inputs: vec![TxInput::new(
                OutputRef::new([1u8; 32], 0),
                TxOut::new(Address::script(staking_hash), Value::new()),
            )],
            ..Default::default()
        };

        assert!(script_input_present(&tx, &staking_hash));
        assert!(!script_input_present(&tx, &[6u8; 28]));
    }

    #[test]
    fn test_find_pool_record_spent_distinguishes_reference() {
        let pool_nft = AssetClass::new(POLICY, b"POOLNFT".to_vec());
        let pool = PoolRecord {
            pool_nft: pool_nft.clone(),
            stake_token: AssetClass::new([2u8; 28], b"STK".to_vec()),
            reward_token: AssetClass::new([3u8; 28], b"RWD".to_vec()),
            yield_rate_bps: 500,
            min_stake: 1,
            owner_key: [4u8; 28],
            pool_creator_key: [5u8; 28],
            total_staked: 0,
            staking_validator_hash: [6u8; 28],
            position_policy: [7u8; 28],
            burn_address_hash: [8u8; 28],
            paused: false,
        };
        let pool_out = TxOut::new(
            Address::script([9u8; 28]),
            nft_value(POLICY, b"POOLNFT"),
        )
        .with_datum(crate::types::RecordDatum::Pool(pool));
        let pool_input = TxInput::new(OutputRef::new([1u8; 32], 0), pool_out);

        // Referenced only: the read path finds it, the spent path refuses
        let tx = Transaction {
            reference_inputs: vec![pool_input.clone()],
            ..Default::default()
        };
        assert!(find_pool_record(&tx, &POLICY, b"POOLNFT").is_ok());
        assert!(matches!(
            find_pool_record_spent(&tx, &POLICY, b"POOLNFT"),
            Err(StakewellError::Unauthorized { .. })
        ));

        // Spent: both paths find it
        let tx = Transaction {
            inputs: vec![pool_input],
            ..Default::default()
        };
        assert!(find_pool_record_spent(&tx, &POLICY, b"POOLNFT").is_ok());

        // Absent entirely
        let tx = Transaction::default();
        assert!(matches!(
            find_pool_record_spent(&tx, &POLICY, b"POOLNFT"),
            Err(StakewellError::NotFound { .. })
        ));
    }
}
