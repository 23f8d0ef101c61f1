//! Core Types for the Stakewell Protocol
//!
//! This module defines the transaction snapshot model every validator is
//! evaluated against, the on-ledger record datums, and the redeemer surface
//! (protocol version v3: constructor tags and field order are fixed; any two
//! records sharing a constructor tag must keep byte-compatible layouts).

use crate::constants::limits;
use crate::errors::{AmountErrorReason, StakewellError, StakewellResult};
use crate::{BTreeMap, Vec};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Type alias for payment key hashes (28-byte blake2b-224)
pub type KeyHash = [u8; 28];

/// Type alias for validator script hashes
pub type ScriptHash = [u8; 28];

/// Type alias for minting policy identifiers
pub type PolicyId = [u8; 28];

/// Type alias for token names (variable length, at most 32 bytes of
/// identifier plus a 4-byte CIP-68 label)
pub type AssetName = Vec<u8>;

/// Type alias for transaction identifiers
pub type TxId = [u8; 32];

/// Type alias for position identifiers (32-byte unique suffix shared by the
/// CIP-68 reference and user token names)
pub type PositionId = [u8; 32];

// ============ Ledger Primitives ============

/// A policy + name pair identifying one asset
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AssetClass {
    /// Minting policy that controls the asset
    pub policy: PolicyId,
    /// Token name under that policy
    pub name: AssetName,
}

impl AssetClass {
    pub fn new(policy: PolicyId, name: impl Into<AssetName>) -> Self {
        Self {
            policy,
            name: name.into(),
        }
    }
}

/// Globally unique reference to a transaction output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct OutputRef {
    /// Transaction that created the output
    pub tx_id: TxId,
    /// Index of the output within that transaction
    pub index: u32,
}

impl OutputRef {
    pub fn new(tx_id: TxId, index: u32) -> Self {
        Self { tx_id, index }
    }
}

/// Payment credential of an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Credential {
    /// Spendable by a signature from the named key
    PubKey(KeyHash),
    /// Spendable only under the named validator's predicate
    Script(ScriptHash),
}

/// An address; only the payment part matters to the validators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Address {
    pub payment: Credential,
}

impl Address {
    /// Wallet address for a payment key
    pub fn pub_key(key: KeyHash) -> Self {
        Self {
            payment: Credential::PubKey(key),
        }
    }

    /// Script address for a validator hash
    pub fn script(hash: ScriptHash) -> Self {
        Self {
            payment: Credential::Script(hash),
        }
    }

    /// Returns true if this is the script address of `hash`
    pub fn is_script(&self, hash: &ScriptHash) -> bool {
        matches!(self.payment, Credential::Script(h) if h == *hash)
    }

    /// Returns true if this is the wallet address of `key`
    pub fn is_key(&self, key: &KeyHash) -> bool {
        matches!(self.payment, Credential::PubKey(k) if k == *key)
    }
}

/// Multi-asset value held by a UTXO. Quantities are unsigned: an output can
/// never hold a negative amount of anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Value {
    /// Base currency in lovelace
    pub lovelace: u64,
    /// Native assets grouped by minting policy
    pub assets: BTreeMap<PolicyId, BTreeMap<AssetName, u64>>,
}

impl Value {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value holding a single asset quantity
    pub fn from_asset(policy: PolicyId, name: impl Into<AssetName>, quantity: u64) -> Self {
        let mut value = Self::new();
        value.add_asset(policy, name, quantity);
        value
    }

    /// Builder-style lovelace setter
    pub fn with_lovelace(mut self, lovelace: u64) -> Self {
        self.lovelace = lovelace;
        self
    }

    /// Add `quantity` of an asset (accumulating on an existing entry)
    pub fn add_asset(&mut self, policy: PolicyId, name: impl Into<AssetName>, quantity: u64) {
        if quantity == 0 {
            return;
        }
        let entry = self
            .assets
            .entry(policy)
            .or_default()
            .entry(name.into())
            .or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    /// Quantity of one asset (0 when absent)
    pub fn asset(&self, policy: &PolicyId, name: &[u8]) -> u64 {
        self.assets
            .get(policy)
            .and_then(|tokens| tokens.get(name))
            .copied()
            .unwrap_or(0)
    }
}

/// Minted (positive) and burned (negative) quantities of a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Mint(pub BTreeMap<PolicyId, BTreeMap<AssetName, i64>>);

impl Mint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minted quantity of one asset
    pub fn set(&mut self, policy: PolicyId, name: impl Into<AssetName>, quantity: i64) {
        self.0.entry(policy).or_default().insert(name.into(), quantity);
    }

    /// Signed quantity for one asset (0 when absent)
    pub fn quantity(&self, policy: &PolicyId, name: &[u8]) -> i64 {
        self.0
            .get(policy)
            .and_then(|tokens| tokens.get(name))
            .copied()
            .unwrap_or(0)
    }

    /// All entries under one policy
    pub fn assets_of(&self, policy: &PolicyId) -> Option<&BTreeMap<AssetName, i64>> {
        self.0.get(policy)
    }

    /// Policies with at least one mint/burn entry
    pub fn policies(&self) -> impl Iterator<Item = &PolicyId> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One bound of a validity interval, POSIX milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum TimeBound {
    /// A concrete instant
    Finite(u64),
    /// Open/infinite bound; rejected by time derivation
    #[default]
    Unbounded,
}

/// The transaction's validity interval - the only time evidence a validator
/// has
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ValidityInterval {
    pub lower_bound: TimeBound,
    pub upper_bound: TimeBound,
}

impl ValidityInterval {
    /// Interval with two finite bounds
    pub fn finite(lower: u64, upper: u64) -> Self {
        Self {
            lower_bound: TimeBound::Finite(lower),
            upper_bound: TimeBound::Finite(upper),
        }
    }
}

/// A transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TxOut {
    pub address: Address,
    pub value: Value,
    /// Inline datum, when the output carries a protocol record
    pub datum: Option<RecordDatum>,
}

impl TxOut {
    pub fn new(address: Address, value: Value) -> Self {
        Self {
            address,
            value,
            datum: None,
        }
    }

    /// Builder-style datum attachment
    pub fn with_datum(mut self, datum: RecordDatum) -> Self {
        self.datum = Some(datum);
        self
    }

    /// The pool record carried by this output, if any
    pub fn pool_record(&self) -> Option<&PoolRecord> {
        match &self.datum {
            Some(RecordDatum::Pool(record)) => Some(record),
            _ => None,
        }
    }

    /// The position record carried by this output, if any
    pub fn position_record(&self) -> Option<&PositionRecord> {
        match &self.datum {
            Some(RecordDatum::Position(record)) => Some(record),
            _ => None,
        }
    }

    /// The platform authority record carried by this output, if any
    pub fn authority_record(&self) -> Option<&PlatformAuthorityRecord> {
        match &self.datum {
            Some(RecordDatum::Authority(record)) => Some(record),
            _ => None,
        }
    }
}

/// A spent (or referenced) input: the reference plus the output it resolves
/// to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TxInput {
    pub out_ref: OutputRef,
    pub resolved: TxOut,
}

impl TxInput {
    pub fn new(out_ref: OutputRef, resolved: TxOut) -> Self {
        Self { out_ref, resolved }
    }
}

/// An immutable transaction snapshot - the complete evidence available to
/// every validator the transaction touches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Transaction {
    pub id: TxId,
    /// Inputs consumed by the transaction
    pub inputs: Vec<TxInput>,
    /// Inputs visible read-only, not consumed
    pub reference_inputs: Vec<TxInput>,
    pub outputs: Vec<TxOut>,
    pub mint: Mint,
    /// Keys that signed the transaction
    pub signatories: Vec<KeyHash>,
    pub validity: ValidityInterval,
    /// Redeemer per spent script input
    pub spend_redeemers: BTreeMap<OutputRef, Redeemer>,
    /// Redeemer per policy appearing in the mint field
    pub mint_redeemers: BTreeMap<PolicyId, Redeemer>,
}

/// Why a validator is being evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptPurpose {
    /// Spending the named UTXO
    Spending(OutputRef),
    /// Minting or burning under the named policy
    Minting(PolicyId),
}

/// Everything a validator sees: the transaction plus its own purpose
#[derive(Debug, Clone)]
pub struct ScriptContext<'a> {
    pub tx: &'a Transaction,
    pub purpose: ScriptPurpose,
}

impl<'a> ScriptContext<'a> {
    pub fn spending(tx: &'a Transaction, out_ref: OutputRef) -> Self {
        Self {
            tx,
            purpose: ScriptPurpose::Spending(out_ref),
        }
    }

    pub fn minting(tx: &'a Transaction, policy: PolicyId) -> Self {
        Self {
            tx,
            purpose: ScriptPurpose::Minting(policy),
        }
    }
}

// ============ Record Datums ============

/// Pool configuration and treasury record, carried in the pool UTXO.
///
/// The pool NFT named by `pool_nft` proves the datum is legitimate; all
/// validator hashes and platform bindings are read from here at runtime,
/// nothing is baked into compiled validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolRecord {
    /// This pool's identity token (self-reference)
    pub pool_nft: AssetClass,
    /// Token users stake
    pub stake_token: AssetClass,
    /// Token the treasury pays rewards in
    pub reward_token: AssetClass,
    /// Annual yield in basis points (500 = 5%)
    pub yield_rate_bps: u64,
    /// Minimum initial deposit
    pub min_stake: u64,
    /// Key permitted to perform administrative transitions
    pub owner_key: KeyHash,
    /// Key that was authorized to create this pool (audit trail)
    pub pool_creator_key: KeyHash,
    /// Aggregate staked quantity. Advisory bookkeeping only: fund safety
    /// derives from per-position value/datum equality, never from this.
    pub total_staked: u64,
    /// Validator that owns user positions (cross-validator authorization)
    pub staking_validator_hash: ScriptHash,
    /// Policy that mints position identity tokens
    pub position_policy: PolicyId,
    /// Script that receives force-refunded identity tokens
    pub burn_address_hash: ScriptHash,
    /// Gate on new stakes and deposits
    pub paused: bool,
}

impl PoolRecord {
    /// Constructor tag in the v3 wire layout
    pub const CONSTR_ID: u8 = 0;

    /// Copy with a different yield rate, everything else identical
    pub fn with_yield_rate(&self, yield_rate_bps: u64) -> Self {
        Self {
            yield_rate_bps,
            ..self.clone()
        }
    }

    /// Copy with a different pause flag, everything else identical
    pub fn with_paused(&self, paused: bool) -> Self {
        Self {
            paused,
            ..self.clone()
        }
    }

    /// Copy with a different advisory total, everything else identical
    pub fn with_total_staked(&self, total_staked: u64) -> Self {
        Self {
            total_staked,
            ..self.clone()
        }
    }

    /// Sanity checks for a freshly created pool record whose identity token
    /// is `policy`/`name`
    pub fn validate_initial(&self, policy: &PolicyId, name: &[u8]) -> StakewellResult<()> {
        if self.pool_nft.policy != *policy || self.pool_nft.name != name {
            return Err(StakewellError::IdentityMismatch {
                expected_policy: *policy,
                expected_name: name.to_vec(),
            });
        }
        if self.yield_rate_bps == 0 || self.yield_rate_bps > limits::MAX_YIELD_RATE_BPS {
            return Err(StakewellError::AmountInvariantViolation {
                reason: AmountErrorReason::RateOutOfRange {
                    rate: self.yield_rate_bps,
                },
            });
        }
        if self.min_stake == 0 {
            return Err(StakewellError::AmountInvariantViolation {
                reason: AmountErrorReason::ZeroAmount,
            });
        }
        if self.total_staked != 0 {
            return Err(StakewellError::ContinuityViolation {
                field: "total_staked must start at zero",
            });
        }
        if self.paused {
            return Err(StakewellError::ContinuityViolation {
                field: "new pool must start unpaused",
            });
        }
        Ok(())
    }
}

/// A user's staking position record, carried in the position UTXO together
/// with the staked tokens and the CIP-68 reference token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PositionRecord {
    /// Identity token of the pool this position belongs to
    pub pool_nft: AssetClass,
    /// Key that may withdraw and claim
    pub owner_key: KeyHash,
    /// Unique suffix of both CIP-68 token names
    pub position_id: PositionId,
    /// Staked quantity; the UTXO must hold exactly this much stake token
    pub staked_amount: u64,
    /// Registration timestamp, POSIX ms, immutable
    pub staked_at: u64,
    /// Last reward claim, POSIX ms, monotone non-decreasing
    pub last_claim_time: u64,
    /// Lifetime rewards claimed
    pub total_claimed: u64,
}

impl PositionRecord {
    /// Constructor tag in the v3 wire layout
    pub const CONSTR_ID: u8 = 1;

    /// Copy with a different staked amount, everything else identical
    pub fn with_stake(&self, staked_amount: u64) -> Self {
        Self {
            staked_amount,
            ..self.clone()
        }
    }

    /// Copy after a claim: clock advanced, lifetime total bumped
    pub fn with_claim(&self, now: u64, rewards: u64) -> Self {
        Self {
            last_claim_time: now,
            total_claimed: self.total_claimed.saturating_add(rewards),
            ..self.clone()
        }
    }

    /// Copy after a compound: rewards restaked, clock advanced
    pub fn with_compound(&self, now: u64, rewards: u64) -> Self {
        Self {
            staked_amount: self.staked_amount.saturating_add(rewards),
            last_claim_time: now,
            total_claimed: self.total_claimed.saturating_add(rewards),
            ..self.clone()
        }
    }

    /// Sanity checks for a freshly registered position at time `now`
    pub fn validate_initial(&self, now: u64, min_stake: u64) -> StakewellResult<()> {
        if self.staked_amount < min_stake {
            return Err(StakewellError::AmountInvariantViolation {
                reason: AmountErrorReason::BelowMinimum {
                    amount: self.staked_amount,
                    minimum: min_stake,
                },
            });
        }
        if self.staked_at != now {
            return Err(StakewellError::ContinuityViolation {
                field: "staked_at must be the derived current time",
            });
        }
        if self.last_claim_time != self.staked_at {
            return Err(StakewellError::ContinuityViolation {
                field: "last_claim_time must equal staked_at",
            });
        }
        if self.total_claimed != 0 {
            return Err(StakewellError::ContinuityViolation {
                field: "total_claimed must start at zero",
            });
        }
        Ok(())
    }
}

/// CIP-68 reference metadata, co-located with the reference token at the
/// staking validator. Display-only; updated through the same transitions
/// that update [`PositionRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PositionRefRecord {
    pub pool_nft: AssetClass,
    pub staked_amount: u64,
    pub stake_timestamp: u64,
}

impl PositionRefRecord {
    /// Constructor tag in the v3 wire layout
    pub const CONSTR_ID: u8 = 0;
}

/// The platform-wide authority record. Exactly one exists, marked by the
/// one-shot authority NFT; it decides who may create pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PlatformAuthorityRecord {
    /// Key authorized to create pools
    pub pool_creator_key: KeyHash,
    /// Key that can update or retire this record
    pub platform_admin_key: KeyHash,
    /// This record's own identity token (self-reference)
    pub authority_nft: AssetClass,
}

impl PlatformAuthorityRecord {
    /// Constructor tag in the v3 wire layout
    pub const CONSTR_ID: u8 = 0;
}

/// Closed union of every datum the protocol attaches to a UTXO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum RecordDatum {
    Pool(PoolRecord),
    Position(PositionRecord),
    PositionRef(PositionRefRecord),
    Authority(PlatformAuthorityRecord),
}

impl RecordDatum {
    /// Serialize to the v3 CBOR wire form
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(self, &mut bytes).ok();
        bytes
    }

    /// Deserialize from the v3 CBOR wire form
    pub fn from_cbor(bytes: &[u8]) -> Option<Self> {
        ciborium::de::from_reader(bytes).ok()
    }

    /// Serialize to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

// ============ Redeemer Surface ============

/// Pool state machine transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolRedeemer {
    /// Add reward tokens to the treasury (owner only)
    FundTreasury { amount: u64 },
    /// Remove reward tokens from the treasury (owner only). The remaining
    /// balance must stay at or above `outstanding_rewards`, the liability
    /// bound computed off-chain over all open positions.
    WithdrawTreasury { amount: u64, outstanding_rewards: u64 },
    /// Change the yield rate (owner only)
    UpdateYield { new_yield_rate_bps: u64 },
    /// Gate new stakes and deposits (owner only)
    PausePool,
    /// Re-open a paused pool (owner only)
    ResumePool,
    /// Co-authorize a unilateral position refund (owner only, paused pool)
    ForceRefund,
    /// Co-validation path for treasury draws: the staking validator must be
    /// spent in the same transaction
    AuthorizeUnstakeOrClaim,
    /// Close the pool and burn its identity token (owner only, paused pool)
    ClosePool,
}

/// Position state machine transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum StakingRedeemer {
    /// Create a new position (no prior position input)
    Register { initial_deposit: u64 },
    /// Add tokens to an existing position
    Deposit { amount: u64 },
    /// Remove tokens; `amount == staked_amount` is a full exit
    Withdraw { amount: u64 },
    /// Claim pending rewards from the pool treasury
    Claim,
    /// Restake pending rewards instead of paying them out
    Compound,
    /// Pool-owner initiated refund of the whole position (paused pool)
    ForceRefund,
}

/// Pool identity policy operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolNftRedeemer {
    /// Mint the one-shot pool identity token
    MintPool {
        /// Output that must receive the token
        output_index: u32,
        /// Validator address the pool record must sit at
        pool_validator_hash: ScriptHash,
        /// Platform authority token to locate the authority record
        authority_nft: AssetClass,
    },
    /// Burn the pool identity token (pool closure)
    BurnPool,
}

/// Position identity policy operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PositionNftRedeemer {
    /// Mint the CIP-68 reference/user pair for a new position
    MintPosition {
        position_id: PositionId,
        /// Pool identity token to locate the pool record
        pool_nft: AssetClass,
    },
    /// Burn the pair on full exit
    BurnPosition {
        position_id: PositionId,
        pool_nft: AssetClass,
    },
}

/// Platform authority policy operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum AuthorityRedeemer {
    /// Mint the one-shot platform authority token (deployment)
    MintAuthority { output_index: u32 },
    /// Burn the authority token (platform migration)
    BurnAuthority,
}

/// Union of every validator's redeemer, as carried in the transaction
/// witness maps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Redeemer {
    Pool(PoolRedeemer),
    Staking(StakingRedeemer),
    PoolNft(PoolNftRedeemer),
    PositionNft(PositionNftRedeemer),
    Authority(AuthorityRedeemer),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pool() -> PoolRecord {
        PoolRecord {
            pool_nft: AssetClass::new([1u8; 28], vec![0xAA; 32]),
            stake_token: AssetClass::new([2u8; 28], b"STAKE".to_vec()),
            reward_token: AssetClass::new([3u8; 28], b"REWARD".to_vec()),
            yield_rate_bps: 500,
            min_stake: 1_000,
            owner_key: [4u8; 28],
            pool_creator_key: [5u8; 28],
            total_staked: 0,
            staking_validator_hash: [6u8; 28],
            position_policy: [7u8; 28],
            burn_address_hash: [8u8; 28],
            paused: false,
        }
    }

    #[test]
    fn test_value_asset_lookup() {
        let mut value = Value::from_asset([1u8; 28], b"TOK".to_vec(), 100);
        value.add_asset([1u8; 28], b"TOK".to_vec(), 50);

        assert_eq!(value.asset(&[1u8; 28], b"TOK"), 150);
        assert_eq!(value.asset(&[2u8; 28], b"TOK"), 0);
        assert_eq!(value.asset(&[1u8; 28], b"OTHER"), 0);
    }

    #[test]
    fn test_pool_record_patching() {
        let pool = sample_pool();

        let updated = pool.with_yield_rate(750);
        assert_eq!(updated.yield_rate_bps, 750);
        assert_eq!(updated.with_yield_rate(500), pool);

        let paused = pool.with_paused(true);
        assert!(paused.paused);
        assert_eq!(paused.with_paused(false), pool);
    }

    #[test]
    fn test_pool_initial_sanity() {
        let pool = sample_pool();
        let policy = pool.pool_nft.policy;
        let name = pool.pool_nft.name.clone();

        assert!(pool.validate_initial(&policy, &name).is_ok());

        let wrong_identity = pool.validate_initial(&[9u8; 28], &name);
        assert!(matches!(
            wrong_identity,
            Err(StakewellError::IdentityMismatch { .. })
        ));

        let bad_rate = pool.with_yield_rate(10_001).validate_initial(&policy, &name);
        assert!(matches!(
            bad_rate,
            Err(StakewellError::AmountInvariantViolation {
                reason: AmountErrorReason::RateOutOfRange { rate: 10_001 },
            })
        ));

        let nonzero_total = pool.with_total_staked(5).validate_initial(&policy, &name);
        assert!(matches!(
            nonzero_total,
            Err(StakewellError::ContinuityViolation { .. })
        ));
    }

    #[test]
    fn test_position_initial_sanity() {
        let position = PositionRecord {
            pool_nft: AssetClass::new([1u8; 28], vec![0xAA; 32]),
            owner_key: [2u8; 28],
            position_id: [3u8; 32],
            staked_amount: 5_000,
            staked_at: 1_700_000_000_000,
            last_claim_time: 1_700_000_000_000,
            total_claimed: 0,
        };

        assert!(position.validate_initial(1_700_000_000_000, 1_000).is_ok());
        assert!(position.validate_initial(1_700_000_000_001, 1_000).is_err());
        assert!(matches!(
            position.validate_initial(1_700_000_000_000, 10_000),
            Err(StakewellError::AmountInvariantViolation {
                reason: AmountErrorReason::BelowMinimum { .. },
            })
        ));
    }

    #[test]
    fn test_record_datum_wire_stability() {
        // v3 constructor tags are part of the wire contract
        assert_eq!(PoolRecord::CONSTR_ID, 0);
        assert_eq!(PositionRecord::CONSTR_ID, 1);
        assert_eq!(PositionRefRecord::CONSTR_ID, 0);
        assert_eq!(PlatformAuthorityRecord::CONSTR_ID, 0);

        let datum = RecordDatum::Pool(sample_pool());
        let cbor = datum.to_cbor();
        assert!(!cbor.is_empty());
        assert_eq!(RecordDatum::from_cbor(&cbor), Some(datum.clone()));
        assert_eq!(RecordDatum::from_bytes(&datum.to_bytes()), Some(datum));
    }
}
