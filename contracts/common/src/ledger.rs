//! Simulated Ledger
//!
//! An in-memory model of the UTXO ledger used by the test suites and
//! off-chain tooling. The ledger is the *only* component that commits
//! state; validators stay pure predicates. Applying a transaction is
//! all-or-nothing: either every touched validator accepts and the UTXO set
//! advances atomically, or nothing changes.
//!
//! The `spent` set is permanent - an [`OutputRef`] consumed once can never
//! be consumed again across the whole simulated history. One-shot minting
//! uniqueness rests on exactly this property.

use crate::errors::{AmountErrorReason, StakewellError, StakewellResult};
use crate::events::{EventLog, StakewellEvent};
use crate::types::{
    AssetName, AuthorityRedeemer, Credential, OutputRef, PolicyId, PoolNftRedeemer, PoolRedeemer,
    PositionNftRedeemer, Redeemer, ScriptContext, ScriptHash, StakingRedeemer, Transaction, TxOut,
};
use crate::{BTreeMap, BTreeSet, Vec};

/// A spending validator entry point
pub type SpendValidator = fn(&ScriptContext, &Redeemer) -> StakewellResult<()>;

/// A minting policy entry point
pub type MintingPolicy = fn(&ScriptContext, &Redeemer) -> StakewellResult<()>;

/// Maps script hashes and policy ids to the predicates that govern them
#[derive(Default)]
pub struct ScriptRegistry {
    spend: BTreeMap<ScriptHash, SpendValidator>,
    mint: BTreeMap<PolicyId, MintingPolicy>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the validator governing outputs locked by `hash`
    pub fn register_spend(&mut self, hash: ScriptHash, validator: SpendValidator) {
        self.spend.insert(hash, validator);
    }

    /// Register the policy governing mints/burns under `policy`
    pub fn register_mint(&mut self, policy: PolicyId, minting_policy: MintingPolicy) {
        self.mint.insert(policy, minting_policy);
    }
}

/// The simulated ledger: an append-only history over a live UTXO set
pub struct Ledger {
    utxos: BTreeMap<OutputRef, TxOut>,
    spent: BTreeSet<OutputRef>,
    registry: ScriptRegistry,
    events: EventLog,
}

impl Ledger {
    pub fn new(registry: ScriptRegistry) -> Self {
        Self {
            utxos: BTreeMap::new(),
            spent: BTreeSet::new(),
            registry,
            events: EventLog::new(),
        }
    }

    /// Insert a genesis/bootstrap output without validation. Used to seed
    /// wallets and the deployment inputs one-shot policies consume.
    pub fn seed(&mut self, out_ref: OutputRef, output: TxOut) {
        self.utxos.insert(out_ref, output);
    }

    /// Look up a live UTXO
    pub fn utxo(&self, out_ref: &OutputRef) -> Option<&TxOut> {
        self.utxos.get(out_ref)
    }

    /// Events emitted by committed transactions, in order
    pub fn events(&self) -> &[StakewellEvent] {
        self.events.events()
    }

    /// Validate and commit a transaction.
    ///
    /// 1. every input exists, is unspent, and matches its resolved output;
    /// 2. token quantities are conserved (outputs = inputs + mint);
    /// 3. every script-locked input's validator accepts its redeemer;
    /// 4. every minting policy in the mint field accepts its redeemer;
    /// 5. only then: inputs move to the permanent spent set, outputs are
    ///    created, events are appended.
    ///
    /// Failure at any step leaves the ledger untouched.
    pub fn apply(&mut self, tx: &Transaction) -> StakewellResult<()> {
        self.check_inputs(tx)?;
        self.check_conservation(tx)?;
        self.run_spend_validators(tx)?;
        self.run_minting_policies(tx)?;
        self.commit(tx);
        Ok(())
    }

    fn check_inputs(&self, tx: &Transaction) -> StakewellResult<()> {
        let mut consumed_here = BTreeSet::new();
        for input in &tx.inputs {
            if self.spent.contains(&input.out_ref) || !consumed_here.insert(input.out_ref) {
                return Err(StakewellError::NotFound {
                    what: "unspent input (already consumed)",
                });
            }
            let known = self.utxos.get(&input.out_ref).ok_or(StakewellError::NotFound {
                what: "input UTXO",
            })?;
            if known != &input.resolved {
                return Err(StakewellError::ContinuityViolation {
                    field: "resolved input does not match the ledger",
                });
            }
        }
        for reference in &tx.reference_inputs {
            let known = self
                .utxos
                .get(&reference.out_ref)
                .ok_or(StakewellError::NotFound {
                    what: "reference input UTXO",
                })?;
            if known != &reference.resolved {
                return Err(StakewellError::ContinuityViolation {
                    field: "resolved reference input does not match the ledger",
                });
            }
        }
        Ok(())
    }

    fn check_conservation(&self, tx: &Transaction) -> StakewellResult<()> {
        let mut balance: BTreeMap<(PolicyId, AssetName), i128> = BTreeMap::new();
        let mut lovelace_in: u64 = 0;
        let mut lovelace_out: u64 = 0;

        for input in &tx.inputs {
            lovelace_in = lovelace_in.saturating_add(input.resolved.value.lovelace);
            for (policy, tokens) in &input.resolved.value.assets {
                for (name, quantity) in tokens {
                    *balance.entry((*policy, name.clone())).or_insert(0) += *quantity as i128;
                }
            }
        }
        for (policy, tokens) in &tx.mint.0 {
            for (name, quantity) in tokens {
                *balance.entry((*policy, name.clone())).or_insert(0) += *quantity as i128;
            }
        }
        for output in &tx.outputs {
            lovelace_out = lovelace_out.saturating_add(output.value.lovelace);
            for (policy, tokens) in &output.value.assets {
                for (name, quantity) in tokens {
                    *balance.entry((*policy, name.clone())).or_insert(0) -= *quantity as i128;
                }
            }
        }

        // Lovelace may only decrease (the difference is the fee)
        if lovelace_out > lovelace_in {
            return Err(StakewellError::AmountInvariantViolation {
                reason: AmountErrorReason::ConservationViolated {
                    inputs: lovelace_in,
                    outputs: lovelace_out,
                },
            });
        }
        // Native assets balance exactly
        for ((_, _), net) in balance {
            if net != 0 {
                return Err(StakewellError::AmountInvariantViolation {
                    reason: AmountErrorReason::ConservationViolated {
                        inputs: if net > 0 { net as u64 } else { 0 },
                        outputs: if net < 0 { (-net) as u64 } else { 0 },
                    },
                });
            }
        }
        Ok(())
    }

    fn run_spend_validators(&self, tx: &Transaction) -> StakewellResult<()> {
        for input in &tx.inputs {
            let hash = match input.resolved.address.payment {
                Credential::Script(hash) => hash,
                Credential::PubKey(_) => continue,
            };
            let validator = self.registry.spend.get(&hash).ok_or(StakewellError::NotFound {
                what: "spending validator for script input",
            })?;
            let redeemer = tx
                .spend_redeemers
                .get(&input.out_ref)
                .ok_or(StakewellError::NotFound {
                    what: "redeemer for script input",
                })?;
            let ctx = ScriptContext::spending(tx, input.out_ref);
            validator(&ctx, redeemer)?;
        }
        Ok(())
    }

    fn run_minting_policies(&self, tx: &Transaction) -> StakewellResult<()> {
        for (policy, tokens) in &tx.mint.0 {
            if tokens.is_empty() {
                continue;
            }
            let minting_policy = self.registry.mint.get(policy).ok_or(StakewellError::NotFound {
                what: "minting policy for mint field entry",
            })?;
            let redeemer = tx.mint_redeemers.get(policy).ok_or(StakewellError::NotFound {
                what: "redeemer for minting policy",
            })?;
            let ctx = ScriptContext::minting(tx, *policy);
            minting_policy(&ctx, redeemer)?;
        }
        Ok(())
    }

    fn commit(&mut self, tx: &Transaction) {
        for input in &tx.inputs {
            self.utxos.remove(&input.out_ref);
            self.spent.insert(input.out_ref);
        }
        for (index, output) in tx.outputs.iter().enumerate() {
            self.utxos
                .insert(OutputRef::new(tx.id, index as u32), output.clone());
        }
        for event in events_for(tx) {
            self.events.emit(event);
        }
    }
}

/// Derive the domain events a committed transaction represents from its
/// redeemer surface
fn events_for(tx: &Transaction) -> Vec<StakewellEvent> {
    let mut events = Vec::new();
    let tx_id = tx.id;

    for redeemer in tx.spend_redeemers.values() {
        match redeemer {
            Redeemer::Pool(PoolRedeemer::FundTreasury { amount }) => {
                events.push(StakewellEvent::TreasuryFunded { tx_id, amount: *amount });
            }
            Redeemer::Pool(PoolRedeemer::WithdrawTreasury { amount, .. }) => {
                events.push(StakewellEvent::TreasuryWithdrawn { tx_id, amount: *amount });
            }
            Redeemer::Pool(PoolRedeemer::UpdateYield { new_yield_rate_bps }) => {
                events.push(StakewellEvent::YieldUpdated {
                    tx_id,
                    new_yield_rate_bps: *new_yield_rate_bps,
                });
            }
            Redeemer::Pool(PoolRedeemer::PausePool) => {
                events.push(StakewellEvent::PoolPaused { tx_id });
            }
            Redeemer::Pool(PoolRedeemer::ResumePool) => {
                events.push(StakewellEvent::PoolResumed { tx_id });
            }
            Redeemer::Pool(PoolRedeemer::ClosePool) => {
                events.push(StakewellEvent::PoolClosed { tx_id });
            }
            Redeemer::Staking(StakingRedeemer::Deposit { amount }) => {
                events.push(StakewellEvent::Deposited { tx_id, amount: *amount });
            }
            Redeemer::Staking(StakingRedeemer::Withdraw { amount }) => {
                events.push(StakewellEvent::Withdrawn { tx_id, amount: *amount });
            }
            Redeemer::Staking(StakingRedeemer::Claim) => {
                events.push(StakewellEvent::RewardsClaimed { tx_id });
            }
            Redeemer::Staking(StakingRedeemer::Compound) => {
                events.push(StakewellEvent::RewardsCompounded { tx_id });
            }
            Redeemer::Staking(StakingRedeemer::ForceRefund) => {
                events.push(StakewellEvent::PositionForceRefunded { tx_id });
            }
            _ => {}
        }
    }

    for redeemer in tx.mint_redeemers.values() {
        match redeemer {
            Redeemer::PoolNft(PoolNftRedeemer::MintPool { .. }) => {
                events.push(StakewellEvent::PoolCreated { tx_id });
            }
            Redeemer::PositionNft(PositionNftRedeemer::MintPosition { position_id, .. }) => {
                events.push(StakewellEvent::PositionRegistered {
                    tx_id,
                    position_id: *position_id,
                });
            }
            Redeemer::PositionNft(PositionNftRedeemer::BurnPosition { position_id, .. }) => {
                events.push(StakewellEvent::PositionClosed {
                    tx_id,
                    position_id: *position_id,
                });
            }
            Redeemer::Authority(AuthorityRedeemer::MintAuthority { .. }) => {
                events.push(StakewellEvent::AuthorityMinted { tx_id });
            }
            Redeemer::Authority(AuthorityRedeemer::BurnAuthority) => {
                events.push(StakewellEvent::AuthorityBurned { tx_id });
            }
            _ => {}
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, TxInput, Value};

    fn wallet_out(key: [u8; 28], lovelace: u64) -> TxOut {
        TxOut::new(Address::pub_key(key), Value::new().with_lovelace(lovelace))
    }

    fn transfer_tx(id: [u8; 32], input: TxInput, output: TxOut) -> Transaction {
        Transaction {
            id,
            inputs: vec![input],
            outputs: vec![output],
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_moves_value() {
        let mut ledger = Ledger::new(ScriptRegistry::new());
        let origin = OutputRef::new([1u8; 32], 0);
        ledger.seed(origin, wallet_out([1u8; 28], 10_000));

        let tx = transfer_tx(
            [2u8; 32],
            TxInput::new(origin, wallet_out([1u8; 28], 10_000)),
            wallet_out([2u8; 28], 9_000),
        );

        assert!(ledger.apply(&tx).is_ok());
        assert!(ledger.utxo(&origin).is_none());
        assert!(ledger.utxo(&OutputRef::new([2u8; 32], 0)).is_some());
    }

    #[test]
    fn test_double_spend_rejected_across_history() {
        let mut ledger = Ledger::new(ScriptRegistry::new());
        let origin = OutputRef::new([1u8; 32], 0);
        ledger.seed(origin, wallet_out([1u8; 28], 10_000));

        let input = TxInput::new(origin, wallet_out([1u8; 28], 10_000));
        let first = transfer_tx([2u8; 32], input.clone(), wallet_out([2u8; 28], 10_000));
        let second = transfer_tx([3u8; 32], input, wallet_out([3u8; 28], 10_000));

        assert!(ledger.apply(&first).is_ok());
        assert!(matches!(
            ledger.apply(&second),
            Err(StakewellError::NotFound { .. })
        ));
    }

    #[test]
    fn test_conservation_rejects_token_creation_without_mint() {
        let mut ledger = Ledger::new(ScriptRegistry::new());
        let origin = OutputRef::new([1u8; 32], 0);
        ledger.seed(origin, wallet_out([1u8; 28], 10_000));

        let mut forged = wallet_out([2u8; 28], 10_000);
        forged.value.add_asset([9u8; 28], b"FORGED".to_vec(), 1);

        let tx = transfer_tx(
            [2u8; 32],
            TxInput::new(origin, wallet_out([1u8; 28], 10_000)),
            forged,
        );

        assert!(matches!(
            ledger.apply(&tx),
            Err(StakewellError::AmountInvariantViolation {
                reason: AmountErrorReason::ConservationViolated { .. },
            })
        ));
    }

    #[test]
    fn test_script_input_without_validator_rejected() {
        let mut ledger = Ledger::new(ScriptRegistry::new());
        let origin = OutputRef::new([1u8; 32], 0);
        let script_out = TxOut::new(Address::script([7u8; 28]), Value::new().with_lovelace(5_000));
        ledger.seed(origin, script_out.clone());

        let tx = transfer_tx(
            [2u8; 32],
            TxInput::new(origin, script_out),
            wallet_out([2u8; 28], 5_000),
        );

        assert!(matches!(
            ledger.apply(&tx),
            Err(StakewellError::NotFound { .. })
        ));
    }

    #[test]
    fn test_failed_apply_leaves_no_partial_state() {
        let mut ledger = Ledger::new(ScriptRegistry::new());
        let origin = OutputRef::new([1u8; 32], 0);
        ledger.seed(origin, wallet_out([1u8; 28], 10_000));

        // Second input does not exist; whole transaction must be void
        let tx = Transaction {
            id: [2u8; 32],
            inputs: vec![
                TxInput::new(origin, wallet_out([1u8; 28], 10_000)),
                TxInput::new(OutputRef::new([9u8; 32], 0), wallet_out([1u8; 28], 1)),
            ],
            outputs: vec![wallet_out([2u8; 28], 10_001)],
            ..Default::default()
        };

        assert!(ledger.apply(&tx).is_err());
        assert!(ledger.utxo(&origin).is_some(), "input must remain live");
        assert!(ledger.events().is_empty());
    }
}
