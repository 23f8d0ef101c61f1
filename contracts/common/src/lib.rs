//! Stakewell Common Library
//!
//! Shared types, constants, and validation primitives for all Stakewell
//! validators. This crate is the foundation of the protocol: the ledger
//! snapshot model, the record datums, the redeemer surface, and the
//! primitives every validator composes (time derivation, asset matching,
//! reward math).
//!
//! ## UTXO model, not accounts
//!
//! Stakewell validators are **pure decision functions**: given a transaction
//! snapshot and the UTXO being spent (or the policy being minted), each
//! returns accept or reject. There is no mutable store and no direct call
//! mechanism between validators:
//! - **State lives in datums** attached to unspent outputs
//! - **Transitions are transaction shapes**: which inputs are consumed,
//!   which outputs are produced, which tokens are minted or burned
//! - **Coordination is co-spending**: a validator "calls" another by
//!   requiring that validator's governed UTXO among the spent inputs
//! - **Double-spend prevention is the ledger's**: a UTXO is consumable
//!   exactly once
//!
//! The [`ledger`] module provides an in-memory simulated ledger used by the
//! test suites to drive whole transactions through every registered
//! validator atomically.
//!
//! This crate is `no_std` compatible when built without the default `std`
//! feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collection types for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{
    collections::{BTreeMap, BTreeSet},
    vec::Vec,
};
#[cfg(feature = "std")]
pub use std::{
    collections::{BTreeMap, BTreeSet},
    vec::Vec,
};

pub mod assets;
pub mod constants;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod math;
pub mod time;
pub mod types;

// Re-exports for convenience
pub use assets::*;
pub use errors::*;
pub use events::*;
pub use ledger::*;
pub use math::*;
pub use time::*;
pub use types::*;
