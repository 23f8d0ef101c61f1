//! Protocol Constants
//!
//! Numeric protocol constants fixed system-wide (protocol version v3).
//! Every validator must use these exact values for datums and redeemers to
//! interoperate; none of them may change without a coordinated redeploy of
//! all contracts.

/// Time derivation configuration
pub mod time {
    /// Maximum width of a transaction validity interval in milliseconds
    /// (10 minutes). A wider window lets the submitter misrepresent "now".
    pub const MAX_VALIDITY_WINDOW_MS: u64 = 600_000;

    /// Milliseconds per day, the granularity of reward accrual
    pub const MS_PER_DAY: u64 = 86_400_000;
}

/// Reward formula configuration
pub mod rewards {
    /// Days per year used by the simple-interest formula
    pub const DAYS_PER_YEAR: u64 = 365;

    /// Basis points denominator (10_000 bps = 100%)
    pub const BPS_DENOMINATOR: u64 = 10_000;

    /// Combined denominator of the reward formula:
    /// rewards = stake * yield_bps * days / (365 * 10_000)
    pub const REWARD_DENOMINATOR: u128 = (DAYS_PER_YEAR * BPS_DENOMINATOR) as u128;
}

/// CIP-68 token name labels
///
/// These are CIP-68 standard label prefixes. They are part of the wire
/// contract with wallets and explorers and NEVER change.
pub mod cip68 {
    /// Label 100 prefix - reference NFT (held at the staking validator)
    pub const REFERENCE_LABEL: [u8; 4] = [0x00, 0x06, 0x43, 0xb0];

    /// Label 222 prefix - user NFT (held in the staker's wallet)
    pub const USER_LABEL: [u8; 4] = [0x00, 0x0d, 0xe1, 0x40];
}

/// Pool parameter limits
pub mod limits {
    /// Maximum annual yield rate (100% APY in basis points)
    pub const MAX_YIELD_RATE_BPS: u64 = 10_000;
}

/// Hash and identifier widths
pub mod hashes {
    /// Payment key hashes and script hashes (blake2b-224)
    pub const KEY_HASH_LEN: usize = 28;

    /// One-shot token names and position identifiers (sha-256)
    pub const UNIQUE_NAME_LEN: usize = 32;
}
