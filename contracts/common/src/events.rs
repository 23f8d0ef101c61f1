//! Protocol Events
//!
//! Validators themselves emit nothing - they accept or reject, full stop.
//! Events are an off-core concern: the simulated ledger appends them when a
//! transaction commits so tooling, indexers, and tests can observe what
//! happened without re-parsing transaction shapes.

use crate::types::{PositionId, TxId};
use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Platform events (0x01 - 0x0F)
    AuthorityMinted = 0x01,
    AuthorityBurned = 0x02,

    // Pool events (0x10 - 0x2F)
    PoolCreated = 0x10,
    PoolClosed = 0x11,
    TreasuryFunded = 0x12,
    TreasuryWithdrawn = 0x13,
    YieldUpdated = 0x14,
    PoolPaused = 0x15,
    PoolResumed = 0x16,

    // Position events (0x30 - 0x4F)
    PositionRegistered = 0x30,
    PositionClosed = 0x31,
    Deposited = 0x32,
    Withdrawn = 0x33,
    RewardsClaimed = 0x34,
    RewardsCompounded = 0x35,
    PositionForceRefunded = 0x36,
}

/// Main event enum covering every observable protocol transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum StakewellEvent {
    /// The one-shot platform authority token was minted
    AuthorityMinted { tx_id: TxId },

    /// The platform authority token was burned (platform migration)
    AuthorityBurned { tx_id: TxId },

    /// A pool identity token was minted and a pool record created
    PoolCreated { tx_id: TxId },

    /// A pool was closed and its identity token burned
    PoolClosed { tx_id: TxId },

    /// Reward tokens were added to a pool treasury
    TreasuryFunded { tx_id: TxId, amount: u64 },

    /// Reward tokens were withdrawn from a pool treasury
    TreasuryWithdrawn { tx_id: TxId, amount: u64 },

    /// A pool's yield rate changed
    YieldUpdated { tx_id: TxId, new_yield_rate_bps: u64 },

    /// A pool was paused
    PoolPaused { tx_id: TxId },

    /// A pool was resumed
    PoolResumed { tx_id: TxId },

    /// A new position was registered and its CIP-68 pair minted
    PositionRegistered { tx_id: TxId, position_id: PositionId },

    /// A position's CIP-68 pair was burned
    PositionClosed { tx_id: TxId, position_id: PositionId },

    /// Tokens were added to an existing position
    Deposited { tx_id: TxId, amount: u64 },

    /// Tokens were withdrawn from a position
    Withdrawn { tx_id: TxId, amount: u64 },

    /// Rewards were claimed from a pool treasury
    RewardsClaimed { tx_id: TxId },

    /// Rewards were restaked into the position
    RewardsCompounded { tx_id: TxId },

    /// A position was refunded unilaterally by the pool owner
    PositionForceRefunded { tx_id: TxId },
}

impl StakewellEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::AuthorityMinted { .. } => EventType::AuthorityMinted,
            Self::AuthorityBurned { .. } => EventType::AuthorityBurned,
            Self::PoolCreated { .. } => EventType::PoolCreated,
            Self::PoolClosed { .. } => EventType::PoolClosed,
            Self::TreasuryFunded { .. } => EventType::TreasuryFunded,
            Self::TreasuryWithdrawn { .. } => EventType::TreasuryWithdrawn,
            Self::YieldUpdated { .. } => EventType::YieldUpdated,
            Self::PoolPaused { .. } => EventType::PoolPaused,
            Self::PoolResumed { .. } => EventType::PoolResumed,
            Self::PositionRegistered { .. } => EventType::PositionRegistered,
            Self::PositionClosed { .. } => EventType::PositionClosed,
            Self::Deposited { .. } => EventType::Deposited,
            Self::Withdrawn { .. } => EventType::Withdrawn,
            Self::RewardsClaimed { .. } => EventType::RewardsClaimed,
            Self::RewardsCompounded { .. } => EventType::RewardsCompounded,
            Self::PositionForceRefunded { .. } => EventType::PositionForceRefunded,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting events as transactions commit
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<StakewellEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: StakewellEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[StakewellEvent] {
        &self.events
    }

    /// Number of events recorded
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when no events have been recorded
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&StakewellEvent> {
        self.events
            .iter()
            .filter(|event| event.event_type() == event_type)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_roundtrip() {
        let event = StakewellEvent::TreasuryFunded {
            tx_id: [1u8; 32],
            amount: 500_000,
        };

        let bytes = event.to_bytes();
        assert_eq!(StakewellEvent::from_bytes(&bytes), Some(event));
    }

    #[test]
    fn test_filter_by_type() {
        let mut log = EventLog::new();
        log.emit(StakewellEvent::PoolCreated { tx_id: [1u8; 32] });
        log.emit(StakewellEvent::Deposited {
            tx_id: [2u8; 32],
            amount: 100,
        });
        log.emit(StakewellEvent::Deposited {
            tx_id: [3u8; 32],
            amount: 200,
        });

        assert_eq!(log.len(), 3);
        assert_eq!(log.filter_by_type(EventType::Deposited).len(), 2);
        assert_eq!(log.filter_by_type(EventType::PoolClosed).len(), 0);
    }
}
