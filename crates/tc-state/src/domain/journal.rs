//! # Journal Entries
//!
//! Reversible undo records. Every state-object mutation appends the prior
//! value of the touched field *before* mutating, so the outer container can
//! revert speculative execution by replaying entries in reverse.

use super::timelock::TimeLock;
use super::value_objects::{Address, Hash, U256};
use serde::{Deserialize, Serialize};

/// One undo record. Each variant carries enough prior-value data to restore
/// the field it shadows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEntry {
    /// An empty account was accessed; no value changed, but the address must
    /// be considered dirty for empty-account cleanup.
    Touch {
        /// Touched account.
        address: Address,
    },
    /// A storage slot is about to change.
    StorageChange {
        /// Owning account.
        address: Address,
        /// Slot key.
        key: Hash,
        /// Value before the write, as seen through the cache tiers.
        prev: Hash,
    },
    /// A per-asset balance is about to change.
    BalanceChange {
        /// Owning account.
        address: Address,
        /// Asset identifier.
        asset: Hash,
        /// Balance before the write.
        prev: U256,
    },
    /// A per-asset time-lock balance is about to change.
    TimeLockBalanceChange {
        /// Owning account.
        address: Address,
        /// Asset identifier.
        asset: Hash,
        /// Time-lock before the write.
        prev: TimeLock,
    },
    /// Contract code is about to change.
    CodeChange {
        /// Owning account.
        address: Address,
        /// Code hash before the write.
        prev_hash: Hash,
        /// Code bytes before the write.
        prev_code: Vec<u8>,
    },
    /// The nonce is about to change.
    NonceChange {
        /// Owning account.
        address: Address,
        /// Nonce before the write.
        prev: u64,
    },
    /// The notation is about to change.
    NotationChange {
        /// Owning account.
        address: Address,
        /// Notation before the write.
        prev: u64,
    },
}

impl JournalEntry {
    /// The account this entry belongs to; the container uses it to route the
    /// undo to the right state object.
    #[must_use]
    pub fn address(&self) -> Address {
        match self {
            JournalEntry::Touch { address }
            | JournalEntry::StorageChange { address, .. }
            | JournalEntry::BalanceChange { address, .. }
            | JournalEntry::TimeLockBalanceChange { address, .. }
            | JournalEntry::CodeChange { address, .. }
            | JournalEntry::NonceChange { address, .. }
            | JournalEntry::NotationChange { address, .. } => *address,
        }
    }
}
