//! # tc-state
//!
//! Account state objects for Temporal-Chain.
//!
//! ## Role in System
//!
//! - **Single Source of Truth**: the in-memory view of one account while it
//!   is being modified, mediating all reads and writes against the
//!   content-addressed storage trie
//! - **Reversible Mutations**: every mutation appends its undo record to
//!   the container's journal before touching memory
//! - **Consensus Encoding**: the canonical account encoding produced here is
//!   the wire format and feeds the global state root
//!
//! ## Data Flow
//!
//! ```text
//! VM ──mutation──→ [StateObject] ──append prior value──→ [Journal]
//!                       │
//!              finalise (tx end): dirty → pending
//!                       │
//!          update_trie (block end): pending → storage trie
//!                       │
//!                commit_trie: trie → database, new storage root
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;

pub use domain::*;
pub use ports::{Database, Journal, Trie};

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::adapters::{MemoryDatabase, MemoryTrie, RecordingJournal};
    pub use crate::domain::{
        keccak256, Account, Address, CodecError, Hash, JournalEntry, StateError, StateObject,
        Storage, TimeLock, TimeLockItem, EMPTY_CODE_HASH, EMPTY_ROOT, RIPEMD_ADDRESS,
        TIME_LOCK_FOREVER, U256,
    };
    pub use crate::ports::{Database, Journal, Trie};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
