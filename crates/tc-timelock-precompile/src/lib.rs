//! # Time-Lock Precompiled Contract
//!
//! Native implementation of the contract at `0x8888...8888`, which keeps
//! multi-interval time-locked balances per `(caller, beneficiary)` pair in
//! its own storage area.
//!
//! ## ABI
//!
//! Input is raw 32-byte word-aligned bytes: one selector word followed by
//! the parameter words. Numbers are big-endian. The function set, in
//! selector order:
//!
//! | # | Function | Returns |
//! |---|----------|---------|
//! | 1 | `getTimeLockBalance(beneficiary, raw?)` | formatted or raw string |
//! | 2 | `hasTimeLockBalance(beneficiary, value, start, end)` | `0x00`/`0x01` |
//! | 3 | `getTimeLockValue(beneficiary, start, end)` | 32-byte big-endian value |
//! | 4 | `addTimeLockBalance(beneficiary, value, start, end)` | `"Ok: addTimeLockBalance"` |
//! | 5 | `subTimeLockBalance(beneficiary, value, start, end)` | `"Ok: subTimeLockBalance"` |
//!
//! A start in the past clamps up to the block timestamp; a zero end means
//! forever. Failures return an `"Error: <msg>"` payload together with the
//! error.

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod contract;
pub mod errors;
pub mod ports;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::adapters::InMemoryStructStore;
    pub use crate::contract::{
        CallContext, TimeLockContract, TimeLockFunc, TIME_LOCK_CALC_GAS,
        TIME_LOCK_CONTRACT_ADDRESS,
    };
    pub use crate::errors::PrecompileError;
    pub use crate::ports::StructStore;
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
