//! # Domain Layer for Account State
//!
//! Pure domain logic; no I/O beyond the capability traits in `ports`.
//!
//! ## Modules
//!
//! - `value_objects`: consensus primitives (Hash, Address, U256)
//! - `codec`: the canonical wire encoding and Keccak-256
//! - `timelock`: the multi-interval time-locked balance type
//! - `account`: the consensus account record
//! - `journal`: reversible undo records
//! - `object`: the state object itself
//! - `errors`: domain error types

pub mod account;
pub mod codec;
pub mod errors;
pub mod journal;
pub mod object;
pub mod timelock;
pub mod value_objects;

pub use account::*;
pub use codec::{keccak256, CodecError};
pub use errors::*;
pub use journal::*;
pub use object::*;
pub use timelock::*;
pub use value_objects::*;
