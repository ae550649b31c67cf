//! # Error Types
//!
//! Errors surfaced by the time-lock precompile. Unlike state-object
//! mutations, the precompile is invoked explicitly and may fail per call:
//! the VM receives both an `"Error: <msg>"` payload and the error itself.

use thiserror::Error;

/// Errors from time-lock precompile execution.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PrecompileError {
    /// The selector word does not name a function.
    #[error("unknown func type")]
    UnknownFunc,

    /// The input is not exactly selector plus the declared parameter words.
    #[error("wrong length of input")]
    WrongLenOfInput,

    /// A time word does not fit in 64 bits.
    #[error("value overflow")]
    ValueOverflow,

    /// The requested interval is inverted after clamping.
    #[error("wrong time range")]
    WrongTimeRange,

    /// The stored time-lock does not cover the requested interval or value.
    #[error("not enough balance")]
    NotEnoughBalance,
}
