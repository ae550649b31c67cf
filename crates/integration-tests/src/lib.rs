//! # Integration Tests Crate
//!
//! End-to-end scenarios that exercise the state layer and the time-lock
//! contract together through the in-memory adapters.
//!
//! ## Structure
//!
//! ```text
//! integration-tests/
//! └── src/
//!     ├── lib.rs            # This file
//!     ├── state_flows.rs    # Balance commit, snapshot/revert, storage flows
//!     └── timelock_flows.rs # Time-lock contract flows
//! ```

#[cfg(test)]
mod state_flows;
#[cfg(test)]
mod timelock_flows;
