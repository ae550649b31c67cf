//! # Outbound Ports
//!
//! Capabilities the precompile consumes from the surrounding engine.

use tc_state::domain::Address;

/// Raw structured-data access on the state container. The precompile stores
/// its per-(caller, beneficiary) time-locks under its own contract address
/// through this capability.
pub trait StructStore {
    /// Reads the blob stored under `key` in `contract`'s storage area.
    /// Absent keys read as empty.
    fn get_struct_data(&self, contract: Address, key: &[u8]) -> Vec<u8>;

    /// Writes the blob stored under `key` in `contract`'s storage area.
    /// Writing an empty blob clears the entry.
    fn set_struct_data(&mut self, contract: Address, key: &[u8], data: Vec<u8>);
}
