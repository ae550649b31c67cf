//! # Struct Store Adapter
//!
//! In-memory structured-data access for testing. The production
//! implementation is backed by the state container's storage tries.

use std::collections::HashMap;

use tc_state::domain::Address;

use crate::ports::StructStore;

/// In-memory [`StructStore`] for tests.
#[derive(Debug, Default)]
pub struct InMemoryStructStore {
    data: HashMap<(Address, Vec<u8>), Vec<u8>>,
}

impl InMemoryStructStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-empty entries, for test assertions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl StructStore for InMemoryStructStore {
    fn get_struct_data(&self, contract: Address, key: &[u8]) -> Vec<u8> {
        self.data
            .get(&(contract, key.to_vec()))
            .cloned()
            .unwrap_or_default()
    }

    fn set_struct_data(&mut self, contract: Address, key: &[u8], data: Vec<u8>) {
        if data.is_empty() {
            self.data.remove(&(contract, key.to_vec()));
        } else {
            self.data.insert((contract, key.to_vec()), data);
        }
    }
}
