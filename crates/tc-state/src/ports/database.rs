use crate::domain::{Hash, StateError};

/// Per-account storage trie abstraction.
///
/// Keys and values are raw byte strings; values carry the canonical slot
/// encoding. `hash` is the current root, `commit` persists node data and
/// returns the final root.
pub trait Trie: Send {
    fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError>;
    fn try_update(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError>;
    fn try_delete(&mut self, key: &[u8]) -> Result<(), StateError>;
    fn hash(&self) -> Hash;
    fn commit(&mut self) -> Result<Hash, StateError>;
    /// Duplicates the trie handle for deep copies of a state object.
    fn clone_trie(&self) -> Box<dyn Trie>;
}

/// Backing database abstraction consumed by state objects.
pub trait Database: Send + Sync {
    fn open_storage_trie(&self, addr_hash: Hash, root: Hash) -> Result<Box<dyn Trie>, StateError>;
    fn contract_code(&self, addr_hash: Hash, code_hash: Hash) -> Result<Vec<u8>, StateError>;
    fn contract_code_size(&self, addr_hash: Hash, code_hash: Hash) -> Result<usize, StateError>;
    fn copy_trie(&self, trie: &dyn Trie) -> Box<dyn Trie>;
}
