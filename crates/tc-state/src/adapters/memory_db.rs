//! In-memory database, trie, and journal implementations for testing and
//! simulation. The trie root is a keccak digest over the sorted entries, so
//! equal content always produces equal roots.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use sha3::{Digest, Keccak256};

use crate::domain::{Address, Hash, JournalEntry, StateError, EMPTY_ROOT};
use crate::ports::{Database, Journal, Trie};

/// Committed trie snapshots and code blobs, shared by every handle the
/// database gives out.
#[derive(Default)]
struct DbInner {
    tries: RwLock<HashMap<Hash, BTreeMap<Vec<u8>, Vec<u8>>>>,
    code: RwLock<HashMap<Hash, Vec<u8>>>,
}

/// In-memory implementation of [`Database`].
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    inner: Arc<DbInner>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a code blob under its hash.
    pub fn insert_code(&self, code_hash: Hash, code: Vec<u8>) {
        if let Ok(mut map) = self.inner.code.write() {
            map.insert(code_hash, code);
        }
    }
}

impl Database for MemoryDatabase {
    fn open_storage_trie(&self, _addr_hash: Hash, root: Hash) -> Result<Box<dyn Trie>, StateError> {
        if root == EMPTY_ROOT || root.is_zero() {
            return Ok(Box::new(MemoryTrie {
                entries: BTreeMap::new(),
                db: Arc::clone(&self.inner),
            }));
        }
        let tries = self.inner.tries.read().map_err(|_| StateError::LockPoisoned)?;
        let entries = tries
            .get(&root)
            .cloned()
            .ok_or_else(|| StateError::TrieOpen(format!("unknown root {root}")))?;
        Ok(Box::new(MemoryTrie {
            entries,
            db: Arc::clone(&self.inner),
        }))
    }

    fn contract_code(&self, _addr_hash: Hash, code_hash: Hash) -> Result<Vec<u8>, StateError> {
        let code = self.inner.code.read().map_err(|_| StateError::LockPoisoned)?;
        code.get(&code_hash)
            .cloned()
            .ok_or_else(|| StateError::Database(format!("unknown code hash {code_hash}")))
    }

    fn contract_code_size(&self, addr_hash: Hash, code_hash: Hash) -> Result<usize, StateError> {
        self.contract_code(addr_hash, code_hash).map(|code| code.len())
    }

    fn copy_trie(&self, trie: &dyn Trie) -> Box<dyn Trie> {
        trie.clone_trie()
    }
}

/// In-memory implementation of [`Trie`].
pub struct MemoryTrie {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    db: Arc<DbInner>,
}

impl Trie for MemoryTrie {
    fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.entries.get(key).cloned())
    }

    fn try_update(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn try_delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.entries.remove(key);
        Ok(())
    }

    fn hash(&self) -> Hash {
        if self.entries.is_empty() {
            return EMPTY_ROOT;
        }
        let mut hasher = Keccak256::new();
        for (key, value) in &self.entries {
            hasher.update(key);
            hasher.update(value);
        }
        Hash::new(hasher.finalize().into())
    }

    fn commit(&mut self) -> Result<Hash, StateError> {
        let root = self.hash();
        let mut tries = self
            .db
            .tries
            .write()
            .map_err(|_| StateError::LockPoisoned)?;
        tries.insert(root, self.entries.clone());
        Ok(root)
    }

    fn clone_trie(&self) -> Box<dyn Trie> {
        Box::new(MemoryTrie {
            entries: self.entries.clone(),
            db: Arc::clone(&self.db),
        })
    }
}

/// Journal that records entries and dirty marks for inspection and replay.
#[derive(Default)]
pub struct RecordingJournal {
    entries: Vec<JournalEntry>,
    dirtied: Vec<Address>,
}

impl RecordingJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries recorded so far, oldest first.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Addresses force-marked dirty.
    pub fn dirtied(&self) -> &[Address] {
        &self.dirtied
    }

    /// Marks a revert point: the current journal length.
    pub fn snapshot(&self) -> usize {
        self.entries.len()
    }

    /// Removes and returns every entry recorded after `snapshot`. The
    /// caller replays them in reverse to restore the snapshot.
    pub fn split_off(&mut self, snapshot: usize) -> Vec<JournalEntry> {
        self.entries.split_off(snapshot.min(self.entries.len()))
    }

    /// Forgets all recorded entries and dirty marks.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dirtied.clear();
    }
}

impl Journal for RecordingJournal {
    fn append(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    fn dirty(&mut self, address: Address) {
        self.dirtied.push(address);
    }
}
