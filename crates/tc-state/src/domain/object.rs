//! # State Object
//!
//! In-memory view of a single account while it is being modified.
//!
//! The usage pattern is as follows: the state container obtains a state
//! object on first access, account values are read and modified through it,
//! and at the end of the block `commit_trie` writes the modified storage
//! trie into the database. Every mutation appends its undo record to the
//! container's journal before touching memory, so speculative execution can
//! be reverted.

use std::collections::HashMap;
use std::mem;

use tracing::{debug, trace};

use super::account::{Account, EMPTY_CODE_HASH, EMPTY_ROOT};
use super::codec::{self, CodecError};
use super::errors::StateError;
use super::journal::JournalEntry;
use super::timelock::TimeLock;
use super::value_objects::{Address, Hash, U256};
use crate::ports::{Database, Journal, Trie};

/// The consensus-defined ripemd address. Its touch records would not survive
/// a subsequent revert, so touches force it into the dirty set directly.
pub const RIPEMD_ADDRESS: Address = Address([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3,
]);

/// Per-account storage cache: slot key to slot value.
pub type Storage = HashMap<Hash, Hash>;

/// A single account being modified.
pub struct StateObject {
    address: Address,
    /// Keccak-256 of the account address, the trie key space.
    addr_hash: Hash,
    data: Account,
    /// Verdict of the container's special-address predicate; special
    /// accounts are never considered empty.
    special: bool,

    /// First database-level error seen by this object. Consensus code
    /// cannot handle such errors mid-execution, so they are memoized here
    /// and surfaced by `commit_trie`.
    db_err: Option<StateError>,

    /// Storage trie, opened on first access.
    trie: Option<Box<dyn Trie>>,
    /// Contract bytecode, fetched on first access.
    code: Option<Vec<u8>>,

    /// Slot values as originally read from the trie this transaction, kept
    /// to elide noop rewrites.
    origin_storage: Storage,
    /// Slot values awaiting flush at the end of the block.
    pending_storage: Storage,
    /// Slot values modified in the current transaction.
    dirty_storage: Storage,
    /// Debug override installed by `set_storage`; authoritative for all
    /// reads and writes, never flushed.
    fake_storage: Option<Storage>,

    dirty_code: bool,
    suicided: bool,
    deleted: bool,
}

impl StateObject {
    /// Creates a state object for `address` backed by `data`. The container
    /// evaluates its special-address predicate and passes the verdict.
    #[must_use]
    pub fn new(address: Address, data: Account, special: bool) -> Self {
        Self {
            address,
            addr_hash: codec::keccak256(address.as_bytes()),
            data,
            special,
            db_err: None,
            trie: None,
            code: None,
            origin_storage: Storage::new(),
            pending_storage: Storage::new(),
            dirty_storage: Storage::new(),
            fake_storage: None,
            dirty_code: false,
            suicided: false,
            deleted: false,
        }
    }

    // =========================================================================
    // IDENTITY & FLAGS
    // =========================================================================

    /// The account address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Keccak-256 of the account address.
    #[must_use]
    pub fn address_hash(&self) -> Hash {
        self.addr_hash
    }

    /// The consensus account record.
    #[must_use]
    pub fn account(&self) -> &Account {
        &self.data
    }

    /// Canonical encoding of the account record.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        self.data.encode()
    }

    /// Whether the account is empty: zero nonce, no balance entries, no
    /// time-lock entries, no code, and not a special address.
    #[must_use]
    pub fn empty(&self) -> bool {
        self.data.nonce == 0
            && self.data.balances_values.is_empty()
            && self.data.timelock_values.is_empty()
            && self.data.code_hash == EMPTY_CODE_HASH
            && !self.special
    }

    /// Marks the account for deletion during state-transition finalization.
    pub fn mark_suicided(&mut self) {
        self.suicided = true;
    }

    /// Whether the account has been marked suicided.
    #[must_use]
    pub fn is_suicided(&self) -> bool {
        self.suicided
    }

    /// Marks the object as removed from the trie.
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    /// Whether the object has been removed from the trie.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Whether the code was updated this block.
    #[must_use]
    pub fn is_dirty_code(&self) -> bool {
        self.dirty_code
    }

    /// The first memoized database error, if any.
    #[must_use]
    pub fn db_error(&self) -> Option<&StateError> {
        self.db_err.as_ref()
    }

    /// Remembers the first error it is called with.
    fn set_error(&mut self, err: StateError) {
        if self.db_err.is_none() {
            self.db_err = Some(err);
        }
    }

    /// Records an access to an empty account so the empty-account cleanup
    /// rule can observe it.
    pub fn touch(&mut self, journal: &mut dyn Journal) {
        journal.append(JournalEntry::Touch {
            address: self.address,
        });
        if self.address == RIPEMD_ADDRESS {
            // Explicitly put it in the dirty set, which is otherwise
            // generated from the flattened journal.
            journal.dirty(self.address);
        }
    }

    // =========================================================================
    // STORAGE SLOTS
    // =========================================================================

    /// Opens the storage trie on first use. On open failure the error is
    /// memoized and a fresh trie stands in so execution can continue.
    fn ensure_trie(&mut self, db: &dyn Database) -> Option<&mut (dyn Trie + 'static)> {
        if self.trie.is_none() {
            match db.open_storage_trie(self.addr_hash, self.data.storage_root) {
                Ok(trie) => self.trie = Some(trie),
                Err(err) => {
                    self.set_error(StateError::TrieOpen(err.to_string()));
                    if let Ok(trie) = db.open_storage_trie(self.addr_hash, EMPTY_ROOT) {
                        self.trie = Some(trie);
                    }
                }
            }
        }
        self.trie.as_deref_mut()
    }

    /// Retrieves a value from account storage, preferring the value written
    /// in the current transaction.
    pub fn get_state(&mut self, db: &dyn Database, key: Hash) -> Hash {
        if let Some(fake) = &self.fake_storage {
            return fake.get(&key).copied().unwrap_or_default();
        }
        if let Some(value) = self.dirty_storage.get(&key) {
            return *value;
        }
        self.get_committed_state(db, key)
    }

    /// Retrieves a value from the committed account storage: pending writes
    /// for this block, then the cached original, then the trie itself.
    pub fn get_committed_state(&mut self, db: &dyn Database, key: Hash) -> Hash {
        if let Some(fake) = &self.fake_storage {
            return fake.get(&key).copied().unwrap_or_default();
        }
        if let Some(value) = self.pending_storage.get(&key) {
            return *value;
        }
        if let Some(value) = self.origin_storage.get(&key) {
            return *value;
        }

        let read = {
            let Some(trie) = self.ensure_trie(db) else {
                return Hash::ZERO;
            };
            trie.try_get(key.as_bytes())
        };
        let enc = match read {
            Ok(enc) => enc,
            Err(err) => {
                self.set_error(err);
                return Hash::ZERO;
            }
        };

        let mut value = Hash::ZERO;
        if let Some(enc) = enc.filter(|enc| !enc.is_empty()) {
            match decode_slot(&enc) {
                Ok(decoded) => value = decoded,
                Err(err) => self.set_error(StateError::Codec(err)),
            }
        }
        self.origin_storage.insert(key, value);
        value
    }

    /// Updates a value in account storage. Writing the value a slot already
    /// holds is a noop and leaves the journal untouched.
    pub fn set_state(
        &mut self,
        db: &dyn Database,
        journal: &mut dyn Journal,
        key: Hash,
        value: Hash,
    ) {
        // In debugging mode the fake storage absorbs the write directly
        if let Some(fake) = &mut self.fake_storage {
            fake.insert(key, value);
            return;
        }
        let prev = self.get_state(db, key);
        if prev == value {
            return;
        }
        journal.append(JournalEntry::StorageChange {
            address: self.address,
            key,
            prev,
        });
        self.dirty_storage.insert(key, value);
    }

    /// Replaces the visible state storage with the given one. All reads and
    /// writes then hit only this fake storage, which is never committed.
    /// Debugging only, hence not journaled.
    pub fn set_storage(&mut self, storage: Storage) {
        self.fake_storage
            .get_or_insert_with(Storage::new)
            .extend(storage);
    }

    /// Moves all dirty slots into the pending area to be hashed or committed
    /// later. Invoked at the end of every transaction; idempotent.
    pub fn finalise(&mut self) {
        if self.dirty_storage.is_empty() {
            return;
        }
        let dirty = mem::take(&mut self.dirty_storage);
        self.pending_storage.extend(dirty);
    }

    /// Writes cached storage modifications into the storage trie. Returns
    /// false when the trie was never loaded and no changes were made, which
    /// signals that no hashing is needed.
    pub fn update_trie(&mut self, db: &dyn Database) -> bool {
        // Make sure all dirty slots are finalized into the pending area
        self.finalise();
        if self.pending_storage.is_empty() {
            return self.trie.is_some();
        }
        if self.ensure_trie(db).is_none() {
            return false;
        }

        let pending = mem::take(&mut self.pending_storage);
        let mut first_err: Option<StateError> = None;
        let mut flushed = 0usize;
        let Some(trie) = self.trie.as_deref_mut() else {
            return false;
        };
        for (key, value) in pending {
            // Skip noop rewrites, persist actual changes
            if value == self.origin_storage.get(&key).copied().unwrap_or_default() {
                continue;
            }
            self.origin_storage.insert(key, value);
            flushed += 1;

            let result = if value.is_zero() {
                trie.try_delete(key.as_bytes())
            } else {
                trie.try_update(key.as_bytes(), &codec::encode_bytes(value.trimmed()))
            };
            if let Err(err) = result {
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
        if let Some(err) = first_err {
            self.set_error(err);
        }
        trace!(address = %self.address, slots = flushed, "flushed pending storage");
        true
    }

    /// Sets the storage root to the current trie hash. Skips hashing when
    /// nothing changed.
    pub fn update_root(&mut self, db: &dyn Database) {
        if !self.update_trie(db) {
            return;
        }
        if let Some(trie) = self.trie.as_deref() {
            self.data.storage_root = trie.hash();
        }
    }

    /// Commits the storage trie, updating the storage root. Surfaces the
    /// first memoized database error instead of committing on top of it.
    pub fn commit_trie(&mut self, db: &dyn Database) -> Result<(), StateError> {
        if !self.update_trie(db) {
            return Ok(());
        }
        if let Some(err) = self.db_err.clone() {
            return Err(err);
        }
        let Some(trie) = self.trie.as_deref_mut() else {
            return Ok(());
        };
        let root = trie.commit()?;
        self.data.storage_root = root;
        debug!(address = %self.address, root = %root, "committed storage trie");
        Ok(())
    }

    // =========================================================================
    // BALANCES
    // =========================================================================

    /// Position of `asset` in the parallel balance arrays, appending a zero
    /// entry if absent. Positions are stable for the account's lifetime.
    fn balance_index(&mut self, asset: Hash) -> usize {
        if let Some(index) = self.data.balances_keys.iter().position(|k| *k == asset) {
            return index;
        }
        self.data.balances_keys.push(asset);
        self.data.balances_values.push(U256::zero());
        self.data.balances_values.len() - 1
    }

    /// Adds `amount` to the account's balance of `asset`. Adding zero only
    /// touches the account if it is empty, so the empty-account clearing
    /// rule can take effect.
    pub fn add_balance(&mut self, journal: &mut dyn Journal, asset: Hash, amount: U256) {
        if amount.is_zero() {
            if self.empty() {
                self.touch(journal);
            }
            return;
        }
        let index = self.balance_index(asset);
        let next = self.data.balances_values[index].saturating_add(amount);
        self.set_balance(journal, asset, next);
    }

    /// Removes `amount` from the account's balance of `asset`. The caller is
    /// responsible for non-negativity; balances are unsigned.
    pub fn sub_balance(&mut self, journal: &mut dyn Journal, asset: Hash, amount: U256) {
        if amount.is_zero() {
            return;
        }
        let index = self.balance_index(asset);
        let next = self.data.balances_values[index].saturating_sub(amount);
        self.set_balance(journal, asset, next);
    }

    /// Sets the account's balance of `asset` unconditionally.
    pub fn set_balance(&mut self, journal: &mut dyn Journal, asset: Hash, amount: U256) {
        let index = self.balance_index(asset);
        journal.append(JournalEntry::BalanceChange {
            address: self.address,
            asset,
            prev: self.data.balances_values[index],
        });
        self.data.balances_values[index] = amount;
    }

    /// The account's balance of `asset`.
    ///
    /// Reading an absent asset appends a zero entry first. The insertion is
    /// a deliberate, consensus-observable invariant of this accessor (it can
    /// leave the account non-empty without any mutation) and is not
    /// journaled; replay relies on the same behavior.
    pub fn balance(&mut self, asset: Hash) -> U256 {
        let index = self.balance_index(asset);
        self.data.balances_values[index]
    }

    /// Non-zero balances keyed by asset, for query surfaces.
    #[must_use]
    pub fn balances(&self) -> HashMap<Hash, U256> {
        self.data.non_zero_balances()
    }

    // =========================================================================
    // TIME-LOCK BALANCES
    // =========================================================================

    /// Position of `asset` in the parallel time-lock arrays, appending an
    /// empty entry if absent.
    fn time_lock_index(&mut self, asset: Hash) -> usize {
        if let Some(index) = self.data.timelock_keys.iter().position(|k| *k == asset) {
            return index;
        }
        self.data.timelock_keys.push(asset);
        self.data.timelock_values.push(TimeLock::new());
        self.data.timelock_values.len() - 1
    }

    /// Adds a time-lock to the account's time-lock balance of `asset`,
    /// clearing items that expired before `timestamp`. Adding an empty lock
    /// only touches the account if it is empty.
    pub fn add_time_lock_balance(
        &mut self,
        journal: &mut dyn Journal,
        asset: Hash,
        amount: &TimeLock,
        timestamp: u64,
    ) {
        if amount.is_empty() {
            if self.empty() {
                self.touch(journal);
            }
            return;
        }
        let index = self.time_lock_index(asset);
        let mut next = self.data.timelock_values[index].add(amount);
        next.clear_expired(timestamp);
        self.set_time_lock_balance(journal, asset, next);
    }

    /// Subtracts a time-lock from the account's time-lock balance of
    /// `asset`, clearing expired items. The caller must have checked
    /// coverage.
    pub fn sub_time_lock_balance(
        &mut self,
        journal: &mut dyn Journal,
        asset: Hash,
        amount: &TimeLock,
        timestamp: u64,
    ) {
        if amount.is_empty() {
            return;
        }
        let index = self.time_lock_index(asset);
        let mut next = self.data.timelock_values[index].sub(amount);
        next.clear_expired(timestamp);
        self.set_time_lock_balance(journal, asset, next);
    }

    /// Sets the account's time-lock balance of `asset` unconditionally.
    pub fn set_time_lock_balance(
        &mut self,
        journal: &mut dyn Journal,
        asset: Hash,
        amount: TimeLock,
    ) {
        let index = self.time_lock_index(asset);
        journal.append(JournalEntry::TimeLockBalanceChange {
            address: self.address,
            asset,
            prev: self.data.timelock_values[index].clone(),
        });
        self.data.timelock_values[index] = amount;
    }

    /// The account's time-lock balance of `asset`, appending an empty entry
    /// if absent (the same deliberate invariant as [`StateObject::balance`]).
    pub fn time_lock_balance(&mut self, asset: Hash) -> &TimeLock {
        let index = self.time_lock_index(asset);
        &self.data.timelock_values[index]
    }

    /// Non-empty time-lock balances keyed by asset, for query surfaces.
    #[must_use]
    pub fn time_lock_balances(&self) -> HashMap<Hash, TimeLock> {
        self.data.non_empty_time_locks()
    }

    // =========================================================================
    // CODE, NONCE, NOTATION
    // =========================================================================

    /// The contract code associated with this object, if any. Fetched from
    /// the database on first use and cached.
    pub fn code(&mut self, db: &dyn Database) -> Vec<u8> {
        if let Some(code) = &self.code {
            return code.clone();
        }
        if self.data.code_hash == EMPTY_CODE_HASH {
            return Vec::new();
        }
        match db.contract_code(self.addr_hash, self.data.code_hash) {
            Ok(code) => {
                self.code = Some(code.clone());
                code
            }
            Err(err) => {
                self.set_error(StateError::CodeLoad {
                    hash: self.data.code_hash,
                    reason: err.to_string(),
                });
                Vec::new()
            }
        }
    }

    /// The size of the contract code. Mirrors [`StateObject::code`] but asks
    /// the database for the size directly, bypassing the byte cache.
    pub fn code_size(&mut self, db: &dyn Database) -> usize {
        if let Some(code) = &self.code {
            return code.len();
        }
        if self.data.code_hash == EMPTY_CODE_HASH {
            return 0;
        }
        match db.contract_code_size(self.addr_hash, self.data.code_hash) {
            Ok(size) => size,
            Err(err) => {
                self.set_error(StateError::CodeLoad {
                    hash: self.data.code_hash,
                    reason: err.to_string(),
                });
                0
            }
        }
    }

    /// Installs new contract code.
    pub fn set_code(
        &mut self,
        db: &dyn Database,
        journal: &mut dyn Journal,
        code_hash: Hash,
        code: Vec<u8>,
    ) {
        let prev_code = self.code(db);
        journal.append(JournalEntry::CodeChange {
            address: self.address,
            prev_hash: self.data.code_hash,
            prev_code,
        });
        self.set_code_raw(code_hash, code);
    }

    fn set_code_raw(&mut self, code_hash: Hash, code: Vec<u8>) {
        self.code = Some(code);
        self.data.code_hash = code_hash;
        self.dirty_code = true;
    }

    /// The hash of the contract code.
    #[must_use]
    pub fn code_hash(&self) -> Hash {
        self.data.code_hash
    }

    /// Sets the transaction counter.
    pub fn set_nonce(&mut self, journal: &mut dyn Journal, nonce: u64) {
        journal.append(JournalEntry::NonceChange {
            address: self.address,
            prev: self.data.nonce,
        });
        self.data.nonce = nonce;
    }

    /// The transaction counter.
    #[must_use]
    pub fn nonce(&self) -> u64 {
        self.data.nonce
    }

    /// Sets the account notation.
    pub fn set_notation(&mut self, journal: &mut dyn Journal, notation: u64) {
        journal.append(JournalEntry::NotationChange {
            address: self.address,
            prev: self.data.notation,
        });
        self.data.notation = notation;
    }

    /// The account notation.
    #[must_use]
    pub fn notation(&self) -> u64 {
        self.data.notation
    }

    /// The storage root carried by the account record.
    #[must_use]
    pub fn storage_root(&self) -> Hash {
        self.data.storage_root
    }

    // =========================================================================
    // COPY & REVERT
    // =========================================================================

    /// Produces an independent copy sharing no mutable state with the
    /// original, for the container's snapshot mechanism. The trie handle is
    /// duplicated through the database.
    #[must_use]
    pub fn deep_copy(&self, db: &dyn Database) -> StateObject {
        StateObject {
            address: self.address,
            addr_hash: self.addr_hash,
            data: self.data.clone(),
            special: self.special,
            db_err: self.db_err.clone(),
            trie: self.trie.as_deref().map(|trie| db.copy_trie(trie)),
            code: self.code.clone(),
            origin_storage: self.origin_storage.clone(),
            pending_storage: self.pending_storage.clone(),
            dirty_storage: self.dirty_storage.clone(),
            fake_storage: self.fake_storage.clone(),
            dirty_code: self.dirty_code,
            suicided: self.suicided,
            deleted: self.deleted,
        }
    }

    /// Restores the prior value captured by a journal entry. The container
    /// replays entries in reverse order; restoring never journals again.
    pub fn apply_undo(&mut self, entry: &JournalEntry) {
        debug_assert_eq!(entry.address(), self.address);
        match entry {
            JournalEntry::Touch { .. } => {}
            JournalEntry::StorageChange { key, prev, .. } => {
                self.dirty_storage.insert(*key, *prev);
            }
            JournalEntry::BalanceChange { asset, prev, .. } => {
                let index = self.balance_index(*asset);
                self.data.balances_values[index] = *prev;
            }
            JournalEntry::TimeLockBalanceChange { asset, prev, .. } => {
                let index = self.time_lock_index(*asset);
                self.data.timelock_values[index] = prev.clone();
            }
            JournalEntry::CodeChange {
                prev_hash,
                prev_code,
                ..
            } => {
                self.set_code_raw(*prev_hash, prev_code.clone());
            }
            JournalEntry::NonceChange { prev, .. } => {
                self.data.nonce = *prev;
            }
            JournalEntry::NotationChange { prev, .. } => {
                self.data.notation = *prev;
            }
        }
    }
}

/// Decode a stored slot value: the canonical encoding of the 32-byte value
/// with leading zero bytes stripped.
fn decode_slot(enc: &[u8]) -> Result<Hash, CodecError> {
    let content = codec::decode_single(enc)?.as_bytes()?;
    Hash::left_padded(content).ok_or(CodecError::WrongLength {
        expected: 32,
        actual: content.len(),
    })
}

// =============================================================================
// TESTS
// =============================================================================
