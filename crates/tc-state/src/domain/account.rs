//! # Account Record
//!
//! The consensus representation of a single account. These records are
//! stored in the main account trie; their canonical encoding is the wire
//! format and participates in the global state root.

use super::codec::{self, CodecError};
use super::timelock::TimeLock;
use super::value_objects::{Hash, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Keccak-256 of the empty byte string: the code hash of accounts without
/// code.
pub const EMPTY_CODE_HASH: Hash = Hash([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03,
    0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85,
    0xa4, 0x70,
]);

/// Root digest of the empty storage trie.
pub const EMPTY_ROOT: Hash = Hash([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8,
    0x6e, 0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63,
    0xb4, 0x21,
]);

/// Consensus account record.
///
/// Per-asset balances are parallel arrays, not maps: position is assigned at
/// first touch and is thereafter stable, and that insertion order is
/// observable in the canonical encoding. Swapping these for a map would
/// change the state root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Transaction counter.
    pub nonce: u64,
    /// Domain-specific account label.
    pub notation: u64,
    /// Asset identifiers, unique, insertion-ordered.
    pub balances_keys: Vec<Hash>,
    /// Asset amounts, parallel to `balances_keys`.
    pub balances_values: Vec<U256>,
    /// Time-lock asset identifiers, unique, insertion-ordered.
    pub timelock_keys: Vec<Hash>,
    /// Time-lock balances, parallel to `timelock_keys`.
    pub timelock_values: Vec<TimeLock>,
    /// Merkle root of the storage trie.
    pub storage_root: Hash,
    /// Hash of contract code, `EMPTY_CODE_HASH` for accounts without code.
    pub code_hash: Hash,
}

impl Default for Account {
    fn default() -> Self {
        Self::new()
    }
}

impl Account {
    /// Creates an empty account with the distinguished defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nonce: 0,
            notation: 0,
            balances_keys: Vec::new(),
            balances_values: Vec::new(),
            timelock_keys: Vec::new(),
            timelock_values: Vec::new(),
            storage_root: EMPTY_ROOT,
            code_hash: EMPTY_CODE_HASH,
        }
    }

    /// Canonical encoding, fields in declared order. Empty sequences encode
    /// as empty lists, never as absent fields.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        debug_assert_eq!(self.balances_keys.len(), self.balances_values.len());
        debug_assert_eq!(self.timelock_keys.len(), self.timelock_values.len());

        let balances_keys: Vec<Vec<u8>> = self
            .balances_keys
            .iter()
            .map(|k| codec::encode_bytes(k.as_bytes()))
            .collect();
        let balances_values: Vec<Vec<u8>> =
            self.balances_values.iter().map(codec::encode_u256).collect();
        let timelock_keys: Vec<Vec<u8>> = self
            .timelock_keys
            .iter()
            .map(|k| codec::encode_bytes(k.as_bytes()))
            .collect();
        let timelock_values: Vec<Vec<u8>> =
            self.timelock_values.iter().map(TimeLock::encode).collect();

        codec::encode_list(&[
            codec::encode_u64(self.nonce),
            codec::encode_u64(self.notation),
            codec::encode_list(&balances_keys),
            codec::encode_list(&balances_values),
            codec::encode_list(&timelock_keys),
            codec::encode_list(&timelock_values),
            codec::encode_bytes(self.storage_root.as_bytes()),
            codec::encode_bytes(self.code_hash.as_bytes()),
        ])
    }

    /// Decodes a canonical encoding. Any missing or malformed field fails
    /// the whole decode.
    pub fn decode(input: &[u8]) -> Result<Self, CodecError> {
        let payload = codec::decode_single(input)?.as_list()?;
        let fields = codec::list_items(payload)?;
        if fields.len() != 8 {
            return Err(CodecError::WrongFieldCount {
                expected: 8,
                actual: fields.len(),
            });
        }

        let nonce = codec::decode_u64(fields[0].as_bytes()?)?;
        let notation = codec::decode_u64(fields[1].as_bytes()?)?;

        let balances_keys = decode_hash_seq(fields[2])?;
        let balances_values = codec::list_items(fields[3].as_list()?)?
            .into_iter()
            .map(|item| codec::decode_u256(item.as_bytes()?))
            .collect::<Result<Vec<_>, _>>()?;
        let timelock_keys = decode_hash_seq(fields[4])?;
        let timelock_values = codec::list_items(fields[5].as_list()?)?
            .into_iter()
            .map(|item| TimeLock::decode_items(item.as_list()?))
            .collect::<Result<Vec<_>, _>>()?;

        let storage_root = codec::decode_hash(fields[6].as_bytes()?)?;
        let code_hash = codec::decode_hash(fields[7].as_bytes()?)?;

        if balances_keys.len() != balances_values.len() {
            return Err(CodecError::WrongFieldCount {
                expected: balances_keys.len(),
                actual: balances_values.len(),
            });
        }
        if timelock_keys.len() != timelock_values.len() {
            return Err(CodecError::WrongFieldCount {
                expected: timelock_keys.len(),
                actual: timelock_values.len(),
            });
        }

        Ok(Self {
            nonce,
            notation,
            balances_keys,
            balances_values,
            timelock_keys,
            timelock_values,
            storage_root,
            code_hash,
        })
    }

    /// Non-zero asset balances, keyed by asset digest. Used by query
    /// surfaces; zero-valued placeholder entries are filtered out.
    #[must_use]
    pub fn non_zero_balances(&self) -> HashMap<Hash, U256> {
        self.balances_keys
            .iter()
            .zip(self.balances_values.iter())
            .filter(|(_, value)| !value.is_zero())
            .map(|(key, value)| (*key, *value))
            .collect()
    }

    /// Non-empty time-lock balances, keyed by asset digest.
    #[must_use]
    pub fn non_empty_time_locks(&self) -> HashMap<Hash, TimeLock> {
        self.timelock_keys
            .iter()
            .zip(self.timelock_values.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (*key, value.clone()))
            .collect()
    }
}

/// Decode a sequence of 32-byte digests.
fn decode_hash_seq(item: codec::Item<'_>) -> Result<Vec<Hash>, CodecError> {
    codec::list_items(item.as_list()?)?
        .into_iter()
        .map(|item| codec::decode_hash(item.as_bytes()?))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
