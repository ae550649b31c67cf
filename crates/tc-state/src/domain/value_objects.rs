//! # Value Objects
//!
//! Immutable consensus primitives shared by the state layer.
//! These types represent concepts that are defined by their value, not identity.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

// Re-export U256 from primitive-types for 256-bit arithmetic
pub use primitive_types::U256;

/// Lower-case `0x`-prefixed hex of a byte string.
fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().fold(String::from("0x"), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}

/// Abbreviated hex for log lines: leading and trailing nibbles around `..`.
fn hex_abbrev(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    let hex = hex_string(bytes);
    write!(f, "{}..{}", &hex[..8], &hex[hex.len() - 6..])
}

// =============================================================================
// HASH (32 bytes)
// =============================================================================

/// A 32-byte digest (Keccak-256 output, asset identifier, or storage word).
///
/// The all-zero digest denotes "no entry".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The zero digest.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates a digest from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Creates a digest from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(slice).ok().map(Self)
    }

    /// Creates a digest by left-padding at most 32 bytes with zeros.
    ///
    /// Returns None if the slice is longer than 32 bytes. Inverse of
    /// [`Hash::trimmed`], used when decoding stored slot values.
    #[must_use]
    pub fn left_padded(slice: &[u8]) -> Option<Self> {
        if slice.len() > 32 {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes[32 - slice.len()..].copy_from_slice(slice);
        Some(Self(bytes))
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the bytes with leading zero bytes stripped.
    #[must_use]
    pub fn trimmed(&self) -> &[u8] {
        let start = self.0.iter().position(|&b| b != 0).unwrap_or(32);
        &self.0[start..]
    }

    /// Returns true if this is the zero digest.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Lower-case `0x`-prefixed hex of the full digest.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex_string(&self.0)
    }

    /// Converts to U256 (big-endian).
    #[must_use]
    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    /// Creates a digest from a U256 (big-endian).
    #[must_use]
    pub fn from_u256(value: U256) -> Self {
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        Self(bytes)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hex_abbrev(f, &self.0)
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for [u8; 32] {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte account address.
///
/// Addresses only identify accounts; interpretation (special status, the
/// ripemd exception, precompile routing) is layered on top by their users.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Wraps a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Builds an address from a slice of exactly 20 bytes; any other length
    /// is None.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(slice).ok().map(Self)
    }

    /// Takes the low 20 bytes of a word-like input, the way ABI parameters
    /// carry addresses. Inputs shorter than 20 bytes zero-fill from the
    /// left.
    #[must_use]
    pub fn from_last_bytes(slice: &[u8]) -> Self {
        let mut bytes = [0u8; 20];
        if slice.len() >= 20 {
            bytes.copy_from_slice(&slice[slice.len() - 20..]);
        } else {
            bytes[20 - slice.len()..].copy_from_slice(slice);
        }
        Self(bytes)
    }

    /// Borrows the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// True for the all-zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Lower-case `0x`-prefixed hex of the full address.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex_string(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hex_abbrev(f, &self.0)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; 20] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

// =============================================================================
// TESTS
// =============================================================================
