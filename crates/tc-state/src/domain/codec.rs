//! # Canonical Codec
//!
//! Length-prefixed recursive binary encoding of byte strings and lists.
//! Digests computed over encoded forms feed the global state root, so the
//! byte layout here is consensus-fixed and must never change.

use super::value_objects::{Hash, U256};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Errors raised while decoding canonical data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before the announced payload.
    #[error("unexpected end of input")]
    Truncated,

    /// A single item was expected but bytes remain after it.
    #[error("trailing bytes after item")]
    TrailingBytes,

    /// A long-form length was not minimally encoded.
    #[error("non-canonical length prefix")]
    NonCanonicalLength,

    /// A byte string was found where a list was expected.
    #[error("expected list, found byte string")]
    ExpectedList,

    /// A list was found where a byte string was expected.
    #[error("expected byte string, found list")]
    ExpectedBytes,

    /// An integer field was not minimally encoded.
    #[error("non-canonical integer encoding")]
    NonCanonicalInteger,

    /// An integer field exceeds its declared width.
    #[error("integer overflows {0} bytes")]
    IntegerOverflow(usize),

    /// A fixed-width field had the wrong length.
    #[error("expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    /// A record list had the wrong number of fields.
    #[error("expected {expected} fields, got {actual}")]
    WrongFieldCount { expected: usize, actual: usize },
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encode a byte string.
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        vec![data[0]]
    } else if data.len() < 56 {
        let mut result = vec![0x80 + data.len() as u8];
        result.extend_from_slice(data);
        result
    } else {
        let len_bytes = encode_length(data.len());
        let mut result = vec![0xb7 + len_bytes.len() as u8];
        result.extend_from_slice(&len_bytes);
        result.extend_from_slice(data);
        result
    }
}

/// Encode a u64 as a minimal big-endian byte string (zero encodes empty).
pub fn encode_u64(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    encode_bytes(&bytes[start..])
}

/// Encode a U256 as a minimal big-endian byte string (zero encodes empty).
pub fn encode_u256(value: &U256) -> Vec<u8> {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    encode_bytes(&bytes[start..])
}

/// Wrap already-encoded children into a list.
pub fn encode_list(children: &[Vec<u8>]) -> Vec<u8> {
    let total_len: usize = children.iter().map(Vec::len).sum();

    let mut result = Vec::with_capacity(total_len + 9);
    if total_len < 56 {
        result.push(0xc0 + total_len as u8);
    } else {
        let len_bytes = encode_length(total_len);
        result.push(0xf7 + len_bytes.len() as u8);
        result.extend_from_slice(&len_bytes);
    }
    for child in children {
        result.extend_from_slice(child);
    }
    result
}

/// Encode a length as minimal big-endian bytes.
fn encode_length(len: usize) -> Vec<u8> {
    let bytes = (len as u64).to_be_bytes();
    let start = bytes
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(bytes.len() - 1);
    bytes[start..].to_vec()
}

/// Compute Keccak-256 hash.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    Hash::new(hasher.finalize().into())
}

// =============================================================================
// DECODING
// =============================================================================

/// One decoded item: a byte-string payload or a list payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Item<'a> {
    /// Payload of a byte string.
    Bytes(&'a [u8]),
    /// Concatenated encodings of a list's children.
    List(&'a [u8]),
}

impl<'a> Item<'a> {
    /// Returns the byte-string payload, or fails if this is a list.
    pub fn as_bytes(&self) -> Result<&'a [u8], CodecError> {
        match self {
            Item::Bytes(payload) => Ok(payload),
            Item::List(_) => Err(CodecError::ExpectedBytes),
        }
    }

    /// Returns the list payload, or fails if this is a byte string.
    pub fn as_list(&self) -> Result<&'a [u8], CodecError> {
        match self {
            Item::List(payload) => Ok(payload),
            Item::Bytes(_) => Err(CodecError::ExpectedList),
        }
    }
}

/// Split the first item off the input, returning it and the remainder.
pub fn split(input: &[u8]) -> Result<(Item<'_>, &[u8]), CodecError> {
    let &prefix = input.first().ok_or(CodecError::Truncated)?;
    match prefix {
        0x00..=0x7f => Ok((Item::Bytes(&input[..1]), &input[1..])),
        0x80..=0xb7 => {
            let len = (prefix - 0x80) as usize;
            let payload = input.get(1..1 + len).ok_or(CodecError::Truncated)?;
            Ok((Item::Bytes(payload), &input[1 + len..]))
        }
        0xb8..=0xbf => {
            let (len, consumed) = split_long_length(input, prefix - 0xb7)?;
            let end = consumed.checked_add(len).ok_or(CodecError::Truncated)?;
            let payload = input.get(consumed..end).ok_or(CodecError::Truncated)?;
            Ok((Item::Bytes(payload), &input[end..]))
        }
        0xc0..=0xf7 => {
            let len = (prefix - 0xc0) as usize;
            let payload = input.get(1..1 + len).ok_or(CodecError::Truncated)?;
            Ok((Item::List(payload), &input[1 + len..]))
        }
        0xf8..=0xff => {
            let (len, consumed) = split_long_length(input, prefix - 0xf7)?;
            let end = consumed.checked_add(len).ok_or(CodecError::Truncated)?;
            let payload = input.get(consumed..end).ok_or(CodecError::Truncated)?;
            Ok((Item::List(payload), &input[end..]))
        }
    }
}

/// Read a long-form length: `len_of_len` big-endian bytes after the prefix.
/// Returns the length and the total header size.
fn split_long_length(input: &[u8], len_of_len: u8) -> Result<(usize, usize), CodecError> {
    let len_of_len = len_of_len as usize;
    let len_bytes = input.get(1..1 + len_of_len).ok_or(CodecError::Truncated)?;
    if len_bytes[0] == 0 {
        return Err(CodecError::NonCanonicalLength);
    }
    let mut len = 0usize;
    for &b in len_bytes {
        len = len
            .checked_mul(256)
            .and_then(|l| l.checked_add(b as usize))
            .ok_or(CodecError::NonCanonicalLength)?;
    }
    if len < 56 {
        return Err(CodecError::NonCanonicalLength);
    }
    Ok((len, 1 + len_of_len))
}

/// Decode exactly one item; trailing bytes fail the decode.
pub fn decode_single(input: &[u8]) -> Result<Item<'_>, CodecError> {
    let (item, rest) = split(input)?;
    if !rest.is_empty() {
        return Err(CodecError::TrailingBytes);
    }
    Ok(item)
}

/// Decode all children of a list payload.
pub fn list_items(mut payload: &[u8]) -> Result<Vec<Item<'_>>, CodecError> {
    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, rest) = split(payload)?;
        items.push(item);
        payload = rest;
    }
    Ok(items)
}

/// Decode a minimal big-endian u64 from a byte-string payload.
pub fn decode_u64(payload: &[u8]) -> Result<u64, CodecError> {
    if payload.len() > 8 {
        return Err(CodecError::IntegerOverflow(8));
    }
    if payload.first() == Some(&0) {
        return Err(CodecError::NonCanonicalInteger);
    }
    let mut value = 0u64;
    for &b in payload {
        value = value << 8 | u64::from(b);
    }
    Ok(value)
}

/// Decode a minimal big-endian U256 from a byte-string payload.
pub fn decode_u256(payload: &[u8]) -> Result<U256, CodecError> {
    if payload.len() > 32 {
        return Err(CodecError::IntegerOverflow(32));
    }
    if payload.first() == Some(&0) {
        return Err(CodecError::NonCanonicalInteger);
    }
    Ok(U256::from_big_endian(payload))
}

/// Decode a fixed 32-byte digest from a byte-string payload.
pub fn decode_hash(payload: &[u8]) -> Result<Hash, CodecError> {
    Hash::from_slice(payload).ok_or(CodecError::WrongLength {
        expected: 32,
        actual: payload.len(),
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_bytes_single_byte() {
        assert_eq!(encode_bytes(&[0x2a]), vec![0x2a]);
        assert_eq!(encode_bytes(&[0x7f]), vec![0x7f]);
        assert_eq!(encode_bytes(&[0x80]), vec![0x81, 0x80]);
    }

    #[test]
    fn test_encode_bytes_empty() {
        assert_eq!(encode_bytes(&[]), vec![0x80]);
    }

    #[test]
    fn test_encode_bytes_short() {
        let data = b"hello";
        let encoded = encode_bytes(data);
        assert_eq!(encoded[0], 0x85);
        assert_eq!(&encoded[1..], data);
    }

    #[test]
    fn test_encode_bytes_long() {
        let data = vec![0xaa; 60];
        let encoded = encode_bytes(&data);
        assert_eq!(encoded[0], 0xb8);
        assert_eq!(encoded[1], 60);
        assert_eq!(&encoded[2..], &data[..]);
    }

    #[test]
    fn test_encode_u64() {
        assert_eq!(encode_u64(0), vec![0x80]);
        assert_eq!(encode_u64(0x2a), vec![0x2a]);
        assert_eq!(encode_u64(0x0400), vec![0x82, 0x04, 0x00]);
    }

    #[test]
    fn test_encode_empty_list() {
        assert_eq!(encode_list(&[]), vec![0xc0]);
    }

    #[test]
    fn test_bytes_round_trip() {
        for data in [&b""[..], &b"\x01"[..], &b"hello world"[..], &[0xffu8; 100]] {
            let encoded = encode_bytes(data);
            let item = decode_single(&encoded).unwrap();
            assert_eq!(item.as_bytes().unwrap(), data);
        }
    }

    #[test]
    fn test_list_round_trip() {
        let children = vec![encode_u64(7), encode_bytes(b"abc"), encode_list(&[])];
        let encoded = encode_list(&children);
        let item = decode_single(&encoded).unwrap();
        let items = list_items(item.as_list().unwrap()).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(decode_u64(items[0].as_bytes().unwrap()).unwrap(), 7);
        assert_eq!(items[1].as_bytes().unwrap(), b"abc");
        assert!(items[2].as_list().unwrap().is_empty());
    }

    #[test]
    fn test_u256_round_trip() {
        for value in [U256::zero(), U256::from(1u64), U256::MAX] {
            let encoded = encode_u256(&value);
            let item = decode_single(&encoded).unwrap();
            assert_eq!(decode_u256(item.as_bytes().unwrap()).unwrap(), value);
        }
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(split(&[]), Err(CodecError::Truncated));
        assert_eq!(split(&[0x85, 0x01]), Err(CodecError::Truncated));
        assert_eq!(split(&[0xb8]), Err(CodecError::Truncated));
        assert_eq!(split(&[0xc5, 0x01]), Err(CodecError::Truncated));
    }

    #[test]
    fn test_decode_trailing() {
        assert_eq!(decode_single(&[0x01, 0x02]), Err(CodecError::TrailingBytes));
    }

    #[test]
    fn test_decode_non_canonical_length() {
        // Long form announcing a length below 56
        assert_eq!(
            split(&[0xb8, 0x01, 0xaa]),
            Err(CodecError::NonCanonicalLength)
        );
        // Length bytes with a leading zero
        let mut input = vec![0xb9, 0x00, 0x38];
        input.extend(vec![0u8; 56]);
        assert_eq!(split(&input), Err(CodecError::NonCanonicalLength));
    }

    #[test]
    fn test_decode_non_minimal_integer() {
        assert_eq!(decode_u64(&[0x00, 0x01]), Err(CodecError::NonCanonicalInteger));
        assert_eq!(decode_u64(&[0u8; 9]), Err(CodecError::IntegerOverflow(8)));
        assert_eq!(decode_u256(&[0u8; 33]), Err(CodecError::IntegerOverflow(32)));
    }

    #[test]
    fn test_type_mismatch() {
        let list = encode_list(&[]);
        let item = decode_single(&list).unwrap();
        assert_eq!(item.as_bytes(), Err(CodecError::ExpectedBytes));

        let bytes = encode_bytes(b"x");
        let item = decode_single(&bytes).unwrap();
        assert_eq!(item.as_list(), Err(CodecError::ExpectedList));
    }

    #[test]
    fn test_keccak256_empty() {
        // keccak256("") = c5d2...a470
        let hash = keccak256(&[]);
        assert_eq!(hash.as_bytes()[0..4], [0xc5, 0xd2, 0x46, 0x01]);
        assert_eq!(hash.as_bytes()[28..32], [0x5d, 0x85, 0xa4, 0x70]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let children = vec![encode_u64(1000), encode_bytes(&[0x2a])];
        assert_eq!(encode_list(&children), encode_list(&children));
        assert_eq!(
            keccak256(&encode_list(&children)),
            keccak256(&encode_list(&children))
        );
    }
}
