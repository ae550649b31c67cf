//! # TimeLock Value Type
//!
//! Funds usable only inside time intervals. A `TimeLock` is an ordered set
//! of disjoint `(start_time, end_time, value)` items; arithmetic over two
//! locks splits and merges items so the result stays normalized.
//!
//! ## Invariants
//!
//! - items are sorted by `start_time` and never overlap
//! - `start_time <= end_time` and `value > 0` for every item
//! - adjacent items with equal value are merged

use super::codec::{self, CodecError};
use super::value_objects::U256;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Sentinel end time for locks without an expiry.
pub const TIME_LOCK_FOREVER: u64 = u64::MAX;

/// One contiguous interval of locked value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLockItem {
    /// First instant (inclusive) at which the value is usable.
    pub start_time: u64,
    /// Last instant (inclusive) at which the value is usable.
    pub end_time: u64,
    /// Locked value, always positive.
    pub value: U256,
}

/// A normalized multi-interval time-locked balance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLock {
    items: Vec<TimeLockItem>,
}

impl TimeLock {
    /// Creates an empty time-lock.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Creates a time-lock holding `value` over `[start, end]`.
    ///
    /// A zero value or an inverted range yields the empty lock.
    #[must_use]
    pub fn from_interval(value: U256, start: u64, end: u64) -> Self {
        if value.is_zero() || start > end {
            return Self::new();
        }
        Self {
            items: vec![TimeLockItem {
                start_time: start,
                end_time: end,
                value,
            }],
        }
    }

    /// Returns true if no value is locked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the normalized items.
    #[must_use]
    pub fn items(&self) -> &[TimeLockItem] {
        &self.items
    }

    /// Total value usable at instant `t`.
    #[must_use]
    pub fn value_at(&self, t: u64) -> U256 {
        self.items
            .iter()
            .filter(|item| item.start_time <= t && t <= item.end_time)
            .fold(U256::zero(), |acc, item| acc.saturating_add(item.value))
    }

    /// Pointwise sum of two time-locks.
    #[must_use]
    pub fn add(&self, other: &TimeLock) -> TimeLock {
        self.combine(other, false)
    }

    /// Pointwise difference `self - other`.
    ///
    /// The caller must have verified coverage (`self` ≥ `other` at every
    /// instant); uncovered remainders saturate to zero.
    #[must_use]
    pub fn sub(&self, other: &TimeLock) -> TimeLock {
        self.combine(other, true)
    }

    /// Drops items that ended before `timestamp`.
    pub fn clear_expired(&mut self, timestamp: u64) {
        self.items
            .retain(|item| item.end_time >= timestamp && !item.value.is_zero());
    }

    /// Value spendable over the whole of `[start, end]`: the minimum value
    /// usable at any instant of the window. Any coverage gap yields zero.
    #[must_use]
    pub fn spendable_value(&self, start: u64, end: u64) -> U256 {
        if start > end {
            return U256::zero();
        }
        // Value is piecewise constant; probing each boundary inside the
        // window suffices.
        let mut bounds = vec![start];
        for item in &self.items {
            if item.start_time > start && item.start_time <= end {
                bounds.push(item.start_time);
            }
            if item.end_time >= start && item.end_time < end {
                bounds.push(item.end_time + 1);
            }
        }
        bounds
            .into_iter()
            .map(|t| self.value_at(t))
            .min()
            .unwrap_or_default()
    }

    /// Returns true if `self` holds at least `other`'s value at every
    /// instant of `other`'s support.
    #[must_use]
    pub fn covers(&self, other: &TimeLock) -> bool {
        matches!(
            self.partial_cmp(other),
            Some(Ordering::Greater | Ordering::Equal)
        )
    }

    /// Compact machine-oriented rendering, one `start:end:value` triple per
    /// item.
    #[must_use]
    pub fn raw_string(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("{}:{}:{}", item.start_time, item.end_time, item.value))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Canonical encoding: a list of `[start, end, value]` triples.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let children: Vec<Vec<u8>> = self
            .items
            .iter()
            .map(|item| {
                codec::encode_list(&[
                    codec::encode_u64(item.start_time),
                    codec::encode_u64(item.end_time),
                    codec::encode_u256(&item.value),
                ])
            })
            .collect();
        codec::encode_list(&children)
    }

    /// Decodes a canonical encoding, renormalizing the items.
    pub fn decode(input: &[u8]) -> Result<Self, CodecError> {
        let payload = codec::decode_single(input)?.as_list()?;
        Self::decode_items(payload)
    }

    /// Decodes the payload of an already-split item list.
    pub(crate) fn decode_items(payload: &[u8]) -> Result<Self, CodecError> {
        let mut result = TimeLock::new();
        for item in codec::list_items(payload)? {
            let fields = codec::list_items(item.as_list()?)?;
            if fields.len() != 3 {
                return Err(CodecError::WrongFieldCount {
                    expected: 3,
                    actual: fields.len(),
                });
            }
            let start = codec::decode_u64(fields[0].as_bytes()?)?;
            let end = codec::decode_u64(fields[1].as_bytes()?)?;
            let value = codec::decode_u256(fields[2].as_bytes()?)?;
            result = result.add(&TimeLock::from_interval(value, start, end));
        }
        Ok(result)
    }

    /// Merge `self` and `other` segment by segment. Both inputs are
    /// normalized, so probing each boundary instant gives the value of the
    /// whole segment.
    fn combine(&self, other: &TimeLock, subtract: bool) -> TimeLock {
        let mut bounds: Vec<u64> = Vec::with_capacity((self.items.len() + other.items.len()) * 2);
        for item in self.items.iter().chain(other.items.iter()) {
            bounds.push(item.start_time);
            if item.end_time < u64::MAX {
                bounds.push(item.end_time + 1);
            }
        }
        bounds.sort_unstable();
        bounds.dedup();

        let mut items: Vec<TimeLockItem> = Vec::new();
        for (i, &start) in bounds.iter().enumerate() {
            let end = match bounds.get(i + 1) {
                Some(&next) => next - 1,
                None => u64::MAX,
            };
            let lhs = self.value_at(start);
            let rhs = other.value_at(start);
            let value = if subtract {
                lhs.saturating_sub(rhs)
            } else {
                lhs.saturating_add(rhs)
            };
            if value.is_zero() {
                continue;
            }
            match items.last_mut() {
                // Extend the previous item when contiguous with equal value
                Some(last) if last.value == value && last.end_time + 1 == start => {
                    last.end_time = end;
                }
                _ => items.push(TimeLockItem {
                    start_time: start,
                    end_time: end,
                    value,
                }),
            }
        }
        TimeLock { items }
    }
}

impl PartialOrd for TimeLock {
    /// Pointwise partial order: `Greater`/`Equal` means "at least as much
    /// value at every instant". Locks that each exceed the other somewhere
    /// are incomparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        let mut bounds: Vec<u64> = self
            .items
            .iter()
            .chain(other.items.iter())
            .flat_map(|item| {
                let next = item.end_time.checked_add(1);
                std::iter::once(item.start_time).chain(next)
            })
            .collect();
        bounds.sort_unstable();
        bounds.dedup();

        let mut ge = true;
        let mut le = true;
        for t in bounds {
            let lhs = self.value_at(t);
            let rhs = other.value_at(t);
            if lhs < rhs {
                ge = false;
            }
            if lhs > rhs {
                le = false;
            }
        }
        match (ge, le) {
            (true, _) => Some(Ordering::Greater),
            (_, true) => Some(Ordering::Less),
            _ => None,
        }
    }
}

impl fmt::Display for TimeLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeLock(")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            if item.end_time == TIME_LOCK_FOREVER {
                write!(f, "[{}, forever] = {}", item.start_time, item.value)?;
            } else {
                write!(f, "[{}, {}] = {}", item.start_time, item.end_time, item.value)?;
            }
        }
        write!(f, ")")
    }
}

// =============================================================================
// TESTS
// =============================================================================
