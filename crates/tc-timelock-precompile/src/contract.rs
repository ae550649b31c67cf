//! # Time-Lock Contract
//!
//! The precompiled contract at `0x8888...8888`. Input is 32-byte
//! word-aligned: the first word selects a function, subsequent words carry
//! the parameters. Time-locks are stored per `(caller, beneficiary)` pair
//! under the contract's own storage area.

use primitive_types::U256;
use tracing::debug;

use tc_state::domain::{Address, TimeLock, TIME_LOCK_FOREVER};

use crate::errors::PrecompileError;
use crate::ports::StructStore;

/// The fixed, well-known address of the time-lock contract.
pub const TIME_LOCK_CONTRACT_ADDRESS: Address = Address([0x88; 20]);

/// Flat gas charge for any time-lock contract call.
pub const TIME_LOCK_CALC_GAS: u64 = 50_000;

/// Function selectors, numbered in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeLockFunc {
    /// `getTimeLockBalance(beneficiary, raw?)`
    GetTimeLockBalance = 1,
    /// `hasTimeLockBalance(beneficiary, value, start, end)`
    HasTimeLockBalance = 2,
    /// `getTimeLockValue(beneficiary, start, end)`
    GetTimeLockValue = 3,
    /// `addTimeLockBalance(beneficiary, value, start, end)`
    AddTimeLockBalance = 4,
    /// `subTimeLockBalance(beneficiary, value, start, end)`
    SubTimeLockBalance = 5,
}

impl TimeLockFunc {
    /// Maps a selector word to a function.
    #[must_use]
    pub fn from_selector(selector: u64) -> Option<Self> {
        match selector {
            1 => Some(Self::GetTimeLockBalance),
            2 => Some(Self::HasTimeLockBalance),
            3 => Some(Self::GetTimeLockValue),
            4 => Some(Self::AddTimeLockBalance),
            5 => Some(Self::SubTimeLockBalance),
            _ => None,
        }
    }

    /// The function's ABI name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetTimeLockBalance => "getTimeLockBalance",
            Self::HasTimeLockBalance => "hasTimeLockBalance",
            Self::GetTimeLockValue => "getTimeLockValue",
            Self::AddTimeLockBalance => "addTimeLockBalance",
            Self::SubTimeLockBalance => "subTimeLockBalance",
        }
    }
}

/// Call environment supplied by the VM.
#[derive(Clone, Copy, Debug)]
pub struct CallContext {
    /// The calling account; half of the storage key.
    pub caller: Address,
    /// The executing block's timestamp, used for clamping and expiry.
    pub block_timestamp: u64,
}

/// Parsed call parameters.
struct FuncParams {
    beneficiary: Address,
    value: U256,
    start: u64,
    end: u64,
}

impl FuncParams {
    /// The requested interval as a time-lock.
    fn time_lock(&self) -> TimeLock {
        TimeLock::from_interval(self.value, self.start, self.end)
    }
}

/// The time-lock precompiled contract, bound to one call's context and the
/// engine's structured-data capability.
pub struct TimeLockContract<'a> {
    state: &'a mut dyn StructStore,
    context: CallContext,
}

impl<'a> TimeLockContract<'a> {
    /// Binds the contract to a call context and state access.
    pub fn new(state: &'a mut dyn StructStore, context: CallContext) -> Self {
        Self { state, context }
    }

    /// Gas required to run the contract on `input`.
    #[must_use]
    pub fn required_gas(&self, _input: &[u8]) -> u64 {
        TIME_LOCK_CALC_GAS
    }

    /// Runs the contract. On failure the returned payload is the formatted
    /// `"Error: <msg>"` string and the error is also handed to the VM.
    pub fn run(&mut self, input: &[u8]) -> (Vec<u8>, Result<(), PrecompileError>) {
        match self.execute(input) {
            Ok(output) => (output, Ok(())),
            Err(err) => {
                debug!(input_len = input.len(), %err, "time-lock contract call failed");
                (to_err_data(&err), Err(err))
            }
        }
    }

    fn execute(&mut self, input: &[u8]) -> Result<Vec<u8>, PrecompileError> {
        if input.len() < 32 {
            return Err(PrecompileError::UnknownFunc);
        }
        let selector = word_u64(input, 0).map_err(|_| PrecompileError::UnknownFunc)?;
        let func = TimeLockFunc::from_selector(selector).ok_or(PrecompileError::UnknownFunc)?;
        match func {
            TimeLockFunc::GetTimeLockBalance => self.get_time_lock_balance(input),
            TimeLockFunc::HasTimeLockBalance => self.has_time_lock_balance(input),
            TimeLockFunc::GetTimeLockValue => self.get_time_lock_value(input),
            TimeLockFunc::AddTimeLockBalance => self.add_time_lock_balance(input),
            TimeLockFunc::SubTimeLockBalance => self.sub_time_lock_balance(input),
        }
    }

    fn get_time_lock_balance(&mut self, input: &[u8]) -> Result<Vec<u8>, PrecompileError> {
        let beneficiary = word_address(input, 32);
        let raw = !word_u256(input, 64).is_zero();
        let timelock = self.load_time_lock(beneficiary);
        if raw {
            Ok(timelock.raw_string().into_bytes())
        } else {
            Ok(timelock.to_string().into_bytes())
        }
    }

    fn has_time_lock_balance(&mut self, input: &[u8]) -> Result<Vec<u8>, PrecompileError> {
        let params = self.parse_params(input, true)?;
        let stored = self.load_time_lock(params.beneficiary);
        if stored.covers(&params.time_lock()) {
            Ok(vec![0x01])
        } else {
            Ok(vec![0x00])
        }
    }

    fn get_time_lock_value(&mut self, input: &[u8]) -> Result<Vec<u8>, PrecompileError> {
        let params = self.parse_params(input, false)?;
        let stored = self.load_time_lock(params.beneficiary);
        let value = stored.spendable_value(params.start, params.end);
        let mut word = [0u8; 32];
        value.to_big_endian(&mut word);
        Ok(word.to_vec())
    }

    fn add_time_lock_balance(&mut self, input: &[u8]) -> Result<Vec<u8>, PrecompileError> {
        let params = self.parse_params(input, true)?;
        let stored = self.load_time_lock(params.beneficiary);
        self.store_time_lock(params.beneficiary, stored.add(&params.time_lock()));
        Ok(to_ok_data(TimeLockFunc::AddTimeLockBalance.name()))
    }

    fn sub_time_lock_balance(&mut self, input: &[u8]) -> Result<Vec<u8>, PrecompileError> {
        let params = self.parse_params(input, true)?;
        let requested = params.time_lock();
        let stored = self.load_time_lock(params.beneficiary);
        if !stored.covers(&requested) {
            return Err(PrecompileError::NotEnoughBalance);
        }
        self.store_time_lock(params.beneficiary, stored.sub(&requested));
        Ok(to_ok_data(TimeLockFunc::SubTimeLockBalance.name()))
    }

    /// Parses `beneficiary [, value], start, end` and applies the time
    /// adjustments: a start in the past clamps up to the block timestamp and
    /// a zero end means forever.
    fn parse_params(&self, input: &[u8], has_value: bool) -> Result<FuncParams, PrecompileError> {
        let mut pos = 32;
        let beneficiary = word_address(input, pos);
        pos += 32;
        let value = if has_value {
            let value = word_u256(input, pos);
            pos += 32;
            value
        } else {
            U256::zero()
        };
        let mut start = word_u64(input, pos)?;
        pos += 32;
        let mut end = word_u64(input, pos)?;
        pos += 32;

        if input.len() != pos {
            return Err(PrecompileError::WrongLenOfInput);
        }

        // adjust
        let timestamp = self.context.block_timestamp;
        if start < timestamp {
            start = timestamp;
        }
        if end == 0 {
            end = TIME_LOCK_FOREVER;
        }

        // check
        if start > end {
            return Err(PrecompileError::WrongTimeRange);
        }

        Ok(FuncParams {
            beneficiary,
            value,
            start,
            end,
        })
    }

    /// Storage key for the caller's lock toward `beneficiary`: the 40-byte
    /// concatenation `caller || beneficiary`.
    fn storage_key(&self, beneficiary: Address) -> [u8; 40] {
        let mut key = [0u8; 40];
        key[..20].copy_from_slice(self.context.caller.as_bytes());
        key[20..].copy_from_slice(beneficiary.as_bytes());
        key
    }

    /// Loads the stored time-lock, treating absent or undecodable data as
    /// empty.
    fn load_time_lock(&self, beneficiary: Address) -> TimeLock {
        let key = self.storage_key(beneficiary);
        let data = self
            .state
            .get_struct_data(TIME_LOCK_CONTRACT_ADDRESS, &key);
        if data.is_empty() {
            return TimeLock::new();
        }
        TimeLock::decode(&data).unwrap_or_default()
    }

    /// Stores a time-lock after clearing expired items; an empty result
    /// clears the entry.
    fn store_time_lock(&mut self, beneficiary: Address, mut timelock: TimeLock) {
        timelock.clear_expired(self.context.block_timestamp);
        let data = if timelock.is_empty() {
            Vec::new()
        } else {
            timelock.encode()
        };
        let key = self.storage_key(beneficiary);
        self.state
            .set_struct_data(TIME_LOCK_CONTRACT_ADDRESS, &key, data);
    }
}

/// Success payload: `"Ok: <funcName>"`.
fn to_ok_data(name: &str) -> Vec<u8> {
    format!("Ok: {name}").into_bytes()
}

/// Failure payload: `"Error: <msg>"`.
fn to_err_data(err: &PrecompileError) -> Vec<u8> {
    format!("Error: {err}").into_bytes()
}

/// The 32-byte word at `pos`, zero-padded past the end of input.
fn word(input: &[u8], pos: usize) -> [u8; 32] {
    let mut out = [0u8; 32];
    if pos < input.len() {
        let end = (pos + 32).min(input.len());
        out[..end - pos].copy_from_slice(&input[pos..end]);
    }
    out
}

/// The word at `pos` as a U256.
fn word_u256(input: &[u8], pos: usize) -> U256 {
    U256::from_big_endian(&word(input, pos))
}

/// The word at `pos` as a u64, failing on overflow.
fn word_u64(input: &[u8], pos: usize) -> Result<u64, PrecompileError> {
    let word = word(input, pos);
    if word[..24].iter().any(|&b| b != 0) {
        return Err(PrecompileError::ValueOverflow);
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(bytes))
}

/// The word at `pos` as an address (its low 20 bytes).
fn word_address(input: &[u8], pos: usize) -> Address {
    Address::from_last_bytes(&word(input, pos))
}

// =============================================================================
// TESTS
// =============================================================================
