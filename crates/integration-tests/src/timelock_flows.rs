//! End-to-end flows through the time-lock contract: the happy path with
//! clamping, insufficient-balance rejection, and expiration.

use primitive_types::U256;
use tc_state::domain::Address;
use tc_timelock_precompile::prelude::*;

const CALLER: Address = Address([0x11; 20]);
const BENEFICIARY: Address = Address([0x22; 20]);

fn push_word(input: &mut Vec<u8>, value: u64) {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    input.extend_from_slice(&word);
}

fn push_address(input: &mut Vec<u8>, address: Address) {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    input.extend_from_slice(&word);
}

fn call_input(func: TimeLockFunc, beneficiary: Address, params: &[u64]) -> Vec<u8> {
    let mut input = Vec::new();
    push_word(&mut input, func as u64);
    push_address(&mut input, beneficiary);
    for &param in params {
        push_word(&mut input, param);
    }
    input
}

fn run(
    store: &mut InMemoryStructStore,
    timestamp: u64,
    input: &[u8],
) -> (Vec<u8>, Result<(), PrecompileError>) {
    let context = CallContext {
        caller: CALLER,
        block_timestamp: timestamp,
    };
    TimeLockContract::new(store, context).run(input)
}

/// Add with a past start clamps to the block timestamp, coverage queries see
/// the clamped interval, and over-asking fails with `NotEnoughBalance`.
#[test]
fn add_query_sub_happy_path() {
    let mut store = InMemoryStructStore::new();

    // addTimeLockBalance(B, 50, 900, 2000) at T=1000: start clamps to 1000
    let add = call_input(
        TimeLockFunc::AddTimeLockBalance,
        BENEFICIARY,
        &[50, 900, 2000],
    );
    let (output, result) = run(&mut store, 1000, &add);
    assert!(result.is_ok());
    assert_eq!(output, b"Ok: addTimeLockBalance");

    // hasTimeLockBalance(B, 50, 1500, 2000) -> 0x01
    let has = call_input(
        TimeLockFunc::HasTimeLockBalance,
        BENEFICIARY,
        &[50, 1500, 2000],
    );
    let (output, result) = run(&mut store, 1000, &has);
    assert!(result.is_ok());
    assert_eq!(output, vec![0x01]);

    // getTimeLockValue(B, 1000, 2000) -> 50 as a 32-byte word
    let value = call_input(TimeLockFunc::GetTimeLockValue, BENEFICIARY, &[1000, 2000]);
    let (output, _) = run(&mut store, 1000, &value);
    assert_eq!(U256::from_big_endian(&output), U256::from(50u64));

    // subTimeLockBalance(B, 60, 1500, 2000) -> NotEnoughBalance
    let sub = call_input(
        TimeLockFunc::SubTimeLockBalance,
        BENEFICIARY,
        &[60, 1500, 2000],
    );
    let (output, result) = run(&mut store, 1000, &sub);
    assert_eq!(result, Err(PrecompileError::NotEnoughBalance));
    assert_eq!(output, b"Error: not enough balance");

    // The failed subtraction changed nothing
    let (output, _) = run(&mut store, 1000, &has);
    assert_eq!(output, vec![0x01]);
}

/// An item ending at T0 disappears from any mutation at T0 + 1, and value
/// queries past the expiry read zero.
#[test]
fn expiration_clears_stored_items() {
    let mut store = InMemoryStructStore::new();
    let t0 = 2000;

    let add = call_input(TimeLockFunc::AddTimeLockBalance, BENEFICIARY, &[50, 1000, t0]);
    run(&mut store, 1000, &add).1.unwrap();

    // Any mutation at T0 + 1 triggers the expiry sweep
    let nudge = call_input(
        TimeLockFunc::AddTimeLockBalance,
        BENEFICIARY,
        &[1, 9000, 9500],
    );
    run(&mut store, t0 + 1, &nudge).1.unwrap();

    let value = call_input(TimeLockFunc::GetTimeLockValue, BENEFICIARY, &[t0 + 1, 8000]);
    let (output, _) = run(&mut store, t0 + 1, &value);
    assert_eq!(U256::from_big_endian(&output), U256::zero());

    // Only the fresh item remains in storage
    let raw = call_input(TimeLockFunc::GetTimeLockBalance, BENEFICIARY, &[1]);
    let (output, _) = run(&mut store, t0 + 1, &raw);
    assert_eq!(output, b"9000:9500:1");
}

/// Repeated add/sub cycles leave storage exactly as it started.
#[test]
fn add_sub_cycles_return_to_baseline() {
    let mut store = InMemoryStructStore::new();

    let add = call_input(
        TimeLockFunc::AddTimeLockBalance,
        BENEFICIARY,
        &[50, 1000, 2000],
    );
    run(&mut store, 1000, &add).1.unwrap();
    let raw = call_input(TimeLockFunc::GetTimeLockBalance, BENEFICIARY, &[1]);
    let (baseline, _) = run(&mut store, 1000, &raw);

    for _ in 0..3 {
        let extra = call_input(
            TimeLockFunc::AddTimeLockBalance,
            BENEFICIARY,
            &[7, 1200, 1800],
        );
        run(&mut store, 1000, &extra).1.unwrap();
        let back = call_input(
            TimeLockFunc::SubTimeLockBalance,
            BENEFICIARY,
            &[7, 1200, 1800],
        );
        run(&mut store, 1000, &back).1.unwrap();
    }

    let (output, _) = run(&mut store, 1000, &raw);
    assert_eq!(output, baseline);
}
