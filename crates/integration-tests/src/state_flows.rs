//! End-to-end flows through the state object: balance commit determinism,
//! journal snapshot and revert, storage noop elision, and zero-write
//! deletion.

use tc_state::prelude::*;

fn addr(n: u8) -> Address {
    Address::new([n; 20])
}

fn asset(label: &[u8]) -> Hash {
    keccak256(label)
}

fn slot(n: u8) -> Hash {
    let mut bytes = [0u8; 32];
    bytes[0] = n;
    Hash::new(bytes)
}

fn word(n: u64) -> Hash {
    Hash::from_u256(U256::from(n))
}

/// Revert a state object to a journal snapshot by replaying the captured
/// entries in reverse, the way the state container does it.
fn revert_to(object: &mut StateObject, journal: &mut RecordingJournal, snapshot: usize) {
    for entry in journal.split_off(snapshot).iter().rev() {
        object.apply_undo(entry);
    }
}

#[test]
fn balance_add_then_commit_is_deterministic() {
    let roots: Vec<Hash> = (0..2)
        .map(|_| {
            let db = MemoryDatabase::new();
            let mut journal = RecordingJournal::new();
            let mut object = StateObject::new(addr(0xa1), Account::new(), false);

            object.add_balance(&mut journal, asset(b"A"), U256::from(100u64));
            assert_eq!(object.balance(asset(b"A")), U256::from(100u64));

            object.finalise();
            object.commit_trie(&db).unwrap();
            object.update_root(&db);
            object.storage_root()
        })
        .collect();

    assert_eq!(roots[0], roots[1]);
}

#[test]
fn revert_restores_balance_snapshot() {
    let mut journal = RecordingJournal::new();
    let mut object = StateObject::new(addr(0xa1), Account::new(), false);

    object.add_balance(&mut journal, asset(b"A"), U256::from(100u64));
    let snapshot = journal.snapshot();

    object.set_balance(&mut journal, asset(b"A"), U256::from(5u64));
    assert_eq!(object.balance(asset(b"A")), U256::from(5u64));

    revert_to(&mut object, &mut journal, snapshot);
    assert_eq!(object.balance(asset(b"A")), U256::from(100u64));
}

#[test]
fn revert_restores_every_getter() {
    let db = MemoryDatabase::new();
    let mut journal = RecordingJournal::new();
    let mut object = StateObject::new(addr(0xa1), Account::new(), false);
    let lock = TimeLock::from_interval(U256::from(9u64), 100, 200);

    // Build up a baseline
    object.set_nonce(&mut journal, 3);
    object.add_balance(&mut journal, asset(b"A"), U256::from(50u64));
    object.set_state(&db, &mut journal, slot(1), word(7));
    object.add_time_lock_balance(&mut journal, asset(b"T"), &lock, 0);
    let snapshot = journal.snapshot();

    // Speculative mutations of every kind
    object.set_nonce(&mut journal, 4);
    object.set_notation(&mut journal, 77);
    object.sub_balance(&mut journal, asset(b"A"), U256::from(20u64));
    object.set_state(&db, &mut journal, slot(1), word(8));
    object.set_state(&db, &mut journal, slot(2), word(9));
    object.sub_time_lock_balance(&mut journal, asset(b"T"), &lock, 0);
    let code = vec![0x60, 0x01];
    object.set_code(&db, &mut journal, keccak256(&code), code);

    revert_to(&mut object, &mut journal, snapshot);

    assert_eq!(object.nonce(), 3);
    assert_eq!(object.notation(), 0);
    assert_eq!(object.balance(asset(b"A")), U256::from(50u64));
    assert_eq!(object.get_state(&db, slot(1)), word(7));
    assert_eq!(object.get_state(&db, slot(2)), Hash::ZERO);
    assert_eq!(object.time_lock_balance(asset(b"T")), &lock);
    assert_eq!(object.code_hash(), EMPTY_CODE_HASH);
    assert!(object.code(&db).is_empty());
}

#[test]
fn storage_noop_write_leaves_journal_untouched() {
    let db = MemoryDatabase::new();
    let mut journal = RecordingJournal::new();

    // Seed a committed slot holding 0x2a
    let address = addr(0xa1);
    let addr_hash = keccak256(address.as_bytes());
    let mut trie = db.open_storage_trie(addr_hash, EMPTY_ROOT).unwrap();
    trie.try_update(slot(1).as_bytes(), &tc_state::domain::codec::encode_bytes(word(0x2a).trimmed()))
        .unwrap();
    let root = trie.commit().unwrap();
    let mut account = Account::new();
    account.storage_root = root;
    let mut object = StateObject::new(address, account, false);

    // Writing the same value through the tiered read is a noop
    object.set_state(&db, &mut journal, slot(1), word(0x2a));
    assert!(journal.entries().is_empty());

    object.finalise();
    object.update_root(&db);
    assert_eq!(object.storage_root(), root);
}

#[test]
fn zero_write_deletes_and_restores_prior_root() {
    let db = MemoryDatabase::new();
    let mut journal = RecordingJournal::new();
    let mut object = StateObject::new(addr(0xa1), Account::new(), false);
    let empty_root = object.storage_root();

    // Insert a slot and commit
    object.set_state(&db, &mut journal, slot(1), word(1));
    object.finalise();
    object.commit_trie(&db).unwrap();
    assert_ne!(object.storage_root(), empty_root);

    // Delete it again; the root returns to the pre-insertion value
    object.set_state(&db, &mut journal, slot(1), Hash::ZERO);
    object.finalise();
    object.commit_trie(&db).unwrap();
    assert_eq!(object.storage_root(), empty_root);
}

#[test]
fn finalise_collapses_tiers_across_transactions() {
    let db = MemoryDatabase::new();
    let mut journal = RecordingJournal::new();
    let mut object = StateObject::new(addr(0xa1), Account::new(), false);

    // Transaction one writes twice to the same slot
    object.set_state(&db, &mut journal, slot(1), word(1));
    object.set_state(&db, &mut journal, slot(1), word(2));
    object.finalise();

    // Transaction two sees the promoted value as committed state
    assert_eq!(object.get_committed_state(&db, slot(1)), word(2));
    object.set_state(&db, &mut journal, slot(1), word(3));
    object.finalise();

    object.commit_trie(&db).unwrap();
    assert_eq!(object.get_committed_state(&db, slot(1)), word(3));
}

#[test]
fn account_record_survives_encode_decode_after_flows() {
    let db = MemoryDatabase::new();
    let mut journal = RecordingJournal::new();
    let mut object = StateObject::new(addr(0xa1), Account::new(), false);

    object.set_nonce(&mut journal, 9);
    object.set_notation(&mut journal, 1042);
    object.add_balance(&mut journal, asset(b"A"), U256::from(1u64));
    object.add_time_lock_balance(
        &mut journal,
        asset(b"T"),
        &TimeLock::from_interval(U256::from(3u64), 10, TIME_LOCK_FOREVER),
        0,
    );
    object.set_state(&db, &mut journal, slot(1), word(5));
    object.finalise();
    object.commit_trie(&db).unwrap();

    let decoded = Account::decode(&object.encode()).unwrap();
    assert_eq!(&decoded, object.account());
}
