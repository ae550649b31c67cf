use crate::domain::{Address, JournalEntry};

/// Journal abstraction borrowed from the state container for the duration of
/// each mutation call.
///
/// `append` records an undo entry *before* the mutation it shadows; `dirty`
/// force-marks an address dirty outside the flattened journal (used by the
/// ripemd touch exception).
pub trait Journal {
    fn append(&mut self, entry: JournalEntry);
    fn dirty(&mut self, address: Address);
}
