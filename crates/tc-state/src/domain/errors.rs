use super::codec::CodecError;
use super::value_objects::Hash;
use thiserror::Error;

/// Errors from the storage trie and backing database.
///
/// State objects are driven by consensus code that cannot handle database
/// failures mid-execution, so these are memoized at first occurrence and
/// surfaced by `commit_trie`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("can't create storage trie: {0}")]
    TrieOpen(String),

    #[error("trie read failed: {0}")]
    TrieRead(String),

    #[error("trie write failed: {0}")]
    TrieWrite(String),

    #[error("trie commit failed: {0}")]
    TrieCommit(String),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("can't load code hash {hash:?}: {reason}")]
    CodeLoad { hash: Hash, reason: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("lock poisoned")]
    LockPoisoned,
}
