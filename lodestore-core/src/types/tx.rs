//! Transaction-related types.

use serde::{Deserialize, Serialize};

use super::Key;

/// Identifier of an in-flight transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(u64);

impl TxId {
    /// Create a `TxId` from a raw u64 value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// A key reserved by a put inside a transaction.
///
/// The write it belongs to is not durable until the enclosing transaction
/// commits, so the key is handed back in this wrapper rather than as a plain
/// [`Key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingKey(Key);

impl PendingKey {
    /// Wrap a reserved key.
    #[must_use]
    pub const fn new(key: Key) -> Self {
        Self(key)
    }

    /// The key this pending write will land on once the transaction commits.
    #[must_use]
    pub const fn key(&self) -> &Key {
        &self.0
    }
}

/// Delivered with a commit notification; names the committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    tx: TxId,
}

impl Commit {
    /// Create a commit record for a transaction.
    #[must_use]
    pub const fn new(tx: TxId) -> Self {
        Self { tx }
    }

    /// The committed transaction.
    #[must_use]
    pub const fn tx(&self) -> TxId {
        self.tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_id_roundtrip() {
        let id = TxId::new(42);
        assert_eq!(id.as_u64(), 42);
    }

    #[test]
    fn pending_key_exposes_target() {
        let pending = PendingKey::new(Key::id("User", 7));
        assert_eq!(pending.key().to_string(), "/User,7");
    }

    #[test]
    fn commit_names_its_transaction() {
        let commit = Commit::new(TxId::new(3));
        assert_eq!(commit.tx(), TxId::new(3));
    }
}
