//! Entity keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The identifier part of a [`Key`].
///
/// A key is *incomplete* until the datastore allocates a numeric identifier
/// for it; named keys are always complete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyId {
    /// No identifier assigned yet; the store allocates one on put.
    Incomplete,
    /// Numeric identifier.
    Id(i64),
    /// String identifier.
    Name(String),
}

/// A key identifying an entity within a kind.
///
/// Keys form paths: a key may have a parent key, and the canonical string
/// form renders ancestors first, e.g. `/Org,acme/User,100`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// The entity kind, e.g. `"User"`.
    kind: String,
    /// The identifier within the kind.
    id: KeyId,
    /// Parent key, if this key is part of an ancestor path.
    parent: Option<Box<Key>>,
    /// Namespace for multi-tenant partitioning.
    namespace: Option<String>,
}

impl Key {
    /// Create a key with a numeric identifier.
    #[must_use]
    pub fn id(kind: impl Into<String>, id: i64) -> Self {
        Self { kind: kind.into(), id: KeyId::Id(id), parent: None, namespace: None }
    }

    /// Create a key with a string identifier.
    #[must_use]
    pub fn name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self { kind: kind.into(), id: KeyId::Name(name.into()), parent: None, namespace: None }
    }

    /// Create an incomplete key; the store assigns an identifier on put.
    #[must_use]
    pub fn incomplete(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), id: KeyId::Incomplete, parent: None, namespace: None }
    }

    /// Attach a parent key.
    #[must_use]
    pub fn with_parent(mut self, parent: Key) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Attach a namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// The entity kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The identifier within the kind.
    #[must_use]
    pub const fn key_id(&self) -> &KeyId {
        &self.id
    }

    /// The numeric identifier, if this key has one.
    #[must_use]
    pub const fn id_value(&self) -> Option<i64> {
        match self.id {
            KeyId::Id(id) => Some(id),
            _ => None,
        }
    }

    /// The parent key, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Key> {
        self.parent.as_deref()
    }

    /// The namespace, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Whether the key still needs an identifier assigned.
    #[must_use]
    pub const fn is_incomplete(&self) -> bool {
        matches!(self.id, KeyId::Incomplete)
    }

    /// Replace an incomplete identifier with an allocated numeric one.
    #[must_use]
    pub fn completed_with(mut self, id: i64) -> Self {
        self.id = KeyId::Id(id);
        self
    }
}

impl fmt::Display for Key {
    /// Canonical path form: ancestors first, one `/{kind},{id}` segment per key.
    /// Incomplete identifiers render as `0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = &self.parent {
            write!(f, "{parent}")?;
        }
        match &self.id {
            KeyId::Incomplete => write!(f, "/{},0", self.kind),
            KeyId::Id(id) => write!(f, "/{},{id}", self.kind),
            KeyId::Name(name) => write!(f, "/{},{name}", self.kind),
        }
    }
}
