//! `lodestore` Cache
//!
//! This crate provides the cache-strategy chain for `lodestore` datastore
//! clients: a chain-of-responsibility interface over datastore operations,
//! middleware implementations of it, and the in-memory terminal store the
//! chain bottoms out at.
//!
//! # Modules
//!
//! - [`strategy`] - The [`CacheStrategy`] trait and chain plumbing
//! - [`strategies`] - Concrete strategy implementations
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use lodestore_cache::strategies::{LogStrategy, MemoryStore};
//! use lodestore_cache::{Chain, RequestContext};
//! use lodestore_core::{Key, PropertyList};
//!
//! let chain = Chain::new(
//!     vec![Arc::new(LogStrategy::traced("ds: "))],
//!     Arc::new(MemoryStore::new()),
//! );
//!
//! let request = RequestContext::new();
//! let keys = chain
//!     .put_multi_without_tx(
//!         &request,
//!         &[Key::id("User", 100)],
//!         &[PropertyList::new().with("name", "foobar")],
//!     )
//!     .unwrap();
//! assert_eq!(keys[0].to_string(), "/User,100");
//! ```

pub mod strategies;
pub mod strategy;

// Re-export core types alongside the chain surface
pub use lodestore_core::{
    Commit, DatastoreError, DatastoreResult, Key, PendingKey, PropertyList, Query, QueryDump, TxId,
};
pub use strategy::{CacheContext, CacheStrategy, Chain, Cursor, NextLink, RequestContext};
