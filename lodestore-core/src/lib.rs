//! `lodestore` Core
//!
//! This crate provides the fundamental datastore types shared across the
//! `lodestore` crates.
//!
//! # Modules
//!
//! - [`types`] - Core data types (Key, Value, Property, transactions)
//! - [`query`] - Query descriptions and their loggable dumps
//! - [`error`] - Error types

pub mod error;
pub mod query;
pub mod types;

// Re-export commonly used types
pub use error::{DatastoreError, DatastoreResult};
pub use query::{Direction, Filter, FilterOp, Order, Query, QueryDump};
pub use types::{Commit, Key, KeyId, PendingKey, Property, PropertyList, TxId, Value};
