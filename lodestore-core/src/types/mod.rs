//! Core datastore types.

mod key;
mod property;
mod tx;
mod value;


pub use key::{Key, KeyId};
pub use property::{Property, PropertyList};
pub use tx::{Commit, PendingKey, TxId};
pub use value::Value;
