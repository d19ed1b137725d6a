//! Fixture model used by the round-trip tests.
//!
//! `User` mirrors a typical generated client model: a numeric identifier that
//! lives in the key rather than the properties, and a reference to another
//! entity stored as a key-valued property. The entity mapping is plain typed
//! code; nothing is recovered from a context at runtime.

use lodestore_core::{
    DatastoreError, DatastoreResult, FilterOp, Key, PropertyList, Query, Value,
};
use serde::{Deserialize, Serialize};

/// The entity kind `User` fixtures are stored under.
pub const KIND_USER: &str = "User";

/// A user identifier, serialized as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// The datastore key for this identifier.
    pub fn key(self) -> Key {
        Key::id(KIND_USER, self.0)
    }
}

/// The fixture model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(rename = "mentorID")]
    pub mentor_id: UserId,
}

impl User {
    /// The key this user is stored under.
    pub fn key(&self) -> Key {
        self.id.key()
    }

    /// Map the model to its stored properties. The identifier stays in the
    /// key; the mentor reference is stored as a key value.
    pub fn to_entity(&self) -> PropertyList {
        PropertyList::new().with("name", self.name.clone()).with("mentor_id", self.mentor_id.key())
    }

    /// Rebuild the model from a stored entity.
    pub fn from_entity(key: &Key, entity: &PropertyList) -> DatastoreResult<Self> {
        let id = key.id_value().ok_or_else(|| DatastoreError::InvalidKey(key.to_string()))?;

        let name = match entity.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(DatastoreError::InvalidEntityType {
                    expected: "string".to_owned(),
                    actual: other.type_name().to_owned(),
                })
            }
            None => String::new(),
        };

        let mentor_id = match entity.get("mentor_id") {
            Some(Value::Key(mentor)) => UserId(
                mentor.id_value().ok_or_else(|| DatastoreError::InvalidKey(mentor.to_string()))?,
            ),
            Some(other) => {
                return Err(DatastoreError::InvalidEntityType {
                    expected: "key".to_owned(),
                    actual: other.type_name().to_owned(),
                })
            }
            None => {
                return Err(DatastoreError::InvalidEntityType {
                    expected: "key".to_owned(),
                    actual: "null".to_owned(),
                })
            }
        };

        Ok(Self { id: UserId(id), name, mentor_id })
    }
}

/// Query for users mentored by `mentor`, standing in for a generated
/// query builder.
pub fn users_by_mentor(mentor: UserId) -> Query {
    Query::new(KIND_USER).filter("mentor_id", FilterOp::Eq, mentor.key())
}
