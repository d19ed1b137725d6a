//! In-memory terminal backing store.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};

use lodestore_core::{
    Commit, DatastoreError, DatastoreResult, Direction, FilterOp, Key, PendingKey, PropertyList,
    Query, QueryDump, TxId, Value,
};

use crate::strategy::{CacheContext, CacheStrategy, Cursor};

/// A buffered mutation awaiting its transaction's commit.
enum PendingOp {
    Put { key: Key, entity: PropertyList },
    Delete { key: Key },
}

/// The chain's terminal link: a thread-safe in-memory entity store.
///
/// Entities live in a map keyed by the canonical key path. Transactional
/// writes are buffered per transaction and applied when the commit
/// notification arrives; until then they are invisible to reads. This is a
/// backing store, not a cache: nothing is ever evicted.
pub struct MemoryStore {
    entities: Mutex<HashMap<String, (Key, PropertyList)>>,
    pending: Mutex<HashMap<TxId, Vec<PendingOp>>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the store holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocate an identifier for an incomplete key.
    fn complete(&self, key: &Key) -> Key {
        if key.is_incomplete() {
            key.clone().completed_with(self.next_id.fetch_add(1, Ordering::SeqCst))
        } else {
            key.clone()
        }
    }

    fn open_transaction(&self, info: &CacheContext<'_>) -> DatastoreResult<TxId> {
        info.transaction()
            .ok_or_else(|| DatastoreError::InvalidArgument("no transaction in progress".to_owned()))
    }

    fn check_lengths(keys: usize, values: usize, what: &str) -> DatastoreResult<()> {
        if keys == values {
            Ok(())
        } else {
            Err(DatastoreError::InvalidArgument(format!(
                "keys and {what} have different lengths: {keys} vs {values}"
            )))
        }
    }

    /// Run a query against committed state.
    fn execute(&self, query: &Query) -> Vec<(Key, PropertyList)> {
        let entities = self.entities.lock().unwrap_or_else(PoisonError::into_inner);

        let mut matches: Vec<(Key, PropertyList)> = entities
            .values()
            .filter(|(key, entity)| {
                key.kind() == query.kind()
                    && query.filters().iter().all(|filter| {
                        entity.get(&filter.property).is_some_and(|value| {
                            filter_matches(filter.op, value, &filter.value)
                        })
                    })
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            for order in query.orders() {
                let ord = match (a.1.get(&order.property), b.1.get(&order.property)) {
                    (Some(x), Some(y)) => compare(x, y).unwrap_or(CmpOrdering::Equal),
                    (Some(_), None) => CmpOrdering::Greater,
                    (None, Some(_)) => CmpOrdering::Less,
                    (None, None) => CmpOrdering::Equal,
                };
                let ord = match order.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                };
                if ord != CmpOrdering::Equal {
                    return ord;
                }
            }
            // Stable results regardless of map iteration order
            a.0.to_string().cmp(&b.0.to_string())
        });

        matches
            .into_iter()
            .skip(query.result_offset())
            .take(query.result_limit().unwrap_or(usize::MAX))
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial order over comparable value pairs.
fn compare(a: &Value, b: &Value) -> Option<CmpOrdering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Key(x), Value::Key(y)) => Some(x.to_string().cmp(&y.to_string())),
        _ => None,
    }
}

fn filter_matches(op: FilterOp, value: &Value, against: &Value) -> bool {
    match op {
        FilterOp::Eq => value == against,
        FilterOp::Lt => compare(value, against) == Some(CmpOrdering::Less),
        FilterOp::Le => {
            matches!(compare(value, against), Some(CmpOrdering::Less | CmpOrdering::Equal))
        }
        FilterOp::Gt => compare(value, against) == Some(CmpOrdering::Greater),
        FilterOp::Ge => {
            matches!(compare(value, against), Some(CmpOrdering::Greater | CmpOrdering::Equal))
        }
    }
}

impl CacheStrategy for MemoryStore {
    fn put_multi_without_tx(
        &self,
        _info: &CacheContext<'_>,
        keys: &[Key],
        entities: &[PropertyList],
    ) -> DatastoreResult<Vec<Key>> {
        Self::check_lengths(keys.len(), entities.len(), "entities")?;

        let completed: Vec<Key> = keys.iter().map(|key| self.complete(key)).collect();

        let mut stored = self.entities.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, entity) in completed.iter().zip(entities) {
            stored.insert(key.to_string(), (key.clone(), entity.clone()));
        }

        Ok(completed)
    }

    fn put_multi_with_tx(
        &self,
        info: &CacheContext<'_>,
        keys: &[Key],
        entities: &[PropertyList],
    ) -> DatastoreResult<Vec<PendingKey>> {
        Self::check_lengths(keys.len(), entities.len(), "entities")?;
        let tx = self.open_transaction(info)?;

        let completed: Vec<Key> = keys.iter().map(|key| self.complete(key)).collect();

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let buffer = pending.entry(tx).or_default();
        for (key, entity) in completed.iter().zip(entities) {
            buffer.push(PendingOp::Put { key: key.clone(), entity: entity.clone() });
        }

        Ok(completed.into_iter().map(PendingKey::new).collect())
    }

    fn get_multi_without_tx(
        &self,
        _info: &CacheContext<'_>,
        keys: &[Key],
        out: &mut [PropertyList],
    ) -> DatastoreResult<()> {
        Self::check_lengths(keys.len(), out.len(), "out")?;

        let stored = self.entities.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, slot) in keys.iter().zip(out.iter_mut()) {
            if key.is_incomplete() {
                return Err(DatastoreError::InvalidKey(key.to_string()));
            }
            match stored.get(&key.to_string()) {
                Some((_, entity)) => *slot = entity.clone(),
                None => return Err(DatastoreError::NoSuchEntity(key.to_string())),
            }
        }

        Ok(())
    }

    fn get_multi_with_tx(
        &self,
        info: &CacheContext<'_>,
        keys: &[Key],
        out: &mut [PropertyList],
    ) -> DatastoreResult<()> {
        self.open_transaction(info)?;
        // Buffered writes stay invisible until commit; transactional reads
        // see the same committed state as plain reads.
        self.get_multi_without_tx(info, keys, out)
    }

    fn delete_multi_without_tx(
        &self,
        _info: &CacheContext<'_>,
        keys: &[Key],
    ) -> DatastoreResult<()> {
        let mut stored = self.entities.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            if key.is_incomplete() {
                return Err(DatastoreError::InvalidKey(key.to_string()));
            }
            // Deleting an absent entity is a no-op
            stored.remove(&key.to_string());
        }
        Ok(())
    }

    fn delete_multi_with_tx(&self, info: &CacheContext<'_>, keys: &[Key]) -> DatastoreResult<()> {
        let tx = self.open_transaction(info)?;

        for key in keys {
            if key.is_incomplete() {
                return Err(DatastoreError::InvalidKey(key.to_string()));
            }
        }

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let buffer = pending.entry(tx).or_default();
        for key in keys {
            buffer.push(PendingOp::Delete { key: key.clone() });
        }

        Ok(())
    }

    fn post_commit(&self, _info: &CacheContext<'_>, commit: &Commit) -> DatastoreResult<()> {
        let buffer = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.remove(&commit.tx())
        };

        if let Some(ops) = buffer {
            let mut stored = self.entities.lock().unwrap_or_else(PoisonError::into_inner);
            for op in ops {
                match op {
                    PendingOp::Put { key, entity } => {
                        stored.insert(key.to_string(), (key, entity));
                    }
                    PendingOp::Delete { key } => {
                        stored.remove(&key.to_string());
                    }
                }
            }
        }

        Ok(())
    }

    fn post_rollback(&self, info: &CacheContext<'_>) -> DatastoreResult<()> {
        if let Some(tx) = info.transaction() {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.remove(&tx);
        }
        Ok(())
    }

    fn run_query(&self, _info: &CacheContext<'_>, query: &Query, _dump: &QueryDump) -> Cursor {
        Cursor::from_results(self.execute(query))
    }

    fn get_all(
        &self,
        _info: &CacheContext<'_>,
        query: &Query,
        _dump: &QueryDump,
        out: &mut Vec<PropertyList>,
    ) -> DatastoreResult<Vec<Key>> {
        let results = self.execute(query);
        let mut keys = Vec::with_capacity(results.len());
        for (key, entity) in results {
            keys.push(key);
            out.push(entity);
        }
        Ok(keys)
    }

    fn next_cursor(
        &self,
        _info: &CacheContext<'_>,
        _query: &Query,
        _dump: &QueryDump,
        cursor: &mut Cursor,
        out: &mut PropertyList,
    ) -> DatastoreResult<Key> {
        match cursor.advance() {
            Some((key, entity)) => {
                *out = entity;
                Ok(key)
            }
            None => Err(DatastoreError::NoMoreResults),
        }
    }
}
