//! The cache-strategy trait and the cursor handle.

use lodestore_core::{Commit, DatastoreResult, Key, PendingKey, PropertyList, Query, QueryDump};

use super::CacheContext;

/// One link in a cache-strategy chain.
///
/// A strategy observes every datastore operation before it reaches the
/// backing store. Most implementations delegate to the next link via
/// [`CacheContext::next`]; the terminal store answers the call itself and
/// never delegates.
///
/// The `with_tx` variants are invoked while a transaction is open on the
/// request; their writes stay pending until the chain owner delivers a
/// [`post_commit`](Self::post_commit) notification.
pub trait CacheStrategy: Send + Sync {
    /// Store entities outside a transaction. Returns the stored keys, with
    /// identifiers allocated for any incomplete input keys.
    fn put_multi_without_tx(
        &self,
        info: &CacheContext<'_>,
        keys: &[Key],
        entities: &[PropertyList],
    ) -> DatastoreResult<Vec<Key>>;

    /// Store entities inside a transaction. Returns pending keys; the writes
    /// become durable only when the transaction commits.
    fn put_multi_with_tx(
        &self,
        info: &CacheContext<'_>,
        keys: &[Key],
        entities: &[PropertyList],
    ) -> DatastoreResult<Vec<PendingKey>>;

    /// Read entities outside a transaction into `out`, one slot per key.
    fn get_multi_without_tx(
        &self,
        info: &CacheContext<'_>,
        keys: &[Key],
        out: &mut [PropertyList],
    ) -> DatastoreResult<()>;

    /// Read entities inside a transaction into `out`, one slot per key.
    fn get_multi_with_tx(
        &self,
        info: &CacheContext<'_>,
        keys: &[Key],
        out: &mut [PropertyList],
    ) -> DatastoreResult<()>;

    /// Delete entities outside a transaction.
    fn delete_multi_without_tx(&self, info: &CacheContext<'_>, keys: &[Key]) -> DatastoreResult<()>;

    /// Delete entities inside a transaction; takes effect on commit.
    fn delete_multi_with_tx(&self, info: &CacheContext<'_>, keys: &[Key]) -> DatastoreResult<()>;

    /// Notification that a transaction committed.
    ///
    /// Delivered by the chain owner to every link in order; links do not
    /// forward it.
    fn post_commit(&self, info: &CacheContext<'_>, commit: &Commit) -> DatastoreResult<()>;

    /// Notification that a transaction rolled back.
    ///
    /// Delivered by the chain owner to every link in order; links do not
    /// forward it.
    fn post_rollback(&self, info: &CacheContext<'_>) -> DatastoreResult<()>;

    /// Start executing a query, returning a cursor over its results.
    ///
    /// Failures surface later, through [`next_cursor`](Self::next_cursor).
    fn run_query(&self, info: &CacheContext<'_>, query: &Query, dump: &QueryDump) -> Cursor;

    /// Execute a query to completion. Returns the matching keys and appends
    /// the matching entities to `out`.
    fn get_all(
        &self,
        info: &CacheContext<'_>,
        query: &Query,
        dump: &QueryDump,
        out: &mut Vec<PropertyList>,
    ) -> DatastoreResult<Vec<Key>>;

    /// Advance a cursor by one result, writing the entity into `out` and
    /// returning its key. Exhaustion is reported as
    /// [`DatastoreError::NoMoreResults`](lodestore_core::DatastoreError::NoMoreResults).
    fn next_cursor(
        &self,
        info: &CacheContext<'_>,
        query: &Query,
        dump: &QueryDump,
        cursor: &mut Cursor,
        out: &mut PropertyList,
    ) -> DatastoreResult<Key>;
}

/// An iteration handle over query results.
///
/// Produced by the terminal store from a [`run_query`](CacheStrategy::run_query)
/// call and advanced one result at a time through the chain, so every advance
/// passes through the middleware.
#[derive(Debug)]
pub struct Cursor {
    results: Vec<(Key, PropertyList)>,
    position: usize,
}

impl Cursor {
    /// Build a cursor over buffered results.
    #[must_use]
    pub fn from_results(results: Vec<(Key, PropertyList)>) -> Self {
        Self { results, position: 0 }
    }

    /// Take the next buffered result, if any.
    pub fn advance(&mut self) -> Option<(Key, PropertyList)> {
        let item = self.results.get(self.position).cloned();
        if item.is_some() {
            self.position += 1;
        }
        item
    }

    /// Number of results not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.results.len() - self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_yields_in_order_then_stops() {
        let mut cursor = Cursor::from_results(vec![
            (Key::id("User", 1), PropertyList::new()),
            (Key::id("User", 2), PropertyList::new()),
        ]);

        assert_eq!(cursor.remaining(), 2);
        assert_eq!(cursor.advance().unwrap().0.to_string(), "/User,1");
        assert_eq!(cursor.advance().unwrap().0.to_string(), "/User,2");
        assert!(cursor.advance().is_none());
        assert_eq!(cursor.remaining(), 0);
    }
}
