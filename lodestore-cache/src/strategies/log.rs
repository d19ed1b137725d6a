//! Logging middleware for the cache-strategy chain.
//!
//! [`LogStrategy`] intercepts each operation, tags it with a correlation
//! number, emits a begin line and (where the operation has a result to
//! report) an end line, and delegates to the next link with the arguments
//! untouched. Results and errors pass through verbatim.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use lodestore_core::{Commit, DatastoreResult, Key, PendingKey, PropertyList, Query, QueryDump};

use crate::strategy::{CacheContext, CacheStrategy, Cursor, RequestContext};

/// Sink for diagnostic lines: receives the request context and the rendered
/// line.
pub type LogCallback = dyn Fn(&RequestContext, fmt::Arguments<'_>) + Send + Sync;

/// A cache strategy that logs every call before delegating it.
///
/// Each intercepted call gets a fresh correlation number pairing its begin
/// and end lines. The counter is the strategy's only mutable state; its lock
/// is released before the call is delegated, so the strategy imposes no
/// serialization on the operations themselves.
pub struct LogStrategy {
    prefix: String,
    logf: Box<LogCallback>,
    counter: Mutex<u64>,
}

impl LogStrategy {
    /// Create a strategy that sends lines to `logf`, each prefixed with
    /// `prefix`.
    pub fn new(
        prefix: impl Into<String>,
        logf: impl Fn(&RequestContext, fmt::Arguments<'_>) + Send + Sync + 'static,
    ) -> Self {
        Self { prefix: prefix.into(), logf: Box::new(logf), counter: Mutex::new(1) }
    }

    /// Create a strategy that sends lines to [`tracing::debug!`].
    #[must_use]
    pub fn traced(prefix: impl Into<String>) -> Self {
        Self::new(prefix, |request, line| {
            tracing::debug!(request_id = request.request_id(), "{line}");
        })
    }

    /// Take the next correlation number. The lock covers only this
    /// read-modify-write.
    fn next_correlation(&self) -> u64 {
        let mut counter = self.counter.lock().unwrap_or_else(PoisonError::into_inner);
        let n = *counter;
        *counter += 1;
        n
    }

    fn emit(&self, info: &CacheContext<'_>, line: fmt::Arguments<'_>) {
        (self.logf)(info.request(), format_args!("{}{line}", self.prefix));
    }

    /// Render a key collection for a log line: canonical key forms joined
    /// with `", "`, an empty collection rendering as the empty string.
    fn keys_to_string(keys: &[Key]) -> String {
        keys.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    }
}

impl CacheStrategy for LogStrategy {
    fn put_multi_without_tx(
        &self,
        info: &CacheContext<'_>,
        keys: &[Key],
        entities: &[PropertyList],
    ) -> DatastoreResult<Vec<Key>> {
        let n = self.next_correlation();
        self.emit(
            info,
            format_args!(
                "put_multi_without_tx #{n}, len(keys)={}, keys=[{}]",
                keys.len(),
                Self::keys_to_string(keys)
            ),
        );

        let result = info.next().put_multi_without_tx(keys, entities);

        match &result {
            Ok(stored) => self.emit(
                info,
                format_args!("put_multi_without_tx #{n}, keys=[{}]", Self::keys_to_string(stored)),
            ),
            Err(err) => self.emit(info, format_args!("put_multi_without_tx #{n}, err={err}")),
        }

        result
    }

    fn put_multi_with_tx(
        &self,
        info: &CacheContext<'_>,
        keys: &[Key],
        entities: &[PropertyList],
    ) -> DatastoreResult<Vec<PendingKey>> {
        let n = self.next_correlation();
        self.emit(
            info,
            format_args!(
                "put_multi_with_tx #{n}, len(keys)={}, keys=[{}]",
                keys.len(),
                Self::keys_to_string(keys)
            ),
        );

        let result = info.next().put_multi_with_tx(keys, entities);

        // The write is pending until the enclosing transaction commits;
        // there is no success outcome to report yet.
        if let Err(err) = &result {
            self.emit(info, format_args!("put_multi_with_tx #{n}, err={err}"));
        }

        result
    }

    fn get_multi_without_tx(
        &self,
        info: &CacheContext<'_>,
        keys: &[Key],
        out: &mut [PropertyList],
    ) -> DatastoreResult<()> {
        let n = self.next_correlation();
        self.emit(
            info,
            format_args!(
                "get_multi_without_tx #{n}, len(keys)={}, keys=[{}]",
                keys.len(),
                Self::keys_to_string(keys)
            ),
        );

        let result = info.next().get_multi_without_tx(keys, out);

        match &result {
            Ok(()) => self.emit(
                info,
                format_args!("get_multi_without_tx #{n}, keys=[{}]", Self::keys_to_string(keys)),
            ),
            Err(err) => self.emit(info, format_args!("get_multi_without_tx #{n}, err={err}")),
        }

        result
    }

    fn get_multi_with_tx(
        &self,
        info: &CacheContext<'_>,
        keys: &[Key],
        out: &mut [PropertyList],
    ) -> DatastoreResult<()> {
        let n = self.next_correlation();
        self.emit(
            info,
            format_args!(
                "get_multi_with_tx #{n}, len(keys)={}, keys=[{}]",
                keys.len(),
                Self::keys_to_string(keys)
            ),
        );

        let result = info.next().get_multi_with_tx(keys, out);

        match &result {
            Ok(()) => self.emit(
                info,
                format_args!("get_multi_with_tx #{n}, keys=[{}]", Self::keys_to_string(keys)),
            ),
            Err(err) => self.emit(info, format_args!("get_multi_with_tx #{n}, err={err}")),
        }

        result
    }

    fn delete_multi_without_tx(
        &self,
        info: &CacheContext<'_>,
        keys: &[Key],
    ) -> DatastoreResult<()> {
        let n = self.next_correlation();
        self.emit(
            info,
            format_args!(
                "delete_multi_without_tx #{n}, len(keys)={}, keys=[{}]",
                keys.len(),
                Self::keys_to_string(keys)
            ),
        );

        let result = info.next().delete_multi_without_tx(keys);

        match &result {
            Ok(()) => self.emit(
                info,
                format_args!("delete_multi_without_tx #{n}, keys=[{}]", Self::keys_to_string(keys)),
            ),
            Err(err) => self.emit(info, format_args!("delete_multi_without_tx #{n}, err={err}")),
        }

        result
    }

    fn delete_multi_with_tx(&self, info: &CacheContext<'_>, keys: &[Key]) -> DatastoreResult<()> {
        let n = self.next_correlation();
        self.emit(
            info,
            format_args!(
                "delete_multi_with_tx #{n}, len(keys)={}, keys=[{}]",
                keys.len(),
                Self::keys_to_string(keys)
            ),
        );

        let result = info.next().delete_multi_with_tx(keys);

        match &result {
            Ok(()) => self.emit(
                info,
                format_args!("delete_multi_with_tx #{n}, keys=[{}]", Self::keys_to_string(keys)),
            ),
            Err(err) => self.emit(info, format_args!("delete_multi_with_tx #{n}, err={err}")),
        }

        result
    }

    fn post_commit(&self, info: &CacheContext<'_>, _commit: &Commit) -> DatastoreResult<()> {
        let n = self.next_correlation();
        self.emit(info, format_args!("post_commit #{n}"));
        Ok(())
    }

    fn post_rollback(&self, info: &CacheContext<'_>) -> DatastoreResult<()> {
        let n = self.next_correlation();
        self.emit(info, format_args!("post_rollback #{n}"));
        Ok(())
    }

    fn run_query(&self, info: &CacheContext<'_>, query: &Query, dump: &QueryDump) -> Cursor {
        let n = self.next_correlation();
        self.emit(info, format_args!("run_query #{n}, q={dump}"));

        // Returns a handle, not a result; failures surface per-advance
        // through next_cursor.
        info.next().run_query(query, dump)
    }

    fn get_all(
        &self,
        info: &CacheContext<'_>,
        query: &Query,
        dump: &QueryDump,
        out: &mut Vec<PropertyList>,
    ) -> DatastoreResult<Vec<Key>> {
        let n = self.next_correlation();
        self.emit(info, format_args!("get_all #{n}, q={dump}"));

        let result = info.next().get_all(query, dump, out);

        match &result {
            Ok(keys) => self.emit(
                info,
                format_args!(
                    "get_all #{n}, len(keys)={}, keys=[{}]",
                    keys.len(),
                    Self::keys_to_string(keys)
                ),
            ),
            Err(err) => self.emit(info, format_args!("get_all #{n}, err={err}")),
        }

        result
    }

    fn next_cursor(
        &self,
        info: &CacheContext<'_>,
        query: &Query,
        dump: &QueryDump,
        cursor: &mut Cursor,
        out: &mut PropertyList,
    ) -> DatastoreResult<Key> {
        let n = self.next_correlation();
        self.emit(info, format_args!("next_cursor #{n}, q={dump}"));

        let result = info.next().next_cursor(query, dump, cursor, out);

        match &result {
            Ok(key) => self.emit(info, format_args!("next_cursor #{n}, key={key}")),
            Err(err) => self.emit(info, format_args!("next_cursor #{n}, err={err}")),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn keys_join_with_comma_space() {
        let keys = [Key::id("User", 1), Key::name("User", "two")];
        assert_eq!(LogStrategy::keys_to_string(&keys), "/User,1, /User,two");
    }

    #[test]
    fn empty_key_collection_renders_empty() {
        assert_eq!(LogStrategy::keys_to_string(&[]), "");
    }

    #[test]
    fn correlation_numbers_start_at_one() {
        let strategy = LogStrategy::new("", |_, _| {});
        assert_eq!(strategy.next_correlation(), 1);
        assert_eq!(strategy.next_correlation(), 2);
        assert_eq!(strategy.next_correlation(), 3);
    }

    proptest! {
        #[test]
        fn joined_keys_have_one_separator_between_each(ids in prop::collection::vec(any::<i64>(), 0..10)) {
            let keys: Vec<Key> = ids.iter().map(|id| Key::id("K", *id)).collect();
            let joined = LogStrategy::keys_to_string(&keys);

            if keys.is_empty() {
                prop_assert_eq!(joined, "");
            } else {
                prop_assert_eq!(joined.matches(", ").count(), keys.len() - 1);
                for key in &keys {
                    prop_assert!(joined.contains(&key.to_string()));
                }
            }
        }
    }
}
