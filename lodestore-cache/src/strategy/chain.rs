//! Chain assembly and entry points.

use std::fmt;
use std::sync::Arc;

use lodestore_core::{Commit, DatastoreResult, Key, PendingKey, PropertyList, Query, QueryDump};

use super::{CacheContext, CacheStrategy, Cursor, RequestContext};

/// An ordered cache-strategy chain.
///
/// Middlewares come first, the terminal backing store last; construction
/// enforces the terminal so a well-formed chain always bottoms out. Each
/// entry point dispatches to the first link with an operation-context the
/// links use to delegate onward.
pub struct Chain {
    links: Vec<Arc<dyn CacheStrategy>>,
}

impl Chain {
    /// Assemble a chain from middlewares (in order) and the terminal store.
    #[must_use]
    pub fn new(middlewares: Vec<Arc<dyn CacheStrategy>>, store: Arc<dyn CacheStrategy>) -> Self {
        let mut links = middlewares;
        links.push(store);
        Self { links }
    }

    /// Number of links, terminal store included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the chain holds no links. Construction always appends the
    /// terminal store, so this is false for any assembled chain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// The link at `depth`. Running past the terminal store means a strategy
    /// that must not delegate did; that is a bug in the chain's composition,
    /// not a recoverable error.
    pub(crate) fn link(&self, depth: usize) -> &dyn CacheStrategy {
        match self.links.get(depth) {
            Some(link) => link.as_ref(),
            None => panic!("cache-strategy chain exhausted at depth {depth}: the terminal store must not delegate"),
        }
    }

    fn entry<'a>(&'a self, request: &'a RequestContext) -> CacheContext<'a> {
        CacheContext::new(request, self, 0)
    }

    /// Store entities outside a transaction.
    pub fn put_multi_without_tx(
        &self,
        request: &RequestContext,
        keys: &[Key],
        entities: &[PropertyList],
    ) -> DatastoreResult<Vec<Key>> {
        self.link(0).put_multi_without_tx(&self.entry(request), keys, entities)
    }

    /// Store entities inside the request's open transaction.
    pub fn put_multi_with_tx(
        &self,
        request: &RequestContext,
        keys: &[Key],
        entities: &[PropertyList],
    ) -> DatastoreResult<Vec<PendingKey>> {
        self.link(0).put_multi_with_tx(&self.entry(request), keys, entities)
    }

    /// Read entities outside a transaction into `out`.
    pub fn get_multi_without_tx(
        &self,
        request: &RequestContext,
        keys: &[Key],
        out: &mut [PropertyList],
    ) -> DatastoreResult<()> {
        self.link(0).get_multi_without_tx(&self.entry(request), keys, out)
    }

    /// Read entities inside the request's open transaction into `out`.
    pub fn get_multi_with_tx(
        &self,
        request: &RequestContext,
        keys: &[Key],
        out: &mut [PropertyList],
    ) -> DatastoreResult<()> {
        self.link(0).get_multi_with_tx(&self.entry(request), keys, out)
    }

    /// Delete entities outside a transaction.
    pub fn delete_multi_without_tx(
        &self,
        request: &RequestContext,
        keys: &[Key],
    ) -> DatastoreResult<()> {
        self.link(0).delete_multi_without_tx(&self.entry(request), keys)
    }

    /// Delete entities inside the request's open transaction.
    pub fn delete_multi_with_tx(
        &self,
        request: &RequestContext,
        keys: &[Key],
    ) -> DatastoreResult<()> {
        self.link(0).delete_multi_with_tx(&self.entry(request), keys)
    }

    /// Notify every link, in order, that a transaction committed.
    ///
    /// Notifications fan out from here rather than flowing down the chain,
    /// so each link sees the commit exactly once.
    pub fn post_commit(&self, request: &RequestContext, commit: &Commit) -> DatastoreResult<()> {
        for depth in 0..self.links.len() {
            let info = CacheContext::new(request, self, depth);
            self.links[depth].post_commit(&info, commit)?;
        }
        Ok(())
    }

    /// Notify every link, in order, that a transaction rolled back.
    pub fn post_rollback(&self, request: &RequestContext) -> DatastoreResult<()> {
        for depth in 0..self.links.len() {
            let info = CacheContext::new(request, self, depth);
            self.links[depth].post_rollback(&info)?;
        }
        Ok(())
    }

    /// Start executing a query, returning a cursor over its results.
    pub fn run_query(&self, request: &RequestContext, query: &Query) -> Cursor {
        let dump = query.dump();
        self.link(0).run_query(&self.entry(request), query, &dump)
    }

    /// Execute a query to completion.
    pub fn get_all(
        &self,
        request: &RequestContext,
        query: &Query,
        out: &mut Vec<PropertyList>,
    ) -> DatastoreResult<Vec<Key>> {
        let dump = query.dump();
        self.link(0).get_all(&self.entry(request), query, &dump, out)
    }

    /// Advance a cursor by one result.
    pub fn next_cursor(
        &self,
        request: &RequestContext,
        query: &Query,
        cursor: &mut Cursor,
        out: &mut PropertyList,
    ) -> DatastoreResult<Key> {
        let dump = query.dump();
        self.link(0).next_cursor(&self.entry(request), query, &dump, cursor, out)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("links", &self.links.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::MemoryStore;

    #[test]
    fn store_only_chain_has_one_link() {
        let chain = Chain::new(Vec::new(), Arc::new(MemoryStore::new()));
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
    }

    #[test]
    #[should_panic(expected = "chain exhausted")]
    fn delegating_past_the_terminal_store_panics() {
        let chain = Chain::new(Vec::new(), Arc::new(MemoryStore::new()));
        chain.link(1);
    }
}
