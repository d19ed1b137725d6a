//! Request and operation contexts.

use std::sync::atomic::{AtomicU64, Ordering};

use lodestore_core::{DatastoreResult, Key, PendingKey, PropertyList, Query, QueryDump, TxId};

use super::{Chain, Cursor};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Ambient, request-scoped context.
///
/// Carries the data every link may need: a process-unique request identifier
/// for diagnostics and the transaction open on this request, if any.
/// Collaborators beyond these are passed as typed parameters, not smuggled
/// through the context.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: u64,
    transaction: Option<TxId>,
}

impl RequestContext {
    /// Create a context for a new request.
    #[must_use]
    pub fn new() -> Self {
        Self { request_id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed), transaction: None }
    }

    /// Mark a transaction as open on this request.
    #[must_use]
    pub const fn with_transaction(mut self, tx: TxId) -> Self {
        self.transaction = Some(tx);
        self
    }

    /// The process-unique request identifier.
    #[must_use]
    pub const fn request_id(&self) -> u64 {
        self.request_id
    }

    /// The transaction open on this request, if any.
    #[must_use]
    pub const fn transaction(&self) -> Option<TxId> {
        self.transaction
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-call operation-context handed to each link.
///
/// Bundles the ambient [`RequestContext`] with this link's position in the
/// chain. The link reaches its successor through [`next`](Self::next); it
/// never owns the chain.
#[derive(Debug, Clone, Copy)]
pub struct CacheContext<'a> {
    request: &'a RequestContext,
    chain: &'a Chain,
    depth: usize,
}

impl<'a> CacheContext<'a> {
    pub(crate) const fn new(request: &'a RequestContext, chain: &'a Chain, depth: usize) -> Self {
        Self { request, chain, depth }
    }

    /// The ambient request context.
    #[must_use]
    pub const fn request(&self) -> &'a RequestContext {
        self.request
    }

    /// The transaction open on this request, if any.
    #[must_use]
    pub const fn transaction(&self) -> Option<TxId> {
        self.request.transaction()
    }

    /// The next handler in the chain.
    #[must_use]
    pub const fn next(&self) -> NextLink<'a> {
        NextLink { request: self.request, chain: self.chain, depth: self.depth + 1 }
    }
}

/// A reference to the next handler in the chain, valid for one call.
///
/// Exposes only the delegating operations. Commit and rollback notifications
/// are deliberately absent: the chain owner delivers those to every link
/// itself, so a strategy cannot forward them.
#[derive(Debug, Clone, Copy)]
pub struct NextLink<'a> {
    request: &'a RequestContext,
    chain: &'a Chain,
    depth: usize,
}

impl<'a> NextLink<'a> {
    fn info(&self) -> CacheContext<'a> {
        CacheContext::new(self.request, self.chain, self.depth)
    }

    /// Delegate a without-tx put to the next link.
    pub fn put_multi_without_tx(
        &self,
        keys: &[Key],
        entities: &[PropertyList],
    ) -> DatastoreResult<Vec<Key>> {
        self.chain.link(self.depth).put_multi_without_tx(&self.info(), keys, entities)
    }

    /// Delegate a with-tx put to the next link.
    pub fn put_multi_with_tx(
        &self,
        keys: &[Key],
        entities: &[PropertyList],
    ) -> DatastoreResult<Vec<PendingKey>> {
        self.chain.link(self.depth).put_multi_with_tx(&self.info(), keys, entities)
    }

    /// Delegate a without-tx get to the next link.
    pub fn get_multi_without_tx(
        &self,
        keys: &[Key],
        out: &mut [PropertyList],
    ) -> DatastoreResult<()> {
        self.chain.link(self.depth).get_multi_without_tx(&self.info(), keys, out)
    }

    /// Delegate a with-tx get to the next link.
    pub fn get_multi_with_tx(&self, keys: &[Key], out: &mut [PropertyList]) -> DatastoreResult<()> {
        self.chain.link(self.depth).get_multi_with_tx(&self.info(), keys, out)
    }

    /// Delegate a without-tx delete to the next link.
    pub fn delete_multi_without_tx(&self, keys: &[Key]) -> DatastoreResult<()> {
        self.chain.link(self.depth).delete_multi_without_tx(&self.info(), keys)
    }

    /// Delegate a with-tx delete to the next link.
    pub fn delete_multi_with_tx(&self, keys: &[Key]) -> DatastoreResult<()> {
        self.chain.link(self.depth).delete_multi_with_tx(&self.info(), keys)
    }

    /// Delegate a query start to the next link.
    pub fn run_query(&self, query: &Query, dump: &QueryDump) -> Cursor {
        self.chain.link(self.depth).run_query(&self.info(), query, dump)
    }

    /// Delegate a full query execution to the next link.
    pub fn get_all(
        &self,
        query: &Query,
        dump: &QueryDump,
        out: &mut Vec<PropertyList>,
    ) -> DatastoreResult<Vec<Key>> {
        self.chain.link(self.depth).get_all(&self.info(), query, dump, out)
    }

    /// Delegate a cursor advance to the next link.
    pub fn next_cursor(
        &self,
        query: &Query,
        dump: &QueryDump,
        cursor: &mut Cursor,
        out: &mut PropertyList,
    ) -> DatastoreResult<Key> {
        self.chain.link(self.depth).next_cursor(&self.info(), query, dump, cursor, out)
    }
}
