//! Integration tests for the logging strategy's contract.

use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use lodestore_cache::strategies::{LogStrategy, MemoryStore};
use lodestore_cache::{Chain, RequestContext};
use lodestore_core::{Commit, DatastoreError, FilterOp, Key, PropertyList, Query, TxId};

/// A log strategy writing into a shared line buffer.
fn recording_strategy(prefix: &str) -> (Arc<LogStrategy>, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    let strategy = Arc::new(LogStrategy::new(prefix, move |_, line| {
        sink.lock().expect("sink lock").push(line.to_string());
    }));
    (strategy, lines)
}

fn logged_chain(prefix: &str) -> (Chain, Arc<Mutex<Vec<String>>>) {
    let (strategy, lines) = recording_strategy(prefix);
    let chain = Chain::new(vec![strategy], Arc::new(MemoryStore::new()));
    (chain, lines)
}

fn taken(lines: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    std::mem::take(&mut *lines.lock().expect("sink lock"))
}

// ============================================================================
// Line format
// ============================================================================

#[test]
fn put_logs_begin_and_end_with_same_number() {
    let (chain, lines) = logged_chain("ds: ");
    let request = RequestContext::new();

    chain
        .put_multi_without_tx(
            &request,
            &[Key::id("User", 1), Key::id("User", 2)],
            &[PropertyList::new(), PropertyList::new()],
        )
        .unwrap();

    assert_eq!(
        taken(&lines),
        vec![
            "ds: put_multi_without_tx #1, len(keys)=2, keys=[/User,1, /User,2]",
            "ds: put_multi_without_tx #1, keys=[/User,1, /User,2]",
        ]
    );
}

#[test]
fn put_end_line_reports_allocated_keys() {
    let (chain, lines) = logged_chain("ds: ");
    let request = RequestContext::new();

    chain
        .put_multi_without_tx(&request, &[Key::incomplete("User")], &[PropertyList::new()])
        .unwrap();

    let lines = taken(&lines);
    assert_eq!(lines[0], "ds: put_multi_without_tx #1, len(keys)=1, keys=[/User,0]");
    assert_eq!(lines[1], "ds: put_multi_without_tx #1, keys=[/User,1]");
}

#[test]
fn empty_key_collection_renders_as_empty_brackets() {
    let (chain, lines) = logged_chain("ds: ");
    let request = RequestContext::new();

    chain.delete_multi_without_tx(&request, &[]).unwrap();

    let lines = taken(&lines);
    assert_eq!(lines[0], "ds: delete_multi_without_tx #1, len(keys)=0, keys=[]");
}

#[test]
fn query_ops_log_the_query_dump() {
    let (chain, lines) = logged_chain("ds: ");
    let request = RequestContext::new();

    let query = Query::new("User").filter("age", FilterOp::Ge, 18i64).limit(3);
    let mut out = Vec::new();
    chain.get_all(&request, &query, &mut out).unwrap();

    let lines = taken(&lines);
    assert_eq!(lines[0], "ds: get_all #1, q=kind=User, filter=[age >= 18], limit=3");
    assert_eq!(lines[1], "ds: get_all #1, len(keys)=0, keys=[]");
}

// ============================================================================
// Correlation numbers
// ============================================================================

#[test]
fn correlation_numbers_are_consecutive_across_operations() {
    let (chain, lines) = logged_chain("");
    let request = RequestContext::new();
    let key = Key::id("User", 1);

    chain.put_multi_without_tx(&request, &[key.clone()], &[PropertyList::new()]).unwrap();
    let mut out = vec![PropertyList::new()];
    chain.get_multi_without_tx(&request, &[key.clone()], &mut out).unwrap();
    chain.delete_multi_without_tx(&request, &[key]).unwrap();

    let begins: Vec<String> = taken(&lines)
        .into_iter()
        .filter(|line| line.contains("len(keys)="))
        .collect();
    assert!(begins[0].contains("put_multi_without_tx #1"));
    assert!(begins[1].contains("get_multi_without_tx #2"));
    assert!(begins[2].contains("delete_multi_without_tx #3"));
}

#[test]
fn each_instance_counts_independently() {
    let (outer, outer_lines) = recording_strategy("outer: ");
    let (inner, inner_lines) = recording_strategy("inner: ");
    let chain = Chain::new(vec![outer, inner], Arc::new(MemoryStore::new()));
    let request = RequestContext::new();

    chain.put_multi_without_tx(&request, &[Key::id("User", 1)], &[PropertyList::new()]).unwrap();

    let outer_lines = taken(&outer_lines);
    let inner_lines = taken(&inner_lines);
    assert!(outer_lines[0].starts_with("outer: put_multi_without_tx #1"));
    assert!(inner_lines[0].starts_with("inner: put_multi_without_tx #1"));
}

// ============================================================================
// Error reporting and pass-through
// ============================================================================

#[test]
fn failed_call_logs_the_error_once_and_no_success_line() {
    let (chain, lines) = logged_chain("ds: ");
    let request = RequestContext::new();

    let mut out = vec![PropertyList::new()];
    let err = chain
        .get_multi_without_tx(&request, &[Key::id("User", 404)], &mut out)
        .unwrap_err();
    assert_eq!(err, DatastoreError::NoSuchEntity("/User,404".to_owned()));

    let lines = taken(&lines);
    assert_eq!(
        lines,
        vec![
            "ds: get_multi_without_tx #1, len(keys)=1, keys=[/User,404]",
            "ds: get_multi_without_tx #1, err=no such entity: /User,404",
        ]
    );
}

#[test]
fn results_pass_through_unchanged() {
    let logged = {
        let (strategy, _) = recording_strategy("ds: ");
        Chain::new(vec![strategy], Arc::new(MemoryStore::new()))
    };
    let bare = Chain::new(Vec::new(), Arc::new(MemoryStore::new()));
    let request = RequestContext::new();

    let keys = [Key::id("User", 1), Key::name("User", "n")];
    let entities =
        [PropertyList::new().with("a", 1i64), PropertyList::new().with("b", "two")];

    let from_logged = logged.put_multi_without_tx(&request, &keys, &entities).unwrap();
    let from_bare = bare.put_multi_without_tx(&request, &keys, &entities).unwrap();
    assert_eq!(from_logged, from_bare);

    let mut out_logged = vec![PropertyList::new(), PropertyList::new()];
    let mut out_bare = vec![PropertyList::new(), PropertyList::new()];
    logged.get_multi_without_tx(&request, &keys, &mut out_logged).unwrap();
    bare.get_multi_without_tx(&request, &keys, &mut out_bare).unwrap();
    assert_eq!(out_logged, out_bare);
}

// ============================================================================
// Transactional write logging
// ============================================================================

#[test]
fn put_with_tx_success_logs_begin_only() {
    let (chain, lines) = logged_chain("ds: ");
    let request = RequestContext::new().with_transaction(TxId::new(1));

    chain.put_multi_with_tx(&request, &[Key::id("User", 1)], &[PropertyList::new()]).unwrap();

    let lines = taken(&lines);
    assert_eq!(lines, vec!["ds: put_multi_with_tx #1, len(keys)=1, keys=[/User,1]"]);
}

#[test]
fn put_with_tx_failure_logs_the_error() {
    let (chain, lines) = logged_chain("ds: ");
    // No open transaction, so the store rejects the call
    let request = RequestContext::new();

    chain
        .put_multi_with_tx(&request, &[Key::id("User", 1)], &[PropertyList::new()])
        .unwrap_err();

    let lines = taken(&lines);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("ds: put_multi_with_tx #1, err="));
}

// ============================================================================
// Commit and rollback notifications
// ============================================================================

#[test]
fn commit_and_rollback_log_a_single_line_each() {
    let (chain, lines) = logged_chain("ds: ");
    let tx = TxId::new(1);
    let request = RequestContext::new().with_transaction(tx);

    chain.post_commit(&request, &Commit::new(tx)).unwrap();
    chain.post_rollback(&request).unwrap();

    assert_eq!(taken(&lines), vec!["ds: post_commit #1", "ds: post_rollback #2"]);
}

// ============================================================================
// Cursor protocol
// ============================================================================

#[test]
fn run_query_logs_begin_only_and_advances_log_each_result() {
    let (chain, lines) = logged_chain("ds: ");
    let request = RequestContext::new();

    chain.put_multi_without_tx(&request, &[Key::id("User", 7)], &[PropertyList::new()]).unwrap();
    taken(&lines);

    let query = Query::new("User");
    let mut cursor = chain.run_query(&request, &query);
    assert_eq!(taken(&lines), vec!["ds: run_query #2, q=kind=User"]);

    let mut out = PropertyList::new();
    chain.next_cursor(&request, &query, &mut cursor, &mut out).unwrap();
    assert_eq!(
        taken(&lines),
        vec!["ds: next_cursor #3, q=kind=User", "ds: next_cursor #3, key=/User,7"]
    );

    let err = chain.next_cursor(&request, &query, &mut cursor, &mut out).unwrap_err();
    assert_eq!(err, DatastoreError::NoMoreResults);
    assert_eq!(
        taken(&lines),
        vec!["ds: next_cursor #4, q=kind=User", "ds: next_cursor #4, err=no more results"]
    );
}

// ============================================================================
// Concurrency
// ============================================================================

/// Concurrent calls never observe duplicate correlation numbers.
#[test]
fn concurrent_calls_get_unique_consecutive_numbers() {
    let (chain, lines) = logged_chain("");
    let chain = Arc::new(chain);

    let num_threads = 8;
    let calls_per_thread = 25;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let chain = Arc::clone(&chain);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                let request = RequestContext::new();
                for i in 0..calls_per_thread {
                    let key = Key::id("User", (t * calls_per_thread + i) as i64);
                    chain
                        .put_multi_without_tx(&request, &[key], &[PropertyList::new()])
                        .expect("put failed");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked");
    }

    let mut numbers: Vec<u64> = taken(&lines)
        .iter()
        .filter(|line| line.contains("len(keys)="))
        .map(|line| {
            let start = line.find('#').expect("missing #") + 1;
            let end = line[start..].find(',').expect("missing ,") + start;
            line[start..end].parse().expect("bad number")
        })
        .collect();

    numbers.sort_unstable();
    let expected: Vec<u64> = (1..=(num_threads * calls_per_thread) as u64).collect();
    assert_eq!(numbers, expected);
}
