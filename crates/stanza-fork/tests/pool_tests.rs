//! Behavioral tests for the worker pool.

use stanza_fork::Pool;
use std::sync::{Arc, Mutex};

#[test]
fn four_tasks_across_two_workers_yield_two_aggregates() {
    let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_in_callback = Arc::clone(&seen);

    let mut pool: Pool<u32, u32> = Pool::new(
        vec![vec![1u32, 2], vec![3, 4]],
        || 0u32,
        |state, _index, task| {
            *state += task;
            task * 10
        },
        |state| state,
        Some(Box::new(move |result| {
            seen_in_callback.lock().unwrap().push(result);
        })),
    )
    .unwrap();

    let mut aggregates = pool.wait();
    aggregates.sort_unstable();

    // Exactly one aggregate per worker, order unspecified.
    assert_eq!(aggregates, vec![3, 7]);
    assert!(!pool.did_have_error());

    // Every task-done callback fired exactly once across the run.
    let mut results = seen.lock().unwrap().clone();
    results.sort_unstable();
    assert_eq!(results, vec![10, 20, 30, 40]);
}

#[test]
fn results_within_one_worker_arrive_in_submission_order() {
    let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_in_callback = Arc::clone(&seen);

    let mut pool: Pool<usize, usize> = Pool::new(
        vec![vec![10usize, 20, 30]],
        || (),
        |_state, index, _task| index,
        |_state| 0,
        Some(Box::new(move |index| {
            seen_in_callback.lock().unwrap().push(index);
        })),
    )
    .unwrap();

    pool.wait();
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
}

#[test]
fn payloads_larger_than_one_read_chunk_reassemble() {
    let mut pool: Pool<String, usize> = Pool::new(
        vec![vec![16 * 1024usize]],
        || (),
        |_state, _index, size| "x".repeat(size),
        |_state| 0,
        None,
    )
    .unwrap();

    let collected = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);
    let mut pool_with_callback: Pool<String, usize> = Pool::new(
        vec![vec![16 * 1024usize]],
        || (),
        |_state, _index, size| "x".repeat(size),
        |_state| 0,
        Some(Box::new(move |payload: String| {
            sink.lock().unwrap().push(payload);
        })),
    )
    .unwrap();

    pool.wait();
    pool_with_callback.wait();
    assert!(!pool_with_callback.did_have_error());

    let collected = collected.lock().unwrap();
    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0].len(), 16 * 1024);
    assert!(collected[0].bytes().all(|b| b == b'x'));
}

#[test]
fn panicking_worker_sets_error_flag_without_failing_the_run() {
    let mut pool: Pool<u32, u32> = Pool::new(
        vec![vec![1u32], vec![2]],
        || (),
        |_state, _index, task| {
            if task == 2 {
                panic!("worker crashed");
            }
            task
        },
        |_state| 0,
        None,
    )
    .unwrap();

    let aggregates = pool.wait();
    // The healthy worker still completed.
    assert_eq!(aggregates, vec![0]);
    assert!(pool.did_have_error());
}

#[test]
fn single_batch_pool_degrades_to_one_worker() {
    let mut pool: Pool<u32, Vec<u32>> = Pool::new(
        vec![vec![5u32, 6]],
        Vec::new,
        |state: &mut Vec<u32>, _index, task| {
            state.push(task);
            task
        },
        |state| state,
        None,
    )
    .unwrap();

    let aggregates = pool.wait();
    assert_eq!(aggregates, vec![vec![5, 6]]);
}
