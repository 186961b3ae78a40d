//! Integration tests for progress tracking
//!
//! These tests verify that:
//! - Snapshots are emitted only when the high-water mark advances
//! - Out-of-order and duplicate events never produce regressions or duplicates
//! - Completion and rate reporting follow the configured total

use chrono::{Duration, TimeZone, Utc};
use datamove::core::progress::{ManualClock, ProgressSnapshot, ProgressTracker};
use datamove::domain::BatchEvent;
use std::sync::{Arc, Mutex};

fn event(batch_number: u64, results_so_far: u64) -> BatchEvent {
    BatchEvent::new(vec![], batch_number, results_so_far)
}

fn collecting_tracker(total: u64) -> (ProgressTracker, Arc<Mutex<Vec<ProgressSnapshot>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let tracker = ProgressTracker::new(total).on_progress(move |snapshot| {
        sink.lock().unwrap().push(snapshot.clone());
        Ok(())
    });
    (tracker, seen)
}

#[test]
fn test_in_order_events_reach_completion() {
    let (tracker, seen) = collecting_tracker(4);
    tracker.start();

    tracker.record(&event(1, 2));
    tracker.record(&event(2, 4));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(!seen[0].is_complete());
    assert!(seen[1].is_complete());
}

#[test]
fn test_out_of_order_event_is_dropped() {
    let (tracker, seen) = collecting_tracker(4);
    tracker.start();

    assert!(tracker.record(&event(2, 4)).is_some());
    assert!(tracker.record(&event(1, 2)).is_none());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].results_so_far, 4);
    assert_eq!(seen[0].job_batch_number, 2);
}

#[test]
fn test_emissions_equal_distinct_new_maxima() {
    let (tracker, seen) = collecting_tracker(0);
    let order = [3u64, 1, 3, 5, 2, 5, 8, 7, 8];
    for (i, results) in order.iter().enumerate() {
        tracker.record(&event(i as u64 + 1, *results));
    }

    let counts: Vec<u64> = seen
        .lock()
        .unwrap()
        .iter()
        .map(|s| s.results_so_far)
        .collect();
    assert_eq!(counts, vec![3, 5, 8]);
}

#[test]
fn test_concurrent_equal_counts_emit_once() {
    let (tracker, seen) = collecting_tracker(0);
    let tracker = Arc::new(tracker);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let tracker = tracker.clone();
            std::thread::spawn(move || {
                tracker.record(&event(i, 100));
                tracker.record(&event(i, 1 + i % 4));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].results_so_far, 100);
    assert_eq!(tracker.high_water_mark(), 100);
}

#[test]
fn test_unknown_total_never_completes() {
    let (tracker, seen) = collecting_tracker(0);
    tracker.record(&event(1, 10));

    let seen = seen.lock().unwrap();
    assert!(!seen[0].is_complete());
    assert_eq!(seen[0].total_results, 0);
    assert!(seen[0].progress_text().contains("10 results so far"));
}

#[test]
fn test_reported_total_raised_but_configured_total_kept() {
    let (tracker, seen) = collecting_tracker(5);
    tracker.record(&event(1, 7));

    assert_eq!(seen.lock().unwrap()[0].total_results, 7);
    assert_eq!(tracker.configured_total(), 5);
}

#[test]
fn test_elapsed_time_and_rate_from_clock() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let (tracker, seen) = collecting_tracker(30);
    let tracker = tracker.with_clock(clock.clone());
    tracker.start();

    clock.advance(Duration::milliseconds(3000));
    tracker.record(&event(1, 10));

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].elapsed_seconds, 3.0);
    assert_eq!(seen[0].rate(), Some(3.3333));
    assert_eq!(
        seen[0].progress_text(),
        "Progress: 10 of 30; time 3.000000s; 3.3333 records/s"
    );
}

#[test]
fn test_failing_observer_does_not_block_later_observers() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let first = calls.clone();
    let third = calls.clone();
    let tracker = ProgressTracker::new(0)
        .on_progress(move |_| {
            first.lock().unwrap().push("first");
            Ok(())
        })
        .on_progress(|_| panic!("observer bug"))
        .on_progress(move |_| {
            third.lock().unwrap().push("third");
            Ok(())
        });

    assert!(tracker.record(&event(1, 1)).is_some());
    assert!(tracker.record(&event(2, 2)).is_some());
    assert_eq!(
        *calls.lock().unwrap(),
        vec!["first", "third", "first", "third"]
    );
}
