//! Producer/consumer pipeline example
//!
//! Producers enqueue work items on a `ConcurrentLinkedList`; consumers drain
//! them, "process" them, and record results in a `ConcurrentHashMap`. The
//! main thread watches progress through the lock-free `len` counter.

use shardlock::metrics::MetricsCollector;
use shardlock::{ConcurrentHashMap, ConcurrentLinkedList};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const NUM_PRODUCERS: usize = 3;
const NUM_CONSUMERS: usize = 3;
const ITEMS_PER_PRODUCER: usize = 2000;

fn main() {
    let work: Arc<ConcurrentLinkedList<usize>> = Arc::new(ConcurrentLinkedList::new());
    let results: Arc<ConcurrentHashMap<usize, usize>> =
        Arc::new(ConcurrentHashMap::with_capacity(256));
    let producers_done = Arc::new(AtomicBool::new(false));

    println!(
        "Pipeline: {} producers x {} items -> {} consumers",
        NUM_PRODUCERS, ITEMS_PER_PRODUCER, NUM_CONSUMERS
    );

    let producer_handles: Vec<_> = (0..NUM_PRODUCERS)
        .map(|producer_id| {
            let work = Arc::clone(&work);
            thread::spawn(move || {
                for i in 0..ITEMS_PER_PRODUCER {
                    work.push_front(producer_id * ITEMS_PER_PRODUCER + i);
                }
                println!("producer {} done", producer_id);
            })
        })
        .collect();

    let consumer_handles: Vec<_> = (0..NUM_CONSUMERS)
        .map(|consumer_id| {
            let work = Arc::clone(&work);
            let results = Arc::clone(&results);
            let producers_done = Arc::clone(&producers_done);
            thread::spawn(move || {
                let mut processed = 0;
                loop {
                    match work.pop_front() {
                        Some(item) => {
                            results.insert(item, item * item);
                            processed += 1;
                        }
                        None => {
                            if producers_done.load(Ordering::Acquire) && work.is_empty() {
                                break;
                            }
                            thread::yield_now();
                        }
                    }
                }
                println!("consumer {} processed {} items", consumer_id, processed);
                processed
            })
        })
        .collect();

    // Watch the queue depth without taking any lock
    let watcher = {
        let work = Arc::clone(&work);
        let producers_done = Arc::clone(&producers_done);
        thread::spawn(move || {
            while !producers_done.load(Ordering::Acquire) {
                println!("queue depth: {}", work.len());
                thread::sleep(Duration::from_millis(10));
            }
        })
    };

    for handle in producer_handles {
        handle.join().unwrap();
    }
    producers_done.store(true, Ordering::Release);
    watcher.join().unwrap();

    let total_processed: usize = consumer_handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .sum();

    let expected = NUM_PRODUCERS * ITEMS_PER_PRODUCER;
    println!("\nprocessed {} / {} items", total_processed, expected);
    println!("results map len: {}", results.len());
    assert_eq!(total_processed, expected);
    assert_eq!(results.len(), expected);

    let map_metrics = results.metrics();
    let list_metrics = work.metrics();
    println!("\nmap:  {} ops, {:.1}% contended", map_metrics.total_operations, map_metrics.contention_rate());
    println!("list: {} ops, {:.1}% contended", list_metrics.total_operations, list_metrics.contention_rate());
}
