//! Basic usage example for shardlock
//!
//! Walks through both containers from a single thread, then shares the map
//! across a handful of writer threads.

use shardlock::metrics::MetricsCollector;
use shardlock::{ConcurrentHashMap, ConcurrentLinkedList};
use std::sync::Arc;
use std::thread;

fn main() {
    println!("shardlock Basic Usage Example");
    println!("=============================");

    // Hash map basics
    println!("\n1. ConcurrentHashMap:");
    let map: ConcurrentHashMap<&str, i32> = ConcurrentHashMap::new();
    map.insert("alice", 25);
    map.insert("bob", 30);
    println!("   inserted alice=25, bob=30; len = {}", map.len());

    map.insert("alice", 26);
    println!("   overwrote alice; len is still {}", map.len());

    println!("   get(\"alice\") = {:?}", map.get(&"alice"));
    println!("   remove(\"alice\") = {:?}", map.remove(&"alice"));
    println!("   contains(\"alice\") = {}", map.contains(&"alice"));
    println!("   len = {}", map.len());

    // Linked list basics: queue order
    println!("\n2. ConcurrentLinkedList as a queue:");
    let list = ConcurrentLinkedList::new();
    for i in 0..5 {
        list.push_back(i);
    }
    print!("   pushed 0..5 via push_back; popping:");
    while let Some(value) = list.pop_front() {
        print!(" {}", value);
    }
    println!();

    // Concurrent writers on disjoint keys
    println!("\n3. Concurrent map writers:");
    let shared = Arc::new(ConcurrentHashMap::new());
    let handles: Vec<_> = (0..4)
        .map(|writer_id: usize| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for i in 0..250 {
                    shared.insert(writer_id * 250 + i, writer_id);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    println!("   4 writers x 250 disjoint keys -> len = {}", shared.len());

    // Operation metrics
    let snapshot = shared.metrics();
    println!("\n4. Metrics:");
    println!("   total operations: {}", snapshot.total_operations);
    println!("   success rate:     {:.1}%", snapshot.success_rate());
    println!("   contention rate:  {:.1}%", snapshot.contention_rate());
    println!("   avg op time:      {:?}", snapshot.avg_operation_time());
}
