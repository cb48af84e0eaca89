//! Concurrent integration tests for list implementations

use super::*;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_spsc_fifo_multiset() {
    // One producer pushing 0..1000 via push_back, one consumer popping via
    // pop_front: exactly 1000 pops, the multiset of popped values is
    // {0..999}, and the list ends empty.
    let list = Arc::new(ConcurrentLinkedList::new());
    let total = 1000;

    let producer = {
        let list = Arc::clone(&list);
        thread::spawn(move || {
            for i in 0..total {
                list.push_back(i);
            }
        })
    };

    let consumer = {
        let list = Arc::clone(&list);
        thread::spawn(move || {
            let mut popped = Vec::with_capacity(total);
            while popped.len() < total {
                match list.pop_front() {
                    Some(value) => popped.push(value),
                    None => thread::yield_now(),
                }
            }
            popped
        })
    };

    producer.join().unwrap();
    let mut popped = consumer.join().unwrap();

    assert_eq!(popped.len(), total);
    popped.sort_unstable();
    assert_eq!(popped, (0..total).collect::<Vec<_>>());
    assert!(list.is_empty());
    assert_eq!(list.pop_front(), None);
}

#[test]
fn test_single_producer_preserves_order() {
    // With one producer, FIFO order (not just the multiset) must survive a
    // concurrent consumer.
    let list = Arc::new(ConcurrentLinkedList::new());
    let total = 500;

    let producer = {
        let list = Arc::clone(&list);
        thread::spawn(move || {
            for i in 0..total {
                list.push_back(i);
            }
        })
    };

    let consumer = {
        let list = Arc::clone(&list);
        thread::spawn(move || {
            let mut previous = None;
            let mut seen = 0;
            while seen < total {
                if let Some(value) = list.pop_front() {
                    if let Some(previous) = previous {
                        assert!(value > previous, "FIFO violated: {} after {}", value, previous);
                    }
                    previous = Some(value);
                    seen += 1;
                } else {
                    thread::yield_now();
                }
            }
        })
    };

    producer.join().unwrap();
    consumer.join().unwrap();
}

#[test]
fn test_concurrent_push_front_counts() {
    let list = Arc::new(ConcurrentLinkedList::new());
    let num_threads = 4;
    let items_per_thread = 1000;

    let mut handles = vec![];
    for thread_id in 0..num_threads {
        let list = Arc::clone(&list);
        handles.push(thread::spawn(move || {
            for i in 0..items_per_thread {
                list.push_front(thread_id * items_per_thread + i);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(list.len(), num_threads * items_per_thread);

    // Drain and verify nothing was lost or duplicated
    let mut drained = Vec::new();
    while let Some(value) = list.pop_front() {
        drained.push(value);
    }
    drained.sort_unstable();
    assert_eq!(drained, (0..num_threads * items_per_thread).collect::<Vec<_>>());
}

#[test]
fn test_mpmc_drain_is_exact() {
    let list = Arc::new(ConcurrentLinkedList::new());
    let num_producers = 4;
    let num_consumers = 4;
    let items_per_producer = 500;
    let total = num_producers * items_per_producer;
    let barrier = Arc::new(Barrier::new(num_producers + num_consumers));

    let mut producers = vec![];
    for producer_id in 0..num_producers {
        let list = Arc::clone(&list);
        let barrier = Arc::clone(&barrier);
        producers.push(thread::spawn(move || {
            barrier.wait();
            for i in 0..items_per_producer {
                list.push_front(producer_id * items_per_producer + i);
            }
        }));
    }

    let consumed = Arc::new(std::sync::Mutex::new(Vec::new()));
    let remaining = Arc::new(core::sync::atomic::AtomicUsize::new(total));
    let mut consumers = vec![];
    for _ in 0..num_consumers {
        let list = Arc::clone(&list);
        let barrier = Arc::clone(&barrier);
        let consumed = Arc::clone(&consumed);
        let remaining = Arc::clone(&remaining);
        consumers.push(thread::spawn(move || {
            barrier.wait();
            let mut local = Vec::new();
            loop {
                match list.pop_front() {
                    Some(value) => {
                        local.push(value);
                        remaining.fetch_sub(1, core::sync::atomic::Ordering::AcqRel);
                    }
                    None => {
                        if remaining.load(core::sync::atomic::Ordering::Acquire) == 0 {
                            break;
                        }
                        thread::yield_now();
                    }
                }
            }
            consumed.lock().unwrap().extend(local);
        }));
    }

    for handle in producers {
        handle.join().unwrap();
    }
    for handle in consumers {
        handle.join().unwrap();
    }

    let mut consumed = Arc::try_unwrap(consumed).unwrap().into_inner().unwrap();
    consumed.sort_unstable();
    assert_eq!(consumed, (0..total).collect::<Vec<_>>());
    assert!(list.is_empty());
}

#[test]
fn test_concurrent_remove_value() {
    let list = Arc::new(ConcurrentLinkedList::new());
    for i in 0..100 {
        list.push_back(i);
    }

    // Two threads race to remove the same values; each value must be
    // removed exactly once overall.
    let removed_counts: Vec<_> = (0..2)
        .map(|_| {
            let list = Arc::clone(&list);
            thread::spawn(move || (0..100).filter(|i| list.remove_value(i)).count())
        })
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(removed_counts.iter().sum::<usize>(), 100);
    assert!(list.is_empty());
}

#[test]
fn test_len_is_readable_under_load() {
    let list = Arc::new(ConcurrentLinkedList::new());
    let writers: Vec<_> = (0..2)
        .map(|_| {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                let mut pops = 0;
                for i in 0..2000 {
                    list.push_front(i);
                    if i % 2 == 0 && list.pop_front().is_some() {
                        pops += 1;
                    }
                }
                pops
            })
        })
        .collect();

    // len never blocks and never exceeds what the writers could have pushed
    let watcher = {
        let list = Arc::clone(&list);
        thread::spawn(move || {
            for _ in 0..10_000 {
                assert!(list.len() <= 4000);
            }
        })
    };

    let mut total_pops = 0;
    for writer in writers {
        total_pops += writer.join().unwrap();
    }
    watcher.join().unwrap();

    // Quiescent: counter equals the actual chain length
    assert_eq!(list.len(), 4000 - total_pops);
    let mut actual = 0;
    while list.pop_front().is_some() {
        actual += 1;
    }
    assert_eq!(actual, 4000 - total_pops);
}
