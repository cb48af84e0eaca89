//! Mutex-guarded singly-linked list
//!
//! One mutex guards the head pointer and, through it, every traversal; an
//! atomic counter tracks the length so `len` never needs the lock. This is
//! deliberately the simplest correct design: all structural operations and
//! even read-only lookups serialize on the one lock, so the list trades
//! scalability for an easily-stated consistency model (full mutual
//! exclusion). Downstream code relies on that model; do not "improve" it to
//! something weaker.
//!
//! Nodes are uniquely owned `Box`es chained through `next`; dropping the
//! list or clearing it unlinks the chain iteratively so deep lists cannot
//! overflow the stack.

use crate::metrics::{AtomicMetrics, MetricsCollector, PerformanceMetrics};
use crate::util::CachePadded;
use crate::{Error, Result};
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use parking_lot::{Mutex, MutexGuard};
use std::time::Instant;

struct Node<T> {
    value: T,
    next: Option<Box<Node<T>>>,
}

type Chain<T> = Option<Box<Node<T>>>;

/// A thread-safe singly-linked list under a single global lock
///
/// Usable as a queue (`push_back` + `pop_front`) or a stack (`push_front` +
/// `pop_front`) from arbitrarily many threads. Only a head reference is
/// tracked, so `push_back` walks the whole chain under the lock: O(n), a
/// known limitation of the design rather than a bug.
///
/// [`len`](ConcurrentLinkedList::len) is an atomic load and never blocks;
/// its value may trail an in-flight structural operation by one.
///
/// # Examples
///
/// ```rust
/// use shardlock::ConcurrentLinkedList;
///
/// let list = ConcurrentLinkedList::new();
/// list.push_back(1);
/// list.push_back(2);
/// assert_eq!(list.pop_front(), Some(1));
/// assert_eq!(list.len(), 1);
/// ```
pub struct ConcurrentLinkedList<T> {
    // The one lock: guards the head and every link reachable from it
    head: CachePadded<Mutex<Chain<T>>>,

    // Updated while the lock is held, read without it
    len: CachePadded<AtomicUsize>,

    metrics: AtomicMetrics,
    metrics_enabled: AtomicBool,
}

impl<T> ConcurrentLinkedList<T> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            head: CachePadded::new(Mutex::new(None)),
            len: CachePadded::new(AtomicUsize::new(0)),
            metrics: AtomicMetrics::default(),
            metrics_enabled: AtomicBool::new(true),
        }
    }

    /// Push a value at the front (stack order)
    pub fn push_front(&self, value: T) {
        let start = Instant::now();
        let mut head = self.lock_head();
        *head = Some(Box::new(Node {
            value,
            next: head.take(),
        }));
        self.len.get().fetch_add(1, Ordering::Release);
        drop(head);
        self.record_hit(start);
    }

    /// Push a value at the back (queue order)
    ///
    /// Walks the chain to the last node while holding the lock: O(n).
    pub fn push_back(&self, value: T) {
        let start = Instant::now();
        let node = Box::new(Node { value, next: None });
        let mut head = self.lock_head();
        let mut cur: &mut Chain<T> = &mut head;
        while let Some(existing) = cur {
            cur = &mut existing.next;
        }
        *cur = Some(node);
        self.len.get().fetch_add(1, Ordering::Release);
        drop(head);
        self.record_hit(start);
    }

    /// Pop the front value, or `None` if the list is empty
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardlock::ConcurrentLinkedList;
    ///
    /// let list = ConcurrentLinkedList::new();
    /// assert_eq!(list.pop_front(), None);
    /// list.push_front("a");
    /// assert_eq!(list.pop_front(), Some("a"));
    /// ```
    pub fn pop_front(&self) -> Option<T> {
        let start = Instant::now();
        let mut head = self.lock_head();
        match head.take() {
            Some(node) => {
                let node = *node;
                *head = node.next;
                self.len.get().fetch_sub(1, Ordering::Release);
                drop(head);
                self.record_hit(start);
                Some(node.value)
            }
            None => {
                drop(head);
                self.record_miss();
                None
            }
        }
    }

    /// Push at the front without blocking
    ///
    /// If the list lock is held by another thread the value is handed back
    /// in `Err` so the caller can retry.
    pub fn try_push_front(&self, value: T) -> core::result::Result<(), T> {
        let start = Instant::now();
        match self.head.get().try_lock() {
            Some(mut head) => {
                *head = Some(Box::new(Node {
                    value,
                    next: head.take(),
                }));
                self.len.get().fetch_add(1, Ordering::Release);
                drop(head);
                self.record_hit(start);
                Ok(())
            }
            None => {
                self.record_blocked();
                Err(value)
            }
        }
    }

    /// Pop the front value without blocking
    ///
    /// `Ok(None)` means the list was observably empty; `Err(WouldBlock)`
    /// means the lock was held and nothing was observed.
    pub fn try_pop_front(&self) -> Result<Option<T>> {
        let start = Instant::now();
        match self.head.get().try_lock() {
            Some(mut head) => match head.take() {
                Some(node) => {
                    let node = *node;
                    *head = node.next;
                    self.len.get().fetch_sub(1, Ordering::Release);
                    drop(head);
                    self.record_hit(start);
                    Ok(Some(node.value))
                }
                None => {
                    drop(head);
                    self.record_miss();
                    Ok(None)
                }
            },
            None => {
                self.record_blocked();
                Err(Error::WouldBlock)
            }
        }
    }

    /// Unlink the first node equal to `value`
    ///
    /// Returns whether a removal occurred.
    pub fn remove_value(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        let start = Instant::now();
        let mut head = self.lock_head();
        // Walk until cur is the matching node's link or the end of the chain
        let mut cur: &mut Chain<T> = &mut head;
        loop {
            let advance = match cur {
                Some(node) if node.value != *value => true,
                _ => false,
            };
            if !advance {
                break;
            }
            cur = &mut cur.as_mut().unwrap().next;
        }
        match cur.take() {
            Some(node) => {
                *cur = node.next;
                self.len.get().fetch_sub(1, Ordering::Release);
                drop(head);
                self.record_hit(start);
                true
            }
            None => {
                drop(head);
                self.record_miss();
                false
            }
        }
    }

    /// Check whether `value` is in the list
    ///
    /// Takes the exclusive lock even though it only reads: the list has no
    /// reader/writer distinction. This is the central trade-off against the
    /// hash map's per-bucket reader-writer locks.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        let start = Instant::now();
        let head = self.lock_head();
        let mut cur = head.as_deref();
        while let Some(node) = cur {
            if node.value == *value {
                drop(head);
                self.record_hit(start);
                return true;
            }
            cur = node.next.as_deref();
        }
        drop(head);
        self.record_miss();
        false
    }

    /// Number of values in the list
    ///
    /// An atomic load: never blocks, always a consistent snapshot of the
    /// counter, though it may trail a structural operation in flight by one.
    pub fn len(&self) -> usize {
        self.len.get().load(Ordering::Acquire)
    }

    /// Check whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all values
    pub fn clear(&self) {
        let mut head = self.lock_head();
        let chain = head.take();
        self.len.get().store(0, Ordering::Release);
        drop(head);
        // The chain is dropped outside the lock
        drop_chain(chain);
    }

    fn lock_head(&self) -> MutexGuard<'_, Chain<T>> {
        let lock = self.head.get();
        match lock.try_lock() {
            Some(guard) => guard,
            None => {
                self.record_contention();
                lock.lock()
            }
        }
    }

    fn record_hit(&self, start: Instant) {
        if self.metrics_enabled.load(Ordering::Relaxed) {
            self.metrics.record_success(start.elapsed());
        }
    }

    fn record_miss(&self) {
        if self.metrics_enabled.load(Ordering::Relaxed) {
            self.metrics.record_failure();
        }
    }

    fn record_contention(&self) {
        if self.metrics_enabled.load(Ordering::Relaxed) {
            self.metrics.record_contention();
        }
    }

    fn record_blocked(&self) {
        if self.metrics_enabled.load(Ordering::Relaxed) {
            self.metrics.record_blocked();
        }
    }
}

/// Unlink and drop a chain iteratively so deep lists stay off the call stack
fn drop_chain<T>(mut chain: Chain<T>) {
    while let Some(mut node) = chain {
        chain = node.next.take();
    }
}

impl<T> Default for ConcurrentLinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ConcurrentLinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentLinkedList")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<T> Drop for ConcurrentLinkedList<T> {
    fn drop(&mut self) {
        let chain = self.head.get_mut().get_mut().take();
        drop_chain(chain);
    }
}

impl<T> MetricsCollector for ConcurrentLinkedList<T> {
    fn metrics(&self) -> PerformanceMetrics {
        self.metrics.snapshot()
    }

    fn reset_metrics(&self) {
        self.metrics.reset();
    }

    fn set_metrics_enabled(&self, enabled: bool) {
        self.metrics_enabled.store(enabled, Ordering::Relaxed);
    }

    fn is_metrics_enabled(&self) -> bool {
        self.metrics_enabled.load(Ordering::Relaxed)
    }
}
