//! Sharded Concurrent HashMap Implementation
//!
//! This module implements a bucketed hash map where every bucket owns its own
//! reader-writer lock and a separate lock protects the aggregate size counter.
//! The design trades peak throughput for a locking discipline that is simple
//! enough to audit by hand.
//!
//! ## Design
//!
//! The hash map uses:
//! - A fixed-size table of buckets, chosen at construction and never
//!   reallocated (no automatic rehashing)
//! - One `parking_lot::RwLock` per bucket, cache-line padded to avoid false
//!   sharing between adjacent buckets
//! - A dedicated `RwLock<usize>` for the aggregate entry count
//! - `fxhash` for bucket selection; the bucket index is `hash(key) % capacity`
//!
//! ## Locking discipline
//!
//! - Every single-key operation touches exactly one bucket lock.
//! - The size lock is acquired only while the owning bucket lock is held
//!   (bucket, then size), and no path ever acquires a bucket lock while
//!   holding the size lock, so the one-way nesting cannot deadlock. Any
//!   extension must preserve that order.
//! - The counter update happens inside the bucket's critical section: an
//!   entry is never visible to other threads before it is counted, and a
//!   removed entry's count is gone by the time its absence is observable.
//!   Deferring the update until after the bucket lock is released would let
//!   a remove racing an insert of the same key decrement before the
//!   insert's increment lands, underflowing the counter.
//! - Multi-bucket operations (`clear`) acquire bucket locks in ascending
//!   index order. Nothing else locks more than one bucket at a time today,
//!   but the ordering convention must hold if that ever changes.
//!
//! ## Consistency
//!
//! Operations on the same key are linearizable: the bucket lock serializes
//! them. Operations on different buckets may interleave freely. `len` may
//! trail operations still inside their bucket critical section, but it is
//! never corrupted: no count is ever lost, duplicated, or underflowed.
//! `keys` is a weakly consistent snapshot: it locks buckets one at a time,
//! so concurrent mutation of not-yet-visited buckets can appear in the
//! result. That is documented behavior, not a bug.
//!
//! ## Example
//!
//! ```rust
//! use shardlock::ConcurrentHashMap;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let map = Arc::new(ConcurrentHashMap::new());
//!
//! let writer = thread::spawn({
//!     let map = Arc::clone(&map);
//!     move || {
//!         for i in 0..1000 {
//!             map.insert(i, i * 2);
//!         }
//!     }
//! });
//!
//! writer.join().unwrap();
//! assert_eq!(map.len(), 1000);
//! assert_eq!(map.get(&21), Some(42));
//! ```

use crate::metrics::{AtomicMetrics, MetricsCollector, PerformanceMetrics};
use crate::util::CachePadded;
use crate::{Error, Result};
use core::fmt;
use core::hash::{Hash, Hasher};
use core::sync::atomic::{AtomicBool, Ordering};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

/// Default number of buckets
const DEFAULT_CAPACITY: usize = 16;
/// Default advisory load factor threshold
const DEFAULT_LOAD_FACTOR: f64 = 0.75;

type Entries<K, V> = Vec<(K, V)>;

/// A concurrent hash map with one reader-writer lock per bucket
///
/// Keys are distributed across a fixed number of buckets by hash; each bucket
/// is independently lockable, so operations on different buckets proceed in
/// parallel and readers of a bucket never block other readers.
///
/// The table never grows: capacity is fixed at construction. The configured
/// load factor is an advisory threshold surfaced through
/// [`is_overloaded`](ConcurrentHashMap::is_overloaded); exceeding it costs
/// longer bucket scans, nothing more.
///
/// # Type Parameters
///
/// * `K` - The key type, must implement `Hash + Eq`
/// * `V` - The value type; `Clone` is required only by the operations that
///   copy values out ([`get`](ConcurrentHashMap::get))
///
/// # Examples
///
/// ```rust
/// use shardlock::ConcurrentHashMap;
///
/// let map: ConcurrentHashMap<i32, String> = ConcurrentHashMap::new();
/// map.insert(1, "hello".to_string());
/// assert_eq!(map.get(&1), Some("hello".to_string()));
/// ```
pub struct ConcurrentHashMap<K, V> {
    // Fixed table; allocated once, never reallocated
    buckets: Box<[CachePadded<RwLock<Entries<K, V>>>]>,

    capacity: usize,

    load_factor: f64,

    // Aggregate entry count, guarded by its own lock. Acquired only while
    // the owning bucket lock is held, never the other way around.
    size: RwLock<usize>,

    metrics: AtomicMetrics,
    metrics_enabled: AtomicBool,
}

impl<K, V> ConcurrentHashMap<K, V>
where
    K: Hash + Eq,
{
    /// Create a new map with the default capacity (16 buckets)
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new map with the given number of buckets
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_load_factor(capacity, DEFAULT_LOAD_FACTOR)
    }

    /// Create a new map with the given number of buckets and advisory load
    /// factor threshold
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or `load_factor` is not a positive finite
    /// number.
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f64) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        assert!(
            load_factor > 0.0 && load_factor.is_finite(),
            "Load factor must be a positive finite number"
        );

        let buckets = (0..capacity)
            .map(|_| CachePadded::new(RwLock::new(Vec::new())))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            buckets,
            capacity,
            load_factor,
            size: RwLock::new(0),
            metrics: AtomicMetrics::default(),
            metrics_enabled: AtomicBool::new(true),
        }
    }

    /// Insert a key-value pair
    ///
    /// If the key already exists its value is overwritten in place and the
    /// previous value is returned; the entry count is unchanged. Otherwise
    /// the entry is appended to its bucket and the count is incremented.
    ///
    /// Blocks only writers and readers of the same bucket.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardlock::ConcurrentHashMap;
    ///
    /// let map: ConcurrentHashMap<i32, String> = ConcurrentHashMap::new();
    /// assert_eq!(map.insert(1, "hello".to_string()), None);
    /// assert_eq!(map.insert(1, "world".to_string()), Some("hello".to_string()));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let start = Instant::now();
        let index = self.bucket_index(&key);
        let bucket = self.write_bucket(index);
        let old = self.insert_entry(bucket, key, value);
        self.record_hit(start);
        old
    }

    /// Insert without blocking
    ///
    /// Returns [`Error::WouldBlock`] if the bucket's write lock is held by
    /// another thread. On success behaves exactly like
    /// [`insert`](ConcurrentHashMap::insert).
    pub fn try_insert(&self, key: K, value: V) -> Result<Option<V>> {
        let start = Instant::now();
        let index = self.bucket_index(&key);
        match self.buckets[index].get().try_write() {
            Some(bucket) => {
                let old = self.insert_entry(bucket, key, value);
                self.record_hit(start);
                Ok(old)
            }
            None => {
                self.record_blocked();
                Err(Error::WouldBlock)
            }
        }
    }

    /// Look up a key and copy its value out
    ///
    /// Takes the bucket's shared lock: concurrent readers of the same bucket
    /// and all operations on other buckets proceed unhindered.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardlock::ConcurrentHashMap;
    ///
    /// let map: ConcurrentHashMap<i32, String> = ConcurrentHashMap::new();
    /// map.insert(1, "hello".to_string());
    /// assert_eq!(map.get(&1), Some("hello".to_string()));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let start = Instant::now();
        let index = self.bucket_index(key);
        let bucket = self.read_bucket(index);
        let found = bucket
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone());
        drop(bucket);
        match found {
            Some(value) => {
                self.record_hit(start);
                Some(value)
            }
            None => {
                self.record_miss();
                None
            }
        }
    }

    /// Look up a key without blocking
    ///
    /// Returns [`Error::WouldBlock`] if the bucket is exclusively locked by a
    /// writer.
    pub fn try_get(&self, key: &K) -> Result<Option<V>>
    where
        V: Clone,
    {
        let start = Instant::now();
        let index = self.bucket_index(key);
        match self.buckets[index].get().try_read() {
            Some(bucket) => {
                let found = bucket
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.clone());
                drop(bucket);
                match found {
                    Some(value) => {
                        self.record_hit(start);
                        Ok(Some(value))
                    }
                    None => {
                        self.record_miss();
                        Ok(None)
                    }
                }
            }
            None => {
                self.record_blocked();
                Err(Error::WouldBlock)
            }
        }
    }

    /// Check whether a key is present
    ///
    /// Same shared-lock scan as [`get`](ConcurrentHashMap::get) without
    /// copying the value.
    pub fn contains(&self, key: &K) -> bool {
        let start = Instant::now();
        let index = self.bucket_index(key);
        let bucket = self.read_bucket(index);
        let found = bucket.iter().any(|(k, _)| k == key);
        drop(bucket);
        if found {
            self.record_hit(start);
        } else {
            self.record_miss();
        }
        found
    }

    /// Remove a key, returning its value if it was present
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardlock::ConcurrentHashMap;
    ///
    /// let map: ConcurrentHashMap<i32, String> = ConcurrentHashMap::new();
    /// map.insert(1, "hello".to_string());
    /// assert_eq!(map.remove(&1), Some("hello".to_string()));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove(&self, key: &K) -> Option<V> {
        let start = Instant::now();
        let index = self.bucket_index(key);
        let mut bucket = self.write_bucket(index);
        let position = bucket.iter().position(|(k, _)| k == key);
        match position {
            Some(position) => {
                let (_, value) = bucket.swap_remove(position);
                // Decrement while still holding the bucket lock: the entry's
                // insert counted itself before the entry became visible, so
                // the counter cannot underflow here
                *self.size.write() -= 1;
                drop(bucket);
                self.record_hit(start);
                Some(value)
            }
            None => {
                drop(bucket);
                self.record_miss();
                None
            }
        }
    }

    /// Number of entries in the map
    ///
    /// Exact at any quiescent point. The counter is updated inside the
    /// bucket's critical section, so it can trail an operation that still
    /// holds its bucket lock, but it never disagrees with the set of entries
    /// another thread could actually observe.
    pub fn len(&self) -> usize {
        *self.size.read()
    }

    /// Check whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of buckets (fixed at construction)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The advisory load factor threshold configured at construction
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Whether the entry count exceeds `capacity * load_factor`
    ///
    /// Purely advisory: the table never grows on its own. An overloaded map
    /// keeps working, with proportionally longer bucket scans.
    pub fn is_overloaded(&self) -> bool {
        self.len() as f64 > self.capacity as f64 * self.load_factor
    }

    /// Remove all entries
    ///
    /// Acquires every bucket's write lock in ascending index order (the
    /// convention for any operation that holds more than one bucket lock),
    /// drains the buckets, zeroes the counter under the size lock, then
    /// releases the bucket locks.
    pub fn clear(&self) {
        let mut guards: Vec<_> = self
            .buckets
            .iter()
            .map(|bucket| bucket.get().write())
            .collect();
        for guard in guards.iter_mut() {
            guard.clear();
        }
        // Zeroed while all bucket locks are still held, so no racing insert
        // can slip a count in between the drain and the reset
        *self.size.write() = 0;
        drop(guards);
    }

    /// Collect a snapshot of all keys
    ///
    /// Buckets are read-locked one at a time, never two at once, so the
    /// result is weakly consistent: mutations racing on buckets not yet
    /// visited may or may not appear.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut result = Vec::with_capacity(self.len());
        for index in 0..self.capacity {
            let bucket = self.read_bucket(index);
            result.extend(bucket.iter().map(|(k, _)| k.clone()));
        }
        result
    }

    // Private helpers

    fn bucket_index(&self, key: &K) -> usize {
        let mut hasher = fxhash::FxHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.capacity
    }

    fn read_bucket(&self, index: usize) -> RwLockReadGuard<'_, Entries<K, V>> {
        let lock = self.buckets[index].get();
        match lock.try_read() {
            Some(guard) => guard,
            None => {
                self.record_contention();
                lock.read()
            }
        }
    }

    fn write_bucket(&self, index: usize) -> RwLockWriteGuard<'_, Entries<K, V>> {
        let lock = self.buckets[index].get();
        match lock.try_write() {
            Some(guard) => guard,
            None => {
                self.record_contention();
                lock.write()
            }
        }
    }

    fn insert_entry(
        &self,
        mut bucket: RwLockWriteGuard<'_, Entries<K, V>>,
        key: K,
        value: V,
    ) -> Option<V> {
        for (k, v) in bucket.iter_mut() {
            if *k == key {
                return Some(core::mem::replace(v, value));
            }
        }
        bucket.push((key, value));
        // Increment before releasing the bucket lock, so the new entry is
        // never visible to other threads before it is counted
        *self.size.write() += 1;
        drop(bucket);
        None
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

impl<K, V> Default for ConcurrentHashMap<K, V>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for ConcurrentHashMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentHashMap")
            .field("capacity", &self.capacity)
            .field("len", &*self.size.read())
            .finish_non_exhaustive()
    }
}

impl<K, V> MetricsCollector for ConcurrentHashMap<K, V> {
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
