//! # shardlock
//!
//! Lock-based concurrent containers for multi-threaded producer/consumer and
//! read/write-heavy workloads.
//!
//! ## Containers
//!
//! - **[`ConcurrentHashMap`]**: bucketed hash table with one reader-writer
//!   lock per bucket, so readers never block writers of other buckets
//! - **[`ConcurrentLinkedList`]**: singly-linked list under a single mutex,
//!   usable as a queue or stack, with a lock-free length counter
//!
//! ## Philosophy
//!
//! shardlock is a correctness- and simplicity-first *blocking* design. There
//! is no CAS-based fast path and no wait-freedom: contention is resolved by
//! blocking on the relevant lock until it is free. In exchange the locking
//! discipline is small enough to audit by hand, and every guarantee the
//! containers make is spelled out in their module documentation.
//!
//! ## Quick Start
//!
//! ```rust
//! use shardlock::ConcurrentHashMap;
//!
//! let map = ConcurrentHashMap::new();
//! map.insert("alice", 25);
//! assert_eq!(map.get(&"alice"), Some(25));
//! ```
//!
//! ## Thread Safety
//!
//! Both containers take `&self` for every operation and can be shared across
//! threads behind an `Arc` without additional synchronization. They assume no
//! special thread identity and work correctly when called from a single
//! thread only.
//!
//! ## What is *not* guaranteed
//!
//! - No FIFO fairness among threads blocked on the same lock; the platform
//!   default applies.
//! - No cross-bucket ordering in the hash map: operations on different
//!   buckets may complete in any relative order.
//! - `clear` and drop must not race in-flight operations that assume the
//!   structure stays populated afterwards; that is a caller obligation.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod list;
pub mod map;
pub mod metrics;

pub use crate::list::ConcurrentLinkedList;
pub use crate::map::ConcurrentHashMap;

/// Common utilities and helper types
pub mod util {
    /// Cache line size for alignment purposes
    pub const CACHE_LINE_SIZE: usize = 64;

    /// Align a value to cache line boundaries
    #[inline]
    pub const fn align_to_cache_line(size: usize) -> usize {
        (size + CACHE_LINE_SIZE - 1) & !(CACHE_LINE_SIZE - 1)
    }

    /// Pad a struct to cache line size
    ///
    /// Used to keep independently-locked state (per-bucket locks, the list
    /// head lock and its length counter) on separate cache lines so that
    /// contention on one does not evict the others.
    #[repr(align(64))]
    pub struct CachePadded<T> {
        value: T,
    }

    impl<T> CachePadded<T> {
        /// Create a new cache-padded value
        #[inline]
        pub const fn new(value: T) -> Self {
            Self { value }
        }

        /// Get a reference to the inner value
        #[inline]
        pub const fn get(&self) -> &T {
            &self.value
        }

        /// Get a mutable reference to the inner value
        #[inline]
        pub fn get_mut(&mut self) -> &mut T {
            &mut self.value
        }

        /// Get the inner value
        #[inline]
        pub fn into_inner(self) -> T {
            self.value
        }
    }

    impl<T: Clone> Clone for CachePadded<T> {
        fn clone(&self) -> Self {
            Self::new(self.value.clone())
        }
    }

    impl<T: Copy> Copy for CachePadded<T> {}

    impl<T: core::fmt::Debug> core::fmt::Debug for CachePadded<T> {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            core::fmt::Debug::fmt(&self.value, f)
        }
    }
}

/// Error types for shardlock operations
///
/// Absence of a key or value is never an error; it is signaled inline via
/// `Option`/`bool` returns. The error type exists only for the non-blocking
/// `try_*` operation variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The lock guarding the operation could not be acquired without blocking
    WouldBlock,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::WouldBlock => write!(f, "Operation would block"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type for shardlock operations
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_line_alignment() {
        assert_eq!(util::align_to_cache_line(1), 64);
        assert_eq!(util::align_to_cache_line(64), 64);
        assert_eq!(util::align_to_cache_line(65), 128);
        assert_eq!(util::align_to_cache_line(127), 128);
        assert_eq!(util::align_to_cache_line(128), 128);
    }

    #[test]
    fn test_cache_padded() {
        let padded = util::CachePadded::new(42);
        assert_eq!(*padded.get(), 42);

        let mut padded = padded;
        *padded.get_mut() = 100;
        assert_eq!(padded.into_inner(), 100);

        assert!(core::mem::align_of::<util::CachePadded<u8>>() >= 64);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::WouldBlock.to_string(), "Operation would block");
    }
}
