//! Map implementations
//!
//! This module provides a concurrent map built for mixed read/write workloads.
//!
//! ## Available Maps
//!
//! - [`ConcurrentHashMap`]: per-bucket reader-writer locks with a sharded
//!   locking discipline
//!
//! ## Choosing a Map
//!
//! - Use `ConcurrentHashMap` for general-purpose concurrent key-value storage
//! - Readers of one bucket never block writers of another; size the capacity
//!   so hot keys spread across buckets
//! - Monitor contention via [`crate::metrics::MetricsCollector`]

pub mod sharded;

pub use self::sharded::ConcurrentHashMap;
