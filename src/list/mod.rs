//! List implementations
//!
//! ## Available Lists
//!
//! - [`ConcurrentLinkedList`]: singly-linked list under a single global
//!   mutex, usable as a FIFO queue (`push_back`/`pop_front`) or LIFO stack
//!   (`push_front`/`pop_front`)
//!
//! ## Choosing a List
//!
//! The single lock gives full mutual exclusion: any two structural
//! operations are linearizable, but the list does not scale with thread
//! count. Prefer [`crate::ConcurrentHashMap`] for keyed read-heavy data;
//! use the list where strict whole-structure consistency matters more than
//! parallelism.

pub mod linked;

pub use self::linked::ConcurrentLinkedList;

#[cfg(test)]
mod tests;

#[cfg(test)]
mod proptests;
