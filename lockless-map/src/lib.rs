//! Fixed-capacity lock-free open-addressing map
//!
//! This crate provides [`OpenAddressingMap`], an insert-or-get associative
//! container whose slots are atomically published pointers. A key's slot
//! sequence starts at `hash(key) % capacity` and follows a rehash chain for
//! at most `max_tries` probes.
//!
//! # Features
//!
//! - **Lock-Free**: Insertion is a single CAS on an empty slot; lookups are
//!   plain acquire loads
//! - **First Writer Wins**: Concurrent inserts of one key install exactly one
//!   element, every other caller gets that element back
//! - **Stable References**: Installed elements are immutable and live as long
//!   as the map, so `get` hands out `&V` directly
//! - **Bounded**: No operation probes more than `max_tries` slots
//!
//! There is no removal or update. Values that need to change after
//! insertion should be internally synchronised (atomics, locks).
//!
//! # Example
//!
//! ```rust
//! use lockless_map::OpenAddressingMap;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! let map = OpenAddressingMap::new(1024);
//!
//! let (hits, inserted) = map.get_or_emplace("page", || AtomicU64::new(0)).unwrap();
//! assert!(inserted);
//! hits.fetch_add(1, Ordering::Relaxed);
//!
//! let (hits, inserted) = map.get_or_emplace("page", || AtomicU64::new(0)).unwrap();
//! assert!(!inserted);
//! assert_eq!(hits.load(Ordering::Relaxed), 1);
//!
//! assert!(map.get("missing").is_none());
//! ```

#![warn(missing_docs)]

mod config;
mod map;

pub use config::MapConfig;
pub use lockless::{ConfigError, DefaultRehasher, Exceeded, Rehash};
pub use map::{Iter, OpenAddressingMap};
