//! Shared building blocks for the `lockless` container family.
//!
//! The containers themselves live in their own crates:
//!
//! - `lockless-queue`: `BoundedQueue`, a bounded MPMC ring of sequence-stamped slots.
//! - `lockless-bitset`: `ShardedBitset`, a sparse bitset made of lazily installed buckets.
//! - `lockless-map`: `OpenAddressingMap`, an insert-or-get map with bounded probing.
//!
//! This crate holds what they have in common: the probe-exhaustion error,
//! construction-time validation errors, the rehash function used to derive
//! the next probe location, and cache-line alignment for shared counters.
//!
//! # Example
//!
//! ```rust
//! use lockless::{DefaultRehasher, Rehash};
//!
//! let rehasher = DefaultRehasher;
//! let first = rehasher.rehash(42);
//! assert_ne!(first, 42);
//! assert_eq!(first, rehasher.rehash(42));
//! ```

#![warn(missing_docs)]

mod error;
mod rehash;
mod utils;

pub use error::{ConfigError, Exceeded};
pub use rehash::{DefaultRehasher, Rehash};
pub use utils::CacheAligned;

/// Default bound on the number of probes a bitset or map operation makes
/// before reporting [`Exceeded`].
pub const DEFAULT_MAX_TRIES: usize = 32;
