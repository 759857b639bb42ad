//! Sharded lock-free bitset.
//!
//! [`ShardedBitset`] covers the whole `u64` position space without
//! allocating it. Positions are grouped into buckets of `2^width` bits;
//! a bucket is allocated the first time one of its bits is set and
//! installed into a fixed array of slots by CAS. When two buckets want the
//! same slot the later one is relocated along a bounded rehash chain, and
//! an operation whose chain runs out reports [`Exceeded`].
//!
//! Bit updates use relaxed atomics: there is no ordering between different
//! bits, only atomicity of each one.
//!
//! ## Usage
//!
//! ```rust
//! use lockless_bitset::ShardedBitset;
//!
//! let bits = ShardedBitset::new(64);
//! bits.set(1 << 40).unwrap();
//! assert_eq!(bits.test(1 << 40), Ok(true));
//! assert_eq!(bits.test(7), Ok(false));
//!
//! bits.reset(1 << 40).unwrap();
//! assert_eq!(bits.test(1 << 40), Ok(false));
//! ```

#![warn(missing_docs)]

mod bitset;
mod bucket;

pub use bitset::{
    BitsetBuilder, DEFAULT_BUCKET_WIDTH, MAX_BUCKET_WIDTH, MIN_BUCKET_WIDTH, ShardedBitset,
};
pub use lockless::{ConfigError, DefaultRehasher, Exceeded, Rehash};
