use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use lockless::{ConfigError, DEFAULT_MAX_TRIES, DefaultRehasher, Exceeded, Rehash};

use crate::bucket::{Address, Bucket, WORD_BITS};

/// Bucket width used by [`ShardedBitset::new`]: 65536 bits per bucket.
pub const DEFAULT_BUCKET_WIDTH: u32 = 16;

/// Smallest bucket width: one 64-bit word.
pub const MIN_BUCKET_WIDTH: u32 = WORD_BITS.trailing_zeros();

/// Largest bucket width: 2 MiB of words per bucket.
pub const MAX_BUCKET_WIDTH: u32 = 24;

/// Slot count used by a builder that was never given one.
const DEFAULT_CAPACITY: usize = 1024;

/// Construction parameters for a [`ShardedBitset`].
///
/// # Examples
///
/// ```
/// use lockless_bitset::ShardedBitset;
///
/// let bits = ShardedBitset::builder()
///     .capacity(256)
///     .bucket_width(10)
///     .max_tries(8)
///     .build()
///     .unwrap();
/// assert_eq!(bits.capacity(), 256);
/// ```
#[derive(Debug, Clone)]
pub struct BitsetBuilder<R = DefaultRehasher> {
    capacity: usize,
    bucket_width: u32,
    max_tries: usize,
    rehasher: R,
}

impl Default for BitsetBuilder<DefaultRehasher> {
    fn default() -> Self {
        BitsetBuilder {
            capacity: DEFAULT_CAPACITY,
            bucket_width: DEFAULT_BUCKET_WIDTH,
            max_tries: DEFAULT_MAX_TRIES,
            rehasher: DefaultRehasher,
        }
    }
}

impl<R: Rehash> BitsetBuilder<R> {
    /// Number of bucket slots.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Each bucket covers `2^width` consecutive positions.
    pub fn bucket_width(mut self, width: u32) -> Self {
        self.bucket_width = width;
        self
    }

    /// Probes an operation makes before reporting [`Exceeded`].
    pub fn max_tries(mut self, max_tries: usize) -> Self {
        self.max_tries = max_tries;
        self
    }

    /// Derivation of the next slot when a bucket collides.
    ///
    /// It is fed `slot << width` and its output is reduced modulo the
    /// capacity.
    pub fn rehasher<R2: Rehash>(self, rehasher: R2) -> BitsetBuilder<R2> {
        BitsetBuilder {
            capacity: self.capacity,
            bucket_width: self.bucket_width,
            max_tries: self.max_tries,
            rehasher,
        }
    }

    /// Validates the parameters and allocates the slot array.
    pub fn build(self) -> Result<ShardedBitset<R>, ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.max_tries == 0 {
            return Err(ConfigError::ZeroMaxTries);
        }
        if !(MIN_BUCKET_WIDTH..=MAX_BUCKET_WIDTH).contains(&self.bucket_width) {
            return Err(ConfigError::BucketWidth {
                width: self.bucket_width,
                min: MIN_BUCKET_WIDTH,
                max: MAX_BUCKET_WIDTH,
            });
        }
        Ok(ShardedBitset::from_parts(
            self.capacity,
            self.bucket_width,
            self.max_tries,
            self.rehasher,
        ))
    }
}

/// A concurrent bitset over the full `u64` position space.
///
/// Slots start empty; a bucket is allocated on the first [`set`](Self::set)
/// that reaches an empty slot on its probe chain and stays until the bitset
/// is dropped. Every operation probes at most `max_tries` slots.
///
/// Bit reads and writes are relaxed: a `set` on one thread is eventually
/// seen by `test` on another, but no ordering between different bits is
/// implied. Bucket installation itself is release/acquire.
///
/// A probe chain depends only on the slot it leaves, not on the position,
/// so it may revisit a few slots and exhaust `max_tries` while most of the
/// array is still free. Cardinalities that share a home slot also share its
/// chain.
pub struct ShardedBitset<R = DefaultRehasher> {
    elements: Box<[AtomicPtr<Bucket>]>,
    bucket_width: u32,
    max_tries: usize,
    rehasher: R,
}

impl ShardedBitset<DefaultRehasher> {
    /// Creates a bitset with `capacity` bucket slots, 16-bit bucket width
    /// and 32 probes per operation.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; use [`builder`](Self::builder) to get
    /// an error instead.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ShardedBitset requires capacity > 0");
        Self::from_parts(
            capacity,
            DEFAULT_BUCKET_WIDTH,
            DEFAULT_MAX_TRIES,
            DefaultRehasher,
        )
    }

    /// Starts a builder with the defaults of [`new`](Self::new) and 1024 slots.
    pub fn builder() -> BitsetBuilder<DefaultRehasher> {
        BitsetBuilder::default()
    }
}

impl<R: Rehash> ShardedBitset<R> {
    fn from_parts(capacity: usize, bucket_width: u32, max_tries: usize, rehasher: R) -> Self {
        let elements = (0..capacity)
            .map(|_| AtomicPtr::new(ptr::null_mut()))
            .collect();

        tracing::debug!(capacity, bucket_width, max_tries, "sharded bitset created");

        ShardedBitset {
            elements,
            bucket_width,
            max_tries,
            rehasher,
        }
    }

    /// Sets the bit at `pos`.
    ///
    /// Fails only when every slot on the position's probe chain is held by
    /// a bucket of another cardinality.
    pub fn set(&self, pos: u64) -> Result<(), Exceeded> {
        let addr = self.address(pos);
        let mut slot = addr.home;
        // A bucket that lost an install race is carried to the next empty slot.
        let mut candidate: Option<Box<Bucket>> = None;

        for _ in 0..self.max_tries {
            let element = &self.elements[slot];
            let current = element.load(Ordering::Acquire);

            if current.is_null() {
                let fresh = candidate
                    .take()
                    .unwrap_or_else(|| Box::new(Bucket::new(addr.cardinality, self.bucket_width)));
                fresh.set(addr.word, addr.mask);
                let fresh = Box::into_raw(fresh);

                match element.compare_exchange(
                    ptr::null_mut(),
                    fresh,
                    Ordering::Release,
                    Ordering::Acquire,
                ) {
                    Ok(_) => return Ok(()),
                    Err(winner) => {
                        // SAFETY: the CAS failed, so `fresh` was never published
                        // and this thread still owns it.
                        let fresh = unsafe { Box::from_raw(fresh) };
                        // SAFETY: installed buckets live until the bitset drops.
                        let winner = unsafe { &*winner };
                        if winner.cardinality == addr.cardinality {
                            winner.set(addr.word, addr.mask);
                            return Ok(());
                        }
                        fresh.reset(addr.word, addr.mask);
                        candidate = Some(fresh);
                    }
                }
            } else {
                // SAFETY: installed buckets live until the bitset drops.
                let bucket = unsafe { &*current };
                if bucket.cardinality == addr.cardinality {
                    bucket.set(addr.word, addr.mask);
                    return Ok(());
                }
            }

            slot = self.relocate(slot);
            tracing::trace!(pos, slot, "bitset set relocated");
        }

        tracing::debug!(pos, tries = self.max_tries, "bitset set exhausted probe chain");
        Err(Exceeded::new(self.max_tries))
    }

    /// Clears the bit at `pos`.
    ///
    /// A position whose bucket was never allocated is already clear.
    /// The bucket itself is kept.
    pub fn reset(&self, pos: u64) -> Result<(), Exceeded> {
        let addr = self.address(pos);
        if let Some(bucket) = self.find(pos, &addr)? {
            bucket.reset(addr.word, addr.mask);
        }
        Ok(())
    }

    /// Returns whether the bit at `pos` is set.
    pub fn test(&self, pos: u64) -> Result<bool, Exceeded> {
        let addr = self.address(pos);
        Ok(self
            .find(pos, &addr)?
            .is_some_and(|bucket| bucket.test(addr.word, addr.mask)))
    }

    /// Clears every bit of every allocated bucket without freeing any.
    ///
    /// Concurrent `set` calls may or may not survive; callers wanting an
    /// empty set afterwards must quiesce writers first.
    pub fn clear(&self) {
        self.buckets().for_each(Bucket::clear);
    }

    /// Counts the set bits.
    ///
    /// Relaxed loads, so concurrent updates may or may not be reflected.
    pub fn count_ones(&self) -> usize {
        self.buckets().map(Bucket::count_ones).sum()
    }

    /// Number of slots holding a bucket.
    pub fn allocated_buckets(&self) -> usize {
        self.buckets().count()
    }

    /// Number of bucket slots.
    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    /// Each bucket covers `2^bucket_width` positions.
    pub fn bucket_width(&self) -> u32 {
        self.bucket_width
    }

    /// Probes per operation before [`Exceeded`].
    pub fn max_tries(&self) -> usize {
        self.max_tries
    }

    #[inline(always)]
    fn address(&self, pos: u64) -> Address {
        Address::of(pos, self.bucket_width, self.elements.len())
    }

    #[inline(always)]
    fn relocate(&self, slot: usize) -> usize {
        let seed = (slot as u64) << self.bucket_width;
        (self.rehasher.rehash(seed) % self.elements.len() as u64) as usize
    }

    /// Walks the probe chain of `addr` without allocating.
    ///
    /// `Ok(None)` means an empty slot ended the chain: since buckets are never
    /// removed, no bucket for this cardinality can sit further along it.
    fn find(&self, pos: u64, addr: &Address) -> Result<Option<&Bucket>, Exceeded> {
        let mut slot = addr.home;

        for _ in 0..self.max_tries {
            let current = self.elements[slot].load(Ordering::Acquire);
            if current.is_null() {
                return Ok(None);
            }
            // SAFETY: installed buckets live until the bitset drops.
            let bucket = unsafe { &*current };
            if bucket.cardinality == addr.cardinality {
                return Ok(Some(bucket));
            }
            slot = self.relocate(slot);
        }

        tracing::debug!(pos, tries = self.max_tries, "bitset lookup exhausted probe chain");
        Err(Exceeded::new(self.max_tries))
    }

    fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.elements.iter().filter_map(|element| {
            let current = element.load(Ordering::Acquire);
            // SAFETY: installed buckets live until the bitset drops.
            (!current.is_null()).then(|| unsafe { &*current })
        })
    }
}

impl<R> Drop for ShardedBitset<R> {
    fn drop(&mut self) {
        for element in self.elements.iter_mut() {
            let current = *element.get_mut();
            if !current.is_null() {
                // SAFETY: exclusive access; every non-null slot owns a bucket
                // created by `Box::into_raw` in `set`.
                drop(unsafe { Box::from_raw(current) });
            }
        }
    }
}

impl<R> fmt::Debug for ShardedBitset<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedBitset")
            .field("capacity", &self.elements.len())
            .field("bucket_width", &self.bucket_width)
            .field("max_tries", &self.max_tries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relocation_keeps_bit_position() {
        // Slot 0 is taken by cardinality 0; cardinality 2 also homes there.
        let bits = ShardedBitset::builder()
            .capacity(2)
            .bucket_width(6)
            .rehasher(|n: u64| (n >> 6) + 1)
            .build()
            .unwrap();

        bits.set(0).unwrap();
        let pos = (2 << 6) | 37;
        bits.set(pos).unwrap();

        let moved = bits.elements[1].load(Ordering::Acquire);
        assert!(!moved.is_null());
        let moved = unsafe { &*moved };
        assert_eq!(moved.cardinality, 2);
        assert!(moved.test(0, 1 << 37));
        assert_eq!(bits.test(pos), Ok(true));
        assert_eq!(bits.test(2 << 6), Ok(false));
    }

    #[test]
    fn foreign_bucket_forces_relocation() {
        let bits = ShardedBitset::builder()
            .capacity(2)
            .bucket_width(6)
            .rehasher(|n: u64| (n >> 6) + 1)
            .build()
            .unwrap();

        // Pre-install a foreign bucket in the home slot, then set a position
        // homing there: the walk must land in slot 1 with only its own bit.
        let foreign = Box::into_raw(Box::new(Bucket::new(4, 6)));
        bits.elements[0].store(foreign, Ordering::Release);

        bits.set((2 << 6) | 5).unwrap();
        assert_eq!(bits.allocated_buckets(), 2);
        assert_eq!(bits.count_ones(), 1);
        assert_eq!(bits.test((4 << 6) | 5), Ok(false));
    }
}
