use std::sync::atomic::{AtomicU64, Ordering};

/// Bits per bucket word.
pub(crate) const WORD_BITS: u32 = u64::BITS;

/// Where a position lives: which bucket tag owns it, its home slot, and the
/// bit inside the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Address {
    pub(crate) cardinality: u64,
    pub(crate) home: usize,
    pub(crate) word: usize,
    pub(crate) mask: u64,
}

impl Address {
    pub(crate) fn of(pos: u64, width: u32, slots: usize) -> Self {
        let cardinality = pos >> width;
        let location = pos & ((1u64 << width) - 1);
        Address {
            cardinality,
            home: (cardinality % slots as u64) as usize,
            word: (location / WORD_BITS as u64) as usize,
            mask: 1u64 << (location % WORD_BITS as u64),
        }
    }
}

/// `2^width` bits serving one cardinality.
///
/// The tag is fixed at allocation; only the words change afterwards.
pub(crate) struct Bucket {
    pub(crate) cardinality: u64,
    words: Box<[AtomicU64]>,
}

impl Bucket {
    pub(crate) fn new(cardinality: u64, width: u32) -> Self {
        let len = 1usize << (width - WORD_BITS.trailing_zeros());
        Bucket {
            cardinality,
            words: (0..len).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    #[inline(always)]
    pub(crate) fn set(&self, word: usize, mask: u64) {
        self.words[word].fetch_or(mask, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn reset(&self, word: usize, mask: u64) {
        self.words[word].fetch_and(!mask, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn test(&self, word: usize, mask: u64) -> bool {
        self.words[word].load(Ordering::Relaxed) & mask != 0
    }

    pub(crate) fn clear(&self) {
        for word in self.words.iter() {
            word.store(0, Ordering::Relaxed);
        }
    }

    pub(crate) fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }
}
