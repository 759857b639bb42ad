use core::ops::{Deref, DerefMut};

/// Pads and aligns a value to the cache-line size of the target.
///
/// Sequence counters hammered by different sets of threads (producers on
/// one, consumers on the other) are kept on separate lines so a CAS on one
/// does not invalidate the other.
///
/// Line sizes: 128B on aarch64 (Apple M-series, Neoverse), 256B on s390x,
/// 64B everywhere else.
#[cfg_attr(target_arch = "s390x", repr(align(256)))]
#[cfg_attr(target_arch = "aarch64", repr(align(128)))]
#[cfg_attr(not(any(target_arch = "s390x", target_arch = "aarch64")), repr(align(64)))]
#[derive(Copy, Clone, Default, Debug)]
pub struct CacheAligned<T>(T);

impl<T> CacheAligned<T> {
    /// Wraps `value`.
    pub const fn new(value: T) -> Self {
        Self(value)
    }
}

impl<T> Deref for CacheAligned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for CacheAligned<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}
