/// Derives the next probe location from the current one.
///
/// Implementations must be deterministic: every thread walking the chain
/// for the same starting point has to visit the same sequence of slots,
/// otherwise a lookup can miss an element another thread installed.
///
/// Closures `Fn(u64) -> u64` implement this trait, so a custom derivation
/// can be passed inline.
pub trait Rehash {
    /// Maps a probe value to the next one in the chain.
    fn rehash(&self, n: u64) -> u64;
}

impl<F> Rehash for F
where
    F: Fn(u64) -> u64,
{
    #[inline(always)]
    fn rehash(&self, n: u64) -> u64 {
        self(n)
    }
}

/// One SplitMix64 step: add the golden-ratio increment, then mix.
///
/// Bijective, so distinct inputs never collide and a chain only revisits a
/// slot once the modulo folds two outputs together. The increment keeps
/// zero from being a fixed point, which matters for chains seeded with
/// `0 << width`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultRehasher;

impl Rehash for DefaultRehasher {
    #[inline(always)]
    fn rehash(&self, n: u64) -> u64 {
        let mut n = n.wrapping_add(0x9e37_79b9_7f4a_7c15);
        n = (n ^ (n >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        n = (n ^ (n >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        n ^ (n >> 31)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_moves() {
        let first = DefaultRehasher.rehash(0);
        assert_ne!(first, 0);
        assert_ne!(DefaultRehasher.rehash(first), first);
    }

    #[test]
    fn closures_rehash() {
        let step = |n: u64| n.wrapping_add(1);
        assert_eq!(step.rehash(41), 42);
        assert_eq!(step.rehash(u64::MAX), 0);
    }

    #[test]
    fn chain_spreads_small_inputs() {
        let mut seen = std::collections::HashSet::new();
        for i in 1..=1024u64 {
            seen.insert(DefaultRehasher.rehash(i) % 64);
        }
        // 1024 inputs over 64 buckets should touch nearly all of them.
        assert!(seen.len() > 56, "only {} buckets hit", seen.len());
    }

    proptest! {
        #[test]
        fn deterministic(n in any::<u64>()) {
            prop_assert_eq!(DefaultRehasher.rehash(n), DefaultRehasher.rehash(n));
        }

        #[test]
        fn injective_on_pairs(a in any::<u64>(), b in any::<u64>()) {
            prop_assume!(a != b);
            prop_assert_ne!(DefaultRehasher.rehash(a), DefaultRehasher.rehash(b));
        }
    }
}
