use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr;
use core::slice;
use core::sync::atomic::{AtomicPtr, Ordering};

use foldhash::fast::FixedState;
use lockless::{ConfigError, DEFAULT_MAX_TRIES, DefaultRehasher, Exceeded, Rehash};
use portable_atomic::AtomicU64;

use crate::config::MapConfig;

/// An installed entry. Never mutated after its slot CAS succeeds.
struct Element<K, V> {
    hash: u64,
    key: K,
    value: V,
}

/// The element a `get_or_emplace` call is trying to install.
///
/// Built lazily on the first empty slot; a built element that loses its CAS
/// is carried along the chain instead of being rebuilt.
enum Candidate<K, V, F> {
    Pending { key: K, make: F },
    Built(Box<Element<K, V>>),
}

impl<K, V, F> Candidate<K, V, F>
where
    F: FnOnce() -> V,
{
    fn key(&self) -> &K {
        match self {
            Candidate::Pending { key, .. } => key,
            Candidate::Built(element) => &element.key,
        }
    }

    fn build(self, hash: u64) -> Box<Element<K, V>> {
        match self {
            Candidate::Pending { key, make } => Box::new(Element {
                hash,
                key,
                value: make(),
            }),
            Candidate::Built(element) => element,
        }
    }
}

/// Fixed-capacity lock-free insert-or-get map.
///
/// # Type Parameters
///
/// - `K`: Key type (must implement `Hash` and `Eq`)
/// - `V`: Value type
/// - `S`: Hash builder (defaults to foldhash's `FixedState`)
/// - `R`: Probe-chain derivation (defaults to [`DefaultRehasher`])
pub struct OpenAddressingMap<K, V, S = FixedState, R = DefaultRehasher> {
    elements: Box<[AtomicPtr<Element<K, V>>]>,
    count: AtomicU64,
    max_tries: usize,
    hasher: S,
    rehasher: R,
    _owns: PhantomData<Box<Element<K, V>>>,
}

// Any thread holding `&map` can move a `K`/`V` in and read `&K`/`&V` out.
unsafe impl<K: Send, V: Send, S: Send, R: Send> Send for OpenAddressingMap<K, V, S, R> {}
unsafe impl<K, V, S, R> Sync for OpenAddressingMap<K, V, S, R>
where
    K: Send + Sync,
    V: Send + Sync,
    S: Sync,
    R: Sync,
{
}

impl<K, V> OpenAddressingMap<K, V, FixedState, DefaultRehasher>
where
    K: Hash + Eq,
{
    /// Creates a map with `capacity` slots and 32 probes per operation.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; use [`with_config`](Self::with_config)
    /// to get an error instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use lockless_map::OpenAddressingMap;
    ///
    /// let map: OpenAddressingMap<i32, String> = OpenAddressingMap::new(128);
    /// assert_eq!(map.capacity(), 128);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, FixedState::default())
    }
}

impl<K, V, S> OpenAddressingMap<K, V, S, DefaultRehasher>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a map with `capacity` slots and a custom hash builder.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        assert!(capacity > 0, "OpenAddressingMap requires capacity > 0");
        Self::from_parts(capacity, DEFAULT_MAX_TRIES, hasher, DefaultRehasher)
    }
}

impl<K, V, S, R> OpenAddressingMap<K, V, S, R>
where
    K: Hash + Eq,
    S: BuildHasher,
    R: Rehash,
{
    /// Creates a map from validated parameters, hash builder and rehasher.
    pub fn with_config(config: MapConfig, hasher: S, rehasher: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(
            config.capacity,
            config.max_tries,
            hasher,
            rehasher,
        ))
    }

    fn from_parts(capacity: usize, max_tries: usize, hasher: S, rehasher: R) -> Self {
        let elements = (0..capacity)
            .map(|_| AtomicPtr::new(ptr::null_mut()))
            .collect();

        tracing::debug!(capacity, max_tries, "open addressing map created");

        Self {
            elements,
            count: AtomicU64::new(0),
            max_tries,
            hasher,
            rehasher,
            _owns: PhantomData,
        }
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    /// Returns the probe bound.
    pub fn max_tries(&self) -> usize {
        self.max_tries
    }

    /// Returns the number of installed elements.
    ///
    /// Note: This is an approximate count in concurrent scenarios.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed) as usize
    }

    /// Returns true if no element is installed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    fn slot(&self, probe: u64) -> &AtomicPtr<Element<K, V>> {
        &self.elements[(probe % self.elements.len() as u64) as usize]
    }

    /// Looks up `key`, returning a reference to its value.
    ///
    /// An empty slot on the chain, or a chain of `max_tries` foreign
    /// elements, both mean the key is absent.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Looks up `key`, returning the stored key and value.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);
        let mut probe = hash;

        for _ in 0..self.max_tries {
            let current = self.slot(probe).load(Ordering::Acquire);
            if current.is_null() {
                return None;
            }
            // SAFETY: installed elements are never freed before the map drops.
            let element = unsafe { &*current };
            // Check hash first (integer compare is fast)
            if element.hash == hash && Borrow::<Q>::borrow(&element.key) == key {
                return Some((&element.key, &element.value));
            }
            probe = self.rehasher.rehash(probe);
        }

        None
    }

    /// Returns true if `key` is installed.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).is_some()
    }

    /// Returns the value for `key`, installing `make()` if the key is absent.
    ///
    /// The boolean is `true` when this call installed the element. `make`
    /// runs at most once, and only once an empty slot has been found; if
    /// another thread installs the same key first, the value just built is
    /// dropped and the winner's value is returned.
    ///
    /// Fails with [`Exceeded`] when `max_tries` slots on the chain all hold
    /// other keys.
    pub fn get_or_emplace<F>(&self, key: K, make: F) -> Result<(&V, bool), Exceeded>
    where
        F: FnOnce() -> V,
    {
        let hash = self.hasher.hash_one(&key);
        let mut probe = hash;
        let mut candidate = Candidate::Pending { key, make };

        for _ in 0..self.max_tries {
            let slot = self.slot(probe);
            let current = slot.load(Ordering::Acquire);

            if current.is_null() {
                let fresh = Box::into_raw(candidate.build(hash));
                match slot.compare_exchange(
                    ptr::null_mut(),
                    fresh,
                    Ordering::Release,
                    Ordering::Acquire,
                ) {
                    Ok(_) => {
                        self.count.fetch_add(1, Ordering::Relaxed);
                        // SAFETY: just published; lives until the map drops.
                        return Ok((unsafe { &(*fresh).value }, true));
                    }
                    Err(winner) => {
                        // SAFETY: the CAS failed, so `fresh` was never published.
                        let fresh = unsafe { Box::from_raw(fresh) };
                        // SAFETY: installed elements live until the map drops.
                        let winner = unsafe { &*winner };
                        if winner.hash == hash && winner.key == fresh.key {
                            return Ok((&winner.value, false));
                        }
                        candidate = Candidate::Built(fresh);
                    }
                }
            } else {
                // SAFETY: installed elements live until the map drops.
                let element = unsafe { &*current };
                if element.hash == hash && element.key == *candidate.key() {
                    return Ok((&element.value, false));
                }
            }

            probe = self.rehasher.rehash(probe);
            tracing::trace!(hash, probe, "map probe relocated");
        }

        tracing::debug!(hash, tries = self.max_tries, "map insert exhausted probe chain");
        Err(Exceeded::new(self.max_tries))
    }

    /// Returns the value for `key`, installing `value` if the key is absent.
    ///
    /// `value` is dropped if the key was already present.
    pub fn get_or_insert(&self, key: K, value: V) -> Result<(&V, bool), Exceeded> {
        self.get_or_emplace(key, move || value)
    }
}

impl<K, V, S, R> OpenAddressingMap<K, V, S, R> {
    /// Iterates over installed elements in slot order.
    ///
    /// Elements installed concurrently may or may not be visited.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            elements: self.elements.iter(),
        }
    }
}

impl<K, V, S, R> Drop for OpenAddressingMap<K, V, S, R> {
    fn drop(&mut self) {
        for element in self.elements.iter_mut() {
            let current = *element.get_mut();
            if !current.is_null() {
                // SAFETY: exclusive access; every non-null slot owns an element
                // created by `Box::into_raw` in `get_or_emplace`.
                drop(unsafe { Box::from_raw(current) });
            }
        }
    }
}

impl<K, V, S, R> fmt::Debug for OpenAddressingMap<K, V, S, R>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, S, R> IntoIterator for &'a OpenAddressingMap<K, V, S, R> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the installed `(key, value)` pairs of an [`OpenAddressingMap`].
pub struct Iter<'a, K, V> {
    elements: slice::Iter<'a, AtomicPtr<Element<K, V>>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.elements.by_ref() {
            let current = slot.load(Ordering::Acquire);
            if !current.is_null() {
                // SAFETY: installed elements live as long as the map borrow.
                let element = unsafe { &*current };
                return Some((&element.key, &element.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.elements.len()))
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
