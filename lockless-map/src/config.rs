use lockless::{ConfigError, DEFAULT_MAX_TRIES};

/// Construction parameters for an [`OpenAddressingMap`](crate::OpenAddressingMap).
///
/// # Examples
///
/// ```
/// use lockless_map::{DefaultRehasher, MapConfig, OpenAddressingMap};
/// use foldhash::fast::FixedState;
///
/// let map: OpenAddressingMap<u32, u32> = OpenAddressingMap::with_config(
///     MapConfig::new(64).max_tries(4),
///     FixedState::default(),
///     DefaultRehasher,
/// )
/// .unwrap();
/// assert_eq!(map.max_tries(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapConfig {
    /// Number of slots. Not rounded.
    pub capacity: usize,
    /// Probes per operation before giving up.
    pub max_tries: usize,
}

impl MapConfig {
    /// `capacity` slots, 32 probes.
    pub fn new(capacity: usize) -> Self {
        MapConfig {
            capacity,
            max_tries: DEFAULT_MAX_TRIES,
        }
    }

    /// Sets the probe bound.
    pub fn max_tries(mut self, max_tries: usize) -> Self {
        self.max_tries = max_tries;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.max_tries == 0 {
            return Err(ConfigError::ZeroMaxTries);
        }
        Ok(())
    }
}
