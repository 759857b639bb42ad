use thiserror::Error;

/// A bounded probe sequence ran out of tries before finding a usable slot.
///
/// This is an expected, locally recoverable condition: the container is
/// too crowded along this key's probe chain. Callers back off, shed the
/// element, or size the container larger next time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("probe sequence exhausted after {tries} tries")]
pub struct Exceeded {
    /// Number of probes made before giving up.
    pub tries: usize,
}

impl Exceeded {
    /// Creates the error for a chain that made `tries` probes.
    pub fn new(tries: usize) -> Self {
        Self { tries }
    }
}

/// Rejected construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A fixed-capacity container needs at least one slot.
    #[error("capacity must be greater than zero")]
    ZeroCapacity,

    /// A probe chain must be allowed at least one probe.
    #[error("max_tries must be greater than zero")]
    ZeroMaxTries,

    /// Bucket width outside the supported range.
    #[error("bucket width {width} out of range, expected {min}..={max}")]
    BucketWidth {
        /// Requested width, in bits of address.
        width: u32,
        /// Smallest accepted width.
        min: u32,
        /// Largest accepted width.
        max: u32,
    },
}
