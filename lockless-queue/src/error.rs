use core::fmt;
use thiserror::Error;

/// Why a push was refused. The rejected value is handed back.
#[derive(Clone, Copy, PartialEq, Eq, Error)]
pub enum PushError<T> {
    /// Every slot holds a value no consumer has claimed yet.
    #[error("queue is full")]
    Full(T),

    /// A consumer claimed the previous value in the target slot but has not
    /// finished moving it out. Retrying shortly will usually succeed.
    #[error("target slot is still being drained")]
    Draining(T),
}

impl<T> PushError<T> {
    /// Returns the value that could not be pushed.
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(value) | PushError::Draining(value) => value,
        }
    }

    /// Returns `true` for [`PushError::Full`].
    pub fn is_full(&self) -> bool {
        matches!(self, PushError::Full(_))
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => f.write_str("Full(..)"),
            PushError::Draining(_) => f.write_str("Draining(..)"),
        }
    }
}

/// Why a pop came back empty-handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PopError {
    /// No sequence has been reserved past the head.
    #[error("queue is empty")]
    Empty,

    /// A producer reserved the next sequence but has not published its value.
    #[error("next value is reserved but not yet published")]
    Pending,
}
