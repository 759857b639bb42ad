//! Bounded lock-free MPMC queue.
//!
//! [`BoundedQueue`] is a ring of power-of-two capacity. Every slot carries
//! two sequence numbers: the push sequence allowed to write it next and the
//! push sequence whose value it currently publishes. Producers and
//! consumers reserve sequences by CAS on two shared counters and then wait
//! for nothing: if the slot for their sequence is not ready, the operation
//! fails with a definite result instead of blocking.
//!
//! ## Usage
//!
//! ```rust
//! use lockless_queue::{BoundedQueue, PushError};
//!
//! let q = BoundedQueue::new(4);
//! for i in 0..4 {
//!     q.push(i).unwrap();
//! }
//! assert_eq!(q.try_push(4), Err(PushError::Full(4)));
//!
//! assert_eq!(q.pop(), Some(0));
//! assert!(q.push(4).is_ok());
//! ```

#![warn(missing_docs)]

mod bounded;
mod error;

pub use bounded::BoundedQueue;
pub use error::{PopError, PushError};
