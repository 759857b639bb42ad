use std::cell::UnsafeCell;
use std::cmp;
use std::fmt;
use std::mem::{self, MaybeUninit};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::Backoff;
use lockless::CacheAligned;

use crate::error::{PopError, PushError};

/// A slot in the ring.
struct Slot<T> {
    /// The push sequence allowed to write this slot next.
    tail: AtomicUsize,

    /// The push sequence whose value this slot currently publishes.
    head: AtomicUsize,

    /// The value, initialized between a publish on `head` and the matching
    /// pop's release of `tail`.
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Signed distance from `seq` to `stamp`, in sequence numbers.
///
/// Zero means the slot is ready for `seq`, negative means the slot is
/// still one lap behind, positive means `seq` was a stale snapshot.
#[inline(always)]
fn lap_distance(stamp: usize, seq: usize) -> isize {
    stamp.wrapping_sub(seq) as isize
}

/// Whether `tail - head` spans the whole ring.
///
/// `head` may be loaded after `tail` and already be past it; the signed
/// distance keeps that case from reading as full.
#[inline(always)]
fn is_full_at(tail: usize, head: usize, capacity: usize) -> bool {
    lap_distance(tail, head) >= capacity as isize
}

/// A bounded multi-producer multi-consumer queue.
///
/// Capacity is fixed at construction and rounded up to a power of two.
/// Push and pop never block: when the slot for the reserved sequence is not
/// ready they report why through [`PushError`] / [`PopError`].
///
/// The queue is lock-free but not wait-free: a thread whose CAS on a
/// shared counter keeps losing retries for as long as it keeps losing.
pub struct BoundedQueue<T> {
    /// Next sequence to pop.
    head: CacheAligned<AtomicUsize>,

    /// Next sequence to push.
    tail: CacheAligned<AtomicUsize>,

    /// The ring.
    slots: Box<[Slot<T>]>,

    /// `capacity - 1`.
    mask: usize,
}

unsafe impl<T: Send> Send for BoundedQueue<T> {}
unsafe impl<T: Send> Sync for BoundedQueue<T> {}

impl<T> BoundedQueue<T> {
    /// Creates a new bounded queue holding at least `cap` values.
    ///
    /// The capacity is rounded up to the next power of two; zero becomes one.
    pub fn new(cap: usize) -> BoundedQueue<T> {
        let capacity = cap.max(1).next_power_of_two();
        let slots = (0..capacity)
            .map(|i| Slot {
                tail: AtomicUsize::new(i),
                // Published "one lap ago", so nothing is readable yet.
                head: AtomicUsize::new(i.wrapping_sub(capacity)),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        tracing::debug!(requested = cap, capacity, "bounded queue created");

        BoundedQueue {
            head: CacheAligned::new(AtomicUsize::new(0)),
            tail: CacheAligned::new(AtomicUsize::new(0)),
            slots,
            mask: capacity - 1,
        }
    }

    /// Pushes a value, handing it back if the target slot is still occupied.
    ///
    /// Races with other producers are retried; only an occupied slot fails.
    /// Use [`try_push`](Self::try_push) to tell a full queue from a slot
    /// that is mid-drain.
    pub fn push(&self, value: T) -> Result<(), T> {
        self.try_push(value).map_err(PushError::into_inner)
    }

    /// Pushes a value, reporting why it could not be placed.
    pub fn try_push(&self, value: T) -> Result<(), PushError<T>> {
        let backoff = Backoff::new();
        let mut tail = self.tail.load(Ordering::Relaxed);

        loop {
            let slot = &self.slots[tail & self.mask];
            let stamp = slot.tail.load(Ordering::Acquire);

            match lap_distance(stamp, tail).cmp(&0) {
                cmp::Ordering::Equal => {
                    match self.tail.compare_exchange_weak(
                        tail,
                        tail.wrapping_add(1),
                        Ordering::SeqCst,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => {
                            // SAFETY: winning the CAS for `tail` gives this thread sole
                            // write access to the slot until `head` is published, and
                            // `slot.tail == tail` means the previous lap's value is gone.
                            unsafe {
                                slot.value.get().write(MaybeUninit::new(value));
                            }
                            slot.head.store(tail, Ordering::Release);
                            return Ok(());
                        }
                        Err(current) => {
                            tail = current;
                            backoff.spin();
                        }
                    }
                }
                cmp::Ordering::Less => {
                    // The previous lap's value still sits in the slot.
                    let head = self.head.load(Ordering::Acquire);
                    return if is_full_at(tail, head, self.slots.len()) {
                        tracing::trace!(tail, head, "push refused: queue full");
                        Err(PushError::Full(value))
                    } else {
                        tracing::trace!(tail, head, "push refused: slot draining");
                        Err(PushError::Draining(value))
                    };
                }
                cmp::Ordering::Greater => {
                    backoff.spin();
                    tail = self.tail.load(Ordering::Relaxed);
                }
            }
        }
    }

    /// Pops the oldest value, or `None` if none is ready.
    pub fn pop(&self) -> Option<T> {
        self.try_pop().ok()
    }

    /// Pops the oldest value, reporting why none was ready.
    pub fn try_pop(&self) -> Result<T, PopError> {
        let backoff = Backoff::new();
        let mut head = self.head.load(Ordering::Relaxed);

        loop {
            let slot = &self.slots[head & self.mask];
            let stamp = slot.head.load(Ordering::Acquire);

            match lap_distance(stamp, head).cmp(&0) {
                cmp::Ordering::Equal => {
                    match self.head.compare_exchange_weak(
                        head,
                        head.wrapping_add(1),
                        Ordering::SeqCst,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => {
                            // SAFETY: the acquire load of `slot.head == head` saw the
                            // producer's write, and winning the CAS makes this thread
                            // the only reader of sequence `head`.
                            let value = unsafe { slot.value.get().read().assume_init() };
                            slot.tail
                                .store(head.wrapping_add(self.slots.len()), Ordering::Release);
                            return Ok(value);
                        }
                        Err(current) => {
                            head = current;
                            backoff.spin();
                        }
                    }
                }
                cmp::Ordering::Less => {
                    let tail = self.tail.load(Ordering::Acquire);
                    return if tail == head {
                        tracing::trace!(tail, head, "pop refused: queue empty");
                        Err(PopError::Empty)
                    } else {
                        tracing::trace!(tail, head, "pop refused: value not yet published");
                        Err(PopError::Pending)
                    };
                }
                cmp::Ordering::Greater => {
                    backoff.spin();
                    head = self.head.load(Ordering::Relaxed);
                }
            }
        }
    }

    /// Returns the capacity of the queue.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of reserved-but-unpopped sequences.
    ///
    /// Counts values whose push is still in flight. Under concurrency this
    /// is a snapshot.
    pub fn len(&self) -> usize {
        // Head first: tail never trails head, so the difference stays non-negative.
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.wrapping_sub(head).min(self.slots.len())
    }

    /// Returns `true` if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the queue is full.
    pub fn is_full(&self) -> bool {
        self.len() == self.slots.len()
    }

    /// Drops every queued value.
    ///
    /// Takes `&mut self`, so no push or pop can be in flight.
    pub fn clear(&mut self) {
        while self.try_pop().is_ok() {}
    }
}

impl<T> Drop for BoundedQueue<T> {
    fn drop(&mut self) {
        if !mem::needs_drop::<T>() {
            return;
        }

        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        let mut seq = head;
        while seq != tail {
            let slot = &mut self.slots[seq & self.mask];
            // SAFETY: with exclusive access every reserved sequence has been
            // published, so slots in `head..tail` hold initialized values.
            unsafe {
                slot.value.get_mut().assume_init_drop();
            }
            seq = seq.wrapping_add(1);
        }
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
