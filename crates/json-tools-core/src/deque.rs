//! Bounded work-stealing deque.
//!
//! A Chase–Lev deque on a fixed ring: the owner pushes and pops at the
//! bottom without locks, thieves steal from the top with a CAS. Capacity is
//! fixed at construction; a full deque rejects the push and hands the task
//! back to the submitter, which decides where it goes instead.
//!
//! The owner/thief split is enforced by the handle types: [`Worker`] is the
//! single bottom-end handle (not `Clone`, not `Sync`), [`Stealer`] is freely
//! cloned and shared.

use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::sync::atomic::{fence, AtomicIsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

struct Ring<T> {
    bottom: CachePadded<AtomicIsize>,
    top: CachePadded<AtomicIsize>,
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
}

// SAFETY: slots between `top` and `bottom` are initialized and transferred
// between threads only through the Release store in `push` and the SeqCst
// CAS in `steal`/`pop`; a slot is read by exactly one side, decided by the
// CAS on `top`.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    fn slot(&self, index: isize) -> *mut MaybeUninit<T> {
        self.buffer[(index as usize) & self.mask].get()
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        // Exclusive access at this point; drop whatever was never taken.
        let top = self.top.load(Ordering::Relaxed);
        let bottom = self.bottom.load(Ordering::Relaxed);
        for i in top..bottom {
            // SAFETY: indices in [top, bottom) hold initialized values.
            unsafe { (*self.slot(i)).assume_init_drop() };
        }
    }
}

/// Create a deque with the given capacity (rounded up to a power of two).
pub(crate) fn deque<T>(capacity: usize) -> (Worker<T>, Stealer<T>) {
    let capacity = capacity.next_power_of_two();
    let buffer: Box<[UnsafeCell<MaybeUninit<T>>]> = (0..capacity)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect();
    let ring = Arc::new(Ring {
        bottom: CachePadded::new(AtomicIsize::new(0)),
        top: CachePadded::new(AtomicIsize::new(0)),
        buffer,
        mask: capacity - 1,
    });
    (
        Worker {
            ring: Arc::clone(&ring),
            _not_sync: PhantomData,
        },
        Stealer { ring },
    )
}

/// Owner handle: push and pop at the bottom. One per deque.
pub(crate) struct Worker<T> {
    ring: Arc<Ring<T>>,
    // The bottom end is single-threaded; keep the handle out of shared refs.
    _not_sync: PhantomData<std::cell::Cell<()>>,
}

// SAFETY: the Worker may move to another thread as long as only one thread
// uses it at a time, which !Sync (via the PhantomData Cell) guarantees.
unsafe impl<T: Send> Send for Worker<T> {}

impl<T> Worker<T> {
    /// Push onto the bottom. Returns the task if the ring is full.
    pub(crate) fn push(&self, value: T) -> Result<(), T> {
        let bottom = self.ring.bottom.load(Ordering::Relaxed);
        let top = self.ring.top.load(Ordering::Acquire);
        if bottom - top >= self.ring.buffer.len() as isize {
            return Err(value);
        }
        // SAFETY: the slot at `bottom` is outside [top, bottom) and thus
        // unoccupied; only the owner writes at the bottom end.
        unsafe { (*self.ring.slot(bottom)).write(value) };
        self.ring.bottom.store(bottom + 1, Ordering::Release);
        Ok(())
    }

    /// Pop from the bottom (most recently pushed first).
    pub(crate) fn pop(&self) -> Option<T> {
        let ring = &*self.ring;
        let bottom = ring.bottom.load(Ordering::Relaxed) - 1;
        ring.bottom.store(bottom, Ordering::Relaxed);
        fence(Ordering::SeqCst);
        let top = ring.top.load(Ordering::Relaxed);

        if top > bottom {
            // Empty; restore.
            ring.bottom.store(bottom + 1, Ordering::Relaxed);
            return None;
        }

        if top == bottom {
            // Last element: race the thieves with a CAS on top.
            let won = ring
                .top
                .compare_exchange(top, top + 1, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok();
            ring.bottom.store(bottom + 1, Ordering::Relaxed);
            if !won {
                return None;
            }
            // SAFETY: the CAS transferred the slot at `bottom` to us.
            return Some(unsafe { (*ring.slot(bottom)).assume_init_read() });
        }

        // More than one element left; the bottom slot is ours outright.
        // SAFETY: thieves cannot reach `bottom` while top < bottom.
        Some(unsafe { (*ring.slot(bottom)).assume_init_read() })
    }
}

/// Thief handle: steal from the top (oldest task first).
pub(crate) struct Stealer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Clone for Stealer<T> {
    fn clone(&self) -> Self {
        Self {
            ring: Arc::clone(&self.ring),
        }
    }
}

impl<T> Stealer<T> {
    /// Attempt to steal the oldest task. Returns `None` when the deque is
    /// empty or the race was lost; callers move on to the next victim.
    pub(crate) fn steal(&self) -> Option<T> {
        let ring = &*self.ring;
        let top = ring.top.load(Ordering::Acquire);
        fence(Ordering::SeqCst);
        let bottom = ring.bottom.load(Ordering::Acquire);
        if top >= bottom {
            return None;
        }
        // Speculative copy before the CAS; forgotten if the race is lost so
        // ownership stays with the winner.
        // SAFETY: the slot at `top` is initialized while top < bottom.
        let value = unsafe { (*ring.slot(top)).assume_init_read() };
        if ring
            .top
            .compare_exchange(top, top + 1, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
        {
            Some(value)
        } else {
            std::mem::forget(value);
            None
        }
    }

    /// True when no task is observable. Approximate.
    pub(crate) fn is_empty(&self) -> bool {
        let top = self.ring.top.load(Ordering::Acquire);
        let bottom = self.ring.bottom.load(Ordering::Acquire);
        top >= bottom
    }
}

// ===========================================================================
// Tests
// ===========================================================================
