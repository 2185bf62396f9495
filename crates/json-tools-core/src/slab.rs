//! Fixed-slot allocator with a lock-free free list.
//!
//! A [`Slab`] owns one contiguous region of cache-line-aligned slots. The
//! free list is threaded through the slots themselves; `alloc` and `free`
//! contend only on a single generation-tagged head word, updated by
//! compare-and-swap. The generation tag makes head updates immune to ABA
//! when a slot is freed and immediately reallocated by another thread.
//!
//! Exhaustion falls back to the global heap; an allocation remembers which
//! side owns it, and [`Slab::contains`] performs the pointer-range check
//! separating slab slots from heap boxes.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

use crate::error::TransformError;

/// Free-list terminator.
const NIL: u32 = u32::MAX;

/// Pack a generation counter and slot index into the head word.
fn pack(generation: u32, index: u32) -> u64 {
    (u64::from(generation) << 32) | u64::from(index)
}

fn unpack_index(head: u64) -> u32 {
    head as u32
}

fn unpack_generation(head: u64) -> u32 {
    (head >> 32) as u32
}

#[repr(align(64))]
struct Slot<T> {
    next: AtomicU32,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Fixed-capacity slot allocator. Shared across threads behind an [`Arc`].
pub(crate) struct Slab<T> {
    slots: Box<[Slot<T>]>,
    head: CachePadded<AtomicU64>,
}

// SAFETY: a slot's value is only touched by the thread that popped it from
// the free list (exclusive ownership via SlabBox) or pushed it back; the
// free-list head serializes handoff with Acquire/Release CAS.
unsafe impl<T: Send> Send for Slab<T> {}
unsafe impl<T: Send> Sync for Slab<T> {}

impl<T> Slab<T> {
    /// Create a slab with `capacity` slots.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Arc<Self>, TransformError> {
        if capacity >= NIL as usize {
            return Err(TransformError::AllocFailed {
                what: "slab capacity exceeds the u32 index space",
            });
        }
        let slots: Box<[Slot<T>]> = (0..capacity)
            .map(|i| Slot {
                next: AtomicU32::new(if i + 1 < capacity { (i + 1) as u32 } else { NIL }),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();
        let head = if capacity == 0 { NIL } else { 0 };
        Ok(Arc::new(Self {
            slots,
            head: CachePadded::new(AtomicU64::new(pack(0, head))),
        }))
    }

    /// Allocate `value`, from a slab slot when one is free, otherwise from
    /// the heap.
    pub(crate) fn alloc(self: &Arc<Self>, value: T) -> SlabBox<T> {
        loop {
            let head = self.head.load(Ordering::Acquire);
            let index = unpack_index(head);
            if index == NIL {
                return SlabBox {
                    slab: Arc::clone(self),
                    state: BoxState::Heap(Box::new(value)),
                };
            }
            // Reading a stale `next` is harmless: the generation tag fails
            // the CAS if the head moved underneath us.
            let next = self.slots[index as usize].next.load(Ordering::Relaxed);
            let replacement = pack(unpack_generation(head).wrapping_add(1), next);
            if self
                .head
                .compare_exchange_weak(head, replacement, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                // SAFETY: the CAS handed this slot to us exclusively.
                unsafe { (*self.slots[index as usize].value.get()).write(value) };
                return SlabBox {
                    slab: Arc::clone(self),
                    state: BoxState::Slot(index),
                };
            }
        }
    }

    /// True if `ptr` lies inside this slab's slot region.
    pub(crate) fn contains(&self, ptr: *const T) -> bool {
        let start = self.slots.as_ptr() as usize;
        let end = start + self.slots.len() * std::mem::size_of::<Slot<T>>();
        (ptr as usize) >= start && (ptr as usize) < end
    }

    /// Drop the slot's value and push it back on the free list.
    fn release(&self, index: u32) {
        let slot = &self.slots[index as usize];
        // SAFETY: the caller owned the slot; after this point the value is
        // uninitialized until the slot is reallocated.
        unsafe { (*slot.value.get()).assume_init_drop() };
        loop {
            let head = self.head.load(Ordering::Acquire);
            slot.next.store(unpack_index(head), Ordering::Relaxed);
            let replacement = pack(unpack_generation(head).wrapping_add(1), index);
            if self
                .head
                .compare_exchange_weak(head, replacement, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return;
            }
        }
    }
}

enum BoxState<T> {
    Slot(u32),
    Heap(Box<T>),
}

/// Owning handle to a slab (or heap-fallback) allocation. Frees on drop.
pub(crate) struct SlabBox<T> {
    slab: Arc<Slab<T>>,
    state: BoxState<T>,
}

impl<T> SlabBox<T> {
    /// True when the value came from a slab slot rather than the heap.
    #[cfg(test)]
    pub(crate) fn is_slab_backed(&self) -> bool {
        matches!(self.state, BoxState::Slot(_))
    }
}

impl<T> Deref for SlabBox<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.state {
            // SAFETY: the slot was initialized in `alloc` and is exclusively
            // ours until drop.
            BoxState::Slot(i) => unsafe {
                (*self.slab.slots[*i as usize].value.get()).assume_init_ref()
            },
            BoxState::Heap(b) => b,
        }
    }
}

impl<T> DerefMut for SlabBox<T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.state {
            // SAFETY: as in Deref, plus &mut self guarantees uniqueness.
            BoxState::Slot(i) => unsafe {
                (*self.slab.slots[*i as usize].value.get()).assume_init_mut()
            },
            BoxState::Heap(b) => b,
        }
    }
}

impl<T> Drop for SlabBox<T> {
    fn drop(&mut self) {
        if let BoxState::Slot(i) = self.state {
            debug_assert!(self.slab.contains(&**self as *const T));
            self.slab.release(i);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
