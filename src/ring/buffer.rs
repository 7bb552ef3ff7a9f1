//! Fixed-capacity single-producer/single-consumer ring.
//!
//! One slot more than the requested capacity is allocated so that full and
//! empty can be told apart from the two cursors alone:
//!
//! ```text
//! empty:  head == tail
//! full:   (head + 1) % slots == tail
//! len:    (head - tail + slots) % slots        in [0, capacity]
//! ```
//!
//! `head` is written only by the producer and `tail` only by the consumer.
//! A slot becomes readable when the producer release-stores `head` past it
//! and becomes writable again when the consumer release-stores `tail` past
//! it, so no slot is ever touched by both sides at once.

#[cfg(not(loom))]
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(loom)]
use loom::sync::atomic::{AtomicUsize, Ordering};

use super::{Full, RingError};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;

pub struct RingBuffer<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    capacity: usize,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
}

// SAFETY: the cursors keep producer and consumer on disjoint slots. A shared
// `&RingBuffer` also exposes `peek`, which hands `&T` to every sharer, hence
// `T: Sync`. The split handles only need `T: Send` and say so themselves.
unsafe impl<T: Send + Sync> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        if capacity == 0 {
            return Err(RingError::InvalidCapacity {
                capacity,
                reason: "must hold at least one item",
            });
        }

        let Some(slot_count) = capacity.checked_add(1) else {
            return Err(RingError::InvalidCapacity {
                capacity,
                reason: "no room for the reserved slot",
            });
        };

        let mut slots: Vec<UnsafeCell<MaybeUninit<T>>> = Vec::new();
        if slots.try_reserve_exact(slot_count).is_err() {
            return Err(RingError::InvalidCapacity {
                capacity,
                reason: "storage too large",
            });
        }
        // SAFETY: `UnsafeCell<MaybeUninit<T>>` needs no initialization and the
        // reservation above covers `slot_count` elements.
        unsafe { slots.set_len(slot_count) };
        let slots = slots.into_boxed_slice();

        tracing::debug!(capacity, slot_count, "ring buffer allocated");

        Ok(Self {
            slots,
            capacity,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        })
    }

    /// Number of items the buffer can hold. One less than the slot count.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// `(index + 1) % slot_count`. `index + 1` cannot overflow because
    /// `index < slot_count <= usize::MAX`.
    #[inline(always)]
    pub(crate) fn advance(&self, index: usize) -> usize {
        debug_assert!(index < self.slot_count());
        let next = index + 1;
        if next == self.slot_count() { 0 } else { next }
    }

    /// Live items between the two cursors of one snapshot.
    #[inline(always)]
    pub(crate) fn distance(&self, head: usize, tail: usize) -> usize {
        debug_assert!(head < self.slot_count() && tail < self.slot_count());
        if head >= tail {
            head - tail
        } else {
            self.slot_count() - (tail - head)
        }
    }

    /// Both cursors, loaded once. Every derived answer (`len`, `is_full`,
    /// `is_empty`) must come from one of these, never from separate loads.
    #[inline(always)]
    pub(crate) fn snapshot(&self) -> (usize, usize) {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        (head, tail)
    }

    #[inline(always)]
    pub(crate) fn producer_snapshot(&self) -> (usize, usize) {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        (head, tail)
    }

    #[inline(always)]
    pub(crate) fn consumer_snapshot(&self) -> (usize, usize) {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        (head, tail)
    }

    /// Writes `item` at `head` and publishes it.
    ///
    /// # Safety
    /// The caller must be the only context producing into this ring for the
    /// duration of the call.
    #[inline]
    pub(crate) unsafe fn produce(&self, item: T) -> Result<(), Full<T>> {
        let (head, tail) = self.producer_snapshot();
        let next = self.advance(head);
        if next == tail {
            return Err(Full(item));
        }

        // SAFETY: `head` is outside `[tail, head)`, so the consumer will not
        // read this slot until the store below publishes it.
        unsafe { (*self.slots[head].get()).write(item) };

        self.head.store(next, Ordering::Release);
        Ok(())
    }

    /// Copies the leading items of `items` that fit and publishes them all
    /// with a single store. Returns how many were written.
    ///
    /// # Safety
    /// Same contract as [`produce`](Self::produce).
    #[inline]
    pub(crate) unsafe fn produce_slice(&self, items: &[T]) -> usize
    where
        T: Copy,
    {
        let (head, tail) = self.producer_snapshot();
        let free = self.capacity - self.distance(head, tail);
        let count = free.min(items.len());
        if count == 0 {
            return 0;
        }

        let mut index = head;
        for &item in &items[..count] {
            // SAFETY: the `count` slots from `head` are free and unpublished.
            unsafe { (*self.slots[index].get()).write(item) };
            index = self.advance(index);
        }

        self.head.store(index, Ordering::Release);
        count
    }

    /// Takes the item at `tail` and releases its slot.
    ///
    /// # Safety
    /// The caller must be the only context consuming from this ring for the
    /// duration of the call.
    #[inline]
    pub(crate) unsafe fn consume(&self) -> Option<T> {
        let (head, tail) = self.consumer_snapshot();
        if head == tail {
            return None;
        }

        // SAFETY: `tail` is inside `[tail, head)`, published by the producer's
        // release store on `head` which our acquire load synchronized with.
        let item = unsafe { (*self.slots[tail].get()).assume_init_read() };

        self.tail.store(self.advance(tail), Ordering::Release);
        Some(item)
    }

    /// # Safety
    /// Same contract as [`consume`](Self::consume).
    #[inline]
    pub(crate) unsafe fn consume_into(&self, out: &mut [T]) -> usize
    where
        T: Copy,
    {
        let (head, tail) = self.consumer_snapshot();
        let count = self.distance(head, tail).min(out.len());
        if count == 0 {
            return 0;
        }

        let mut index = tail;
        for dst in &mut out[..count] {
            // SAFETY: the `count` slots from `tail` are initialized and ours.
            *dst = unsafe { (*self.slots[index].get()).assume_init_read() };
            index = self.advance(index);
        }

        self.tail.store(index, Ordering::Release);
        count
    }

    /// Borrows the oldest item without releasing its slot.
    ///
    /// # Safety
    /// Same contract as [`consume`](Self::consume), and the returned reference
    /// must not outlive the consumer's exclusive hold on the slot.
    #[inline]
    pub(crate) unsafe fn front(&self) -> Option<&T> {
        let (head, tail) = self.consumer_snapshot();
        if head == tail {
            return None;
        }

        // SAFETY: the producer cannot reuse this slot until `tail` moves,
        // and only the consumer moves `tail`.
        Some(unsafe { (*self.slots[tail].get()).assume_init_ref() })
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no handle is alive, so we hold both roles.
        while unsafe { self.consume() }.is_some() {}
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (head, tail) = self.snapshot();
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("head", &head)
            .field("tail", &tail)
            .field("len", &self.distance(head, tail))
            .finish()
    }
}
