//! Split handles for running the two roles in different contexts.
//!
//! ```text
//! Producer: write slot[head], then Release-store head  ->  Consumer: Acquire-load head, read slot
//! Consumer: read slot[tail], then Release-store tail   ->  Producer: Acquire-load tail, reuse slot
//! ```
//!
//! Neither side ever blocks or retries internally. A full ring is reported to
//! the producer, an empty ring to the consumer, and the caller decides.

use super::{Full, RingBuffer};
use std::fmt;

pub struct Producer<'a, T> {
    ring: &'a RingBuffer<T>,
}

pub struct Consumer<'a, T> {
    ring: &'a RingBuffer<T>,
}

// SAFETY: each handle is the sole owner of its role, so moving it to another
// thread only requires that items can cross threads.
unsafe impl<T: Send> Send for Producer<'_, T> {}
unsafe impl<T: Send> Send for Consumer<'_, T> {}

impl<'a, T> Producer<'a, T> {
    pub(crate) fn new(ring: &'a RingBuffer<T>) -> Self {
        Self { ring }
    }

    #[inline]
    pub fn try_push(&mut self, item: T) -> Result<(), Full<T>> {
        // SAFETY: `split` creates one producer per exclusive borrow and
        // `&mut self` keeps it on one thread at a time.
        unsafe { self.ring.produce(item) }
    }

    /// Pushes as many leading items of `items` as fit and returns the count.
    /// The whole batch becomes visible to the consumer at once.
    #[inline]
    pub fn try_push_slice(&mut self, items: &[T]) -> usize
    where
        T: Copy,
    {
        // SAFETY: see `try_push`.
        unsafe { self.ring.produce_slice(items) }
    }

    /// Items currently queued. Exact for this side: the consumer can only
    /// make it smaller, so at least `free_slots()` pushes will succeed.
    #[inline]
    pub fn len(&self) -> usize {
        let (head, tail) = self.ring.producer_snapshot();
        self.ring.distance(head, tail)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        let (head, tail) = self.ring.producer_snapshot();
        head == tail
    }

    #[inline]
    pub fn free_slots(&self) -> usize {
        self.ring.capacity() - self.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        let (head, tail) = self.ring.producer_snapshot();
        self.ring.advance(head) == tail
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

impl<'a, T> Consumer<'a, T> {
    pub(crate) fn new(ring: &'a RingBuffer<T>) -> Self {
        Self { ring }
    }

    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        // SAFETY: one consumer per exclusive borrow, pinned by `&mut self`.
        unsafe { self.ring.consume() }
    }

    /// The oldest item, left in place. The producer never writes a slot the
    /// consumer has not released, so the reference stays valid until the
    /// next pop, which needs `&mut self` and therefore ends this borrow.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        // SAFETY: pops require `&mut self`, so the slot stays ours.
        unsafe { self.ring.front() }
    }

    /// Pops up to `out.len()` items into `out` and returns the count.
    #[inline]
    pub fn pop_into(&mut self, out: &mut [T]) -> usize
    where
        T: Copy,
    {
        // SAFETY: see `try_pop`.
        unsafe { self.ring.consume_into(out) }
    }

    /// Pops until the ring looks empty. Items pushed while draining are
    /// picked up too. Popping is lazy: dropping the iterator early leaves the
    /// rest queued.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain::new(self.ring)
    }

    /// Items ready to pop. Exact for this side: the producer can only make it
    /// larger.
    #[inline]
    pub fn len(&self) -> usize {
        let (head, tail) = self.ring.consumer_snapshot();
        self.ring.distance(head, tail)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        let (head, tail) = self.ring.consumer_snapshot();
        head == tail
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

/// Iterator returned by [`RingBuffer::drain`] and [`Consumer::drain`].
///
/// Each `next` pops one item. Nothing is popped on drop.
pub struct Drain<'a, T> {
    ring: &'a RingBuffer<T>,
}

impl<'a, T> Drain<'a, T> {
    /// Only built from a borrow that already holds the consumer role.
    pub(crate) fn new(ring: &'a RingBuffer<T>) -> Self {
        Self { ring }
    }
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        // SAFETY: the borrow this drain was built from holds the consumer role.
        unsafe { self.ring.consume() }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (head, tail) = self.ring.consumer_snapshot();
        (self.ring.distance(head, tail), None)
    }
}

impl<T> fmt::Debug for Producer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer").field("ring", self.ring).finish()
    }
}

impl<T> fmt::Debug for Consumer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer").field("ring", self.ring).finish()
    }
}

#[cfg(all(test, loom))]
mod loom_tests {
    use super::*;
    use loom::sync::Arc;
    use loom::thread;

    // Handles are built per thread from a shared ring, one of each role,
    // because loom threads need 'static captures.
    fn shared_ring(capacity: usize) -> (Arc<RingBuffer<u32>>, Arc<RingBuffer<u32>>) {
        let ring = Arc::new(RingBuffer::new(capacity).unwrap());
        (ring.clone(), ring)
    }

    #[test]
    fn loom_fifo_across_threads() {
        const K: u32 = 3;

        loom::model(|| {
            let (ring_p, ring_c) = shared_ring(2);

            let producer = thread::spawn(move || {
                let mut prod = Producer::new(&ring_p);
                for i in 0..K {
                    while prod.try_push(i).is_err() {
                        thread::yield_now();
                    }
                }
            });

            let consumer = thread::spawn(move || {
                let mut cons = Consumer::new(&ring_c);
                let mut received = Vec::new();
                while received.len() < K as usize {
                    match cons.try_pop() {
                        Some(v) => received.push(v),
                        None => thread::yield_now(),
                    }
                }
                received
            });

            producer.join().unwrap();
            assert_eq!(consumer.join().unwrap(), vec![0, 1, 2]);
        });
    }

    #[test]
    fn loom_len_stays_in_bounds() {
        loom::model(|| {
            let (ring_p, ring_c) = shared_ring(1);

            let producer = thread::spawn(move || {
                let mut prod = Producer::new(&ring_p);
                for i in 0..2u32 {
                    while prod.try_push(i).is_err() {
                        assert!(prod.len() <= 1);
                        thread::yield_now();
                    }
                }
            });

            let consumer = thread::spawn(move || {
                let mut cons = Consumer::new(&ring_c);
                let mut seen = 0;
                while seen < 2 {
                    assert!(cons.len() <= 1);
                    match cons.peek().copied() {
                        Some(front) => {
                            assert_eq!(cons.try_pop(), Some(front));
                            seen += 1;
                        }
                        None => thread::yield_now(),
                    }
                }
            });

            producer.join().unwrap();
            consumer.join().unwrap();
        });
    }
}
