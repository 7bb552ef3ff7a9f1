use super::{Consumer, Drain, Full, Producer, RingBuffer};

/// Exclusive-access API. Holding `&mut RingBuffer` means one context plays
/// both roles, so every operation here is trivially single-writer.
impl<T> RingBuffer<T> {
    /// Appends `item`, or hands it back in `Full` without touching the buffer.
    #[inline]
    pub fn try_push(&mut self, item: T) -> Result<(), Full<T>> {
        // SAFETY: `&mut self` excludes every other producer.
        unsafe { self.produce(item) }
    }

    /// Appends `item`, evicting and returning the oldest entry when full.
    ///
    /// This is the "most recent sample wins" policy. It moves `tail` from the
    /// producing side, so it exists only here and never on [`Producer`].
    pub fn push_overwrite(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() { self.try_pop() } else { None };
        if evicted.is_some() {
            tracing::trace!(capacity = self.capacity(), "evicted oldest entry");
        }

        match self.try_push(item) {
            Ok(()) => evicted,
            // A slot was just freed or the ring had room.
            Err(_) => unreachable!("ring full after eviction"),
        }
    }

    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        // SAFETY: `&mut self` excludes every other consumer.
        unsafe { self.consume() }
    }

    /// The oldest item, left in place. Repeated calls return the same item.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        // SAFETY: with only `&self` available nobody can pop, and nobody can
        // push either, so the front slot is stable for the borrow.
        unsafe { self.front() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        let (head, tail) = self.snapshot();
        self.distance(head, tail)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        let (head, tail) = self.snapshot();
        head == tail
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        let (head, tail) = self.snapshot();
        self.advance(head) == tail
    }

    /// Free slots left for the producer.
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Drops every live item. Cursors are not reset; only their distance matters.
    pub fn clear(&mut self) {
        while self.try_pop().is_some() {}
    }

    /// Pops items in FIFO order until the buffer is empty.
    ///
    /// Items are popped lazily, one per `next`. Unlike `Vec::drain`, dropping
    /// the iterator early leaves the rest queued.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain::new(self)
    }

    /// Hands out the two roles. The exclusive borrow guarantees there is
    /// exactly one producer and one consumer for as long as the handles live.
    pub fn split(&mut self) -> (Producer<'_, T>, Consumer<'_, T>) {
        let ring: &RingBuffer<T> = self;
        (Producer::new(ring), Consumer::new(ring))
    }
}
