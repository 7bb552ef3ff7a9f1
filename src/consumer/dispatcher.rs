use super::Sink;

pub struct Dispatcher<T> {
    sinks: Vec<Box<dyn Sink<T>>>,
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Dispatcher<T> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink<S: Sink<T> + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Delivers every item to every sink, then flushes all sinks.
    ///
    /// Takes any popping iterator, typically `ring.drain()` or
    /// `consumer.drain()`.
    #[inline]
    pub fn drain<I: IntoIterator<Item = T>>(&mut self, items: I) -> DrainStats {
        let stats = self.deliver(items.into_iter());
        for sink in &mut self.sinks {
            sink.flush();
        }
        stats
    }

    /// Delivers at most `limit` items and leaves the rest queued. Sinks are
    /// not flushed, so a main loop can interleave bounded slices of work.
    #[inline]
    pub fn drain_batch<I: IntoIterator<Item = T>>(&mut self, items: I, limit: usize) -> DrainStats {
        self.deliver(items.into_iter().take(limit))
    }

    fn deliver(&mut self, items: impl Iterator<Item = T>) -> DrainStats {
        let mut stats = DrainStats::default();
        for item in items {
            stats.items_read += 1;
            for sink in &mut self.sinks {
                if sink.accept(&item) {
                    stats.items_delivered += 1;
                } else {
                    stats.items_rejected += 1;
                    tracing::trace!(sink = sink.name(), "sink rejected item");
                }
            }
        }
        stats
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    pub items_read: u64,
    pub items_delivered: u64,
    pub items_rejected: u64,
}

impl DrainStats {
    #[inline]
    pub fn success_rate(&self) -> f64 {
        let total = self.items_delivered + self.items_rejected;
        if total == 0 {
            1.0
        } else {
            self.items_delivered as f64 / total as f64
        }
    }

    pub fn merge(&mut self, other: DrainStats) {
        self.items_read += other.items_read;
        self.items_delivered += other.items_delivered;
        self.items_rejected += other.items_rejected;
    }
}
