pub mod dispatcher;

pub use dispatcher::{DrainStats, Dispatcher};

/// Main-loop side destination for items popped off a ring, e.g. a protocol
/// parser fed from a UART receive buffer.
pub trait Sink<T>: Send {
    /// Returns `false` when the item was rejected. Rejection is counted by the
    /// dispatcher and never stops a drain.
    fn accept(&mut self, item: &T) -> bool;

    fn flush(&mut self) {}

    fn name(&self) -> &str;
}
