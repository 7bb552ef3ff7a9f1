pub mod consumer;
pub mod ring;
