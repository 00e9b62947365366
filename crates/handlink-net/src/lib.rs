//! Handlink Net - Landmark ingestion pipeline
//!
//! This crate moves hand frames from the network into the skeleton:
//! - A UDP receiver task that decodes and validates each datagram
//! - A single-slot, most-recent-wins channel to the consumer
//! - An update driver that applies pending frames once per tick

pub mod channel;
pub mod driver;
pub mod receiver;

pub use channel::{ChannelStats, FrameChannel};
pub use driver::UpdateDriver;
pub use receiver::{LandmarkReceiver, ReceiverConfig, ReceiverError, ReceiverStats, DEFAULT_PORT};
