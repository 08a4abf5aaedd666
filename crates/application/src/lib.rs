//! Application layer - Request orchestration over the shared reader channel

pub mod bridge;
pub mod channel;

pub use bridge::BridgeService;
pub use channel::{ChannelSession, RetryPolicy, SerialChannel};
