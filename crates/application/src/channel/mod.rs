mod serial_channel;

pub use serial_channel::{ChannelSession, RetryPolicy, SerialChannel};
