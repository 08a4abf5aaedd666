mod channel_state;
mod reader_link;

pub use channel_state::ChannelState;
pub use reader_link::ReaderLink;
