mod codec;

pub use codec::ReaderProtocolCodec;
