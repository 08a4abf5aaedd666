//! Infrastructure layer - Serial links, wire codec, XML and configuration

pub mod config;
pub mod drivers;
pub mod protocol;
pub mod xml;

pub use config::BridgeConfig;
pub use drivers::LinkFactory;
pub use protocol::ReaderProtocolCodec;
pub use xml::XmlTranslator;
