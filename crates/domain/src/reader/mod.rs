mod command;
mod operation;
mod response;
mod result;

pub use command::ReaderCommand;
pub use operation::Operation;
pub use response::ReaderResponse;
pub use result::BridgeResult;
