use async_trait::async_trait;

use crate::error::BridgeError;

/// Byte-level link to the RFID reader that infrastructure implementations must provide
#[async_trait]
pub trait ReaderLink: Send + Sync {
    /// Open the underlying connection
    async fn open(&mut self) -> Result<(), BridgeError>;

    /// Close the underlying connection
    async fn close(&mut self) -> Result<(), BridgeError>;

    /// Discard any input received but not yet consumed
    async fn clear_input(&mut self) -> Result<(), BridgeError>;

    /// Write raw bytes to the reader
    async fn write_all(&mut self, data: &[u8]) -> Result<(), BridgeError>;

    /// Read one newline-terminated frame.
    /// Returns None if the link's read timeout elapsed without any data.
    async fn read_line(&mut self) -> Result<Option<Vec<u8>>, BridgeError>;

    /// Check if currently open
    fn is_open(&self) -> bool;

    /// Get link type identifier
    fn link_type(&self) -> &str;
}
