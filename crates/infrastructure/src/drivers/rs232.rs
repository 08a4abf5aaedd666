use std::time::Duration;

use async_trait::async_trait;
use domain::{BridgeError, ReaderLink};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{
    ClearBuffer, DataBits, Parity, SerialPort, SerialPortBuilder, SerialPortBuilderExt,
    SerialStream, StopBits,
};

/// Parity as written in configuration files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParityMode {
    #[default]
    None,
    Even,
    Odd,
}

/// Serial line settings of the reader. Keys missing from configuration fall back
/// to the reader's factory settings (9600 8N1, 5 s per read).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RS232Config {
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: ParityMode,
    pub stop_bits: u8,
    pub timeout_ms: u64,
}

impl Default for RS232Config {
    fn default() -> Self {
        let port = if cfg!(target_os = "windows") {
            "COM10"
        } else {
            "/dev/ttyACM0"
        };
        Self::new(port.to_string())
    }
}

impl RS232Config {
    pub fn new(port: String) -> Self {
        Self {
            port,
            baud_rate: 9600,
            data_bits: 8,
            parity: ParityMode::None,
            stop_bits: 1,
            timeout_ms: 5000,
        }
    }

    /// Reject settings tokio-serial cannot express before the port is ever opened
    pub fn validate(&self) -> Result<(), BridgeError> {
        self.port_builder().map(|_| ())
    }

    fn port_builder(&self) -> Result<SerialPortBuilder, BridgeError> {
        let data_bits = match self.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            other => return Err(unsupported("data bits", other)),
        };
        let stop_bits = match self.stop_bits {
            1 => StopBits::One,
            2 => StopBits::Two,
            other => return Err(unsupported("stop bits", other)),
        };
        let parity = match self.parity {
            ParityMode::None => Parity::None,
            ParityMode::Even => Parity::Even,
            ParityMode::Odd => Parity::Odd,
        };

        Ok(tokio_serial::new(self.device_path(), self.baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .timeout(Duration::from_millis(self.timeout_ms)))
    }

    // COM10 and up are only reachable through the \\.\ device namespace
    fn device_path(&self) -> String {
        let namespaced = self.port.starts_with(r"\\.\");
        if cfg!(target_os = "windows") && !namespaced {
            format!(r"\\.\{}", self.port)
        } else {
            self.port.clone()
        }
    }
}

fn unsupported(setting: &str, value: u8) -> BridgeError {
    BridgeError::InvalidLinkConfig(format!("Unsupported {}: {}", setting, value))
}

/// Serial link to the reader.
/// Not internally synchronised: callers serialise access (see `SerialChannel`).
pub struct RS232ReaderLink {
    config: RS232Config,
    port: Option<SerialStream>,
    pending: Vec<u8>,
}

impl RS232ReaderLink {
    pub fn new(config: RS232Config) -> Self {
        Self {
            config,
            port: None,
            pending: Vec::new(),
        }
    }

    fn not_open() -> BridgeError {
        BridgeError::Transport("Port not open".to_string())
    }
}

#[async_trait]
impl ReaderLink for RS232ReaderLink {
    async fn open(&mut self) -> Result<(), BridgeError> {
        let port_name = self.config.device_path();

        tracing::debug!(
            port = %port_name,
            baud_rate = self.config.baud_rate,
            "Opening serial port"
        );

        let port = self
            .config
            .port_builder()?
            .open_native_async()
            .map_err(|e| {
                tracing::warn!(port = %port_name, error = %e, "Failed to open serial port");
                BridgeError::Transport(format!(
                    "Failed to open serial port {}: {}. Tip: Ensure the port is not used by another application and that you have sufficient permissions.",
                    port_name, e
                ))
            })?;

        self.port = Some(port);
        self.pending.clear();

        tracing::debug!(port = %self.config.port, "Serial port opened successfully");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BridgeError> {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.shutdown().await {
                tracing::warn!(error = %e, "Error shutting down serial port");
            }
        }
        self.pending.clear();

        tracing::info!(port = %self.config.port, "Serial port closed");
        Ok(())
    }

    async fn clear_input(&mut self) -> Result<(), BridgeError> {
        let port = self.port.as_mut().ok_or_else(Self::not_open)?;
        port.clear(ClearBuffer::Input)
            .map_err(|e| BridgeError::Transport(format!("Clear input error: {}", e)))?;
        self.pending.clear();
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), BridgeError> {
        let port = self.port.as_mut().ok_or_else(Self::not_open)?;

        port.write_all(data)
            .await
            .map_err(|e| BridgeError::Transport(format!("Write error: {}", e)))?;

        port.flush()
            .await
            .map_err(|e| BridgeError::Transport(format!("Flush error: {}", e)))?;

        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<Vec<u8>>, BridgeError> {
        let port = self.port.as_mut().ok_or_else(Self::not_open)?;
        let deadline =
            tokio::time::Instant::now() + Duration::from_millis(self.config.timeout_ms);
        let mut buffer = [0u8; 256];

        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                return Ok(Some(self.pending.drain(..=pos).collect()));
            }

            match tokio::time::timeout_at(deadline, port.read(&mut buffer)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => self.pending.extend_from_slice(&buffer[..n]),
                Ok(Err(e)) => {
                    return Err(BridgeError::Transport(format!("Read error: {}", e)));
                }
                // Timeout elapsed; hand back whatever arrived so far
                Err(_) => break,
            }
        }

        if self.pending.is_empty() {
            Ok(None)
        } else {
            Ok(Some(std::mem::take(&mut self.pending)))
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn link_type(&self) -> &str {
        "RS232"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rs232_config_defaults() {
        let config = RS232Config::new("COM10".to_string());
        assert_eq!(config.port, "COM10");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.data_bits, 8);
        assert_eq!(config.parity, ParityMode::None);
        assert_eq!(config.stop_bits, 1);
        assert_eq!(config.timeout_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rs232_config_partial_table_keeps_defaults() {
        let config: RS232Config =
            serde_json::from_value(serde_json::json!({ "port": "COM3", "parity": "Even" }))
                .unwrap();
        assert_eq!(config.port, "COM3");
        assert_eq!(config.parity, ParityMode::Even);
        assert_eq!(config.baud_rate, 9600);
        assert!(config.validate().is_ok());

        let mark = serde_json::from_value::<RS232Config>(serde_json::json!({ "parity": "Mark" }));
        assert!(mark.is_err());
    }

    #[test]
    fn test_rs232_config_rejects_unsupported_line_settings() {
        let base = RS232Config::new("COM1".to_string());

        let config = RS232Config {
            data_bits: 9,
            ..base.clone()
        };
        assert!(matches!(
            config.validate(),
            Err(BridgeError::InvalidLinkConfig(_))
        ));

        let config = RS232Config {
            stop_bits: 0,
            ..base
        };
        assert!(matches!(
            config.validate(),
            Err(BridgeError::InvalidLinkConfig(_))
        ));
    }

    #[test]
    fn test_rs232_initial_state() {
        let link = RS232ReaderLink::new(RS232Config::new("COM1".to_string()));
        assert!(!link.is_open());
        assert_eq!(link.link_type(), "RS232");
    }

    #[tokio::test]
    async fn test_rs232_io_without_open_port() {
        let mut link = RS232ReaderLink::new(RS232Config::new("COM1".to_string()));

        assert!(matches!(
            link.write_all(b"1").await,
            Err(BridgeError::Transport(_))
        ));
        assert!(matches!(
            link.read_line().await,
            Err(BridgeError::Transport(_))
        ));
        // Closing a link that was never opened is harmless
        assert!(link.close().await.is_ok());
    }
}
