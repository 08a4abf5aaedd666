use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use domain::{BridgeError, ReaderLink};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::sleep;

/// Virtual tag presented by the simulated reader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_barcode")]
    pub barcode: String,
    #[serde(default)]
    pub security_on: bool,
    #[serde(default = "default_tag_present")]
    pub tag_present: bool,
    /// Delay before each answer, emulating the reader's radio round trip
    #[serde(default)]
    pub response_delay_ms: u64,
}

fn default_barcode() -> String {
    "11240000237988".to_string()
}
fn default_tag_present() -> bool {
    true
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            barcode: default_barcode(),
            security_on: false,
            tag_present: default_tag_present(),
            response_delay_ms: 0,
        }
    }
}

/// In-process stand-in for the reader firmware with a single tag in its field
pub struct SimulatedReaderLink {
    config: SimulatorConfig,
    barcode: String,
    security_on: bool,
    outbox: VecDeque<Vec<u8>>,
    open: bool,
}

impl SimulatedReaderLink {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            barcode: config.barcode.clone(),
            security_on: config.security_on,
            config,
            outbox: VecDeque::new(),
            open: false,
        }
    }

    fn answer(&mut self, frame: &[u8]) -> serde_json::Value {
        let Some((&command, argument)) = frame.split_first() else {
            return self.rejected("Empty command");
        };

        // Stopping the scan loop does not need a tag in the field
        if command == b'9' {
            return self.accepted();
        }

        if !self.config.tag_present {
            return self.rejected("No tag found");
        }

        match command {
            b'1' | b'2' => self.accepted(),
            b'3' => {
                self.security_on = true;
                self.accepted()
            }
            b'4' => {
                self.security_on = false;
                self.accepted()
            }
            b'5' => match std::str::from_utf8(argument) {
                Ok(barcode) if !barcode.is_empty() => {
                    self.barcode = barcode.to_string();
                    self.accepted()
                }
                Ok(_) => self.rejected("No barcode supplied"),
                Err(_) => self.rejected("Barcode is not valid text"),
            },
            other => self.rejected(&format!("Unknown command: {}", other as char)),
        }
    }

    fn accepted(&self) -> serde_json::Value {
        let crc = checksum(&self.barcode);
        json!({
            "r": "1",
            "e": "",
            "s": if self.security_on { "1" } else { "0" },
            "p": self.barcode,
            "c1": crc,
            "c2": crc,
        })
    }

    fn rejected(&self, reason: &str) -> serde_json::Value {
        json!({ "r": "0", "e": reason, "s": "0", "p": "", "c1": "", "c2": "" })
    }
}

fn checksum(payload: &str) -> String {
    let sum = payload
        .bytes()
        .fold(0u16, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u16));
    format!("{:04X}", sum)
}

#[async_trait]
impl ReaderLink for SimulatedReaderLink {
    async fn open(&mut self) -> Result<(), BridgeError> {
        tracing::info!(barcode = %self.barcode, "Simulated reader opened");
        self.open = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BridgeError> {
        tracing::info!("Simulated reader closed");
        self.open = false;
        self.outbox.clear();
        Ok(())
    }

    async fn clear_input(&mut self) -> Result<(), BridgeError> {
        self.outbox.clear();
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), BridgeError> {
        if !self.open {
            return Err(BridgeError::Transport("Simulated reader not open".to_string()));
        }
        let reply = self.answer(data);
        let mut line = reply.to_string().into_bytes();
        line.push(b'\n');
        self.outbox.push_back(line);
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<Vec<u8>>, BridgeError> {
        if !self.open {
            return Err(BridgeError::Transport("Simulated reader not open".to_string()));
        }
        if self.config.response_delay_ms > 0 {
            sleep(Duration::from_millis(self.config.response_delay_ms)).await;
        }
        Ok(self.outbox.pop_front())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn link_type(&self) -> &str {
        "Simulator"
    }
}
