use domain::{BridgeError, ReaderCommand, ReaderResponse};
use serde::Deserialize;

/// Raw frame as emitted by the reader firmware:
/// `{"r":"1","e":"","s":"1","p":"11240000237988","c1":"XXXX","c2":"XXXX"}`
#[derive(Debug, Deserialize)]
struct RawFrame {
    /// Result, "1" on success
    r: String,
    /// Error text when r is "0"
    e: String,
    /// Security flag, "1" when on
    s: String,
    /// Payload (barcode for read commands)
    p: String,
    /// CRC recorded on the tag
    c1: String,
    /// CRC calculated from the tag contents
    c2: String,
}

/// Encodes reader commands and decodes the reader's JSON line responses
#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderProtocolCodec;

impl ReaderProtocolCodec {
    pub fn new() -> Self {
        Self
    }

    /// Command byte followed by the argument, if any. No terminator.
    pub fn encode(&self, command: &ReaderCommand) -> Vec<u8> {
        let mut frame = vec![command.command_byte()];
        if let Some(argument) = command.argument() {
            frame.extend_from_slice(argument.as_bytes());
        }
        frame
    }

    pub fn decode(&self, line: &[u8]) -> Result<ReaderResponse, BridgeError> {
        let text = std::str::from_utf8(line)
            .map_err(|e| BridgeError::MalformedResponse(format!("Invalid UTF-8: {}", e)))?;

        let frame: RawFrame = serde_json::from_str(text.trim())
            .map_err(|e| BridgeError::MalformedResponse(e.to_string()))?;

        let ok = match frame.r.as_str() {
            "1" => true,
            "0" => false,
            other => {
                return Err(BridgeError::MalformedResponse(format!(
                    "Unexpected result code: {}",
                    other
                )));
            }
        };

        Ok(ReaderResponse {
            ok,
            error_message: frame.e,
            security_on: frame.s == "1",
            payload: frame.p,
            crc_recorded: frame.c1,
            crc_calculated: frame.c2,
        })
    }
}
