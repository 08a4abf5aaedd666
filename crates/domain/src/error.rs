use thiserror::Error;

use crate::reader::Operation;

/// Message shown when no usable answer came back over the serial line
pub const NO_READER_RESPONSE: &str = "Problems getting response from RFID reader";

/// Message shown when the reader answered with something that is not a valid frame
pub const UNDECODABLE_READER_RESPONSE: &str = "Problems decoding response from RFID reader";

/// Bridge-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Invalid request XML: {0}")]
    InvalidRequestXml(String),

    #[error("No response from RFID reader within retry budget")]
    ReaderTimeout,

    #[error("Malformed reader response: {0}")]
    MalformedResponse(String),

    #[error("Reader rejected command: {0}")]
    ReaderRejected(String),

    #[error("Serial transport error: {0}")]
    Transport(String),

    #[error("Invalid link configuration: {0}")]
    InvalidLinkConfig(String),
}

impl BridgeError {
    /// Text placed in the `<Message>` element of the exception document
    pub fn user_message(&self, operation: Operation) -> String {
        match self {
            Self::InvalidRequestXml(_) => {
                format!("Problems decoding {} command from Alma", operation.label())
            }
            _ => self.reader_message(),
        }
    }

    /// Message for failures that happen once a command has been built
    pub fn reader_message(&self) -> String {
        match self {
            Self::InvalidRequestXml(_) => "Problems decoding command from Alma".to_string(),
            Self::ReaderTimeout | Self::Transport(_) | Self::InvalidLinkConfig(_) => {
                NO_READER_RESPONSE.to_string()
            }
            Self::MalformedResponse(_) => UNDECODABLE_READER_RESPONSE.to_string(),
            Self::ReaderRejected(message) => message.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_failure_names_operation() {
        let err = BridgeError::InvalidRequestXml("missing barcode".to_string());
        assert_eq!(
            err.user_message(Operation::ItemUpdate),
            "Problems decoding Item Update command from Alma"
        );
        assert_eq!(
            err.user_message(Operation::SetSecurity),
            "Problems decoding Set Security command from Alma"
        );
    }

    #[test]
    fn test_transport_failures_share_message() {
        for err in [
            BridgeError::ReaderTimeout,
            BridgeError::Transport("broken pipe".to_string()),
            BridgeError::InvalidLinkConfig("Unsupported stop bits: 3".to_string()),
        ] {
            assert_eq!(err.user_message(Operation::GetItems), NO_READER_RESPONSE);
        }
    }

    #[test]
    fn test_rejection_passes_reader_text_through() {
        let err = BridgeError::ReaderRejected("No tag found".to_string());
        assert_eq!(err.user_message(Operation::GetItems), "No tag found");
    }

    #[test]
    fn test_malformed_response_message() {
        let err = BridgeError::MalformedResponse("expected value".to_string());
        assert_eq!(
            err.user_message(Operation::SetSecurity),
            UNDECODABLE_READER_RESPONSE
        );
    }
}
