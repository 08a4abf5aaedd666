/// Terminal outcome of one bridge request, ready to be rendered as XML
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeResult {
    ItemsFound { barcode: String, security_on: bool },
    SecurityStatus { security_on: bool },
    SecuritySet,
    BarcodeWritten,
    ScanningStopped,
    Failure { message: String },
}

impl BridgeResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}
