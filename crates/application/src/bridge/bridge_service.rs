use std::sync::Arc;
use std::time::Duration;

use domain::{BridgeError, BridgeResult, Operation, ReaderCommand, ReaderResponse};
use infrastructure::{ReaderProtocolCodec, XmlTranslator};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::channel::SerialChannel;

/// Upper bound on the stop-scanning exchange made while shutting down
const SHUTDOWN_EXCHANGE_BUDGET: Duration = Duration::from_secs(2);

/// Runs one library platform request against the reader:
/// parse, send, receive, decode, resolve.
pub struct BridgeService {
    channel: Arc<SerialChannel>,
    codec: ReaderProtocolCodec,
}

impl BridgeService {
    pub fn new(channel: Arc<SerialChannel>) -> Self {
        Self {
            channel,
            codec: ReaderProtocolCodec::new(),
        }
    }

    pub fn channel(&self) -> &Arc<SerialChannel> {
        &self.channel
    }

    /// Full request path from raw request body to outcome. Never fails:
    /// every error is resolved into `BridgeResult::Failure`.
    pub async fn dispatch(&self, operation: Operation, body: &[u8]) -> BridgeResult {
        let command = match XmlTranslator::parse_command(operation, body) {
            Ok(command) => command,
            Err(e) => {
                warn!(operation = operation.label(), error = %e, "Could not decode request");
                return BridgeResult::failure(e.user_message(operation));
            }
        };

        self.execute(&command).await
    }

    pub async fn execute(&self, command: &ReaderCommand) -> BridgeResult {
        match self.try_execute(command).await {
            Ok(result) => result,
            Err(e) => {
                warn!(command = %command, error = %e, "Reader command failed");
                BridgeResult::failure(e.reader_message())
            }
        }
    }

    /// Same as [`execute`](Self::execute) but keeps the failure kind
    pub async fn try_execute(&self, command: &ReaderCommand) -> Result<BridgeResult, BridgeError> {
        let frame = self.codec.encode(command);
        let line = self.channel.exchange(frame).await?;
        self.interpret(command, &line)
    }

    /// Ask the reader to stop scanning. Used on shutdown; failures are only logged.
    ///
    /// Waits for one read only and never reconnects, since the link is closed right after.
    pub async fn stop_scanning(&self) {
        let command = ReaderCommand::StopScanning;
        let frame = self.codec.encode(&command);

        let outcome = timeout(SHUTDOWN_EXCHANGE_BUDGET, async {
            let mut session = self.channel.session().await;
            session.send(&frame).await?;
            session.receive_once().await
        })
        .await
        .unwrap_or(Err(BridgeError::ReaderTimeout))
        .and_then(|line| self.interpret(&command, &line));

        match outcome {
            Ok(_) => info!("Reader scanning stopped"),
            Err(e) => warn!(error = %e, "Could not stop reader scanning"),
        }
    }

    fn interpret(&self, command: &ReaderCommand, line: &[u8]) -> Result<BridgeResult, BridgeError> {
        let response = self.codec.decode(line)?;
        if !response.crc_matches() {
            debug!(
                crc_recorded = %response.crc_recorded,
                crc_calculated = %response.crc_calculated,
                "Tag CRC mismatch"
            );
        }

        if !response.ok {
            return Err(BridgeError::ReaderRejected(response.error_message));
        }

        let result = resolve(command, response);
        info!(command = %command, "Reader command completed");
        Ok(result)
    }
}

fn resolve(command: &ReaderCommand, response: ReaderResponse) -> BridgeResult {
    match command {
        ReaderCommand::ReadTag => BridgeResult::ItemsFound {
            barcode: response.payload,
            security_on: response.security_on,
        },
        ReaderCommand::GetSecurity => BridgeResult::SecurityStatus {
            security_on: response.security_on,
        },
        ReaderCommand::SetSecurity { .. } => BridgeResult::SecuritySet,
        ReaderCommand::WriteBarcode(_) => BridgeResult::BarcodeWritten,
        ReaderCommand::StopScanning => BridgeResult::ScanningStopped,
    }
}
