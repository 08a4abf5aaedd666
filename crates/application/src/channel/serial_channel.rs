use std::sync::Arc;
use std::time::Duration;

use domain::{BridgeError, ChannelState, ReaderLink};
use infrastructure::config::RetryConfig;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Timing of one receive: initial wait, bounded retries, then a reconnect cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub initial_delay: Duration,
    pub reconnect_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
            initial_delay: Duration::from_millis(500),
            reconnect_cooldown: Duration::from_secs(2),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            reconnect_cooldown: Duration::from_millis(config.reconnect_cooldown_ms),
        }
    }
}

struct ChannelInner {
    link: Box<dyn ReaderLink>,
    state: ChannelState,
}

impl ChannelInner {
    fn transition(&mut self, next: Result<ChannelState, &'static str>) {
        match next {
            Ok(state) => self.state = state,
            Err(reason) => debug!(state = ?self.state, reason, "Ignoring channel transition"),
        }
    }

    async fn open_link(&mut self) -> Result<(), BridgeError> {
        match self.link.open().await {
            Ok(()) => {
                self.transition(self.state.to_open());
                info!(link = self.link.link_type(), "Reader link open");
                Ok(())
            }
            Err(e) => {
                self.state = self.state.to_failed();
                Err(e)
            }
        }
    }

    async fn ensure_open(&mut self) -> Result<(), BridgeError> {
        if self.link.is_open() {
            return Ok(());
        }
        debug!(state = ?self.state, "Reader link not open, opening before command");
        self.open_link().await
    }
}

/// The single shared connection to the reader.
///
/// All traffic goes through a [`ChannelSession`], which holds the channel lock
/// for the whole command/response pair so concurrent requests never interleave.
pub struct SerialChannel {
    inner: Mutex<ChannelInner>,
    policy: RetryPolicy,
}

impl SerialChannel {
    pub fn new(link: Box<dyn ReaderLink>, policy: RetryPolicy) -> Self {
        Self {
            inner: Mutex::new(ChannelInner {
                link,
                state: ChannelState::Closed,
            }),
            policy,
        }
    }

    pub async fn state(&self) -> ChannelState {
        self.inner.lock().await.state
    }

    pub async fn open(&self) -> Result<(), BridgeError> {
        self.inner.lock().await.open_link().await
    }

    pub async fn close(&self) -> Result<(), BridgeError> {
        let mut inner = self.inner.lock().await;
        inner.link.close().await?;
        inner.state = inner.state.to_closed();
        Ok(())
    }

    /// Wait for exclusive use of the channel
    pub async fn session(&self) -> ChannelSession<'_> {
        ChannelSession {
            inner: self.inner.lock().await,
            policy: &self.policy,
        }
    }

    /// Send one frame and receive its reply on a task of its own.
    ///
    /// The pair always runs to completion even if the caller is dropped halfway,
    /// so a reply is never left on the line for the next exchange to pick up.
    pub async fn exchange(self: &Arc<Self>, frame: Vec<u8>) -> Result<Vec<u8>, BridgeError> {
        let channel = Arc::clone(self);
        tokio::spawn(async move {
            let mut session = channel.session().await;
            session.send(&frame).await?;
            session.receive_line().await
        })
        .await
        .map_err(|e| BridgeError::Transport(format!("Reader exchange aborted: {}", e)))?
    }
}

/// Exclusive access to the channel for one exchange
pub struct ChannelSession<'a> {
    inner: MutexGuard<'a, ChannelInner>,
    policy: &'a RetryPolicy,
}

impl ChannelSession<'_> {
    /// Write one encoded command (command byte followed by its argument).
    /// Stale input left over from an earlier exchange is discarded first.
    pub async fn send(&mut self, frame: &[u8]) -> Result<(), BridgeError> {
        self.inner.ensure_open().await?;

        let result = match self.inner.link.clear_input().await {
            Ok(()) => self.inner.link.write_all(frame).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            // Leave the link closed so the next command reopens it
            warn!(error = %e, "Failed to send command to reader");
            if let Err(close_err) = self.inner.link.close().await {
                warn!(error = %close_err, "Error closing reader link");
            }
            self.inner.state = self.inner.state.to_failed();
            return Err(e);
        }

        debug!(frame = %String::from_utf8_lossy(frame), "Command sent to reader");
        Ok(())
    }

    /// Read one frame, retrying while the reader stays silent.
    /// Gives up with `ReaderTimeout` after reconnecting the link.
    pub async fn receive_line(&mut self) -> Result<Vec<u8>, BridgeError> {
        sleep(self.policy.initial_delay).await;

        let mut attempt = 0;
        loop {
            match self.inner.link.read_line().await {
                Ok(Some(line)) if !line.iter().all(u8::is_ascii_whitespace) => {
                    debug!(attempt, bytes = line.len(), "Frame received from reader");
                    return Ok(line);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Read failure, resetting reader connection");
                    self.reconnect().await;
                    return Err(e);
                }
            }

            if attempt >= self.policy.max_retries {
                break;
            }
            attempt += 1;
            debug!(attempt, "No data from reader yet, retrying");
            sleep(self.policy.retry_delay).await;
        }

        warn!(
            retries = self.policy.max_retries,
            "Error reading RFID response, resetting connection"
        );
        self.reconnect().await;
        Err(BridgeError::ReaderTimeout)
    }

    /// Single read after the initial delay: no retries and no reconnect.
    /// Silence is reported as `ReaderTimeout`.
    pub async fn receive_once(&mut self) -> Result<Vec<u8>, BridgeError> {
        sleep(self.policy.initial_delay).await;

        match self.inner.link.read_line().await? {
            Some(line) if !line.iter().all(u8::is_ascii_whitespace) => Ok(line),
            _ => Err(BridgeError::ReaderTimeout),
        }
    }

    /// Close, wait out the cooldown and reopen the link.
    /// A failed reopen leaves the channel `Failed`; the next `send` tries again.
    pub async fn reconnect(&mut self) {
        let inner = &mut *self.inner;
        inner.transition(inner.state.to_recovering());

        if let Err(e) = inner.link.close().await {
            warn!(error = %e, "Error closing reader link");
        }

        sleep(self.policy.reconnect_cooldown).await;

        if let Err(e) = inner.open_link().await {
            error!(error = %e, "Failed to reopen reader link");
        }
    }

    pub fn state(&self) -> ChannelState {
        self.inner.state
    }
}
