use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use domain::{BridgeError, ReaderLink};
use tokio::sync::Mutex;

/// What the mock hands back for one `read_line` call
#[derive(Debug, Clone)]
pub enum MockReply {
    Line(Vec<u8>),
    Silence,
    ReadError(String),
}

/// Scripted reader link for tests. Clones share all state.
#[derive(Clone, Default)]
pub struct MockReaderLink {
    /// Replies returned in order after each command; an empty script reads as silence
    pub replies: Arc<Mutex<VecDeque<MockReply>>>,
    /// Input already sitting in the receive buffer, dropped by `clear_input`
    pub stale_input: Arc<Mutex<VecDeque<Vec<u8>>>>,
    pub sent_data: Arc<Mutex<Vec<Vec<u8>>>>,
    pub open_count: Arc<AtomicUsize>,
    pub close_count: Arc<AtomicUsize>,
    pub read_count: Arc<AtomicUsize>,
    pub fail_open: Arc<AtomicBool>,
    open: Arc<AtomicBool>,
}

impl MockReaderLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_line(&self, line: &str) {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        self.replies.lock().await.push_back(MockReply::Line(bytes));
    }

    pub async fn push_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    pub async fn push_stale_line(&self, line: &str) {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        self.stale_input.lock().await.push_back(bytes);
    }

    pub async fn sent(&self) -> Vec<Vec<u8>> {
        self.sent_data.lock().await.clone()
    }

    pub fn opens(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReaderLink for MockReaderLink {
    async fn open(&mut self) -> Result<(), BridgeError> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(BridgeError::Transport("Simulated open failure".to_string()));
        }
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BridgeError> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn clear_input(&mut self) -> Result<(), BridgeError> {
        self.stale_input.lock().await.clear();
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), BridgeError> {
        if !self.is_open() {
            return Err(BridgeError::Transport("Port not open".to_string()));
        }
        self.sent_data.lock().await.push(data.to_vec());
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<Vec<u8>>, BridgeError> {
        self.read_count.fetch_add(1, Ordering::SeqCst);
        if let Some(line) = self.stale_input.lock().await.pop_front() {
            return Ok(Some(line));
        }
        match self.replies.lock().await.pop_front() {
            Some(MockReply::Line(line)) => Ok(Some(line)),
            Some(MockReply::Silence) | None => Ok(None),
            Some(MockReply::ReadError(e)) => Err(BridgeError::Transport(e)),
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn link_type(&self) -> &str {
        "Mock"
    }
}
