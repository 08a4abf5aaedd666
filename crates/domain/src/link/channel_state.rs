use serde::{Deserialize, Serialize};

/// Lifecycle of the shared serial connection to the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChannelState {
    /// Never opened, or closed on shutdown
    #[default]
    Closed,
    /// Open and usable for command/response exchanges
    Open,
    /// Closed after a read failure, waiting out the cooldown before reopening
    Recovering,
    /// Last open attempt failed; the next command retries the open
    Failed,
}

impl ChannelState {
    /// Check if a command may be written right away
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Check if an open attempt is allowed from this state
    pub fn can_open(&self) -> bool {
        matches!(self, Self::Closed | Self::Recovering | Self::Failed)
    }

    /// Transition after a successful open
    pub fn to_open(&self) -> Result<Self, &'static str> {
        if self.can_open() {
            Ok(Self::Open)
        } else {
            Err("Channel is already open")
        }
    }

    /// Transition after a detected read failure
    pub fn to_recovering(&self) -> Result<Self, &'static str> {
        match self {
            Self::Open => Ok(Self::Recovering),
            _ => Err("Can only start recovery from Open state"),
        }
    }

    /// Transition after a failed open attempt
    pub fn to_failed(&self) -> Self {
        Self::Failed
    }

    /// Transition after an explicit close
    pub fn to_closed(&self) -> Self {
        Self::Closed
    }
}
