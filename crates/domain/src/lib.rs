//! Domain layer - Pure bridge model with no I/O
//!
//! This crate contains:
//! - Reader commands, decoded reader responses and bridge outcomes
//! - The operations exposed to the library platform
//! - The serial link port (trait) and its lifecycle states
//! - The bridge error taxonomy
//!
//! Principles:
//! - No dependencies on infrastructure
//! - Every failure mode is a named error variant
//! - Testable in isolation

pub mod error;
pub mod link;
pub mod reader;

// Re-export commonly used types
pub use error::BridgeError;
pub use link::{ChannelState, ReaderLink};
pub use reader::{BridgeResult, Operation, ReaderCommand, ReaderResponse};
