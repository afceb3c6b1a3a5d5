//! Switchboard Runtime - the threaded edge of the Switchboard framework.
//!
//! This crate provides:
//! - Background offloading of a handler onto its own worker thread
//!   ([`Buffered`], [`PendingResult`])
//! - The [`SharedContext`] adapter offloaded handlers run against
//! - Configuration loading ([`ConfigLoader`])
//! - Logging setup ([`LoggingBuilder`])
//!
//! Routers stay synchronous: the only thread boundary in a router tree is a
//! `Buffered` wrapper, and every wrapper owns exactly one worker.

pub mod config;
pub mod error;
pub mod logging;
pub mod offload;

pub use config::{ConfigError, ConfigLoader, ConfigResult, OffloadConfig, SwitchboardConfig};
pub use error::{OffloadError, OffloadResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use offload::{Buffered, Outcome, PendingResult, SharedContext};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;
