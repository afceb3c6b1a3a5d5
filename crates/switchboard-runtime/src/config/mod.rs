//! Configuration for the Switchboard runtime.
//!
//! Settings are layered with figment: built-in defaults, an optional TOML file
//! and `SWITCHBOARD_*` environment variables.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config};
pub use schema::{LogFormat, LogLevel, LoggingConfig, OffloadConfig, SwitchboardConfig};
