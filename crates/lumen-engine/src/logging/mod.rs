//! Logging utilities.
//!
//! Centralizes logger initialization behind the standard `log` facade so the
//! binary and the engine share one configuration path.

mod init;

pub use init::{LoggingConfig, init_logging};
