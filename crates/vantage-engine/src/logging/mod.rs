//! Logging utilities.
//!
//! The engine only emits through the `log` facade. This module offers a
//! one-call `env_logger` setup for hosts that do not bring their own.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
