//! Common infrastructure shared by the dimensioner crates.
//!
//! - [`logging`]: `tracing-subscriber` setup with level, JSON and span options
//! - [`errors`]: infrastructure error type

pub mod errors;
pub mod logging;

pub use errors::types::{Error, Result};
pub use logging::setup::{log_welcome, parse_log_level, setup_logging, LogFormat, LoggingConfig};
