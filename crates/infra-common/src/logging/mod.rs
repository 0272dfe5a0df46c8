pub mod setup;

pub use setup::{log_welcome, parse_log_level, setup_logging, LogFormat, LoggingConfig};
