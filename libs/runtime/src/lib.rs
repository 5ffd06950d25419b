//! Process-level plumbing shared by the partners binaries:
//! layered configuration and logging bootstrap.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{default_logging_config, AppConfig, CliArgs, ClientConfig, LoggingConfig, Section};
