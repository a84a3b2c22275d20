//! Process runtime shared by binaries: layered configuration, logging,
//! home directory resolution and shutdown signals.

pub mod config;
pub mod home_dir;
pub mod logging;
pub mod shutdown;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, RedisConfig, Section};
pub use logging::init_logging_from_config;
pub use shutdown::{shutdown_token, wait_for_shutdown};
