#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::{CargoConfig, LoggingConfig, MonitorConfig, SourceConfig};
