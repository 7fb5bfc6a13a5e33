//! Command-line and environment configuration

use clap::Parser;
use std::path::PathBuf;
use tracing::Level as TraceLevel;

use crate::constants::http;
use crate::persistence::ButtonFile;

/// Map marker server: stores, syncs and persists markers placed on a world map
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// JSON file holding the buttons (default: <data dir>/map-markers/buttons_data.json)
    #[arg(long, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long, default_value = http::DEFAULT_BIND)]
    pub bind: String,

    /// Port to bind the HTTP server to
    #[arg(long, default_value_t = http::DEFAULT_PORT)]
    pub port: u16,

    /// Also save the store when the server shuts down
    #[arg(long)]
    pub save_on_exit: bool,

    /// Log level (trace, debug, info, warn, error); overrides LOG_LEVEL
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

/// Resolved server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_file: PathBuf,
    pub bind: String,
    pub port: u16,
    pub save_on_exit: bool,
    pub log_level: TraceLevel,
}

impl ServerConfig {
    pub fn from_cli(cli: Cli) -> Self {
        let level_name = cli
            .log_level
            .or_else(|| std::env::var("LOG_LEVEL").ok())
            .unwrap_or_else(|| "info".to_string());
        Self {
            data_file: cli.data_file.unwrap_or_else(ButtonFile::default_path),
            bind: cli.bind,
            port: cli.port,
            save_on_exit: cli.save_on_exit,
            log_level: parse_log_level(&level_name),
        }
    }
}

/// Unknown names fall back to `INFO`
pub fn parse_log_level(name: &str) -> TraceLevel {
    match name.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("DEBUG"), TraceLevel::DEBUG);
        assert_eq!(parse_log_level("warn"), TraceLevel::WARN);
        assert_eq!(parse_log_level("verbose"), TraceLevel::INFO);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["map-markers", "--log-level", "error"]);
        let config = ServerConfig::from_cli(cli);
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.port, 8050);
        assert!(!config.save_on_exit);
        assert_eq!(config.log_level, TraceLevel::ERROR);
        assert!(config.data_file.ends_with("map-markers/buttons_data.json"));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "map-markers",
            "--data-file",
            "/tmp/markers.json",
            "--port",
            "9000",
            "--save-on-exit",
        ]);
        let config = ServerConfig::from_cli(cli);
        assert_eq!(config.data_file, PathBuf::from("/tmp/markers.json"));
        assert_eq!(config.port, 9000);
        assert!(config.save_on_exit);
    }
}
