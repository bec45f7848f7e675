//! Configuration for the echo server and client.
//!
//! Both binaries accept command-line arguments and an optional TOML file.
//! CLI arguments take precedence over config file values, which take
//! precedence over built-in defaults.

use crate::protocol;
use bytes::Bytes;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line arguments for the echo server
#[derive(Parser, Debug, Default)]
#[command(name = "ring-echo-server")]
#[command(version = "0.1.0")]
#[command(about = "Single-session TCP echo server with ring buffer staging", long_about = None)]
pub struct ServerArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0:12345)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Ring buffer capacity in bytes
    #[arg(short = 'b', long)]
    pub capacity: Option<usize>,

    /// Maximum bytes taken per read
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Command-line arguments for the echo client
#[derive(Parser, Debug, Default)]
#[command(name = "ring-echo-client")]
#[command(version = "0.1.0")]
#[command(about = "Scripted TCP client for the ring echo server", long_about = None)]
pub struct ClientArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Server address to connect to (e.g., 127.0.0.1:12345)
    #[arg(short = 'a', long)]
    pub connect: Option<String>,

    /// Message to send; repeat to send several in order
    #[arg(short, long = "message")]
    pub messages: Vec<String>,

    /// Pause between messages in milliseconds
    #[arg(short, long)]
    pub pace_ms: Option<u64>,

    /// Read timeout for acknowledgments in milliseconds (0 = block forever)
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "protocol::default_listen")]
    pub listen: String,
    /// Ring buffer capacity in bytes
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Maximum bytes per read
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Reply written after each read event
    #[serde(default = "default_ack")]
    pub ack: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: protocol::default_listen(),
            capacity: default_capacity(),
            chunk_size: default_chunk_size(),
            ack: default_ack(),
        }
    }
}

/// Client-related configuration
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    /// Server address
    #[serde(default = "protocol::default_connect")]
    pub connect: String,
    /// Scripted messages, sent in order
    #[serde(default = "default_messages")]
    pub messages: Vec<String>,
    /// Pause between messages
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
    /// Maximum bytes taken per acknowledgment read
    #[serde(default = "default_chunk_size")]
    pub response_size: usize,
    /// 0 = OS default
    #[serde(default)]
    pub connect_timeout_ms: u64,
    /// 0 = block indefinitely
    #[serde(default)]
    pub read_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect: protocol::default_connect(),
            messages: default_messages(),
            pace_ms: default_pace_ms(),
            response_size: default_chunk_size(),
            connect_timeout_ms: 0,
            read_timeout_ms: 0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_capacity() -> usize {
    protocol::RING_CAPACITY
}

fn default_chunk_size() -> usize {
    protocol::CHUNK_SIZE
}

fn default_ack() -> String {
    String::from_utf8_lossy(protocol::ACK).into_owned()
}

fn default_messages() -> Vec<String> {
    protocol::SCRIPT.iter().map(|m| m.to_string()).collect()
}

fn default_pace_ms() -> u64 {
    protocol::PACE_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Read and parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        toml::from_str(&contents).map_err(|e| ConfigError::TomlParse(path.to_path_buf(), e))
    }

    fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

/// Final resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub listen: String,
    pub capacity: usize,
    pub chunk_size: usize,
    pub ack: Bytes,
    pub log_level: String,
}

impl ServerSettings {
    /// Load configuration from process arguments and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(ServerArgs::parse())
    }

    /// Merge parsed CLI args with the TOML file they point at.
    pub fn from_args(cli: ServerArgs) -> Result<Self, ConfigError> {
        let toml_config = TomlConfig::load(cli.config.as_deref())?;
        Self::merge(cli, toml_config)
    }

    fn merge(cli: ServerArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let settings = ServerSettings {
            listen: cli.listen.unwrap_or(toml_config.server.listen),
            capacity: cli.capacity.unwrap_or(toml_config.server.capacity),
            chunk_size: cli.chunk_size.unwrap_or(toml_config.server.chunk_size),
            ack: Bytes::from(toml_config.server.ack.into_bytes()),
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        };

        if settings.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be greater than zero"));
        }
        if settings.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be greater than zero"));
        }
        Ok(settings)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: protocol::default_listen(),
            capacity: protocol::RING_CAPACITY,
            chunk_size: protocol::CHUNK_SIZE,
            ack: Bytes::from_static(protocol::ACK),
            log_level: default_log_level(),
        }
    }
}

/// Final resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect: String,
    pub messages: Vec<String>,
    pub pace: Duration,
    pub response_size: usize,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub log_level: String,
}

impl ClientSettings {
    /// Load configuration from process arguments and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(ClientArgs::parse())
    }

    /// Merge parsed CLI args with the TOML file they point at.
    pub fn from_args(cli: ClientArgs) -> Result<Self, ConfigError> {
        let toml_config = TomlConfig::load(cli.config.as_deref())?;
        Self::merge(cli, toml_config)
    }

    fn merge(cli: ClientArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let client = toml_config.client;
        let settings = ClientSettings {
            connect: cli.connect.unwrap_or(client.connect),
            messages: if cli.messages.is_empty() {
                client.messages
            } else {
                cli.messages
            },
            pace: Duration::from_millis(cli.pace_ms.unwrap_or(client.pace_ms)),
            response_size: client.response_size,
            connect_timeout: millis(client.connect_timeout_ms),
            read_timeout: millis(cli.read_timeout_ms.unwrap_or(client.read_timeout_ms)),
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        };

        if settings.response_size == 0 {
            return Err(ConfigError::Invalid("response_size must be greater than zero"));
        }
        Ok(settings)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect: protocol::default_connect(),
            messages: default_messages(),
            pace: Duration::from_millis(protocol::PACE_MS),
            response_size: protocol::CHUNK_SIZE,
            connect_timeout: None,
            read_timeout: None,
            log_level: default_log_level(),
        }
    }
}

/// Zero means "no timeout".
fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    Invalid(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::Invalid(reason) => write!(f, "Invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TomlConfig::default();
        assert_eq!(config.server.listen, "0.0.0.0:12345");
        assert_eq!(config.server.capacity, 1024);
        assert_eq!(config.server.ack, "Message received");
        assert_eq!(config.client.connect, "127.0.0.1:12345");
        assert_eq!(config.client.messages.len(), 3);
        assert_eq!(config.client.pace_ms, 1000);
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [server]
            listen = "127.0.0.1:4000"
            capacity = 4

            [client]
            connect = "127.0.0.1:4000"
            messages = ["one", "two"]
            pace_ms = 0
            read_timeout_ms = 250

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:4000");
        assert_eq!(config.server.capacity, 4);
        assert_eq!(config.server.chunk_size, 1024);
        assert_eq!(config.client.messages, vec!["one", "two"]);
        assert_eq!(config.client.read_timeout_ms, 250);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_overrides_file() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
            [server]
            listen = "127.0.0.1:4000"
            capacity = 4
            [logging]
            level = "debug"
        "#,
        )
        .unwrap();

        let cli = ServerArgs {
            capacity: Some(64),
            log_level: Some("warn".to_string()),
            ..Default::default()
        };

        let settings = ServerSettings::merge(cli, toml_config).unwrap();
        assert_eq!(settings.listen, "127.0.0.1:4000");
        assert_eq!(settings.capacity, 64);
        assert_eq!(settings.log_level, "warn");
        assert_eq!(&settings.ack[..], b"Message received");
    }

    #[test]
    fn test_client_messages_from_cli() {
        let cli = ClientArgs {
            messages: vec!["only".to_string()],
            pace_ms: Some(0),
            ..Default::default()
        };

        let settings = ClientSettings::merge(cli, TomlConfig::default()).unwrap();
        assert_eq!(settings.messages, vec!["only"]);
        assert_eq!(settings.pace, Duration::ZERO);
        assert_eq!(settings.read_timeout, None);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let cli = ServerArgs {
            capacity: Some(0),
            ..Default::default()
        };
        let err = ServerSettings::merge(cli, TomlConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client]\nread_timeout_ms = 500\nconnect_timeout_ms = 100").unwrap();

        let cli = ClientArgs {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let settings = ClientSettings::from_args(cli).unwrap();
        assert_eq!(settings.read_timeout, Some(Duration::from_millis(500)));
        assert_eq!(settings.connect_timeout, Some(Duration::from_millis(100)));
        assert_eq!(settings.connect, "127.0.0.1:12345");
    }

    #[test]
    fn test_missing_file() {
        let cli = ServerArgs {
            config: Some(PathBuf::from("/nonexistent/ring-echo.toml")),
            ..Default::default()
        };
        let err = ServerSettings::from_args(cli).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(..)));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nlisten = ").unwrap();

        let cli = ServerArgs {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let err = ServerSettings::from_args(cli).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(..)));
    }
}
