mod config;
mod dns_config;
mod error;
mod game_server_config;
mod health_config;
mod log_level;
mod logging_config;
mod process_config;
mod public_access_config;
mod retry_config;
mod tunnel_config;

pub use config::Config;
pub use dns_config::DnsConfig;
pub use error::{ConfigError, ConfigErrorResult};
pub use game_server_config::GameServerConfig;
pub use health_config::HealthConfig;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use process_config::ProcessConfig;
pub use public_access_config::PublicAccessConfig;
pub use retry_config::RetryConfig;
pub use tunnel_config::TunnelConfig;

#[cfg(test)]
mod tests;

const CONFIG_DIR_ENV: &str = "CG_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".craftgate";
const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;

// Game server
const DEFAULT_GAME_DIRECTORY: &str = "server";
const DEFAULT_JAVA_PATH: &str = "java";
const DEFAULT_SERVER_JAR: &str = "server.jar";
const DEFAULT_STOP_COMMAND: &str = "stop";
const DEFAULT_GAME_STARTUP_TIMEOUT_SECS: u64 = 300;

// Tunnel
const DEFAULT_TUNNEL_BINARY: &str = "playit";
const DEFAULT_TUNNEL_STARTUP_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SERVICE_NAME: &str = "minecraft";

// Startup timeouts (shared bounds)
const MIN_STARTUP_TIMEOUT_SECS: u64 = 5;
const MAX_STARTUP_TIMEOUT_SECS: u64 = 1800;
