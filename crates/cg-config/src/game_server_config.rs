use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_GAME_DIRECTORY, DEFAULT_GAME_STARTUP_TIMEOUT_SECS,
    DEFAULT_JAVA_PATH, DEFAULT_SERVER_JAR, DEFAULT_STOP_COMMAND, MAX_STARTUP_TIMEOUT_SECS,
    MIN_STARTUP_TIMEOUT_SECS,
};

use std::path::PathBuf;

use serde::Deserialize;

/// How the game server is launched.
///
/// The command line is assembled as
/// `<java_path> <jvm_args..> -jar <server_jar> <server_args..>`
/// with `directory` as the working directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameServerConfig {
    pub directory: String,
    pub java_path: String,
    pub server_jar: String,
    pub jvm_args: Vec<String>,
    pub server_args: Vec<String>,
    /// Console command written to stdin for a graceful stop (empty = signal only)
    pub stop_command: String,
    pub startup_timeout_secs: u64,
    /// Start the game server when the daemon boots
    pub auto_start: bool,
}

impl Default for GameServerConfig {
    fn default() -> Self {
        Self {
            directory: String::from(DEFAULT_GAME_DIRECTORY),
            java_path: String::from(DEFAULT_JAVA_PATH),
            server_jar: String::from(DEFAULT_SERVER_JAR),
            jvm_args: vec![String::from("-Xms1G"), String::from("-Xmx2G")],
            server_args: vec![String::from("nogui")],
            stop_command: String::from(DEFAULT_STOP_COMMAND),
            startup_timeout_secs: DEFAULT_GAME_STARTUP_TIMEOUT_SECS,
            auto_start: false,
        }
    }
}

impl GameServerConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.java_path.trim().is_empty() {
            return Err(ConfigError::game_server("game_server.java_path cannot be empty"));
        }

        if self.server_jar.trim().is_empty() {
            return Err(ConfigError::game_server("game_server.server_jar cannot be empty"));
        }

        if self.startup_timeout_secs < MIN_STARTUP_TIMEOUT_SECS
            || self.startup_timeout_secs > MAX_STARTUP_TIMEOUT_SECS
        {
            return Err(ConfigError::game_server(format!(
                "game_server.startup_timeout_secs must be {}-{}, got {}",
                MIN_STARTUP_TIMEOUT_SECS, MAX_STARTUP_TIMEOUT_SECS, self.startup_timeout_secs
            )));
        }

        Ok(())
    }

    /// Full argument list passed to the java executable.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = self.jvm_args.clone();
        args.push(String::from("-jar"));
        args.push(self.server_jar.clone());
        args.extend(self.server_args.iter().cloned());
        args
    }

    pub fn directory_path(&self) -> PathBuf {
        PathBuf::from(&self.directory)
    }

    pub fn stop_command(&self) -> Option<&str> {
        let command = self.stop_command.trim();
        (!command.is_empty()).then_some(command)
    }
}
