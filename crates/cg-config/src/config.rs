use crate::{
    CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult, DEFAULT_CONFIG_DIR,
    DnsConfig, GameServerConfig, HealthConfig, LoggingConfig, ProcessConfig, PublicAccessConfig,
    RetryConfig, TunnelConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub game_server: GameServerConfig,
    pub tunnel: TunnelConfig,
    pub process: ProcessConfig,
    pub dns: DnsConfig,
    pub retry: RetryConfig,
    pub public_access: PublicAccessConfig,
    pub health: HealthConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration.
    ///
    /// Loading order:
    /// 1. Check for CG_CONFIG_DIR env var, else use ./.craftgate/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply CG_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse a configuration from TOML text (no env overrides).
    pub fn from_toml_str(contents: &str) -> ConfigErrorResult<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::Toml {
            path: PathBuf::from("<inline>"),
            source: e,
        })
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: CG_CONFIG_DIR env var > ./.craftgate/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.game_server.validate()?;
        self.tunnel.validate()?;
        self.process.validate()?;
        self.dns.validate()?;
        self.retry.validate()?;
        self.public_access.validate()?;
        self.health.validate()?;

        Ok(())
    }

    /// Log configuration summary (NEVER logs secrets).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  game_server: dir={}, jar={}, stop_command={:?}, startup_timeout={}s, auto_start={}",
            self.game_server.directory,
            self.game_server.server_jar,
            self.game_server.stop_command,
            self.game_server.startup_timeout_secs,
            self.game_server.auto_start
        );
        info!(
            "  tunnel: binary={}, startup_timeout={}s, service={}",
            self.tunnel.binary_path, self.tunnel.startup_timeout_secs, self.tunnel.service_name
        );
        info!(
            "  process: grace={}s, kill={}s, auto_restart={} (max {}, backoff {}ms)",
            self.process.stop_grace_secs,
            self.process.kill_timeout_secs,
            self.process.auto_restart,
            self.process.max_restart_attempts,
            self.process.restart_backoff_ms
        );
        info!(
            "  dns: domain={}, zone={}, token={}, ttl={}s, propagation={}s/{}s",
            self.dns.base_domain.as_deref().unwrap_or("<unset>"),
            self.dns.zone_id.as_deref().unwrap_or("<unset>"),
            if self.dns.api_token.is_some() {
                "set"
            } else {
                "unset"
            },
            self.dns.default_ttl,
            self.dns.propagation_timeout_secs,
            self.dns.propagation_interval_secs
        );
        info!(
            "  retry: attempts={}, base={}ms, backoff={}x, max={}ms",
            self.retry.max_attempts,
            self.retry.base_delay_ms,
            self.retry.backoff_multiplier,
            self.retry.max_delay_ms
        );
        info!(
            "  public_access: subdomain={}, enable_on_start={}, monitor={}s, auto_recovery={}",
            self.public_access.default_subdomain,
            self.public_access.enable_on_start,
            self.public_access.connectivity_interval_secs,
            self.public_access.auto_recovery
        );
        info!(
            "  health: interval={}s, threshold={}, auto_recovery={}, retention={}h",
            self.health.interval_secs,
            self.health.failure_threshold,
            self.health.auto_recovery,
            self.health.history_retention_hours
        );
        info!("  logging: {}", *self.logging.level);
    }

    fn apply_env_overrides(&mut self) {
        // Game server
        Self::apply_env_string("CG_GAME_DIRECTORY", &mut self.game_server.directory);
        Self::apply_env_string("CG_GAME_JAVA_PATH", &mut self.game_server.java_path);
        Self::apply_env_string("CG_GAME_SERVER_JAR", &mut self.game_server.server_jar);
        Self::apply_env_parse(
            "CG_GAME_STARTUP_TIMEOUT_SECS",
            &mut self.game_server.startup_timeout_secs,
        );
        Self::apply_env_bool("CG_GAME_AUTO_START", &mut self.game_server.auto_start);

        // Tunnel
        Self::apply_env_string("CG_TUNNEL_BINARY", &mut self.tunnel.binary_path);
        Self::apply_env_parse(
            "CG_TUNNEL_STARTUP_TIMEOUT_SECS",
            &mut self.tunnel.startup_timeout_secs,
        );

        // Process
        Self::apply_env_parse("CG_STOP_GRACE_SECS", &mut self.process.stop_grace_secs);
        Self::apply_env_bool("CG_AUTO_RESTART", &mut self.process.auto_restart);
        Self::apply_env_parse(
            "CG_MAX_RESTART_ATTEMPTS",
            &mut self.process.max_restart_attempts,
        );

        // DNS (secrets usually arrive this way)
        Self::apply_env_option_string("CG_DNS_API_TOKEN", &mut self.dns.api_token);
        Self::apply_env_option_string("CG_DNS_ZONE_ID", &mut self.dns.zone_id);
        Self::apply_env_option_string("CG_DNS_BASE_DOMAIN", &mut self.dns.base_domain);
        Self::apply_env_string("CG_DNS_API_BASE_URL", &mut self.dns.api_base_url);
        Self::apply_env_parse("CG_DNS_TTL", &mut self.dns.default_ttl);

        // Retry
        Self::apply_env_parse("CG_RETRY_MAX_ATTEMPTS", &mut self.retry.max_attempts);
        Self::apply_env_parse("CG_RETRY_BASE_DELAY_MS", &mut self.retry.base_delay_ms);

        // Public access
        Self::apply_env_string(
            "CG_PUBLIC_SUBDOMAIN",
            &mut self.public_access.default_subdomain,
        );
        Self::apply_env_bool(
            "CG_PUBLIC_ENABLE_ON_START",
            &mut self.public_access.enable_on_start,
        );

        // Health
        Self::apply_env_parse("CG_HEALTH_INTERVAL_SECS", &mut self.health.interval_secs);
        Self::apply_env_parse(
            "CG_HEALTH_FAILURE_THRESHOLD",
            &mut self.health.failure_threshold,
        );
        Self::apply_env_bool("CG_HEALTH_AUTO_RECOVERY", &mut self.health.auto_recovery);

        // Logging
        Self::apply_env_parse("CG_LOG_LEVEL", &mut self.logging.level);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
