use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub users_file: PathBuf,
    pub wg_config_path: PathBuf,
    pub wg_interface: String,
    pub wifi_device: String,
    pub rate_limit_dir: PathBuf,
    pub session_timeout: Duration,
    pub command_timeout: Duration,
    pub use_sudo: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

fn parse_secs(var: &'static str, raw: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    match raw {
        None => Ok(Duration::from_secs(default)),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::Invalid { var, value }),
        },
    }
}

fn parse_bool(var: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { var, value }),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let or = |var: &str, default: &str| lookup(var).unwrap_or_else(|| default.to_string());

        Ok(Self {
            bind_addr: or("BIND_ADDR", "127.0.0.1:8080"),
            users_file: or("USERS_FILE", "/etc/wgpanel/users.json").into(),
            wg_config_path: or("WG_CONFIG_PATH", "/etc/wireguard/wg0.conf").into(),
            wg_interface: or("WG_INTERFACE", "wg0"),
            wifi_device: or("WIFI_DEVICE", "wlan0"),
            rate_limit_dir: lookup("RATE_LIMIT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            session_timeout: parse_secs("SESSION_TIMEOUT_SECS", lookup("SESSION_TIMEOUT_SECS"), 1800)?,
            command_timeout: parse_secs("COMMAND_TIMEOUT_SECS", lookup("COMMAND_TIMEOUT_SECS"), 10)?,
            use_sudo: parse_bool("USE_SUDO", lookup("USE_SUDO"), true)?,
        })
    }
}
