//! Runtime configuration, read once from the environment at start-up.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// JSON snapshot to load at start-up and save to periodically.
    pub data_file: Option<PathBuf>,
    /// Cookie signing key; 64+ bytes. A random key is used when unset.
    pub session_key: Option<String>,
    /// Token of the admin account, created if missing.
    pub admin_token: Option<String>,
    pub reject_null_group: bool,
    /// Long-poll limit for `/api/view/wait`.
    pub view_wait: Duration,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// HOST, PORT, DATA_FILE, SESSION_KEY, ADMIN_TOKEN, REJECT_NULL_GROUP, VIEW_WAIT_SECS.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT").map(|p| p.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(_)) => {
                log::warn!("PORT is not a valid port number, using {}", default_port());
                default_port()
            }
            None => default_port(),
        };

        let view_wait_secs = non_empty("VIEW_WAIT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(25);

        Self {
            host: non_empty("HOST").unwrap_or_else(default_host),
            port,
            data_file: non_empty("DATA_FILE").map(PathBuf::from),
            session_key: non_empty("SESSION_KEY"),
            admin_token: non_empty("ADMIN_TOKEN"),
            reject_null_group: non_empty("REJECT_NULL_GROUP")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            view_wait: Duration::from_secs(view_wait_secs),
        }
    }
}
