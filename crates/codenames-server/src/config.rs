//! Server configuration

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::clock::RestartWarning;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Live WebSocket connections accepted before upgrades are refused
    pub max_connections: u32,
    /// How long a disconnected player keeps their seat
    pub disconnect_grace: Duration,
    /// How long an empty room survives before it is deleted
    pub room_deletion_grace: Duration,
    /// Seconds of inactivity before a player is kicked
    pub afk_timeout_secs: i64,
    /// Remaining AFK seconds below which warnings are sent
    pub afk_warning_secs: i64,
    /// Daily restart warning, `None` to disable
    pub restart_warning: Option<RestartWarning>,
    /// Frames per second a single socket may send
    pub rate_limit_per_sec: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 2000,
            max_connections: 1000,
            disconnect_grace: Duration::from_secs(600),
            room_deletion_grace: Duration::from_secs(10 * 60 * 60),
            afk_timeout_secs: 10800,
            afk_warning_secs: 300,
            restart_warning: Some(RestartWarning {
                hour: 10,
                minute: 50,
                window_secs: 2,
            }),
            rate_limit_per_sec: 20,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let window_secs = env_or("RESTART_WARNING_WINDOW_SECS", 2);

        let restart_warning = match std::env::var("RESTART_WARNING") {
            Ok(value) if value.eq_ignore_ascii_case("off") => None,
            Ok(value) => match RestartWarning::parse(&value, window_secs) {
                Some(warning) => Some(warning),
                None => {
                    warn!(value = %value, "ignoring malformed RESTART_WARNING, expected HH:MM");
                    defaults.restart_warning
                }
            },
            Err(_) => defaults.restart_warning.map(|w| RestartWarning { window_secs, ..w }),
        };

        Self {
            port: env_or("PORT", defaults.port),
            max_connections: env_or("MAX_CONNECTIONS", defaults.max_connections),
            disconnect_grace: Duration::from_secs(env_or(
                "DISCONNECT_GRACE_SECS",
                defaults.disconnect_grace.as_secs(),
            )),
            room_deletion_grace: Duration::from_secs(env_or(
                "ROOM_DELETION_GRACE_SECS",
                defaults.room_deletion_grace.as_secs(),
            )),
            afk_timeout_secs: env_or("AFK_TIMEOUT_SECS", defaults.afk_timeout_secs),
            afk_warning_secs: env_or("AFK_WARNING_SECS", defaults.afk_warning_secs),
            restart_warning,
            rate_limit_per_sec: env_or("RATE_LIMIT_PER_SEC", defaults.rate_limit_per_sec),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "ignoring unparseable environment variable");
                default
            }
        },
        Err(_) => default,
    }
}
