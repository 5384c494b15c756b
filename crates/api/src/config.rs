//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use crate::background::{BackgroundConfig, DEFAULT_PING_INTERVAL};

pub const BIND_ADDR_ENV: &str = "OFFLOAD_BIND_ADDR";
pub const PING_INTERVAL_ENV: &str = "OFFLOAD_PING_INTERVAL_MS";
pub const MAX_BODY_BYTES_ENV: &str = "OFFLOAD_MAX_BODY_BYTES";
pub const REQUEST_TIMEOUT_ENV: &str = "OFFLOAD_REQUEST_TIMEOUT_MS";
pub const SLOW_HANDLER_ENV: &str = "OFFLOAD_SLOW_HANDLER_MS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SLOW_HANDLER: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub background: BackgroundConfig,
    /// Deadline attached to every request's lifetime, if any.
    pub request_timeout: Option<Duration>,
    /// How long the demo `/slow` handler works before answering.
    pub slow_handler_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            background: BackgroundConfig::default(),
            request_timeout: None,
            slow_handler_delay: DEFAULT_SLOW_HANDLER,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Unset and blank values take
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = get(BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| invalid(BIND_ADDR_ENV, &bind_addr, e))?;

        let ping_interval = match get(PING_INTERVAL_ENV) {
            Some(v) => non_zero_millis(PING_INTERVAL_ENV, &v)?,
            None => DEFAULT_PING_INTERVAL,
        };

        let max_body_bytes = match get(MAX_BODY_BYTES_ENV) {
            Some(v) => parse_u64(MAX_BODY_BYTES_ENV, &v)?
                .try_into()
                .map_err(|e| invalid(MAX_BODY_BYTES_ENV, &v, e))?,
            None => usize::MAX,
        };

        let request_timeout = get(REQUEST_TIMEOUT_ENV)
            .map(|v| non_zero_millis(REQUEST_TIMEOUT_ENV, &v))
            .transpose()?;

        let slow_handler_delay = match get(SLOW_HANDLER_ENV) {
            Some(v) => Duration::from_millis(parse_u64(SLOW_HANDLER_ENV, &v)?),
            None => DEFAULT_SLOW_HANDLER,
        };

        Ok(Self {
            bind_addr,
            background: BackgroundConfig {
                ping_interval,
                max_body_bytes,
            },
            request_timeout,
            slow_handler_delay,
        })
    }
}

fn invalid(var: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_u64(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|e| invalid(var, value, e))
}

fn non_zero_millis(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match parse_u64(var, value)? {
        0 => Err(ConfigError::Zero { var }),
        ms => Ok(Duration::from_millis(ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();

        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(cfg.background.ping_interval, Duration::from_secs(5));
        assert_eq!(cfg.background.max_body_bytes, usize::MAX);
        assert_eq!(cfg.request_timeout, None);
        assert_eq!(cfg.slow_handler_delay, Duration::from_secs(10));
    }

    #[test]
    fn reads_every_variable() {
        let cfg = config(&[
            (BIND_ADDR_ENV, "127.0.0.1:8081"),
            (PING_INTERVAL_ENV, "250"),
            (MAX_BODY_BYTES_ENV, "1048576"),
            (REQUEST_TIMEOUT_ENV, "30000"),
            (SLOW_HANDLER_ENV, "0"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:8081");
        assert_eq!(cfg.background.ping_interval, Duration::from_millis(250));
        assert_eq!(cfg.background.max_body_bytes, 1_048_576);
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.slow_handler_delay, Duration::ZERO);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = config(&[(PING_INTERVAL_ENV, "  "), (BIND_ADDR_ENV, "")]).unwrap();

        assert_eq!(cfg.background.ping_interval, DEFAULT_PING_INTERVAL);
        assert_eq!(cfg.bind_addr.port(), 3000);
    }

    #[test]
    fn zero_ping_interval_is_rejected() {
        let err = config(&[(PING_INTERVAL_ENV, "0")]).unwrap_err();
        assert_eq!(err, ConfigError::Zero { var: PING_INTERVAL_ENV });
    }

    #[test]
    fn garbage_is_rejected_with_the_variable_name() {
        let err = config(&[(MAX_BODY_BYTES_ENV, "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: MAX_BODY_BYTES_ENV, .. }));

        let err = config(&[(BIND_ADDR_ENV, "not-an-addr")]).unwrap_err();
        assert!(err.to_string().starts_with(BIND_ADDR_ENV));
    }
}
