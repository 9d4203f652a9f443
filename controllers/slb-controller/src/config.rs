//! Controller configuration read from the environment.

use crate::error::ControllerError;
use crate::poller::{PollConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_INTERVAL, DEFAULT_MIN_INTERVAL};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.capitalonline.net";

pub const ENV_API_URL: &str = "SLB_API_URL";
pub const ENV_API_TOKEN: &str = "SLB_API_TOKEN";
pub const ENV_WATCH_NAMESPACE: &str = "WATCH_NAMESPACE";
pub const ENV_POLL_ATTEMPTS: &str = "SLB_TASK_POLL_ATTEMPTS";
pub const ENV_POLL_MIN_INTERVAL_MS: &str = "SLB_TASK_POLL_MIN_INTERVAL_MS";
pub const ENV_POLL_MAX_INTERVAL_MS: &str = "SLB_TASK_POLL_MAX_INTERVAL_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub api_url: String,
    pub api_token: String,
    /// Namespace to watch; all namespaces when unset
    pub namespace: Option<String>,
    pub poll: PollConfig,
}

impl ControllerConfig {
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(ENV_API_URL)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_token = lookup(ENV_API_TOKEN)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                ControllerError::InvalidConfig(format!("{} environment variable is required", ENV_API_TOKEN))
            })?;
        let namespace = lookup(ENV_WATCH_NAMESPACE).filter(|v| !v.trim().is_empty());

        let max_attempts = parse_or(&lookup, ENV_POLL_ATTEMPTS, DEFAULT_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(ControllerError::InvalidConfig(format!("{} must be at least 1", ENV_POLL_ATTEMPTS)));
        }
        let min_interval = parse_or(&lookup, ENV_POLL_MIN_INTERVAL_MS, DEFAULT_MIN_INTERVAL.as_millis() as u64)?;
        let max_interval = parse_or(&lookup, ENV_POLL_MAX_INTERVAL_MS, DEFAULT_MAX_INTERVAL.as_millis() as u64)?;
        if min_interval == 0 {
            return Err(ControllerError::InvalidConfig(format!("{} must be at least 1", ENV_POLL_MIN_INTERVAL_MS)));
        }
        if min_interval > max_interval {
            return Err(ControllerError::InvalidConfig(format!(
                "{} ({}) exceeds {} ({})",
                ENV_POLL_MIN_INTERVAL_MS, min_interval, ENV_POLL_MAX_INTERVAL_MS, max_interval
            )));
        }

        Ok(Self {
            api_url,
            api_token,
            namespace,
            poll: PollConfig {
                max_attempts,
                min_interval: Duration::from_millis(min_interval),
                max_interval: Duration::from_millis(max_interval),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ControllerError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ControllerError::InvalidConfig(format!("{}={:?}: {}", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::from_lookup(lookup(&[(ENV_API_TOKEN, "secret")])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.api_token, "secret");
        assert_eq!(config.namespace, None);
        assert_eq!(config.poll, PollConfig::default());
    }

    #[test]
    fn test_token_required() {
        let err = ControllerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(_)));
    }

    #[test]
    fn test_overrides() {
        let config = ControllerConfig::from_lookup(lookup(&[
            (ENV_API_TOKEN, "secret"),
            (ENV_API_URL, "http://slb.local"),
            (ENV_WATCH_NAMESPACE, "edge"),
            (ENV_POLL_ATTEMPTS, "10"),
            (ENV_POLL_MIN_INTERVAL_MS, "100"),
            (ENV_POLL_MAX_INTERVAL_MS, "200"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "http://slb.local");
        assert_eq!(config.namespace.as_deref(), Some("edge"));
        assert_eq!(config.poll.max_attempts, 10);
        assert_eq!(config.poll.min_interval, Duration::from_millis(100));
        assert_eq!(config.poll.max_interval, Duration::from_millis(200));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        for pairs in [
            vec![(ENV_API_TOKEN, "secret"), (ENV_POLL_ATTEMPTS, "many")],
            vec![(ENV_API_TOKEN, "secret"), (ENV_POLL_ATTEMPTS, "0")],
            vec![(ENV_API_TOKEN, "secret"), (ENV_POLL_MIN_INTERVAL_MS, "9000")],
            vec![(ENV_API_TOKEN, "secret"), (ENV_POLL_MIN_INTERVAL_MS, "0")],
        ] {
            let err = ControllerConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, ControllerError::InvalidConfig(_)), "{:?}", pairs);
        }
    }
}
