use std::env;
use std::time::Duration;

use crate::error::WarRoomError;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const DISCORD_TOKEN: &str = "DISCORD_TOKEN";
    pub const OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
    pub const OPENROUTER_ENDPOINT: &str = "OPENROUTER_ENDPOINT";
    pub const ROSTER_PATH: &str = "ROSTER_PATH";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const OFFICER_TIMEOUT_SECS: &str = "OFFICER_TIMEOUT_SECS";
    pub const MEMORY_MAX_TOKENS: &str = "MEMORY_MAX_TOKENS";
}

/// Default values
pub mod defaults {
    pub const OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
    pub const ROSTER_PATH: &str = "config/roster.json";
    pub const DATABASE_URL: &str = "./.db/warroom.db";
    pub const OFFICER_TIMEOUT_SECS: u64 = 60;
    pub const MEMORY_MAX_TOKENS: usize = 2000;
}

/// Process-wide settings. Built once in `main` and passed down; never mutated.
#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub openrouter_api_key: String,
    pub openrouter_endpoint: String,
    pub roster_path: String,
    pub database_url: String,
    pub officer_timeout: Duration,
    pub memory_max_tokens: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"<redacted>")
            .field("openrouter_api_key", &"<redacted>")
            .field("openrouter_endpoint", &self.openrouter_endpoint)
            .field("roster_path", &self.roster_path)
            .field("database_url", &self.database_url)
            .field("officer_timeout", &self.officer_timeout)
            .field("memory_max_tokens", &self.memory_max_tokens)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, WarRoomError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WarRoomError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, WarRoomError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| WarRoomError::Config(format!("{} must be set", key)))
        };

        let officer_timeout_secs = match lookup(env_vars::OFFICER_TIMEOUT_SECS) {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                WarRoomError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    env_vars::OFFICER_TIMEOUT_SECS,
                    raw
                ))
            })?,
            None => defaults::OFFICER_TIMEOUT_SECS,
        };

        let memory_max_tokens = match lookup(env_vars::MEMORY_MAX_TOKENS) {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                WarRoomError::Config(format!(
                    "{} must be a positive integer, got '{}'",
                    env_vars::MEMORY_MAX_TOKENS,
                    raw
                ))
            })?,
            None => defaults::MEMORY_MAX_TOKENS,
        };

        Ok(Self {
            discord_token: required(env_vars::DISCORD_TOKEN)?,
            openrouter_api_key: required(env_vars::OPENROUTER_API_KEY)?,
            openrouter_endpoint: lookup(env_vars::OPENROUTER_ENDPOINT)
                .unwrap_or_else(|| defaults::OPENROUTER_ENDPOINT.to_string()),
            roster_path: lookup(env_vars::ROSTER_PATH)
                .unwrap_or_else(|| defaults::ROSTER_PATH.to_string()),
            database_url: lookup(env_vars::DATABASE_URL)
                .unwrap_or_else(|| defaults::DATABASE_URL.to_string()),
            officer_timeout: Duration::from_secs(officer_timeout_secs),
            memory_max_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "discord"),
            ("OPENROUTER_API_KEY", "sk-or"),
        ]))
        .unwrap();

        assert_eq!(config.roster_path, "config/roster.json");
        assert_eq!(config.database_url, "./.db/warroom.db");
        assert_eq!(config.openrouter_endpoint, defaults::OPENROUTER_ENDPOINT);
        assert_eq!(config.officer_timeout, Duration::from_secs(60));
        assert_eq!(config.memory_max_tokens, 2000);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "discord"),
            ("OPENROUTER_API_KEY", "sk-or"),
            ("ROSTER_PATH", "/etc/warroom/roster.json"),
            ("OFFICER_TIMEOUT_SECS", "15"),
            ("MEMORY_MAX_TOKENS", "500"),
        ]))
        .unwrap();

        assert_eq!(config.roster_path, "/etc/warroom/roster.json");
        assert_eq!(config.officer_timeout, Duration::from_secs(15));
        assert_eq!(config.memory_max_tokens, 500);
    }

    #[test]
    fn test_missing_token_is_error() {
        let err = Config::from_lookup(lookup_from(&[("OPENROUTER_API_KEY", "sk-or")])).unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn test_bad_timeout_is_error() {
        let err = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "discord"),
            ("OPENROUTER_API_KEY", "sk-or"),
            ("OFFICER_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OFFICER_TIMEOUT_SECS"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "very-secret"),
            ("OPENROUTER_API_KEY", "sk-or-secret"),
        ]))
        .unwrap();
        let dbg = format!("{:?}", config);
        assert!(!dbg.contains("very-secret"));
        assert!(!dbg.contains("sk-or-secret"));
    }
}
