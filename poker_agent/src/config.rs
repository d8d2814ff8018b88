//! Agent configuration management.
//!
//! Consolidates all environment variable reads. Values given on the command
//! line take priority over the environment.

use std::{path::PathBuf, str::FromStr, time::Duration};

use super::net::{messages::ConnectRequest, transport::parse_server_url};

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8765";
pub const DEFAULT_NAME: &str = "pa_bot";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Complete agent configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// WebSocket endpoint, `ws://` or `wss://`
    pub server_url: String,
    pub auth_token: Option<String>,
    /// Name the agent joins under
    pub name: String,
    /// Game to join, if the server hosts several
    pub game_id: Option<String>,
    /// Socket read/write timeout in seconds
    pub timeout_secs: u64,
    /// Seed for agents that make random choices
    pub seed: Option<u64>,
    /// Stop after this many hands
    pub hand_limit: Option<u64>,
    /// Where to write the JSONL message log
    pub message_log: Option<PathBuf>,
}

/// Values supplied on the command line. Each one set wins over its
/// environment variable.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub auth_token: Option<String>,
    pub name: Option<String>,
    pub game_id: Option<String>,
    pub timeout_secs: Option<u64>,
    pub seed: Option<u64>,
    pub hand_limit: Option<u64>,
    pub message_log: Option<PathBuf>,
}

impl AgentConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if an optional numeric variable is set but unparsable
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let server_url = overrides
            .server_url
            .or_else(|| env_string("AGENT_SERVER_URL"))
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let name = overrides
            .name
            .or_else(|| env_string("AGENT_NAME"))
            .unwrap_or_else(|| DEFAULT_NAME.to_string());

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => parse_env_opt("AGENT_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let seed = match overrides.seed {
            Some(seed) => Some(seed),
            None => parse_env_opt("AGENT_SEED")?,
        };
        let hand_limit = match overrides.hand_limit {
            Some(limit) => Some(limit),
            None => parse_env_opt("AGENT_HAND_LIMIT")?,
        };

        Ok(AgentConfig {
            server_url,
            auth_token: overrides.auth_token.or_else(|| env_string("AGENT_AUTH_TOKEN")),
            name,
            game_id: overrides.game_id.or_else(|| env_string("AGENT_GAME_ID")),
            timeout_secs,
            seed,
            hand_limit,
            message_log: overrides
                .message_log
                .or_else(|| env_string("AGENT_MESSAGE_LOG").map(PathBuf::from)),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(error) = parse_server_url(&self.server_url) {
            return Err(ConfigError::Invalid {
                var: "AGENT_SERVER_URL".to_string(),
                reason: error.to_string(),
            });
        }

        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "AGENT_NAME".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "AGENT_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.hand_limit == Some(0) {
            return Err(ConfigError::Invalid {
                var: "AGENT_HAND_LIMIT".to_string(),
                reason: "Must be greater than 0 when set".to_string(),
            });
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Handshake sent when the session opens
    pub fn connect_request(&self) -> ConnectRequest {
        ConnectRequest {
            name: self.name.clone(),
            game: self.game_id.clone(),
            auth_token: self.auth_token.clone(),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Non-empty value of an environment variable
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Helper to parse environment variable with default fallback
fn parse_env_opt<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(key)
        .map(|v| {
            v.parse().map_err(|e: T::Err| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("{v:?}: {e}"),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const VARS: [&str; 8] = [
        "AGENT_SERVER_URL",
        "AGENT_AUTH_TOKEN",
        "AGENT_NAME",
        "AGENT_GAME_ID",
        "AGENT_TIMEOUT_SECS",
        "AGENT_SEED",
        "AGENT_HAND_LIMIT",
        "AGENT_MESSAGE_LOG",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment are serialized
            unsafe { std::env::remove_var(var) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: tests touching the environment are serialized
        unsafe { std::env::set_var(key, value) };
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = AgentConfig::from_env(ConfigOverrides::default()).unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.name, DEFAULT_NAME);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.seed, None);
        assert_eq!(config.auth_token, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_env_values() {
        clear_env();
        set_env("AGENT_SERVER_URL", "wss://poker.example.com/agents");
        set_env("AGENT_AUTH_TOKEN", "secret");
        set_env("AGENT_GAME_ID", "table-7");
        set_env("AGENT_SEED", "42");
        set_env("AGENT_HAND_LIMIT", "100");
        set_env("AGENT_MESSAGE_LOG", "/tmp/messages.jsonl");

        let config = AgentConfig::from_env(ConfigOverrides::default()).unwrap();
        assert_eq!(config.server_url, "wss://poker.example.com/agents");
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.hand_limit, Some(100));
        assert_eq!(config.message_log, Some(PathBuf::from("/tmp/messages.jsonl")));

        let request = config.connect_request();
        assert_eq!(request.game.as_deref(), Some("table-7"));
        assert_eq!(request.auth_token.as_deref(), Some("secret"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides_win() {
        clear_env();
        set_env("AGENT_NAME", "from_env");
        set_env("AGENT_TIMEOUT_SECS", "9");
        let overrides = ConfigOverrides {
            name: Some("from_cli".to_string()),
            timeout_secs: Some(3),
            ..ConfigOverrides::default()
        };
        let config = AgentConfig::from_env(overrides).unwrap();
        assert_eq!(config.name, "from_cli");
        assert_eq!(config.timeout(), Duration::from_secs(3));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparsable_seed() {
        clear_env();
        set_env("AGENT_SEED", "lucky");
        let err = AgentConfig::from_env(ConfigOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("AGENT_SEED"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparsable_timeout() {
        clear_env();
        set_env("AGENT_TIMEOUT_SECS", "soon");
        let err = AgentConfig::from_env(ConfigOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("AGENT_TIMEOUT_SECS"));

        // An explicit override skips the bad variable
        let overrides = ConfigOverrides {
            timeout_secs: Some(7),
            ..ConfigOverrides::default()
        };
        assert_eq!(AgentConfig::from_env(overrides).unwrap().timeout_secs, 7);
        clear_env();
    }

    #[test]
    fn test_validation() {
        let valid = AgentConfig {
            server_url: DEFAULT_SERVER_URL.to_string(),
            auth_token: None,
            name: "bot".to_string(),
            game_id: None,
            timeout_secs: 5,
            seed: None,
            hand_limit: None,
            message_log: None,
        };
        assert!(valid.validate().is_ok());

        let cases = [
            AgentConfig {
                server_url: "http://127.0.0.1".to_string(),
                ..valid.clone()
            },
            AgentConfig {
                name: "  ".to_string(),
                ..valid.clone()
            },
            AgentConfig {
                timeout_secs: 0,
                ..valid.clone()
            },
            AgentConfig {
                hand_limit: Some(0),
                ..valid.clone()
            },
        ];
        for config in cases {
            assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
        }
    }
}
