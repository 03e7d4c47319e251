use anyhow::{Context, Result};
use dvote_core::VotePolicy;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub voting: VotingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/dvote.db?mode=rwc".to_string(),
            max_connections: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    pub policy: VotePolicy,
    pub max_attempts: u32,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            policy: VotePolicy::Reject,
            max_attempts: dvote_core::retry::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

impl Config {
    /// Read `path` (defaults if it does not exist), then apply `DVOTE_*` overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else {
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(addr) = lookup("DVOTE_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }
        if let Some(url) = lookup("DVOTE_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(raw) = lookup("DVOTE_MAX_CONNECTIONS") {
            self.database.max_connections = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid DVOTE_MAX_CONNECTIONS '{raw}'"))?;
        }
        if let Some(raw) = lookup("DVOTE_VOTE_POLICY") {
            self.voting.policy = raw.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(raw) = lookup("DVOTE_MAX_ATTEMPTS") {
            self.voting.max_attempts = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid DVOTE_MAX_ATTEMPTS '{raw}'"))?;
        }
        if let Some(raw) = lookup("DVOTE_LOG_JSON") {
            self.logging.json = matches!(raw.trim(), "1" | "true" | "yes");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.voting.policy, VotePolicy::Reject);
        assert_eq!(config.voting.max_attempts, 3);
        assert_eq!(config.database.max_connections, 8);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [voting]
            policy = "replace"

            [database]
            url = "sqlite::memory:"
            "#,
        )
        .unwrap();
        assert_eq!(config.voting.policy, VotePolicy::Replace);
        assert_eq!(config.voting.max_attempts, 3);
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let parsed = toml::from_str::<Config>("[voting]\npolicy = \"append\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DVOTE_BIND_ADDRESS", "0.0.0.0:9000"),
            ("DVOTE_VOTE_POLICY", "Replace"),
            ("DVOTE_MAX_CONNECTIONS", "2"),
            ("DVOTE_MAX_ATTEMPTS", " 5 "),
            ("DVOTE_LOG_JSON", "true"),
        ]);
        let mut config = Config::default();
        config
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.voting.policy, VotePolicy::Replace);
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.voting.max_attempts, 5);
        assert!(config.logging.json);
    }

    #[test]
    fn bad_env_value_is_an_error() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "DVOTE_MAX_CONNECTIONS").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("DVOTE_MAX_CONNECTIONS"));

        let err = config
            .apply_env(|key| (key == "DVOTE_MAX_ATTEMPTS").then(|| "-1".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("DVOTE_MAX_ATTEMPTS"));
    }
}
