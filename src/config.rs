use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// IANA timezone used for object keys, the duplicate guard, and the
    /// admin view. Stored timestamps stay UTC.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub checkin: CheckinConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    /// Base URL prepended to object keys for display. Without one, photo
    /// locations resolve to file URLs under the storage root.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_storage_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ponto")
        .join("photos")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            public_base_url: None,
        }
    }
}

/// Which duplicate-check-in policy gates submissions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DedupPolicy {
    /// Reject while the user's last check-in is younger than the cooldown.
    #[default]
    Cooldown,
    /// Reject a second check-in on the same local calendar day.
    Daily,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinConfig {
    #[serde(default)]
    pub policy: DedupPolicy,

    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u32,
}

fn default_cooldown_minutes() -> u32 {
    30
}

impl Default for CheckinConfig {
    fn default() -> Self {
        Self {
            policy: DedupPolicy::default(),
            cooldown_minutes: default_cooldown_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Gate for the admin tab. `PONTO_ADMIN_PASSWORD` overrides; with
    /// neither set the admin tab stays locked.
    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_view_limit")]
    pub view_limit: usize,
}

fn default_view_limit() -> usize {
    100
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: None,
            view_limit: default_view_limit(),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ponto")
        .join("ponto.db")
}

fn default_timezone() -> String {
    "America/Belem".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            timezone: default_timezone(),
            storage: StorageConfig::default(),
            checkin: CheckinConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("PONTO_CONFIG") {
            return Self::load_from(&PathBuf::from(path));
        }
        let config_path = Self::config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // First run: write the defaults so there is a file to edit.
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ponto")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Resolve the configured timezone name. An unknown name is a fatal
    /// configuration error.
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        chrono_tz::Tz::from_str(&self.timezone)
            .map_err(|_| anyhow::anyhow!("unknown timezone in config: {}", self.timezone))
    }

    /// Admin password with the environment override applied.
    pub fn admin_password(&self) -> Option<String> {
        std::env::var("PONTO_ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty())
            .or_else(|| self.admin.password.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.timezone, "America/Belem");
        assert_eq!(config.checkin.policy, DedupPolicy::Cooldown);
        assert_eq!(config.checkin.cooldown_minutes, 30);
        assert_eq!(config.admin.view_limit, 100);
        assert!(config.admin.password.is_none());
    }

    #[test]
    fn test_policy_parses_lowercase() {
        let config: Config = toml::from_str("[checkin]\npolicy = \"daily\"\n").unwrap();
        assert_eq!(config.checkin.policy, DedupPolicy::Daily);
    }

    #[test]
    fn test_tz_resolution() {
        let mut config = Config::default();
        assert!(config.tz().is_ok());

        config.timezone = "Not/AZone".to_string();
        assert!(config.tz().is_err());
    }

    #[test]
    fn test_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.timezone, config.timezone);
        assert_eq!(parsed.db_path, config.db_path);
    }
}
