use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::Coordinates;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";
pub const DEFAULT_SCHEDULE: &str = "@daily";
const DATABASE_FILE: &str = "weather.db";

/// Weather API endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,

    /// Request timeout; the HTTP client default applies when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
        }
    }
}

/// Destination database settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; `None` means the platform data directory.
    pub path: Option<PathBuf>,
}

/// When the pipeline runs in `schedule` mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// `@daily` or a cron expression, evaluated in UTC.
    pub cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: DEFAULT_SCHEDULE.to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [api]
/// base_url = "https://api.open-meteo.com"
///
/// [database]
/// path = "/var/lib/weather/weather.db"
///
/// [location]
/// latitude = "51.5074"
/// longitude = "-0.1278"
///
/// [schedule]
/// cron = "@daily"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub location: Coordinates,
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Load config from the default location, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from `path`, or return defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Database file, falling back to the platform data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(DATABASE_FILE)),
        }
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        validate_degrees("latitude", &self.location.latitude, 90.0)?;
        validate_degrees("longitude", &self.location.longitude, 180.0)?;

        let url = reqwest::Url::parse(&self.api.base_url)
            .with_context(|| format!("Invalid API base URL '{}'", self.api.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "API base URL '{}' must use http or https",
                self.api.base_url
            );
        }

        if self.api.timeout_secs == Some(0) {
            bail!("API timeout must be at least one second");
        }

        Ok(())
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weather-etl", "weather-etl")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

fn validate_degrees(name: &str, value: &str, limit: f64) -> Result<()> {
    let degrees: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {name} '{value}': expected decimal degrees"))?;

    if !degrees.is_finite() || degrees.abs() > limit {
        bail!("Invalid {name} '{value}': must be between -{limit} and {limit}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_point_at_open_meteo_and_london() {
        let cfg = Config::default();

        assert_eq!(cfg.api.base_url, "https://api.open-meteo.com");
        assert_eq!(cfg.api.timeout_secs, None);
        assert_eq!(cfg.location, Coordinates::new("51.5074", "-0.1278"));
        assert_eq!(cfg.schedule.cron, "@daily");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [location]
            latitude = "48.8566"
            longitude = "2.3522"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.location, Coordinates::new("48.8566", "2.3522"));
        assert_eq!(cfg.api, ApiConfig::default());
        assert_eq!(cfg.schedule, ScheduleConfig::default());
        assert_eq!(cfg.database.path, None);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.api.timeout_secs = Some(30);
        cfg.database.path = Some(dir.path().join("w.db"));
        cfg.schedule.cron = "0 30 6 * * *".to_string();
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api\nbase_url = 1").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn explicit_database_path_wins() {
        let mut cfg = Config::default();
        cfg.database.path = Some(PathBuf::from("/tmp/x.db"));
        assert_eq!(cfg.database_path().unwrap(), PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let mut cfg = Config::default();
        cfg.location.latitude = "91.0".to_string();

        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn non_numeric_longitude_is_rejected() {
        let mut cfg = Config::default();
        cfg.location.longitude = "west".to_string();

        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid longitude"));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let mut cfg = Config::default();
        cfg.api.base_url = "ftp://example.com".to_string();
        assert!(cfg.validate().is_err());

        cfg.api.base_url = "not a url".to_string();
        assert!(cfg.validate().is_err());
    }
}
