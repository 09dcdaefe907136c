use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{MAX_WEEK_OF_MONTH, parse_weekday};
use crate::holidays::{DEFAULT_COUNTRY_CODE, DEFAULT_HOLIDAY_API_URL};

const CONFIG_DIR_NAME: &str = "roster";
const CONFIG_FILE_NAME: &str = "config.toml";
const CURRENT_SCHEMA_VERSION: u32 = 1;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const CONFIG_PATH_ENV: &str = "ROSTER_CONFIG";
pub const HOLIDAY_API_URL_ENV: &str = "ROSTER_HOLIDAY_API_URL";

/// Result returned by [`load_config`], capturing the source and any non-fatal issues.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: FileConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

/// Indicates where the configuration was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No usable configuration file was found; defaults were synthesized.
    Default,
    /// Configuration was read from `config.toml`.
    File,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML serialization error: {0}")]
    Ser(#[from] toml::ser::Error),
}

/// Disk-backed configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "FileConfig::schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub holidays: HolidaySettings,
    #[serde(default)]
    pub defaults: RosterDefaults,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            holidays: HolidaySettings::default(),
            defaults: RosterDefaults::default(),
        }
    }
}

impl FileConfig {
    const fn schema_version() -> u32 {
        CURRENT_SCHEMA_VERSION
    }
}

/// Where and how public holidays are looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidaySettings {
    #[serde(default = "HolidaySettings::default_base_url")]
    pub base_url: String,
    #[serde(default = "HolidaySettings::default_country")]
    pub country: String,
    /// Request timeout handed to the HTTP client; 0 keeps the client default.
    #[serde(default = "HolidaySettings::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HolidaySettings {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            country: Self::default_country(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HolidaySettings {
    fn default_base_url() -> String {
        DEFAULT_HOLIDAY_API_URL.to_string()
    }

    fn default_country() -> String {
        DEFAULT_COUNTRY_CODE.to_string()
    }

    const fn default_timeout_secs() -> u64 {
        DEFAULT_TIMEOUT_SECS
    }

    /// Applies the `ROSTER_HOLIDAY_API_URL` override, if set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var(HOLIDAY_API_URL_ENV) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
        self
    }
}

/// Fallback values for options the caller leaves unspecified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterDefaults {
    #[serde(default = "RosterDefaults::default_weekday")]
    pub weekday: String,
    /// 1-based weeks of the month.
    #[serde(default = "RosterDefaults::default_weeks")]
    pub weeks: Vec<u32>,
    #[serde(default = "RosterDefaults::default_true")]
    pub avoid_holidays: bool,
    #[serde(default = "RosterDefaults::default_true")]
    pub avoid_back_to_back: bool,
    #[serde(default)]
    pub output_dir: Option<String>,
}

impl Default for RosterDefaults {
    fn default() -> Self {
        Self {
            weekday: Self::default_weekday(),
            weeks: Self::default_weeks(),
            avoid_holidays: true,
            avoid_back_to_back: true,
            output_dir: None,
        }
    }
}

impl RosterDefaults {
    fn default_weekday() -> String {
        "tuesday".to_string()
    }

    fn default_weeks() -> Vec<u32> {
        vec![1, 3]
    }

    const fn default_true() -> bool {
        true
    }

    /// Output directory with a leading `~` expanded.
    pub fn output_dir_path(&self) -> Option<PathBuf> {
        self.output_dir
            .as_deref()
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(|dir| PathBuf::from(shellexpand::tilde(dir).into_owned()))
    }
}

/// Path to the configuration directory.
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path to `config.toml`, honouring `ROSTER_CONFIG`.
pub fn config_path() -> PathBuf {
    match env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => {
            PathBuf::from(shellexpand::tilde(path.trim()).into_owned())
        }
        _ => config_directory().join(CONFIG_FILE_NAME),
    }
}

/// Load the configuration from the default location, falling back to defaults.
pub fn load_config() -> ConfigLoadResult {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> ConfigLoadResult {
    let mut warnings = Vec::new();

    if path.exists() {
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str::<FileConfig>(&raw) {
                Ok(cfg) => {
                    let (cfg, mut sanitize_warnings) = sanitize_config(cfg);
                    warnings.append(&mut sanitize_warnings);
                    return ConfigLoadResult {
                        config: cfg,
                        warnings,
                        source: ConfigSource::File,
                    };
                }
                Err(err) => {
                    warnings.push(format!(
                        "Failed to parse {} as TOML: {}. Falling back to defaults.",
                        path.display(),
                        err
                    ));
                }
            },
            Err(err) => {
                warnings.push(format!(
                    "Failed to read {}: {}. Falling back to defaults.",
                    path.display(),
                    err
                ));
            }
        }
    }

    ConfigLoadResult {
        config: FileConfig::default(),
        warnings,
        source: ConfigSource::Default,
    }
}

/// Persist the configuration to the default location.
pub fn save_config(config: &FileConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &FileConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(config)?;
    fs::write(path, serialized)?;
    Ok(())
}

fn sanitize_config(mut config: FileConfig) -> (FileConfig, Vec<String>) {
    let mut warnings = Vec::new();

    if config.schema_version != CURRENT_SCHEMA_VERSION {
        warnings.push(format!(
            "Unknown config schema version {}. Resetting to {}.",
            config.schema_version, CURRENT_SCHEMA_VERSION
        ));
        return (FileConfig::default(), warnings);
    }

    if config.holidays.base_url.trim().is_empty() {
        warnings.push(format!(
            "Holiday base_url is empty. Resetting to {}.",
            DEFAULT_HOLIDAY_API_URL
        ));
        config.holidays.base_url = DEFAULT_HOLIDAY_API_URL.to_string();
    }

    if config.holidays.country.trim().is_empty() {
        warnings.push(format!(
            "Holiday country is empty. Resetting to {}.",
            DEFAULT_COUNTRY_CODE
        ));
        config.holidays.country = DEFAULT_COUNTRY_CODE.to_string();
    }

    if parse_weekday(&config.defaults.weekday).is_err() {
        warnings.push(format!(
            "Default weekday '{}' is not recognised. Resetting to {}.",
            config.defaults.weekday,
            RosterDefaults::default_weekday()
        ));
        config.defaults.weekday = RosterDefaults::default_weekday();
    }

    let (valid, invalid): (Vec<u32>, Vec<u32>) = config
        .defaults
        .weeks
        .iter()
        .copied()
        .partition(|week| (1..=MAX_WEEK_OF_MONTH).contains(week));
    if !invalid.is_empty() {
        warnings.push(format!(
            "Removed default weeks outside 1-{}: {:?}",
            MAX_WEEK_OF_MONTH, invalid
        ));
    }
    let valid: BTreeSet<u32> = valid.into_iter().collect();
    config.defaults.weeks = if valid.is_empty() {
        if invalid.is_empty() {
            warnings.push("Default weeks are empty. Resetting to [1, 3].".to_string());
        }
        RosterDefaults::default_weeks()
    } else {
        valid.into_iter().collect()
    };

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let config = FileConfig::default();
        let raw = toml::to_string_pretty(&config).unwrap();
        let parsed: FileConfig = toml::from_str(&raw).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.holidays.country, "SG");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: FileConfig = toml::from_str("[defaults]\nweekday = \"friday\"\n").unwrap();
        assert_eq!(parsed.defaults.weekday, "friday");
        assert_eq!(parsed.defaults.weeks, vec![1, 3]);
        assert_eq!(parsed.holidays.base_url, DEFAULT_HOLIDAY_API_URL);
    }

    #[test]
    fn test_sanitize_wrong_schema_version() {
        let mut config = FileConfig::default();
        config.schema_version = 999;
        config.defaults.weekday = "friday".to_string();

        let (sanitized, warnings) = sanitize_config(config);

        assert_eq!(sanitized, FileConfig::default());
        assert!(warnings.iter().any(|w| w.contains("schema version")));
    }

    #[test]
    fn test_sanitize_invalid_weeks() {
        let mut config = FileConfig::default();
        config.defaults.weeks = vec![0, 2, 6, 2];

        let (sanitized, warnings) = sanitize_config(config);

        assert_eq!(sanitized.defaults.weeks, vec![2]);
        assert!(warnings.iter().any(|w| w.contains("outside 1-5")));
    }

    #[test]
    fn test_sanitize_unknown_weekday() {
        let mut config = FileConfig::default();
        config.defaults.weekday = "caturday".to_string();

        let (sanitized, warnings) = sanitize_config(config);

        assert_eq!(sanitized.defaults.weekday, "tuesday");
        assert!(warnings.iter().any(|w| w.contains("caturday")));
    }

    #[test]
    fn test_load_config_bad_toml_falls_back() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "schema_version = [").unwrap();

        let result = load_config_from(&path);

        assert_eq!(result.source, ConfigSource::Default);
        assert_eq!(result.config, FileConfig::default());
        assert!(result.warnings.iter().any(|w| w.contains("Failed to parse")));
    }

    #[test]
    fn test_missing_file_is_default_without_warnings() {
        let temp = tempdir().unwrap();
        let result = load_config_from(&temp.path().join("absent.toml"));
        assert_eq!(result.source, ConfigSource::Default);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let mut config = FileConfig::default();
        config.defaults.weeks = vec![2, 4];
        config.holidays.timeout_secs = 3;

        save_config_to(&config, &path).unwrap();
        let result = load_config_from(&path);

        assert_eq!(result.source, ConfigSource::File);
        assert_eq!(result.config, config);
    }

    #[test]
    fn test_output_dir_expands_tilde() {
        let defaults = RosterDefaults {
            output_dir: Some("~/rosters".to_string()),
            ..RosterDefaults::default()
        };
        let path = defaults.output_dir_path().unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with("rosters"));

        let blank = RosterDefaults {
            output_dir: Some("  ".to_string()),
            ..RosterDefaults::default()
        };
        assert!(blank.output_dir_path().is_none());
    }
}
