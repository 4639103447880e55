#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::ports::SettingsProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use chrono::{DateTime, Duration, Utc};
use toml_config::TomlConfig;

pub const DEFAULT_SEASON_LABEL: &str = "Superbowl 2026";
/// 儲存格式改變時換新的 key，舊 key 的資料不會被讀取或覆寫
pub const DEFAULT_STORAGE_KEY: &str = "scoreline_squares_full_v2";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_KICKOFF_CUTOFF_MINUTES: i64 = 60;

/// Resolved settings: defaults, then the TOML file, then command-line overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub season_label: String,
    pub storage_key: String,
    pub data_dir: String,
    pub default_kickoff: Option<DateTime<Utc>>,
    pub kickoff_cutoff_minutes: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            season_label: DEFAULT_SEASON_LABEL.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            data_dir: DEFAULT_DATA_DIR.to_string(),
            default_kickoff: None,
            kickoff_cutoff_minutes: DEFAULT_KICKOFF_CUTOFF_MINUTES,
        }
    }
}

impl Settings {
    pub fn from_toml(config: &TomlConfig) -> Result<Self> {
        let mut settings = Settings::default();
        if let Some(label) = config.season_label() {
            settings.season_label = label.trim().to_string();
        }
        if let Some(key) = config.storage_key() {
            settings.storage_key = key.to_string();
        }
        if let Some(dir) = config.data_dir() {
            settings.data_dir = dir.to_string();
        }
        if let Some(minutes) = config.kickoff_cutoff_minutes() {
            settings.kickoff_cutoff_minutes = minutes;
        }
        settings.default_kickoff = config.kickoff_at()?;
        Ok(settings)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("season_label", &self.season_label)?;
        validation::validate_storage_key("storage_key", &self.storage_key)?;
        validation::validate_path("data_dir", &self.data_dir)?;
        validation::validate_positive_number(
            "kickoff_cutoff_minutes",
            self.kickoff_cutoff_minutes,
            0,
        )?;
        Ok(())
    }
}

impl SettingsProvider for Settings {
    fn season_label(&self) -> &str {
        &self.season_label
    }

    fn storage_key(&self) -> &str {
        &self.storage_key
    }

    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn default_kickoff(&self) -> Option<DateTime<Utc>> {
        self.default_kickoff
    }

    fn kickoff_cutoff(&self) -> Duration {
        Duration::minutes(self.kickoff_cutoff_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.season_label(), "Superbowl 2026");
        assert_eq!(settings.storage_key(), "scoreline_squares_full_v2");
        assert_eq!(settings.kickoff_cutoff(), Duration::hours(1));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
[board]
season_label = "  Final 2027 "
kickoff_cutoff_minutes = 30

[storage]
key = "alt_key"
"#,
        )
        .unwrap();

        let settings = Settings::from_toml(&config).unwrap();
        assert_eq!(settings.season_label, "Final 2027");
        assert_eq!(settings.storage_key, "alt_key");
        assert_eq!(settings.data_dir, DEFAULT_DATA_DIR);
        assert_eq!(settings.kickoff_cutoff(), Duration::minutes(30));
    }
}
