use crate::utils::error::{Result, SquaresError};
use crate::utils::validation::{self, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub board: Option<BoardConfig>,
    pub storage: Option<StorageConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    pub season_label: Option<String>,
    /// RFC 3339, e.g. "2026-02-08T23:30:00Z"
    pub kickoff_at: Option<String>,
    pub kickoff_cutoff_minutes: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SquaresError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SquaresError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SQUARES_SEASON})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn season_label(&self) -> Option<&str> {
        self.board.as_ref()?.season_label.as_deref()
    }

    pub fn kickoff_at(&self) -> Result<Option<DateTime<Utc>>> {
        match self.board.as_ref().and_then(|b| b.kickoff_at.as_deref()) {
            Some(raw) => parse_kickoff("board.kickoff_at", raw).map(Some),
            None => Ok(None),
        }
    }

    pub fn kickoff_cutoff_minutes(&self) -> Option<i64> {
        self.board.as_ref()?.kickoff_cutoff_minutes
    }

    pub fn data_dir(&self) -> Option<&str> {
        self.storage.as_ref()?.data_dir.as_deref()
    }

    pub fn storage_key(&self) -> Option<&str> {
        self.storage.as_ref()?.key.as_deref()
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.json)
            .unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if let Some(label) = self.season_label() {
            validation::validate_non_empty_string("board.season_label", label)?;
        }

        self.kickoff_at()?;

        if let Some(minutes) = self.kickoff_cutoff_minutes() {
            validation::validate_positive_number("board.kickoff_cutoff_minutes", minutes, 0)?;
        }

        if let Some(dir) = self.data_dir() {
            validation::validate_path("storage.data_dir", dir)?;
        }

        if let Some(key) = self.storage_key() {
            validation::validate_storage_key("storage.key", key)?;
        }

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

pub fn parse_kickoff(field_name: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SquaresError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: raw.to_string(),
            reason: format!("Expected an RFC 3339 timestamp: {}", e),
        })
}
