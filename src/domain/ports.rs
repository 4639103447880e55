use crate::utils::error::Result;
use chrono::{DateTime, Duration, Utc};

/// Key-value persistence shaped like browser local storage: one string blob per key.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

pub trait SettingsProvider {
    fn season_label(&self) -> &str;
    fn storage_key(&self) -> &str;
    fn data_dir(&self) -> &str;
    fn default_kickoff(&self) -> Option<DateTime<Utc>>;
    fn kickoff_cutoff(&self) -> Duration;
}
