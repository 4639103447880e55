use crate::config::toml_config::TomlConfig;
use crate::config::Settings;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "squares")]
#[command(about = "Scoreline squares boards kept in a local data directory")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, help = "Directory holding the board data")]
    pub data_dir: Option<String>,

    #[arg(long, help = "Season label used in new board references")]
    pub season: Option<String>,

    #[arg(long, help = "Storage key (file name without .json)")]
    pub storage_key: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Buy randomly assigned squares on the active board
    Buy {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "1")]
        quantity: String,
    },
    /// Buy specific squares, e.g. `H3-A7` or `73`
    Pick {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(required = true, num_args = 1..)]
        squares: Vec<String>,
    },
    /// Show the active board
    Grid {
        /// Squares to highlight as selected
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,
        /// Show the buyer of one square
        #[arg(long)]
        show: Option<String>,
    },
    /// Export entries as CSV
    Export {
        /// Board number to export instead of the active board
        #[arg(long, conflicts_with = "all")]
        board: Option<String>,
        #[arg(long)]
        all: bool,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List sold-out boards
    Archive {
        /// Include open and void boards
        #[arg(long, conflicts_with = "refunds")]
        all: bool,
        /// List the entries of voided boards that are owed a refund
        #[arg(long)]
        refunds: bool,
    },
    /// Look up a sold-out board by its 4-digit number
    FindBoard { number: String },
    /// Find squares by username or email
    Search { query: String },
    Kickoff {
        #[command(subcommand)]
        action: KickoffCommand,
    },
    /// Delete all stored boards
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum KickoffCommand {
    /// Set the kickoff time (RFC 3339) of the active board
    Set { at: String },
    /// Apply the kickoff cutoff rule to the active board
    Check {
        /// Evaluate as if it were this time (RFC 3339)
        #[arg(long)]
        now: Option<String>,
    },
}

impl CliConfig {
    /// Reads and validates the `--config` file once; without one, every section is empty.
    pub fn file_config(&self) -> Result<TomlConfig> {
        match &self.config {
            Some(path) => {
                let config = TomlConfig::from_file(path)?;
                config.validate()?;
                Ok(config)
            }
            None => Ok(TomlConfig::default()),
        }
    }

    pub fn settings(&self) -> Result<Settings> {
        self.settings_from(&self.file_config()?)
    }

    /// 預設值 → TOML 檔 → 命令列參數，後者覆蓋前者
    pub fn settings_from(&self, file_config: &TomlConfig) -> Result<Settings> {
        let mut settings = Settings::from_toml(file_config)?;
        if let Some(dir) = &self.data_dir {
            settings.data_dir = dir.clone();
        }
        if let Some(season) = &self.season {
            settings.season_label = season.trim().to_string();
        }
        if let Some(key) = &self.storage_key {
            settings.storage_key = key.clone();
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn json_logs(&self, file_config: &TomlConfig) -> bool {
        self.json_logs || file_config.json_logs()
    }
}
