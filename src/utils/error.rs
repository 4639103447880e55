use thiserror::Error;

#[derive(Error, Debug)]
pub enum SquaresError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage error for key '{key}': {message}")]
    StorageError { key: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Not enough squares left: requested {requested}, available {available}")]
    InsufficientSquares { requested: usize, available: usize },

    #[error("Square {square} is already taken")]
    SquareTaken { square: String },

    #[error("Board {reference} is not open ({status})")]
    BoardNotOpen { reference: String, status: String },

    #[error("{what} not found: {query}")]
    NotFound { what: String, query: String },
}

pub type Result<T> = std::result::Result<T, SquaresError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Capacity,
    NotFound,
    Persistence,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SquaresError {
    pub fn validation(message: impl Into<String>) -> Self {
        SquaresError::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SquaresError::ValidationError { .. } => ErrorCategory::Validation,
            SquaresError::InsufficientSquares { .. }
            | SquaresError::SquareTaken { .. }
            | SquaresError::BoardNotOpen { .. } => ErrorCategory::Capacity,
            SquaresError::NotFound { .. } => ErrorCategory::NotFound,
            SquaresError::ConfigError { .. } | SquaresError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            SquaresError::CsvError(_)
            | SquaresError::IoError(_)
            | SquaresError::SerializationError(_)
            | SquaresError::StorageError { .. } => ErrorCategory::Persistence,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::NotFound => ErrorSeverity::Low,
            ErrorCategory::Validation | ErrorCategory::Capacity => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Persistence => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的訊息，不含內部細節
    pub fn user_friendly_message(&self) -> String {
        match self {
            SquaresError::ValidationError { message } => message.clone(),
            SquaresError::InsufficientSquares { available, .. } => {
                format!("Not enough squares left ({} available).", available)
            }
            SquaresError::SquareTaken { square } => {
                format!("Square {} has already been claimed.", square)
            }
            SquaresError::BoardNotOpen { reference, .. } => {
                format!("{} is no longer accepting entries.", reference)
            }
            SquaresError::NotFound { what, query } => format!("{} not found: {}", what, query),
            SquaresError::ConfigError { message } => format!("Configuration problem: {}", message),
            SquaresError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            SquaresError::CsvError(_) => "Could not write the CSV export.".to_string(),
            SquaresError::IoError(_)
            | SquaresError::SerializationError(_)
            | SquaresError::StorageError { .. } => "Could not save board data.".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        if let SquaresError::BoardNotOpen { .. } = self {
            return "Run the kickoff check to settle this board and open a new one.";
        }
        match self.category() {
            ErrorCategory::Validation => "Enter a username, an email and a quantity of at least 1.",
            ErrorCategory::Capacity => "Choose fewer squares or pick squares that are still free.",
            ErrorCategory::NotFound => "Check the board number or search text and try again.",
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags.",
            ErrorCategory::Persistence => "Check that the data directory exists and is writable.",
        }
    }
}
