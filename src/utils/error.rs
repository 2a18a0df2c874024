use thiserror::Error;

#[derive(Error, Debug)]
pub enum SanctError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Filesystem,
    Data,
    Configuration,
}

impl SanctError {
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RequestFailed(_) => ErrorCategory::Network,
            Self::IoError(_) | Self::ZipError(_) => ErrorCategory::Filesystem,
            Self::CsvError(_) | Self::SerializationError(_) | Self::ValidationError { .. } => {
                ErrorCategory::Data
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    /// Short message suitable for the terminal; details stay in the log.
    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => "The cleaning service could not be reached or rejected the request".to_string(),
            ErrorCategory::Filesystem => format!("File operation failed: {}", self),
            ErrorCategory::Data => "The service returned data that could not be understood".to_string(),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check that the API is running and --api-url points at it, then start a new task",
            ErrorCategory::Filesystem => "Check that the file exists and the output directory is writable",
            ErrorCategory::Data => "Make sure the API version matches this client",
            ErrorCategory::Configuration => "Fix the pacing file or command line arguments and retry",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Network => 2,
            ErrorCategory::Data => 2,
            ErrorCategory::Filesystem => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, SanctError>;
