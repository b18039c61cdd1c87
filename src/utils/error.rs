use thiserror::Error;

#[derive(Error, Debug)]
pub enum CargoError {
    #[error("Malformed payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API responded with status {status} from {endpoint}")]
    ApiStatusError { endpoint: String, status: u16 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Payload,
    Source,
    Config,
}

impl CargoError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        CargoError::MalformedPayload {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CargoError::MalformedPayload { .. } | CargoError::SerializationError(_) => {
                ErrorCategory::Payload
            }
            CargoError::ApiError(_) | CargoError::ApiStatusError { .. } | CargoError::IoError(_) => {
                ErrorCategory::Source
            }
            CargoError::ConfigError { .. }
            | CargoError::InvalidConfigValueError { .. }
            | CargoError::MissingConfigError { .. } => ErrorCategory::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, CargoError>;
