use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration field '{field}' is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Model artifact error: {message}")]
    ArtifactError { message: String },

    #[error("{message}")]
    InferenceError { message: String },
}

pub type Result<T> = std::result::Result<T, RiskError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Artifact,
    Inference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskError {
    pub fn artifact(message: impl Into<String>) -> Self {
        Self::ArtifactError {
            message: message.into(),
        }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::InferenceError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IoError(_) => ErrorCategory::Io,
            Self::SerializationError(_) | Self::ArtifactError { .. } => ErrorCategory::Artifact,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::InferenceError { .. } => ErrorCategory::Inference,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單次請求失敗，服務仍可繼續
            ErrorCategory::Inference => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io | ErrorCategory::Artifact => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::IoError(e) => format!("Unable to read a required file: {}", e),
            Self::SerializationError(e) => format!("Model artifact is not valid JSON: {}", e),
            Self::ConfigValidationError { field, message } => {
                format!("Configuration '{}' is invalid: {}", field, message)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration '{}' is invalid: {}", field, reason)
            }
            Self::MissingConfigError { field } => {
                format!("Configuration '{}' must be provided", field)
            }
            Self::ArtifactError { message } => format!("Model artifact is unusable: {}", message),
            Self::InferenceError { message } => format!("Prediction failed: {}", message),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Io => "Check that the model path exists and is readable",
            ErrorCategory::Configuration => {
                "Review the command line flags, environment variables and TOML config"
            }
            ErrorCategory::Artifact => "Re-export the pipeline artifact and restart the service",
            ErrorCategory::Inference => "Verify the submitted values and try again",
        }
    }
}
