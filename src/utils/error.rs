use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    ValidationError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load reference data from '{file}': {message}")]
    DataLoadError { file: String, message: String },

    #[error("Failed to render '{url}': {message}")]
    RenderError { url: String, message: String },

    #[error("Extraction failed: {message}")]
    ExtractionError { message: String },

    #[error("Component '{item}' failed validation: {message}")]
    ReconciliationError { item: String, message: String },

    #[error("Failed to persist '{path}': {message}")]
    PersistenceError { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, ScoutError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    ReferenceData,
    Network,
    Rendering,
    Extraction,
    Validation,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScoutError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScoutError::ApiError(_) => ErrorCategory::Network,
            ScoutError::IoError(_) | ScoutError::PersistenceError { .. } => ErrorCategory::Storage,
            ScoutError::SerializationError(_) | ScoutError::ExtractionError { .. } => {
                ErrorCategory::Extraction
            }
            ScoutError::ConfigError { .. }
            | ScoutError::MissingConfigError { .. }
            | ScoutError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            ScoutError::ValidationError { .. } | ScoutError::ReconciliationError { .. } => {
                ErrorCategory::Validation
            }
            ScoutError::DataLoadError { .. } => ErrorCategory::ReferenceData,
            ScoutError::RenderError { .. } => ErrorCategory::Rendering,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一製造商範圍內的錯誤，批次仍會繼續
            ScoutError::RenderError { .. }
            | ScoutError::ExtractionError { .. }
            | ScoutError::ReconciliationError { .. }
            | ScoutError::ApiError(_) => ErrorSeverity::Medium,
            ScoutError::PersistenceError { .. }
            | ScoutError::SerializationError(_)
            | ScoutError::ValidationError { .. } => ErrorSeverity::High,
            ScoutError::IoError(_)
            | ScoutError::ConfigError { .. }
            | ScoutError::MissingConfigError { .. }
            | ScoutError::ConfigValidationError { .. }
            | ScoutError::DataLoadError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 是否屬於可在單一製造商邊界內隔離的錯誤
    pub fn is_manufacturer_scoped(&self) -> bool {
        matches!(
            self,
            ScoutError::RenderError { .. }
                | ScoutError::ExtractionError { .. }
                | ScoutError::ReconciliationError { .. }
                | ScoutError::PersistenceError { .. }
                | ScoutError::ApiError(_)
                | ScoutError::SerializationError(_)
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the command line flags, the TOML config file and ANTHROPIC_API_KEY"
            }
            ErrorCategory::ReferenceData => {
                "Fix Manufacturer.json / component_types.json so every record matches its schema"
            }
            ErrorCategory::Network => "Check network connectivity and the oracle endpoint",
            ErrorCategory::Rendering => "Verify the manufacturer website is reachable",
            ErrorCategory::Extraction => "Re-run later; the model reply was not valid JSON",
            ErrorCategory::Validation => "Inspect the extracted record; a required field is missing or malformed",
            ErrorCategory::Storage => "Check disk space and write permissions of the output directory",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScoutError::MissingConfigError { field } => {
                format!("Missing required setting '{}'", field)
            }
            ScoutError::DataLoadError { file, message } => {
                format!("Reference data in '{}' is invalid: {}", file, message)
            }
            ScoutError::RenderError { url, .. } => format!("Could not open {}", url),
            ScoutError::PersistenceError { path, .. } => format!("Could not write {}", path),
            other => other.to_string(),
        }
    }
}
