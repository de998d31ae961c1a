use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsultError {
    #[error("Archive operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error on {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Invalid request body: {message}")]
    InvalidRequestError { message: String },

    #[error("Missing required fields: {}", fields.join(", "))]
    MissingFieldsError { fields: Vec<String> },

    #[error("Patient intake incomplete: {message}")]
    IntakeIncompleteError { message: String },

    #[error("Consultation request declined: {reason}")]
    QueryDeclinedError { reason: String },

    #[error("{provider} request failed (status {status}): {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("No LLM provider is configured")]
    NoProviderError,

    #[error("Not found: {what}")]
    NotFoundError { what: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    Network,
    Provider,
    Storage,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ConsultError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConsultError::ConfigError { .. }
            | ConsultError::MissingConfigError { .. }
            | ConsultError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ConsultError::ValidationError { .. }
            | ConsultError::InvalidRequestError { .. }
            | ConsultError::MissingFieldsError { .. }
            | ConsultError::IntakeIncompleteError { .. }
            | ConsultError::QueryDeclinedError { .. }
            | ConsultError::NotFoundError { .. } => ErrorCategory::Validation,
            ConsultError::HttpError(_) => ErrorCategory::Network,
            ConsultError::ProviderError { .. } | ConsultError::NoProviderError => {
                ErrorCategory::Provider
            }
            ConsultError::IoError(_) | ConsultError::ZipError(_) => ErrorCategory::Storage,
            ConsultError::CsvError(_) | ConsultError::SerializationError(_) => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ConsultError::QueryDeclinedError { .. } => ErrorSeverity::Low,
            ConsultError::HttpError(_)
            | ConsultError::ProviderError { .. }
            | ConsultError::NoProviderError => ErrorSeverity::Medium,
            ConsultError::IoError(_) | ConsultError::ZipError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ConsultError::ConfigError { .. } | ConsultError::InvalidConfigValueError { .. } => {
                "Check consult.toml against the documented options".to_string()
            }
            ConsultError::MissingConfigError { field } => {
                format!("Add '{}' to the configuration file", field)
            }
            ConsultError::ValidationError { field, .. } => {
                format!("Correct the value supplied for '{}'", field)
            }
            ConsultError::InvalidRequestError { .. } => {
                "Send a JSON body with the documented field names and types".to_string()
            }
            ConsultError::MissingFieldsError { fields } => {
                format!("Provide the required fields: {}", fields.join(", "))
            }
            ConsultError::IntakeIncompleteError { .. } => {
                "Complete the patient intake form with `consult-desk intake` first".to_string()
            }
            ConsultError::QueryDeclinedError { .. } => {
                "Rephrase the request around a clinical concern".to_string()
            }
            ConsultError::HttpError(_) => {
                "Check network connectivity and retry the request".to_string()
            }
            ConsultError::ProviderError { provider, .. } => {
                format!("Verify the {} API key and model settings", provider)
            }
            ConsultError::NoProviderError => {
                "Set ANTHROPIC_API_KEY, OPENAI_API_KEY, META_API_KEY or XAI_API_KEY".to_string()
            }
            ConsultError::IoError(_) | ConsultError::ZipError(_) => {
                "Check that the data directory exists and is writable".to_string()
            }
            ConsultError::CsvError(_) | ConsultError::SerializationError(_) => {
                "The stored data may be corrupted; inspect the data directory".to_string()
            }
            ConsultError::NotFoundError { .. } => "List the available entries and retry".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ConsultError::MissingFieldsError { .. } => {
                "Please fill out all required fields.".to_string()
            }
            ConsultError::IntakeIncompleteError { .. } => {
                "Please complete the Patient Intake form before proceeding to consultation."
                    .to_string()
            }
            ConsultError::QueryDeclinedError { .. } => {
                "This request falls outside the scope of a professional clinical consultation."
                    .to_string()
            }
            ConsultError::NoProviderError => {
                "No AI services configured. Some features may be limited.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsultError>;
