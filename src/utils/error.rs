use crate::core::workflow::WorkflowState;
use crate::domain::model::{AddressList, ErrorMap, Field};
use std::time::Duration;
use thiserror::Error;

/// Repository 呼叫失敗 (含逾時)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("repository call timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("repository backend failure: {message}")]
    Backend { message: String },
}

impl RepositoryError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("validation failed for {} field(s)", .0.len())]
    Validation(ErrorMap),

    #[error("no circuit found with service number: {query}")]
    NotFound { query: String },

    #[error("search query is empty")]
    EmptyQuery,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: WorkflowState,
        action: &'static str,
    },

    #[error("another operation is in flight ({state})")]
    Busy { state: WorkflowState },

    #[error("field {0} is read-only")]
    ReadOnlyField(Field),

    #[error("{list} has no entry at index {index}")]
    AddressIndex { list: AddressList, index: usize },
}

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration parse error: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    WorkflowError(#[from] WorkflowError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Backend,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PortalError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PortalError::IoError(_) | PortalError::SerializationError(_) => ErrorCategory::System,
            PortalError::ConfigParseError(_)
            | PortalError::ConfigValidationError { .. }
            | PortalError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            PortalError::WorkflowError(WorkflowError::Repository(_)) => ErrorCategory::Backend,
            PortalError::WorkflowError(_) => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PortalError::WorkflowError(WorkflowError::NotFound { .. }) => ErrorSeverity::Low,
            PortalError::WorkflowError(WorkflowError::Repository(_))
            | PortalError::WorkflowError(WorkflowError::Busy { .. }) => ErrorSeverity::Medium,
            PortalError::WorkflowError(_)
            | PortalError::ConfigParseError(_)
            | PortalError::ConfigValidationError { .. }
            | PortalError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            PortalError::IoError(_) | PortalError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PortalError::IoError(_) => "Check that the file exists and is readable".to_string(),
            PortalError::SerializationError(_) => "Report this as a bug".to_string(),
            PortalError::ConfigParseError(_) => "Fix the TOML syntax of the configuration file".to_string(),
            PortalError::ConfigValidationError { field, .. }
            | PortalError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}' in the configuration", field)
            }
            PortalError::WorkflowError(e) => match e {
                WorkflowError::Validation(_) => "Correct the listed fields and commit again".to_string(),
                WorkflowError::NotFound { .. } => "Check the service number and search again".to_string(),
                WorkflowError::EmptyQuery => "Enter a service number to search".to_string(),
                WorkflowError::Repository(RepositoryError::Timeout { .. }) => {
                    "The backend is slow; retry or raise workflow.repository_timeout_ms".to_string()
                }
                WorkflowError::Repository(_) => "Retry the operation; the draft was kept".to_string(),
                WorkflowError::Busy { .. } => "Wait for the running operation to finish".to_string(),
                WorkflowError::InvalidTransition { .. } => "Go back and start the action from the right view".to_string(),
                WorkflowError::ReadOnlyField(_) => "This field is assigned by the system".to_string(),
                WorkflowError::AddressIndex { .. } => "Use an existing address entry".to_string(),
            },
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PortalError::WorkflowError(WorkflowError::Validation(errors)) => {
                let details: Vec<String> = errors
                    .iter()
                    .map(|(key, message)| format!("{}: {}", key, message))
                    .collect();
                format!("Validation failed - {}", details.join("; "))
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;
