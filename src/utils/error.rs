use std::fmt;
use thiserror::Error;

/// 協調器的執行階段，錯誤會標記失敗發生在哪一個階段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtlStage {
    Fetching,
    Parsing,
    Expanding,
    Writing,
}

impl fmt::Display for EtlStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EtlStage::Fetching => "fetching",
            EtlStage::Parsing => "parsing",
            EtlStage::Expanding => "expanding",
            EtlStage::Writing => "writing",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    #[error("Failed to read '{path}': {source}")]
    ReadFailure {
        path: String,
        #[source]
        source: Box<EtlError>,
    },

    #[error("Failed to write '{path}' ({count} partition(s) already written): {source}", count = .written.len())]
    WriteFailure {
        path: String,
        written: Vec<String>,
        #[source]
        source: Box<EtlError>,
    },

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: EtlStage,
        #[source]
        source: Box<EtlError>,
    },

    #[error("Object not found: {path}")]
    NotFound { path: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Columnar encoding error: {message}")]
    ColumnarError { message: String },

    /// Built through [`EtlError::api`] so the request URL (and its access key)
    /// never reaches the message.
    #[error("API request failed: {0}")]
    ApiError(#[source] reqwest::Error),

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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Storage,
    Network,
    Encoding,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn malformed(message: impl Into<String>) -> Self {
        EtlError::MalformedInput {
            message: message.into(),
        }
    }

    pub fn api(error: reqwest::Error) -> Self {
        EtlError::ApiError(error.without_url())
    }

    pub fn at_stage(self, stage: EtlStage) -> Self {
        EtlError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// 失敗的階段（僅在協調器包裝過的錯誤上有值）
    pub fn stage(&self) -> Option<EtlStage> {
        match self {
            EtlError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Strips stage tags and read/write wrappers down to the underlying error.
    pub fn root_cause(&self) -> &EtlError {
        match self {
            EtlError::Stage { source, .. }
            | EtlError::ReadFailure { source, .. }
            | EtlError::WriteFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::Stage { source, .. } => source.category(),
            EtlError::MalformedInput { .. } | EtlError::SerializationError(_) => {
                ErrorCategory::Input
            }
            EtlError::ReadFailure { .. }
            | EtlError::WriteFailure { .. }
            | EtlError::NotFound { .. }
            | EtlError::StorageError { .. }
            | EtlError::IoError(_) => ErrorCategory::Storage,
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::ColumnarError { .. } => ErrorCategory::Encoding,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Storage | ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Encoding => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Re-running the whole invocation is safe: partition writes are full overwrites.
    pub fn is_retryable(&self) -> bool {
        match self {
            EtlError::Stage { source, .. } => source.is_retryable(),
            EtlError::ReadFailure { .. }
            | EtlError::WriteFailure { .. }
            | EtlError::StorageError { .. }
            | EtlError::ApiError(_)
            | EtlError::IoError(_) => true,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Fix the upstream rate snapshot; retrying the same input will fail again",
            ErrorCategory::Storage => "Check storage permissions and connectivity, then re-run the invocation",
            ErrorCategory::Network => "Check the rate API endpoint and access key, then retry",
            ErrorCategory::Encoding => "Inspect the row data; the columnar writer rejected it",
            ErrorCategory::Configuration => "Review the configuration file, flags and environment variables",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.stage() {
            Some(stage) => format!("ETL failed while {}: {}", stage, self.root_cause()),
            None => format!("ETL failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
