//! Error handling for sprintboard.
//!
//! This module provides:
//! - [`SbError`]: The main error enum for all sprintboard operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type with suggestion and context

mod codes;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;

/// Main error type for sprintboard operations.
#[derive(Error, Debug)]
pub enum SbError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Carries the user-facing message verbatim ("Deal not found").
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidStatus(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("Could not parse agent response: {0}")]
    AgentParse(String),

    #[error("Model not trained: {0}")]
    ModelNotTrained(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SbError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::InvalidStatus(_) => ErrorCode::InvalidStatus,
            Self::ValidationFailed(_) => ErrorCode::ValidationFailed,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::Llm(_) => ErrorCode::LlmRequestFailed,
            Self::AgentParse(_) => ErrorCode::AgentParseError,
            Self::ModelNotTrained(_) => ErrorCode::ModelNotTrained,
            Self::Import(_) => ErrorCode::ImportFailed,
            Self::Timeout(_) => ErrorCode::Timeout,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            Self::ModelNotTrained(model) => Some(serde_json::json!({ "model": model })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_sb_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "NOT_FOUND")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// Error category (e.g., "record", "config", "llm")
    pub category: String,
}

impl StructuredError {
    /// Create a structured error from an SbError.
    #[must_use]
    pub fn from_sb_error(err: &SbError) -> Self {
        let code = err.code();
        Self {
            code,
            numeric_code: code.numeric(),
            message: err.to_string(),
            suggestion: code.suggestion().to_string(),
            context: err.context(),
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
        }
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&SbError> for StructuredError {
    fn from(err: &SbError) -> Self {
        Self::from_sb_error(err)
    }
}

/// Result type alias using SbError.
pub type Result<T> = std::result::Result<T, SbError>;
