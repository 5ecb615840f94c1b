//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Record errors (deals, contacts, customers)
//! - 3xx: Config errors
//! - 5xx: LLM / network errors
//! - 6xx: Storage errors
//! - 7xx: Analytics errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for robot mode and REST output.
///
/// Each variant maps to a numeric code (e.g., `NotFound` -> E101) and an
/// HTTP status used by the API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Record errors (1xx)
    // ========================================
    /// E101: Requested record does not exist
    NotFound,
    /// E102: Deal status string is not one of the six board statuses
    InvalidStatus,
    /// E103: Input failed validation
    ValidationFailed,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E301: Config file has invalid syntax or values
    ConfigInvalid,
    /// E302: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // LLM errors (5xx)
    // ========================================
    /// E501: Chat completion request failed
    LlmRequestFailed,
    /// E502: Chat completion response had no usable JSON
    AgentParseError,
    /// E503: Operation timed out
    Timeout,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E601: Database operation failed
    DatabaseError,
    /// E602: Serialization/deserialization failed
    SerializationError,
    /// E603: IO operation failed
    IoError,

    // ========================================
    // Analytics errors (7xx)
    // ========================================
    /// E701: Model has not been trained yet
    ModelNotTrained,
    /// E702: Customer import failed
    ImportFailed,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `NotFound` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::NotFound => 101,
            Self::InvalidStatus => 102,
            Self::ValidationFailed => 103,

            Self::ConfigInvalid => 301,
            Self::ConfigMissingRequired => 302,

            Self::LlmRequestFailed => 501,
            Self::AgentParseError => 502,
            Self::Timeout => 503,

            Self::DatabaseError => 601,
            Self::SerializationError => 602,
            Self::IoError => 603,

            Self::ModelNotTrained => 701,
            Self::ImportFailed => 702,

            Self::InternalError => 901,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// HTTP status the REST layer answers with.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidStatus | Self::ValidationFailed | Self::ImportFailed => 400,
            Self::LlmRequestFailed | Self::AgentParseError => 502,
            Self::Timeout => 504,
            Self::ModelNotTrained | Self::ConfigMissingRequired => 503,
            Self::ConfigInvalid
            | Self::DatabaseError
            | Self::SerializationError
            | Self::IoError
            | Self::InternalError => 500,
        }
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::NotFound => "Check the identifier. Run `sprintboard board` to list deals",
            Self::InvalidStatus => "Use one of: lead, qualified_solution, qualified_delivery, qualified_cso, deal, project",
            Self::ValidationFailed => "Review the request fields and fix each reported issue",
            Self::ConfigInvalid => "Run `sprintboard config` to see current values. Check TOML syntax in config file",
            Self::ConfigMissingRequired => "Set the value in sprintboard.toml or via the matching environment variable",
            Self::LlmRequestFailed => "Check OPENAI_API_KEY and [llm].endpoint, or enable AI_FALLBACK_ENABLED",
            Self::AgentParseError => "The model answered without JSON. Retry or enable AI_FALLBACK_ENABLED",
            Self::Timeout => "Increase [llm].timeout_secs or retry later",
            Self::DatabaseError => "Check that the database path is writable. Run `sprintboard init` to recreate it",
            Self::SerializationError => "The stored data may be corrupted. Check input data for validity",
            Self::IoError => "File operation failed. Check path exists and permissions are correct",
            Self::ModelNotTrained => "Import customer data and run `sprintboard train`",
            Self::ImportFailed => "Check the import file is a JSON array of customer records",
            Self::InternalError => "An unexpected error occurred. Please report this issue with full error output",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SerializationError | Self::InternalError)
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "record",
            3 => "config",
            5 => "llm",
            6 => "storage",
            7 => "analytics",
            9 => "internal",
            _ => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes_match_categories() {
        assert_eq!(ErrorCode::NotFound.category(), "record");
        assert_eq!(ErrorCode::ConfigInvalid.category(), "config");
        assert_eq!(ErrorCode::LlmRequestFailed.category(), "llm");
        assert_eq!(ErrorCode::DatabaseError.category(), "storage");
        assert_eq!(ErrorCode::ModelNotTrained.category(), "analytics");
        assert_eq!(ErrorCode::InternalError.category(), "internal");
    }

    #[test]
    fn code_string_is_prefixed() {
        assert_eq!(ErrorCode::InvalidStatus.code_string(), "E102");
        assert_eq!(ErrorCode::InvalidStatus.to_string(), "E102");
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(ErrorCode::NotFound.http_status(), 404);
        assert_eq!(ErrorCode::InvalidStatus.http_status(), 400);
        assert_eq!(ErrorCode::LlmRequestFailed.http_status(), 502);
        assert_eq!(ErrorCode::DatabaseError.http_status(), 500);
    }

    #[test]
    fn serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::ModelNotTrained).unwrap();
        assert_eq!(json, "\"MODEL_NOT_TRAINED\"");
    }

    #[test]
    fn internal_errors_are_not_recoverable() {
        assert!(!ErrorCode::InternalError.is_recoverable());
        assert!(ErrorCode::NotFound.is_recoverable());
    }
}
