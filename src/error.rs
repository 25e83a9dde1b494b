//! Error types for the judgement schema engine
//!
//! Validation failures are never errors: they are collected as issues and
//! reported per section. These variants cover everything else.

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema engine errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Invalid schema definition: {0}")]
    InvalidSchema(String),

    #[error("Case not found: {0}")]
    CaseNotFound(String),

    #[error("Invalid case id: {0}")]
    InvalidCaseId(String),

    #[error("Invalid edit path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Field '{0}' is computed and cannot be edited")]
    ComputedField(String),

    #[error("Field '{0}' is not nullable")]
    NotNullable(String),

    #[error("Session is not authorized to {0}")]
    Unauthorized(&'static str),

    #[error("Cannot {action} while the session is {state}")]
    InvalidTransition { action: &'static str, state: String },

    #[error("Verification blocked: {0} section(s) have validation errors")]
    VerificationBlocked(usize),

    #[error("Checksum mismatch for case {case_id}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        case_id: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid format pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),
}
