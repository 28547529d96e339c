//! Unified Error Type System
//!
//! Closed error taxonomy for the detection and scoring pipeline.
//! Every fallible operation in the crate returns [`Result`], carrying one
//! of six error kinds with enough context to route the failure.
//!
//! ## Error Kinds
//!
//! - **Validation**: schema check failed on load/add (field issues attached)
//! - **Parse**: YAML or source parse failed
//! - **Config**: malformed scanner options or ignore file
//! - **Analysis**: walker/IO failure during a scan
//! - **Migration**: YAML transform or write failed
//! - **NotFound**: id lookup miss (category, pattern, migration)
//!
//! ## Design Principles
//!
//! - Single unified error type (PinataError) for the entire crate
//! - Structured variants with context for better debugging
//! - Kind-based routing so callers can decide warn-and-continue vs abort
//! - No panic/unwrap - all errors are recoverable

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Error Kinds
// =============================================================================

/// Closed taxonomy of error kinds for routing decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Schema validation failed on load or add
    Validation,
    /// YAML/source parse failed
    Parse,
    /// Malformed options or ignore file
    Config,
    /// Walker or IO failure during scan
    Analysis,
    /// YAML transform or write failed during migration
    Migration,
    /// Id lookup miss
    NotFound,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::Parse => write!(f, "PARSE"),
            Self::Config => write!(f, "CONFIG"),
            Self::Analysis => write!(f, "ANALYSIS"),
            Self::Migration => write!(f, "MIGRATION"),
            Self::NotFound => write!(f, "NOT_FOUND"),
        }
    }
}

impl ErrorKind {
    /// Whether a scan should recover from this kind at the file level
    /// (warn and continue) rather than abort the whole run.
    pub fn is_file_recoverable(&self) -> bool {
        matches!(self, Self::Parse | Self::Analysis)
    }
}

// =============================================================================
// Validation Issues
// =============================================================================

/// One field-level issue inside a validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Field or component that failed validation
    pub field: String,
    /// Detailed message
    pub message: String,
    /// Expected value or format
    pub expected: Option<String>,
    /// Actual value received
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationIssue {
    /// Create a new issue for a field
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    /// Add expected/actual values
    pub fn with_comparison(
        mut self,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum PinataError {
    #[error("validation failed for '{subject}' ({} issue(s))", issues.len())]
    Validation {
        subject: String,
        issues: Vec<ValidationIssue>,
    },

    #[error("parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("analysis error: {message}")]
    Analysis {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("migration error: {message}")]
    Migration {
        id: Option<String>,
        message: String,
    },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

pub type Result<T> = std::result::Result<T, PinataError>;

// =============================================================================
// Helper Constructors
// =============================================================================

impl PinataError {
    /// Error kind for routing decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Config(_) => ErrorKind::Config,
            Self::Analysis { .. } => ErrorKind::Analysis,
            Self::Migration { .. } => ErrorKind::Migration,
            Self::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    /// Create a validation error with field issues
    pub fn validation(subject: impl Into<String>, issues: Vec<ValidationIssue>) -> Self {
        Self::Validation {
            subject: subject.into(),
            issues,
        }
    }

    /// Create a parse error with file context
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an analysis error without a path
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis {
            path: None,
            message: message.into(),
        }
    }

    /// Create an analysis error attached to a path
    pub fn analysis_in(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        let path = path.into();
        let message = format!("{}: {}", path.display(), message.into());
        Self::Analysis {
            path: Some(path),
            message,
        }
    }

    /// Create a migration error without a migration id
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration {
            id: None,
            message: message.into(),
        }
    }

    /// Create a migration error for a specific migration id
    pub fn migration_for(id: impl Into<String>, message: impl Into<String>) -> Self {
        let id = id.into();
        let message = format!("[{}] {}", id, message.into());
        Self::Migration {
            id: Some(id),
            message,
        }
    }

    /// Create a not-found error
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Validation issues, when this is a Validation error.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Validation { issues, .. } => issues,
            _ => &[],
        }
    }
}

/// Context extension trait for converting foreign errors into the taxonomy.
pub trait ResultExt<T> {
    /// Map the error into a Parse error at the given path
    fn parse_context(self, path: impl Into<String>) -> Result<T>;

    /// Map the error into an Analysis error at the given path
    fn analysis_context(self, path: impl Into<PathBuf>) -> Result<T>;

    /// Map the error into a Migration error for the given migration id
    fn migration_context(self, id: impl Into<String>) -> Result<T>;

    /// Map the error into a Config error with a description
    fn config_context(self, what: impl Into<String>) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn parse_context(self, path: impl Into<String>) -> Result<T> {
        self.map_err(|e| PinataError::parse(path, e.to_string()))
    }

    fn analysis_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| PinataError::analysis_in(path, e.to_string()))
    }

    fn migration_context(self, id: impl Into<String>) -> Result<T> {
        self.map_err(|e| PinataError::migration_for(id, e.to_string()))
    }

    fn config_context(self, what: impl Into<String>) -> Result<T> {
        self.map_err(|e| PinataError::Config(format!("{}: {}", what.into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::Validation.to_string(), "VALIDATION");
        assert_eq!(ErrorKind::NotFound.to_string(), "NOT_FOUND");
        assert_eq!(ErrorKind::Analysis.to_string(), "ANALYSIS");
    }

    #[test]
    fn test_kind_routing() {
        assert_eq!(
            PinataError::parse("db.py", "bad yaml").kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            PinataError::not_found("category", "sql-injection").kind(),
            ErrorKind::NotFound
        );
        assert!(ErrorKind::Parse.is_file_recoverable());
        assert!(ErrorKind::Analysis.is_file_recoverable());
        assert!(!ErrorKind::Validation.is_file_recoverable());
        assert!(!ErrorKind::Config.is_file_recoverable());
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue::new("id", "must be kebab-case")
            .with_comparison("^[a-z][a-z0-9-]*$", "Bad_Id");
        assert_eq!(issue.to_string(), "id: must be kebab-case");
        assert_eq!(issue.expected.as_deref(), Some("^[a-z][a-z0-9-]*$"));
        assert_eq!(issue.actual.as_deref(), Some("Bad_Id"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = PinataError::validation(
            "sql-injection",
            vec![
                ValidationIssue::new("patterns", "must not be empty"),
                ValidationIssue::new("version", "must be positive"),
            ],
        );
        assert_eq!(
            err.to_string(),
            "validation failed for 'sql-injection' (2 issue(s))"
        );
        assert_eq!(err.issues().len(), 2);
    }

    #[test]
    fn test_not_found_display() {
        let err = PinataError::not_found("category", "missing-cat");
        assert_eq!(err.to_string(), "category not found: missing-cat");
    }

    #[test]
    fn test_result_ext_parse_context() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        let err = io.parse_context("catalog/a.yml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("catalog/a.yml"));
    }
}
