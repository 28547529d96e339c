//! Pinata - Pattern-Driven Static Analysis Engine
//!
//! Scans a source tree for known insecurity and reliability
//! anti-patterns, ranks the findings, and computes an aggregate quality
//! score. Used as an embeddable library by CLI front-ends and CI
//! pipelines.
//!
//! ## Pipeline
//!
//! - **Category Store**: loads, validates, indexes, and searches a
//!   catalog of detection categories (declarative YAML rule packs)
//! - **Pattern Matcher**: applies a category's patterns to file content
//!   via regex and tree-sitter AST query backends, with negative-pattern
//!   suppression
//! - **Scanner**: walks a directory tree, separates production from test
//!   files, aggregates matches into ranked gaps, and scores the result
//! - **Category Migrator**: applies ordered, versioned schema
//!   transformations to the on-disk catalog with rollback and integrity
//!   verification
//!
//! ## Quick Start
//!
//! ```ignore
//! use pinata::{CategoryStore, Scanner, ScannerOptions};
//!
//! let mut store = CategoryStore::new();
//! store.load_from_directory("catalog/")?;
//!
//! let scanner = Scanner::new(&store, ScannerOptions::default());
//! let result = scanner.scan("path/to/repo")?;
//! println!("score: {} ({})", result.score.overall, result.score.grade);
//! ```
//!
//! ## Modules
//!
//! - [`types`]: category schema, detection results, reports, errors
//! - [`store`]: in-memory catalog with indices and search
//! - [`matcher`]: regex and AST pattern execution
//! - [`scanner`]: directory walking, gap ranking, coverage, scoring
//! - [`migrate`]: catalog migrations with a persisted journal
//! - [`config`]: layered option loading

pub mod config;
pub mod constants;
pub mod matcher;
pub mod migrate;
pub mod scanner;
pub mod store;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Error Types
pub use types::error::{ErrorKind, PinataError, Result, ResultExt, ValidationIssue};

// Data Model
pub use types::{
    Category, CategoryFilter, CategorySummary, Confidence, DetectionPattern, DetectionResult,
    Domain, Gap, Grade, Language, MatchContext, MatchDetail, PatternType, PinataScore, Priority,
    ScanResult, Severity, TestLevel,
};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

// Store
pub use store::{CategoryStore, SearchHit, SearchOptions, StoreStats};

// Matcher
pub use matcher::{
    FileScanOutcome, GrammarProvider, NativeGrammars, PatternMatcher, SemanticFinding,
    SemanticMatcher,
};

// Scanner
pub use scanner::{CancelFlag, Scanner, ScannerOptions};

// Migrator
pub use migrate::{
    AppliedMigration, CategoryMigrator, IntegrityIssue, MigrateOptions, MigrateOutcome,
    MigrationDefinition, MigrationFailure, MigrationRunResult, MigrationScript, MigrationState,
    RollbackOptions, RollbackOutcome, VerifyReport,
};

// Configuration
pub use config::ConfigLoader;

// =============================================================================
// Test Support
// =============================================================================
