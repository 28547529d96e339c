//! Global Constants
//!
//! Centralized policy constants for the detection and scoring pipeline.
//! All magic numbers should be defined here with documentation.

/// Pattern matcher constants
pub mod matcher {
    /// Maximum number of lines rendered into a code snippet
    pub const MAX_SNIPPET_LINES: usize = 5;

    /// Context lines included around a match in a snippet (each side)
    pub const SNIPPET_CONTEXT_LINES: usize = 1;

    /// Width the 1-based line number is right-padded to in snippets
    pub const SNIPPET_LINE_NO_WIDTH: usize = 4;

    /// Maximum file size scanned (10 MiB); larger files are skipped with
    /// a warning
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

    /// Lines of leading context in the negative-pattern window
    pub const NEGATIVE_WINDOW_BEFORE: u32 = 3;

    /// Lines of trailing context in the negative-pattern window
    pub const NEGATIVE_WINDOW_AFTER: u32 = 2;
}

/// Category store constants
pub mod store {
    /// Default result cap for searches
    pub const SEARCH_DEFAULT_LIMIT: usize = 20;

    /// Query/index tokens shorter than this are dropped
    pub const MIN_TOKEN_LEN: usize = 2;

    /// Score for an exact search-index token hit
    pub const EXACT_HIT_SCORE: u32 = 10;

    /// Score per index token that the query token strictly prefixes
    pub const PREFIX_HIT_SCORE: u32 = 5;
}

/// Scoring constants
pub mod scoring {
    /// Base multiplier for every gap penalty
    pub const BASE_PENALTY: f64 = 2.0;

    /// Domain and severity buckets lose double the overall penalty
    pub const BUCKET_PENALTY_FACTOR: f64 = 2.0;

    /// Coverage at or above this earns the large coverage bonus
    pub const COVERAGE_BONUS_HIGH_THRESHOLD: u32 = 90;

    /// Coverage at or above this earns the small coverage bonus
    pub const COVERAGE_BONUS_LOW_THRESHOLD: u32 = 75;

    /// Bonus for coverage >= the high threshold
    pub const COVERAGE_BONUS_HIGH: f64 = 5.0;

    /// Bonus for coverage >= the low threshold
    pub const COVERAGE_BONUS_LOW: f64 = 3.0;

    /// Bonus for zero critical gaps (requires >= 1 evaluated category)
    pub const NO_CRITICAL_BONUS: f64 = 5.0;

    /// Bonus for zero high gaps (requires >= 1 evaluated category)
    pub const NO_HIGH_BONUS: f64 = 3.0;

    /// How many penalty descriptions are retained on the score
    pub const MAX_RETAINED_PENALTIES: usize = 10;

    /// How many top gaps the summary carries
    pub const SUMMARY_TOP_GAPS: usize = 3;
}

/// Scanner constants
pub mod scanner {
    /// Directory base names skipped at any depth by default
    pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
        "node_modules",
        ".git",
        "target",
        "dist",
        "build",
        "__pycache__",
        "vendor",
        ".venv",
        "coverage",
    ];

    /// File extensions scanned by default
    pub const DEFAULT_INCLUDE_EXTENSIONS: &[&str] =
        &["py", "ts", "tsx", "js", "jsx", "go", "java", "rs"];

    /// Ignore file read from the scan root
    pub const IGNORE_FILE_NAME: &str = ".pinataignore";

    /// Built-in test-file glob patterns, all languages
    pub const TEST_FILE_PATTERNS: &[&str] = &[
        "test_*.py",
        "*_test.py",
        "conftest.py",
        "*.test.ts",
        "*.spec.ts",
        "*.test.tsx",
        "*.spec.tsx",
        "*.test.js",
        "*.spec.js",
        "*.test.jsx",
        "*.spec.jsx",
        "*_test.go",
        "*Test.java",
        "*Tests.java",
        "*_test.rs",
    ];

    /// Path components that mark a file as a test file
    pub const TEST_DIR_COMPONENTS: &[&str] = &["test", "tests", "__tests__"];
}

/// Migration constants
pub mod migrate {
    /// Journal file name, at the catalog root
    pub const JOURNAL_FILE_NAME: &str = ".migrations.json";

    /// Cooperative lock file name, at the catalog root
    pub const LOCK_FILE_NAME: &str = ".migrations.lock";

    /// Migrations directory name, under the catalog root
    pub const MIGRATIONS_DIR_NAME: &str = "migrations";

    /// Journal schema version
    pub const JOURNAL_VERSION: u32 = 1;

    /// Version stamped on journal entries by this migrator
    pub const MIGRATOR_VERSION: u32 = 1;

    /// Hex characters kept from the SHA-256 checksum
    pub const CHECKSUM_HEX_LEN: usize = 16;
}
