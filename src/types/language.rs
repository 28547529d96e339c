//! Language Detection Module
//!
//! **Single source of truth** for scan-language detection across the
//! crate. All extension-to-language mapping MUST go through this module.
//!
//! The set is closed: only languages the catalog can declare patterns for
//! are represented. Files with any other extension are not scanned.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Language Enum Definition
// =============================================================================

/// Languages the detection pipeline can scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Go,
    Java,
    Rust,
}

/// Language metadata entry
struct LanguageMeta {
    /// Wire/display identifier (lowercase, as written in catalogs)
    name: &'static str,
    /// File extensions that map to this language
    extensions: &'static [&'static str],
    /// Whether the AST backend has a grammar for this language
    has_ast_support: bool,
}

impl Language {
    fn meta(&self) -> LanguageMeta {
        match self {
            Language::Python => LanguageMeta {
                name: "python",
                extensions: &["py"],
                has_ast_support: true,
            },
            Language::TypeScript => LanguageMeta {
                name: "typescript",
                extensions: &["ts", "tsx"],
                has_ast_support: true,
            },
            Language::JavaScript => LanguageMeta {
                name: "javascript",
                extensions: &["js", "jsx"],
                has_ast_support: true,
            },
            Language::Go => LanguageMeta {
                name: "go",
                extensions: &["go"],
                has_ast_support: false,
            },
            Language::Java => LanguageMeta {
                name: "java",
                extensions: &["java"],
                has_ast_support: false,
            },
            Language::Rust => LanguageMeta {
                name: "rust",
                extensions: &["rs"],
                has_ast_support: false,
            },
        }
    }

    /// Wire identifier (lowercase)
    pub fn as_str(&self) -> &'static str {
        self.meta().name
    }

    /// Detect language from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext_lower = ext.to_lowercase();
        Self::all()
            .iter()
            .find(|lang| lang.meta().extensions.contains(&ext_lower.as_str()))
            .copied()
    }

    /// Detect language from a file path. `None` means the file is not
    /// scanned for regex or AST patterns.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether the AST backend can parse this language.
    pub fn has_ast_support(&self) -> bool {
        self.meta().has_ast_support
    }

    /// Whether a pattern declared for `self` applies to a file of
    /// `file_language`. TypeScript patterns apply to JavaScript files and
    /// vice versa; otherwise the languages must be equal.
    pub fn applies_to(&self, file_language: Language) -> bool {
        if *self == file_language {
            return true;
        }
        matches!(
            (self, file_language),
            (Language::TypeScript, Language::JavaScript)
                | (Language::JavaScript, Language::TypeScript)
        )
    }

    /// All scannable languages
    pub fn all() -> &'static [Language] {
        &[
            Language::Python,
            Language::TypeScript,
            Language::JavaScript,
            Language::Go,
            Language::Java,
            Language::Rust,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s_lower = s.to_lowercase();
        Self::all()
            .iter()
            .find(|lang| lang.meta().name == s_lower)
            .copied()
            .ok_or(())
    }
}
