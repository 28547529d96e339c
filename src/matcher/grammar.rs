//! Grammar Provision
//!
//! Tree-sitter grammars are injected into the AST backend through the
//! [`GrammarProvider`] capability rather than probed from the filesystem,
//! so tests and embedders can substitute their own grammar set.

use crate::types::Language;

/// Supplies a tree-sitter grammar per language. `None` means the AST
/// backend skips AST patterns for that language.
pub trait GrammarProvider: Send + Sync {
    fn grammar(&self, language: Language) -> Option<tree_sitter::Language>;
}

/// Default provider backed by the statically linked grammar crates.
/// Exactly python, typescript, and javascript are supported; TypeScript
/// files use the TSX-capable grammar so `.tsx` sources parse too.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeGrammars;

impl GrammarProvider for NativeGrammars {
    fn grammar(&self, language: Language) -> Option<tree_sitter::Language> {
        match language {
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::Go | Language::Java | Language::Rust => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_grammar_coverage() {
        let provider = NativeGrammars;
        assert!(provider.grammar(Language::Python).is_some());
        assert!(provider.grammar(Language::TypeScript).is_some());
        assert!(provider.grammar(Language::JavaScript).is_some());
        assert!(provider.grammar(Language::Go).is_none());
        assert!(provider.grammar(Language::Java).is_none());
        assert!(provider.grammar(Language::Rust).is_none());
    }

    #[test]
    fn test_grammar_parses() {
        let provider = NativeGrammars;
        let grammar = provider.grammar(Language::Python).unwrap();
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&grammar).unwrap();
        let tree = parser.parse("x = 1\n", None).unwrap();
        assert_eq!(tree.root_node().kind(), "module");
    }
}
