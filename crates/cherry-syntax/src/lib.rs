//! Cherry-picking documentation scanner.
//!
//! Scans source text of any registered language for `@tag` annotations in
//! comments, binds them to the code constructs they document, and tolerates
//! everything else. A scan never fails on input: problems come back as
//! [`Diagnostic`]s next to the [`DocTree`].
//!
//! ```
//! use cherry_syntax::{scan, LanguageSet, TagRegistry};
//!
//! let languages = LanguageSet::builtin();
//! let registry = TagRegistry::standard();
//! let src = "/** @function\n * @param {Array} list */\nfunction filter(list) {}\n";
//! let out = scan(src, "javascript", &languages, &registry).unwrap();
//! let filter = out.tree.root.find("filter").unwrap();
//! assert_eq!(filter.tags.len(), 2);
//! assert!(out.diagnostics.is_empty());
//! ```

pub mod adapter;
pub mod annotation;
mod builder;
pub mod cursor;
pub mod diagnostics;
pub mod grammar;
pub mod options;
pub mod registry;
pub mod scanner;
pub mod span;
pub mod tree;

pub use adapter::{GrammarAdapter, LanguageAdapter};
pub use diagnostics::{Diagnostic, DiagnosticKind, SyntaxError};
pub use grammar::{GrammarSpec, LanguageSet};
pub use options::{ScanOptions, SkipLookahead};
pub use registry::{ArgKind, ArgSlot, Multiplicity, Placement, TagDefinition, TagRegistry};
pub use scanner::{ScanState, Scanner};
pub use span::{Position, Span};
pub use tree::{AnchorKind, AnnotationTag, ArgValue, CodeAnchor, DocNode, DocTree, ScanOutput};

/// Scan `source` as `language_id` with default options.
pub fn scan(
    source: &str,
    language_id: &str,
    languages: &LanguageSet,
    registry: &TagRegistry,
) -> Result<ScanOutput, SyntaxError> {
    scan_with(source, language_id, languages, registry, &ScanOptions::default())
}

/// Scan `source` as `language_id`.
///
/// ## Errors
/// Returns [`SyntaxError::UnknownLanguage`] if `language_id` is not in
/// `languages`. Nothing in `source` itself produces an error.
#[tracing::instrument(skip_all, fields(language = %language_id, bytes = source.len()))]
pub fn scan_with(
    source: &str,
    language_id: &str,
    languages: &LanguageSet,
    registry: &TagRegistry,
    options: &ScanOptions,
) -> Result<ScanOutput, SyntaxError> {
    let grammar = languages
        .get(language_id)
        .ok_or_else(|| SyntaxError::UnknownLanguage(language_id.to_string()))?;
    let scanner = Scanner::new(GrammarAdapter::new(grammar), registry, options.clone());
    Ok(scanner.run(source))
}
