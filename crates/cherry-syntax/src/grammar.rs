//! Language grammar specs — the lexical surface of one language as plain data.
//!
//! A [`GrammarSpec`] says where comments, strings and blocks start and end and
//! which statement-leading keywords introduce a named anchor. It carries no
//! behavior of its own; [`crate::adapter::GrammarAdapter`] answers queries
//! against it. Specs are built once and shared read-only by every scan.

use crate::diagnostics::SyntaxError;
use crate::tree::AnchorKind;
use std::collections::BTreeMap;

/// String or char literal delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringDelim {
    pub open: String,
    pub close: String,
    /// `None` for raw literals (Go backticks).
    pub escape: Option<char>,
    /// Single-line literals are force-closed at end of line.
    pub multiline: bool,
}

impl StringDelim {
    fn quoted(q: &str, escape: Option<char>, multiline: bool) -> Self {
        StringDelim {
            open: q.to_string(),
            close: q.to_string(),
            escape,
            multiline,
        }
    }
}

/// A bracket pair such as `(` `)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPair {
    pub open: String,
    pub close: String,
    /// Newlines inside this block start a new statement (`{}` in C-likes).
    pub holds_statements: bool,
}

impl BlockPair {
    fn new(open: &str, close: &str, holds_statements: bool) -> Self {
        BlockPair {
            open: open.to_string(),
            close: close.to_string(),
            holds_statements,
        }
    }
}

/// How an anchor's body is delimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyStyle {
    /// The next occurrence of `open` after the anchor, at the anchor's depth.
    Braces { open: String },
    /// A trailing `opener` on the anchor line; the body lasts while lines are
    /// indented deeper than the anchor line.
    Indent { opener: char },
}

/// Result of a name extraction: the name and how many bytes it consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorName {
    pub name: String,
    pub len: usize,
    /// Overrides the rule's kind (Go receivers turn a function into a method).
    pub kind: Option<AnchorKind>,
}

/// Custom name extraction. Receives the text right after the keyword.
pub type NameFn = fn(&str, &GrammarSpec) -> Option<AnchorName>;

#[derive(Debug, Clone, Copy)]
pub enum NameRule {
    /// `class Foo`, `def foo`, `function* gen`.
    FollowingIdent,
    /// `func (r *Recv) Name` → method, else like `FollowingIdent`.
    AfterReceiver,
    Custom(NameFn),
}

#[derive(Debug, Clone)]
pub struct AnchorRule {
    pub keyword: String,
    pub kind: AnchorKind,
    pub name: NameRule,
}

impl AnchorRule {
    pub fn new(keyword: &str, kind: AnchorKind, name: NameRule) -> Self {
        AnchorRule {
            keyword: keyword.to_string(),
            kind,
            name,
        }
    }
}

/// `name = function …` / `name: function …` anchors, named by the identifier
/// preceding the assignment-like token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRule {
    pub operators: Vec<String>,
    /// Leading keyword of the right-hand side and the anchor kind it yields.
    pub values: Vec<(String, AnchorKind)>,
    /// Arrow token marking a function expression (`(a) => …`).
    pub arrow: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GrammarSpec {
    pub name: String,
    pub extensions: Vec<String>,
    pub line_comments: Vec<String>,
    pub block_comments: Vec<(String, String)>,
    pub strings: Vec<StringDelim>,
    pub blocks: Vec<BlockPair>,
    pub body: BodyStyle,
    pub statement_ends: Vec<String>,
    /// A newline ends the pending statement (Go, Python).
    pub newline_terminates: bool,
    /// Characters allowed in identifiers besides ASCII alphanumerics and `_`.
    pub ident_extra: Vec<char>,
    pub modifiers: Vec<String>,
    pub anchor_rules: Vec<AnchorRule>,
    pub assignment: Option<AssignmentRule>,
    /// `name(…) {` inside a class body is a method (JavaScript classes).
    pub method_shorthand: bool,
    /// `/…/` after an operator is a regex literal, consumed like a string.
    pub regex_literals: bool,
}

fn strs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl GrammarSpec {
    pub fn is_ident_start(&self, c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_' || self.ident_extra.contains(&c)
    }

    pub fn is_ident_continue(&self, c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_' || self.ident_extra.contains(&c)
    }

    /// Length in bytes of the identifier at the start of `text`, if any.
    pub fn ident_len(&self, text: &str) -> Option<usize> {
        let mut chars = text.char_indices();
        match chars.next() {
            Some((_, c)) if self.is_ident_start(c) => {}
            _ => return None,
        }
        let end = chars
            .find(|(_, c)| !self.is_ident_continue(*c))
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        Some(end)
    }

    /// JavaScript family: JS, JSX, TypeScript.
    pub fn javascript() -> Self {
        use AnchorKind::*;
        GrammarSpec {
            name: "javascript".into(),
            extensions: strs(&["js", "mjs", "cjs", "jsx", "ts", "tsx"]),
            line_comments: strs(&["//"]),
            block_comments: vec![("/*".into(), "*/".into())],
            strings: vec![
                StringDelim::quoted("\"", Some('\\'), false),
                StringDelim::quoted("'", Some('\\'), false),
                StringDelim::quoted("`", Some('\\'), true),
            ],
            blocks: vec![
                BlockPair::new("{", "}", true),
                BlockPair::new("(", ")", false),
                BlockPair::new("[", "]", false),
            ],
            body: BodyStyle::Braces { open: "{".into() },
            statement_ends: strs(&[";", ","]),
            newline_terminates: false,
            ident_extra: vec!['$'],
            modifiers: strs(&[
                "export", "default", "async", "static", "var", "let", "const", "declare",
                "abstract",
            ]),
            anchor_rules: vec![
                AnchorRule::new("function", Function, NameRule::FollowingIdent),
                AnchorRule::new("class", Class, NameRule::FollowingIdent),
            ],
            assignment: Some(AssignmentRule {
                operators: strs(&["=", ":"]),
                values: vec![
                    ("function".into(), Function),
                    ("async".into(), Function),
                    ("class".into(), Class),
                ],
                arrow: Some("=>".into()),
            }),
            method_shorthand: true,
            regex_literals: true,
        }
    }

    /// Python family: indentation bodies, `#` comments, triple-quoted strings.
    pub fn python() -> Self {
        use AnchorKind::*;
        GrammarSpec {
            name: "python".into(),
            extensions: strs(&["py", "pyi"]),
            line_comments: strs(&["#"]),
            block_comments: Vec::new(),
            strings: vec![
                StringDelim::quoted("\"\"\"", Some('\\'), true),
                StringDelim::quoted("'''", Some('\\'), true),
                StringDelim::quoted("\"", Some('\\'), false),
                StringDelim::quoted("'", Some('\\'), false),
            ],
            blocks: vec![
                BlockPair::new("(", ")", false),
                BlockPair::new("[", "]", false),
                BlockPair::new("{", "}", false),
            ],
            body: BodyStyle::Indent { opener: ':' },
            statement_ends: strs(&[";"]),
            newline_terminates: true,
            ident_extra: Vec::new(),
            modifiers: strs(&["async"]),
            anchor_rules: vec![
                AnchorRule::new("def", Function, NameRule::FollowingIdent),
                AnchorRule::new("class", Class, NameRule::FollowingIdent),
            ],
            assignment: None,
            method_shorthand: false,
            regex_literals: false,
        }
    }

    /// Go family: brace bodies, raw backtick strings, receiver methods.
    pub fn go() -> Self {
        use AnchorKind::*;
        GrammarSpec {
            name: "go".into(),
            extensions: strs(&["go"]),
            line_comments: strs(&["//"]),
            block_comments: vec![("/*".into(), "*/".into())],
            strings: vec![
                StringDelim::quoted("\"", Some('\\'), false),
                StringDelim::quoted("'", Some('\\'), false),
                StringDelim::quoted("`", None, true),
            ],
            blocks: vec![
                BlockPair::new("{", "}", true),
                BlockPair::new("(", ")", false),
                BlockPair::new("[", "]", false),
            ],
            body: BodyStyle::Braces { open: "{".into() },
            statement_ends: strs(&[";"]),
            newline_terminates: true,
            ident_extra: Vec::new(),
            modifiers: Vec::new(),
            anchor_rules: vec![
                AnchorRule::new("package", Module, NameRule::FollowingIdent),
                AnchorRule::new("func", Function, NameRule::AfterReceiver),
                AnchorRule::new("type", Class, NameRule::FollowingIdent),
                AnchorRule::new("var", Attribute, NameRule::FollowingIdent),
                AnchorRule::new("const", Attribute, NameRule::FollowingIdent),
            ],
            assignment: None,
            method_shorthand: false,
            regex_literals: false,
        }
    }
}

/// Language id → grammar. Read-only once scans start.
#[derive(Debug, Clone, Default)]
pub struct LanguageSet {
    grammars: BTreeMap<String, GrammarSpec>,
}

impl LanguageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// JavaScript, Python and Go.
    pub fn builtin() -> Self {
        let mut set = LanguageSet::new();
        for spec in [GrammarSpec::javascript(), GrammarSpec::python(), GrammarSpec::go()] {
            set.grammars.insert(spec.name.clone(), spec);
        }
        set
    }

    pub fn register(&mut self, spec: GrammarSpec) -> Result<(), SyntaxError> {
        if self.grammars.contains_key(&spec.name) {
            return Err(SyntaxError::DuplicateLanguage(spec.name));
        }
        self.grammars.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&GrammarSpec> {
        self.grammars.get(id)
    }

    /// Grammar registered for a file extension (without the dot).
    pub fn for_extension(&self, ext: &str) -> Option<&GrammarSpec> {
        self.grammars
            .values()
            .find(|g| g.extensions.iter().any(|e| e == ext))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.grammars.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_languages_by_extension() {
        let set = LanguageSet::builtin();
        assert_eq!(set.for_extension("js").map(|g| g.name.as_str()), Some("javascript"));
        assert_eq!(set.for_extension("py").map(|g| g.name.as_str()), Some("python"));
        assert_eq!(set.for_extension("go").map(|g| g.name.as_str()), Some("go"));
        assert!(set.for_extension("sh").is_none());
    }

    #[test]
    fn duplicate_language_rejected() {
        let mut set = LanguageSet::builtin();
        let err = set.register(GrammarSpec::go()).unwrap_err();
        assert_eq!(err, SyntaxError::DuplicateLanguage("go".into()));
    }

    #[test]
    fn register_custom_language() {
        let mut set = LanguageSet::builtin();
        let mut spec = GrammarSpec::javascript();
        spec.name = "qml".into();
        spec.extensions = vec!["qml".into()];
        set.register(spec).unwrap();
        assert!(set.get("qml").is_some());
        assert_eq!(set.names().count(), 4);
    }

    #[test]
    fn ident_len_respects_extra_chars() {
        let js = GrammarSpec::javascript();
        assert_eq!(js.ident_len("$el.find"), Some(3));
        let py = GrammarSpec::python();
        assert_eq!(py.ident_len("$el"), None);
        assert_eq!(py.ident_len("snake_case(x)"), Some(10));
    }
}
