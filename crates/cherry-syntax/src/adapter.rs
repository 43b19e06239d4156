//! Language adapters — lookahead queries over a grammar spec.
//!
//! Every query inspects the input at the cursor and never consumes it;
//! consumption belongs to the scanner. The matching algorithm is shared by all
//! languages: they differ only in their [`GrammarSpec`] and, optionally, in how
//! an anchor's name is extracted ([`LanguageAdapter::anchor_name`]).

use crate::cursor::ScanCursor;
use crate::grammar::{AnchorName, AnchorRule, AssignmentRule, BodyStyle, GrammarSpec, NameRule};
use crate::tree::AnchorKind;
use regex::Regex;
use std::sync::LazyLock;

// `(a, b) =>`, `async x =>`
static RE_ARROW_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:async\s+)?(?:\([^()]*\)|[A-Za-z_$][\w$]*)\s*(?::[^=]*)?$").unwrap()
});

// Class member shorthand: `static async *name(`, `get name(`
static RE_SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:static|async|get|set|public|private|protected|readonly)\s+)*\*?\s*([A-Za-z_$#][\w$]*)\s*\(")
        .unwrap()
});

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "with", "do", "else", "new",
    "typeof", "await", "yield", "super",
];

/// Which comment form starts at the cursor, by index into the grammar lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentForm {
    Line(usize),
    Block(usize),
}

/// A recognized anchor at a statement start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorMatch {
    pub kind: AnchorKind,
    pub name: String,
    /// Bytes from the cursor to the end of the recognized header.
    pub len: usize,
}

/// Capability contract the scanner is written against.
pub trait LanguageAdapter {
    fn grammar(&self) -> &GrammarSpec;

    /// Does a comment start here?
    fn comment_start(&self, cur: &ScanCursor) -> Option<CommentForm> {
        let g = self.grammar();
        // Block markers first: `/*` must win over a `/` line marker.
        if let Some(i) = g.block_comments.iter().position(|(open, _)| cur.starts_with(open)) {
            return Some(CommentForm::Block(i));
        }
        g.line_comments
            .iter()
            .position(|m| cur.starts_with(m))
            .map(CommentForm::Line)
    }

    /// Length of the comment terminator at the cursor, if the comment ends here.
    /// Line comments end at (without consuming) the newline.
    fn comment_end(&self, cur: &ScanCursor, form: CommentForm) -> Option<usize> {
        match form {
            CommentForm::Line(_) => (cur.peek() == Some('\n')).then_some(0),
            CommentForm::Block(i) => {
                let close = &self.grammar().block_comments[i].1;
                cur.starts_with(close).then(|| close.len())
            }
        }
    }

    /// Index of the string delimiter opening here. Longest match wins.
    fn string_start(&self, cur: &ScanCursor) -> Option<usize> {
        self.grammar()
            .strings
            .iter()
            .enumerate()
            .filter(|(_, d)| cur.starts_with(&d.open))
            .max_by_key(|(_, d)| d.open.len())
            .map(|(i, _)| i)
    }

    /// Length of the closing delimiter of string `delim` at the cursor.
    fn string_end(&self, cur: &ScanCursor, delim: usize) -> Option<usize> {
        let close = &self.grammar().strings[delim].close;
        cur.starts_with(close).then(|| close.len())
    }

    /// Full length of a regex literal starting here, when the grammar has them.
    fn regex_literal(&self, cur: &ScanCursor) -> Option<usize> {
        if !self.grammar().regex_literals || cur.peek() != Some('/') {
            return None;
        }
        let operand_expected = match cur.last_significant() {
            None => true,
            Some(c) => "(,=:[!&|?{};+-*%<>~^".contains(c),
        };
        if !operand_expected {
            return None;
        }
        let line = cur.rest_of_line();
        let mut in_class = false;
        let mut escaped = false;
        for (i, c) in line.char_indices().skip(1) {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => {
                    let flags = line[i + 1..]
                        .chars()
                        .take_while(|c| c.is_ascii_alphabetic())
                        .count();
                    return Some(i + 1 + flags);
                }
                _ => {}
            }
        }
        None
    }

    /// Index of the bracket pair opening here.
    fn block_open(&self, cur: &ScanCursor) -> Option<usize> {
        self.grammar().blocks.iter().position(|b| cur.starts_with(&b.open))
    }

    /// Index of the bracket pair closing here.
    fn block_close(&self, cur: &ScanCursor) -> Option<usize> {
        self.grammar().blocks.iter().position(|b| cur.starts_with(&b.close))
    }

    /// Is the bracket pair `pair` the one that opens anchor bodies?
    fn is_body_pair(&self, pair: usize) -> bool {
        match &self.grammar().body {
            BodyStyle::Braces { open } => self.grammar().blocks[pair].open == *open,
            BodyStyle::Indent { .. } => false,
        }
    }

    /// For indentation grammars: does a body opener (`:` ending the line) sit here?
    fn body_opener(&self, cur: &ScanCursor) -> Option<usize> {
        let g = self.grammar();
        let &BodyStyle::Indent { opener } = &g.body else {
            return None;
        };
        if cur.peek() != Some(opener) {
            return None;
        }
        let after = cur.rest_of_line()[opener.len_utf8()..].trim_start();
        let ends_line =
            after.is_empty() || g.line_comments.iter().any(|m| after.starts_with(m.as_str()));
        ends_line.then(|| opener.len_utf8())
    }

    fn statement_end(&self, cur: &ScanCursor) -> Option<usize> {
        self.grammar()
            .statement_ends
            .iter()
            .find(|s| cur.starts_with(s))
            .map(|s| s.len())
    }

    /// Does an anchor start here? Only called at statement starts.
    ///
    /// `enclosing` is the kind of the anchor whose body holds the cursor.
    fn anchor_at(&self, cur: &ScanCursor, enclosing: Option<AnchorKind>) -> Option<AnchorMatch> {
        let g = self.grammar();
        let text = cur.rest();
        let start = skip_modifiers(g, text);
        let body = &text[start..];

        let found = g
            .anchor_rules
            .iter()
            .find_map(|rule| {
                let after = keyword_len(g, body, &rule.keyword)?;
                let ws = inline_ws_len(&body[after..]);
                let name = self.anchor_name(rule, &body[after + ws..])?;
                Some(AnchorMatch {
                    kind: name.kind.unwrap_or(rule.kind),
                    name: name.name,
                    len: start + after + ws + name.len,
                })
            })
            .or_else(|| {
                let rule = g.assignment.as_ref()?;
                assigned_anchor(g, rule, body).map(|mut m| {
                    m.len += start;
                    m
                })
            })
            .or_else(|| {
                if !g.method_shorthand || enclosing != Some(AnchorKind::Class) {
                    return None;
                }
                let caps = RE_SHORTHAND.captures(text)?;
                let name = caps.get(1)?;
                if CONTROL_KEYWORDS.contains(&name.as_str()) {
                    return None;
                }
                Some(AnchorMatch {
                    kind: AnchorKind::Method,
                    name: name.as_str().to_string(),
                    len: name.end(),
                })
            })?;

        let kind = match (found.kind, enclosing) {
            (AnchorKind::Function, Some(AnchorKind::Class)) => AnchorKind::Method,
            (kind, _) => kind,
        };
        Some(AnchorMatch { kind, ..found })
    }

    /// Extract the anchor name following `rule.keyword`.
    fn anchor_name(&self, rule: &AnchorRule, text: &str) -> Option<AnchorName> {
        let g = self.grammar();
        match rule.name {
            NameRule::FollowingIdent => following_ident(g, rule.kind, text),
            NameRule::AfterReceiver => {
                if !text.starts_with('(') {
                    return following_ident(g, rule.kind, text);
                }
                let close = balanced_len(text, '(', ')')?;
                let ws = inline_ws_len(&text[close..]);
                let len = g.ident_len(&text[close + ws..])?;
                Some(AnchorName {
                    name: text[close + ws..close + ws + len].to_string(),
                    len: close + ws + len,
                    kind: Some(AnchorKind::Method),
                })
            }
            NameRule::Custom(f) => f(text, g),
        }
    }
}

/// The shared adapter: every behavior comes from the grammar.
#[derive(Debug, Clone, Copy)]
pub struct GrammarAdapter<'g> {
    grammar: &'g GrammarSpec,
}

impl<'g> GrammarAdapter<'g> {
    pub fn new(grammar: &'g GrammarSpec) -> Self {
        GrammarAdapter { grammar }
    }
}

impl LanguageAdapter for GrammarAdapter<'_> {
    fn grammar(&self) -> &GrammarSpec {
        self.grammar
    }
}

// -- helpers ------------------------------------------------------------------

fn inline_ws_len(text: &str) -> usize {
    text.len() - text.trim_start_matches([' ', '\t']).len()
}

/// Bytes of `keyword` at the start of `text` when not followed by an ident char.
fn keyword_len(g: &GrammarSpec, text: &str, keyword: &str) -> Option<usize> {
    let rest = text.strip_prefix(keyword)?;
    match rest.chars().next() {
        Some(c) if g.is_ident_continue(c) => None,
        _ => Some(keyword.len()),
    }
}

fn skip_modifiers(g: &GrammarSpec, text: &str) -> usize {
    let mut offset = 0;
    'outer: loop {
        for m in &g.modifiers {
            if let Some(len) = keyword_len(g, &text[offset..], m) {
                let ws = inline_ws_len(&text[offset + len..]);
                if ws > 0 {
                    offset += len + ws;
                    continue 'outer;
                }
            }
        }
        return offset;
    }
}

fn following_ident(g: &GrammarSpec, kind: AnchorKind, text: &str) -> Option<AnchorName> {
    // Generators: `function* name`
    let star = if text.starts_with('*') {
        1 + inline_ws_len(&text[1..])
    } else {
        0
    };
    match g.ident_len(&text[star..]) {
        Some(len) => Some(AnchorName {
            name: text[star..star + len].to_string(),
            len: star + len,
            kind: None,
        }),
        None if matches!(kind, AnchorKind::Function | AnchorKind::Class) => Some(AnchorName {
            name: String::new(),
            len: 0,
            kind: None,
        }),
        None => None,
    }
}

/// Byte length through the bracket closing the one at `text[0]`.
fn balanced_len(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i + c.len_utf8());
            }
        } else if c == '\n' {
            return None;
        }
    }
    None
}

/// `a.b.c = function`, `name: async (x) =>`.
fn assigned_anchor(g: &GrammarSpec, rule: &AssignmentRule, text: &str) -> Option<AnchorMatch> {
    let mut offset = 0;
    let mut segments = 0;
    let mut last;
    loop {
        let len = g.ident_len(&text[offset..])?;
        last = offset..offset + len;
        offset += len;
        segments += 1;
        if text[offset..].starts_with('.') {
            offset += 1;
        } else {
            break;
        }
    }
    offset += inline_ws_len(&text[offset..]);

    let op = rule.operators.iter().find(|op| {
        text[offset..].starts_with(op.as_str())
            && !matches!(text[offset + op.len()..].chars().next(), Some('=' | '>'))
    })?;
    let op_end = offset + op.len();
    let rhs_start = op_end + inline_ws_len(&text[op_end..]);
    let rhs = &text[rhs_start..];

    let value_kind = rule
        .values
        .iter()
        .find(|(kw, _)| keyword_len(g, rhs, kw).is_some())
        .map(|(_, kind)| *kind)
        .or_else(|| {
            let arrow = rule.arrow.as_deref()?;
            let line = rhs.split('\n').next().unwrap_or(rhs);
            let head = &line[..line.find(arrow)?];
            RE_ARROW_HEAD
                .is_match(head.trim_end())
                .then_some(AnchorKind::Function)
        })?;

    let kind = match value_kind {
        AnchorKind::Function if segments > 1 => AnchorKind::Method,
        kind => kind,
    };
    Some(AnchorMatch {
        kind,
        name: text[last].to_string(),
        len: op_end,
    })
}
