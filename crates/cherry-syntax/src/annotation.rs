//! Annotation parser — `@tag` headers and their arguments inside one comment.
//!
//! Works on comment lines already stripped of their markers (`//`, `#`, the
//! `*` gutter of `/** */` blocks). A tag header is `@name` at the start of a
//! line's content; the tag extends to the next header or the comment end.
//!
//! Two argument syntaxes are accepted:
//!
//! - parenthesized: `@param(selector, String) The CSS selector`
//! - words: `@param {String} selector The CSS selector`
//!
//! Anything that does not fit the tag's schema is kept as one raw argument
//! with a `MalformedArgument` diagnostic. Unknown tags are kept too.

use crate::cursor::position_after;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::registry::{ArgKind, ArgSlot, Placement, TagDefinition, TagRegistry};
use crate::span::{Position, Span};
use crate::tree::{AnnotationTag, ArgValue};
use regex::Regex;
use std::sync::LazyLock;

static RE_TAG_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z_][A-Za-z0-9_]*)").unwrap());

static RE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*$").unwrap()
});

/// One line of comment content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    pub text: String,
    /// Source position of `text`'s first byte.
    pub start: Position,
}

/// A run of comment text: one block comment, or consecutive line comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    pub lines: Vec<CommentLine>,
    pub span: Span,
}

/// A parsed tag plus what went wrong parsing it.
#[derive(Debug)]
pub struct ParsedTag {
    pub tag: AnnotationTag,
    pub diagnostics: Vec<Diagnostic>,
    /// Index of the first line after this tag.
    pub next: usize,
}

fn indent_len(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

/// Tag name if `line` opens with a header.
pub fn header_name(line: &CommentLine) -> Option<&str> {
    let content = &line.text[indent_len(&line.text)..];
    RE_TAG_HEADER
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// First line at or after `from` that opens a tag.
pub fn next_header(lines: &[CommentLine], from: usize) -> Option<usize> {
    (from..lines.len()).find(|&i| header_name(&lines[i]).is_some())
}

/// Parse the tag whose header sits on `lines[at]`.
pub fn parse_tag(lines: &[CommentLine], at: usize, registry: &TagRegistry) -> ParsedTag {
    let line = &lines[at];
    let indent = indent_len(&line.text);
    let header = line.text[indent..].trim_end();
    let name = header_name(line).unwrap_or_default().to_string();
    let rest = header.get(1 + name.len()..).unwrap_or_default();
    let end = next_header(lines, at + 1).unwrap_or(lines.len());

    let tag_start = position_after(line.start, &line.text[..indent]);
    let header_span = Span::new(tag_start, position_after(tag_start, header));
    let last = &lines[end - 1];
    let span = Span::new(tag_start, position_after(last.start, last.text.trim_end()));

    let mut diagnostics = Vec::new();
    let def = registry.get(&name);
    if def.is_none() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::UnknownTag,
            header_span,
            format!("unknown tag @{name}"),
        ));
    }

    let (args, header_rest) = match rest.strip_prefix('(') {
        Some(inner) => parenthesized_args(def, &name, inner, header_span, &mut diagnostics),
        None => match def {
            Some(def) => word_args(def, rest, header_span, &mut diagnostics),
            None => (Vec::new(), rest),
        },
    };

    let body = tag_body(header_rest, &lines[at + 1..end]);
    let placement = def.map(|d| d.placement).unwrap_or(Placement::NextAnchor);

    ParsedTag {
        tag: AnnotationTag {
            name,
            args,
            body,
            span,
            placement,
            resolved: false,
        },
        diagnostics,
        next: end,
    }
}

// -- argument forms -----------------------------------------------------------

fn malformed(span: Span, name: &str, why: &str, raw: &str) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::MalformedArgument,
        span,
        format!("@{name}: {why}"),
    )
    .with_recovered(raw)
}

/// `inner` is the header text after the opening `(`.
fn parenthesized_args<'a>(
    def: Option<&TagDefinition>,
    name: &str,
    inner: &'a str,
    span: Span,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Vec<ArgValue>, &'a str) {
    let Some((parts, close)) = split_top_level(inner) else {
        let raw = inner.trim();
        diagnostics.push(malformed(span, name, "unbalanced parentheses", raw));
        return (vec![ArgValue::Raw(raw.to_string())], "");
    };
    let rest = &inner[close + 1..];

    let Some(def) = def else {
        let args = parts.into_iter().map(|p| ArgValue::Raw(p.to_string())).collect();
        return (args, rest);
    };

    match check_slots(def, &parts) {
        Ok(args) => (args, rest),
        Err(why) => {
            let raw = inner[..close].trim();
            diagnostics.push(malformed(span, name, &why, raw));
            (vec![ArgValue::Raw(raw.to_string())], rest)
        }
    }
}

/// Split `a, (b, c), "d,e")…` on top-level commas up to the closing paren.
/// Returns the trimmed parts and the byte index of the closing paren.
fn split_top_level(inner: &str) -> Option<(Vec<&str>, usize)> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut parts = Vec::new();
    let mut part_start = 0;

    for (i, c) in inner.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' | '{' | '<' => depth += 1,
            ']' | '}' | '>' => depth = depth.saturating_sub(1),
            ')' if depth == 0 => {
                parts.push(inner[part_start..i].trim());
                if parts.len() == 1 && parts[0].is_empty() {
                    parts.clear();
                }
                return Some((parts, i));
            }
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(inner[part_start..i].trim());
                part_start = i + 1;
            }
            _ => {}
        }
    }
    None
}

fn unquote(text: &str) -> &str {
    for q in ['"', '\'', '`'] {
        if text.len() >= 2 && text.starts_with(q) && text.ends_with(q) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

fn check_kind(slot: &ArgSlot, text: &str) -> Result<String, String> {
    match slot.kind {
        ArgKind::Identifier if RE_IDENTIFIER.is_match(text) => Ok(text.to_string()),
        ArgKind::Identifier => Err(format!("`{text}` is not an identifier for `{}`", slot.name)),
        ArgKind::String => Ok(unquote(text).to_string()),
        ArgKind::TypeExpression if text.is_empty() => {
            Err(format!("empty type expression for `{}`", slot.name))
        }
        ArgKind::TypeExpression | ArgKind::FreeText => Ok(text.to_string()),
    }
}

fn check_slots(def: &TagDefinition, parts: &[&str]) -> Result<Vec<ArgValue>, String> {
    let slots = &def.slots;
    let required = def.required_arity();
    if parts.len() < required || parts.len() > slots.len() {
        return Err(if required == slots.len() {
            format!("expected {} argument(s), found {}", slots.len(), parts.len())
        } else {
            format!(
                "expected {} to {} arguments, found {}",
                required,
                slots.len(),
                parts.len()
            )
        });
    }
    slots
        .iter()
        .zip(parts)
        .map(|(slot, part)| {
            Ok(ArgValue::Parsed {
                slot: slot.name.clone(),
                kind: slot.kind,
                text: check_kind(slot, part)?,
            })
        })
        .collect()
}

/// Word form. A leading `{…}` group fills the first type slot; other slots take
/// one word each, a free-text slot takes the rest of the line.
fn word_args<'a>(
    def: &TagDefinition,
    rest: &'a str,
    span: Span,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Vec<ArgValue>, &'a str) {
    let mut args = Vec::new();
    let mut text = rest.trim_start();

    let type_slot = def.slots.iter().find(|s| s.kind == ArgKind::TypeExpression);
    if let (Some(slot), Some(inner)) = (type_slot, text.strip_prefix('{')) {
        match inner.find('}') {
            Some(close) => {
                args.push(ArgValue::Parsed {
                    slot: slot.name.clone(),
                    kind: slot.kind,
                    text: inner[..close].trim().to_string(),
                });
                text = inner[close + 1..].trim_start();
            }
            None => {
                let raw = rest.trim();
                diagnostics.push(malformed(span, &def.name, "unclosed `{` in type", raw));
                return (vec![ArgValue::Raw(raw.to_string())], "");
            }
        }
    }

    for slot in &def.slots {
        if slot.kind == ArgKind::TypeExpression {
            continue;
        }
        if slot.kind == ArgKind::FreeText {
            if !text.is_empty() {
                args.push(ArgValue::Parsed {
                    slot: slot.name.clone(),
                    kind: slot.kind,
                    text: text.to_string(),
                });
                text = "";
            } else if !slot.optional {
                diagnostics.push(malformed(span, &def.name, &format!("missing `{}`", slot.name), ""));
            }
            continue;
        }

        let word_len = text.find(char::is_whitespace).unwrap_or(text.len());
        let word = &text[..word_len];
        if word.is_empty() {
            if !slot.optional {
                diagnostics.push(malformed(span, &def.name, &format!("missing `{}`", slot.name), ""));
            }
            continue;
        }
        match check_kind(slot, word) {
            Ok(value) => {
                args.push(ArgValue::Parsed {
                    slot: slot.name.clone(),
                    kind: slot.kind,
                    text: value,
                });
                text = text[word_len..].trim_start();
            }
            Err(_) if slot.optional => {}
            Err(why) => {
                let raw = rest.trim();
                diagnostics.push(malformed(span, &def.name, &why, raw));
                return (vec![ArgValue::Raw(raw.to_string())], "");
            }
        }
    }
    (args, text)
}

/// Header remainder plus continuation lines, common indentation removed.
fn tag_body(header_rest: &str, continuation: &[CommentLine]) -> String {
    let common = continuation
        .iter()
        .filter(|l| !l.text.trim().is_empty())
        .map(|l| indent_len(&l.text))
        .min()
        .unwrap_or(0);

    let mut lines: Vec<&str> = Vec::with_capacity(continuation.len() + 1);
    lines.push(header_rest.trim());
    for l in continuation {
        let text = l.text.get(common..).unwrap_or_else(|| l.text.trim_start());
        lines.push(text.trim_end());
    }
    lines.join("\n").trim().to_string()
}
