//! Cherry-pick scanner — one pass over the input, four states, never aborts.
//!
//! Structured scanning only looks for comments, strings, block boundaries and
//! anchor headers at statement starts. Everything else is skipped up to the
//! next resynchronization point. Tags and anchors reach the [`TreeBuilder`] in
//! source order.

use crate::adapter::{AnchorMatch, CommentForm, LanguageAdapter};
use crate::annotation::{next_header, parse_tag, CommentBlock, CommentLine, ParsedTag};
use crate::builder::TreeBuilder;
use crate::cursor::{position_after, Context, Pushed, ScanCursor};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::grammar::BodyStyle;
use crate::options::{ScanOptions, SkipLookahead};
use crate::registry::{Multiplicity, TagRegistry};
use crate::span::{Position, Span};
use crate::tree::{CodeAnchor, ScanOutput};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    ScanningCode,
    InComment(CommentForm),
    ParsingTag,
    Skipping,
}

/// Runs scans for one adapter and tag registry.
pub struct Scanner<'r, A> {
    adapter: A,
    registry: &'r TagRegistry,
    options: ScanOptions,
}

impl<'r, A: LanguageAdapter> Scanner<'r, A> {
    pub fn new(adapter: A, registry: &'r TagRegistry, options: ScanOptions) -> Self {
        Scanner {
            adapter,
            registry,
            options,
        }
    }

    /// Scan one source text. Total: every input yields a tree.
    pub fn run(&self, source: &str) -> ScanOutput {
        let mut pass = Pass::new(self, source);
        pass.run();
        let output = pass.finish();
        tracing::debug!(
            nodes = output.tree.root.walk().count() - 1,
            unresolved = output.tree.unresolved.len(),
            diagnostics = output.diagnostics.len(),
            "scan finished"
        );
        output
    }
}

/// Anchor still waiting for its body opener.
#[derive(Debug, Clone, Copy)]
struct PendingBody {
    depth: usize,
    /// Indentation of the anchor line.
    indent: usize,
}

/// State of one scan.
struct Pass<'p, 's, A> {
    adapter: &'p A,
    registry: &'p TagRegistry,
    options: &'p ScanOptions,
    cur: ScanCursor<'s>,
    builder: TreeBuilder<'s>,
    diagnostics: Vec<Diagnostic>,
    state: ScanState,
    comment: Option<CommentBlock>,
    statement_start: bool,
    line_start: bool,
    pending_body: Option<PendingBody>,
    /// End of the last non-whitespace token.
    last_end: Position,
}

impl<'p, 's, A: LanguageAdapter> Pass<'p, 's, A> {
    fn new(scanner: &'p Scanner<'_, A>, source: &'s str) -> Self {
        Pass {
            adapter: &scanner.adapter,
            registry: scanner.registry,
            options: &scanner.options,
            cur: ScanCursor::new(source, scanner.options.max_depth),
            builder: TreeBuilder::new(source, scanner.options.max_blank_lines),
            diagnostics: Vec::new(),
            state: ScanState::ScanningCode,
            comment: None,
            statement_start: true,
            line_start: true,
            pending_body: None,
            last_end: Position::START,
        }
    }

    fn run(&mut self) {
        loop {
            let state = self.state;
            match state {
                ScanState::InComment(form) => self.read_comment(form),
                ScanState::ParsingTag => self.parse_comment(),
                _ if self.cur.is_eof() => break,
                ScanState::ScanningCode => self.scan_code(),
                ScanState::Skipping => self.skip(),
            }
        }
    }

    fn enter(&mut self, state: ScanState) {
        tracing::trace!(from = ?self.state, to = ?state, at = %self.cur.position(), "transition");
        self.state = state;
    }

    // -- ScanningCode ---------------------------------------------------------

    fn scan_code(&mut self) {
        match self.cur.peek() {
            Some('\n') => {
                self.cur.bump();
                self.after_newline();
            }
            Some(c) if c.is_whitespace() => {
                self.cur.bump();
            }
            Some(_) => {
                self.token();
                self.last_end = self.cur.position();
            }
            None => {}
        }
    }

    /// Dispatch on the token class at the cursor; the first char is not
    /// whitespace.
    fn token(&mut self) {
        let a = self.adapter;
        if self.line_start {
            self.line_start = false;
            self.dedent();
        }

        if let Some(form) = a.comment_start(&self.cur) {
            self.enter(ScanState::InComment(form));
        } else if let Some(delim) = a.string_start(&self.cur) {
            self.statement_start = false;
            self.string(delim);
        } else if let Some(len) = a.regex_literal(&self.cur) {
            self.statement_start = false;
            self.cur.advance(len);
        } else if let Some(pair) = a.block_close(&self.cur) {
            self.close_block(pair);
        } else if let Some(pair) = a.block_open(&self.cur) {
            self.open_block(pair);
        } else if let Some(len) = self.body_opener() {
            self.open_indent_body(len);
        } else if let Some(len) = a.statement_end(&self.cur) {
            self.cur.advance(len);
            self.cancel_pending_body();
            self.statement_start = self.in_statement_context();
        } else if std::mem::take(&mut self.statement_start) {
            match a.anchor_at(&self.cur, self.builder.enclosing_kind()) {
                Some(m) => self.anchor(m),
                None => {
                    // A plain statement ends any wait for a body.
                    self.cancel_pending_body();
                    self.enter(ScanState::Skipping);
                }
            }
        } else {
            self.enter(ScanState::Skipping);
        }
    }

    fn after_newline(&mut self) {
        self.line_start = true;
        if self.in_statement_context() {
            self.statement_start = true;
        }
        if self.adapter.grammar().newline_terminates {
            self.cancel_pending_body();
        }
    }

    /// Does a newline or separator here start a new statement?
    fn in_statement_context(&self) -> bool {
        match self.cur.top() {
            None | Some(Context::Body { .. }) => true,
            Some(Context::Block { pair, .. }) => self.adapter.grammar().blocks[*pair].holds_statements,
            Some(_) => false,
        }
    }

    fn pending_body_here(&self) -> bool {
        self.pending_body
            .is_some_and(|p| p.depth == self.cur.depth())
    }

    fn cancel_pending_body(&mut self) {
        if self.pending_body_here() {
            self.pending_body = None;
        }
    }

    /// A pending body can no longer open once its depth is gone.
    fn drop_stale_pending_body(&mut self) {
        if self.pending_body.is_some_and(|p| p.depth > self.cur.depth()) {
            self.pending_body = None;
        }
    }

    fn anchor(&mut self, m: AnchorMatch) {
        let start = self.cur.position();
        let indent = self.cur.line_indent();
        self.cur.advance(m.len);
        let anchor = CodeAnchor {
            kind: m.kind,
            name: m.name,
            span: self.cur.span_from(start),
        };
        tracing::debug!(kind = %anchor.kind, name = %anchor.name, at = %start, "anchor");
        let depth = self.cur.depth();
        self.builder.anchor(anchor, depth);
        self.pending_body = Some(PendingBody { depth, indent });
    }

    // -- blocks and bodies ----------------------------------------------------

    fn open_block(&mut self, pair: usize) {
        let a = self.adapter;
        let block = &a.grammar().blocks[pair];
        let opened = self.cur.position();
        let body = a.is_body_pair(pair) && self.pending_body_here() && self.builder.can_enter_body();
        if body {
            self.pending_body = None;
        }
        let ctx = if body {
            Context::Body {
                opened,
                indent: None,
            }
        } else {
            Context::Block { pair, opened }
        };
        match self.cur.push(ctx) {
            Pushed::Yes if body => self.builder.enter_body(opened),
            Pushed::Yes => {}
            Pushed::Overflow { first } => self.too_deep(first, opened),
        }
        self.cur.advance(block.open.len());
        self.statement_start = body || block.holds_statements;
    }

    fn close_block(&mut self, pair: usize) {
        let a = self.adapter;
        let block = &a.grammar().blocks[pair];
        let start = self.cur.position();
        if self.cur.absorb_overflow_close() {
            self.cur.advance(block.close.len());
            return;
        }

        let closes = |ctx: &Context| match ctx {
            Context::Block { pair: p, .. } => *p == pair,
            Context::Body { indent: None, .. } => a.is_body_pair(pair),
            _ => false,
        };
        let Some(at) = self.cur.contexts().iter().rposition(closes) else {
            self.cur.advance(block.close.len());
            tracing::debug!(at = %start, "stray closer ignored");
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnbalancedBlock,
                self.cur.span_from(start),
                format!("stray `{}` ignored", block.close),
            ));
            return;
        };

        while self.cur.depth() > at + 1 {
            let Some(ctx) = self.cur.pop() else { break };
            self.unwind(ctx, start, Some(block.close.as_str()));
        }
        let closed = self.cur.pop();
        self.cur.advance(block.close.len());
        let is_body = matches!(closed, Some(Context::Body { .. }));
        if is_body {
            self.builder.leave_body(self.cur.position());
        }
        self.builder.block_closed(self.cur.depth());
        self.drop_stale_pending_body();
        self.statement_start = (is_body || block.holds_statements) && self.in_statement_context();
    }

    /// Close `ctx` implicitly: its closer is `closer`, or missing at end of input.
    fn unwind(&mut self, ctx: Context, end: Position, closer: Option<&str>) {
        let g = self.adapter.grammar();
        let opener = match ctx {
            Context::Block { pair, .. } => Some(g.blocks[pair].open.as_str()),
            Context::Body { indent: None, .. } => match &g.body {
                BodyStyle::Braces { open } => Some(open.as_str()),
                BodyStyle::Indent { .. } => None,
            },
            _ => None,
        };
        match ctx {
            Context::Body { indent: None, .. } => self.builder.leave_body(end),
            Context::Body { .. } => self.builder.leave_body(self.last_end),
            _ => {}
        }
        let Some(open) = opener else { return };
        let (kind, message) = match closer {
            Some(close) => (
                DiagnosticKind::UnbalancedBlock,
                format!("`{open}` implicitly closed by `{close}`"),
            ),
            None => (
                DiagnosticKind::UnterminatedBlock,
                format!("`{open}` never closed; closed at end of input"),
            ),
        };
        tracing::debug!(%kind, opened = %ctx.opened(), "unwinding block");
        self.diagnostics
            .push(Diagnostic::new(kind, Span::new(ctx.opened(), end), message));
    }

    fn body_opener(&self) -> Option<usize> {
        if !self.pending_body_here() {
            return None;
        }
        self.adapter.body_opener(&self.cur)
    }

    fn open_indent_body(&mut self, len: usize) {
        let opened = self.cur.position();
        if let Some(pending) = self.pending_body.take() {
            if self.builder.can_enter_body() {
                let ctx = Context::Body {
                    opened,
                    indent: Some(pending.indent),
                };
                match self.cur.push(ctx) {
                    Pushed::Yes => self.builder.enter_body(opened),
                    Pushed::Overflow { first } => {
                        // Indentation bodies have no closer to cancel the no-op.
                        self.cur.absorb_overflow_close();
                        self.too_deep(first, opened);
                    }
                }
            }
        }
        self.cur.advance(len);
    }

    /// Close indentation bodies that the current line's indent leaves.
    fn dedent(&mut self) {
        if !matches!(self.adapter.grammar().body, BodyStyle::Indent { .. }) {
            return;
        }
        let indent = self.cur.line_indent();
        while let Some(&Context::Body {
            indent: Some(level),
            ..
        }) = self.cur.top()
        {
            if level < indent {
                break;
            }
            self.cur.pop();
            self.builder.leave_body(self.last_end);
            self.builder.block_closed(self.cur.depth());
            tracing::trace!(indent = level, "indentation body closed");
        }
        self.drop_stale_pending_body();
    }

    fn too_deep(&mut self, first: bool, at: Position) {
        if !first {
            return;
        }
        tracing::debug!(at = %at, max_depth = self.options.max_depth, "nesting too deep");
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::NestingTooDeep,
            Span::point(at),
            format!(
                "nesting deeper than {} levels; further opens ignored until closed",
                self.options.max_depth
            ),
        ));
    }

    // -- strings --------------------------------------------------------------

    fn string(&mut self, delim: usize) {
        let a = self.adapter;
        let d = &a.grammar().strings[delim];
        let opened = self.cur.position();
        let pushed = self.cur.push(Context::StringLiteral { delim, opened });
        self.cur.advance(d.open.len());
        loop {
            let Some(c) = self.cur.peek() else {
                self.unterminated_string(opened, "end of input");
                break;
            };
            if d.escape == Some(c) {
                self.cur.bump();
                self.cur.bump();
            } else if let Some(len) = a.string_end(&self.cur, delim) {
                self.cur.advance(len);
                break;
            } else if c == '\n' && !d.multiline {
                self.unterminated_string(opened, "end of line");
                break;
            } else {
                self.cur.bump();
            }
        }
        match pushed {
            Pushed::Yes => {
                self.cur.pop();
            }
            Pushed::Overflow { .. } => {
                self.cur.absorb_overflow_close();
            }
        }
    }

    fn unterminated_string(&mut self, opened: Position, reached: &str) {
        tracing::debug!(at = %opened, reached, "unterminated string");
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::UnterminatedString,
            self.cur.span_from(opened),
            format!("string literal reaches {reached}"),
        ));
    }

    // -- Skipping -------------------------------------------------------------

    /// Consume unrecognized input up to the next resynchronization point.
    fn skip(&mut self) {
        let a = self.adapter;
        let from = self.cur.position();
        // Always make progress.
        self.cur.bump();
        let mut last = self.cur.position();

        while let Some(c) = self.cur.peek() {
            if c == '\n'
                || a.comment_start(&self.cur).is_some()
                || a.block_open(&self.cur).is_some()
                || a.block_close(&self.cur).is_some()
                || self.body_opener().is_some()
            {
                break;
            }
            if self.options.skip_lookahead == SkipLookahead::Statement
                && a.statement_end(&self.cur).is_some()
            {
                break;
            }
            if let Some(delim) = a.string_start(&self.cur) {
                self.string(delim);
                last = self.cur.position();
            } else if let Some(len) = a.regex_literal(&self.cur) {
                self.cur.advance(len);
                last = self.cur.position();
            } else {
                self.cur.bump();
                if !c.is_whitespace() {
                    last = self.cur.position();
                }
            }
        }

        self.last_end = last;
        tracing::trace!(from = %from, to = %self.cur.position(), "skipped");
        self.enter(ScanState::ScanningCode);
    }

    // -- InComment / ParsingTag -----------------------------------------------

    fn read_comment(&mut self, form: CommentForm) {
        let start = self.cur.position();
        let pushed = self.cur.push(Context::Comment { opened: start });
        let (lines, merged) = match form {
            CommentForm::Line(i) => self.read_line_comments(i),
            CommentForm::Block(i) => (self.read_block_comment(i, form, start), false),
        };
        match pushed {
            Pushed::Yes => {
                self.cur.pop();
            }
            Pushed::Overflow { .. } => {
                self.cur.absorb_overflow_close();
            }
        }
        if merged {
            self.after_newline();
        }
        self.last_end = self.cur.position();
        self.comment = Some(CommentBlock {
            lines,
            span: self.cur.span_from(start),
        });
        self.enter(ScanState::ParsingTag);
    }

    /// Consecutive line comments with the same marker form one block. Leaves
    /// the cursor on the newline ending the last one; the flag tells whether
    /// newlines were consumed on the way.
    fn read_line_comments(&mut self, marker: usize) -> (Vec<CommentLine>, bool) {
        let marker = &self.adapter.grammar().line_comments[marker];
        let mut lines = Vec::new();
        let mut merged = false;
        loop {
            self.cur.advance(marker.len());
            let text_start = self.cur.position();
            let text = self.cur.rest_of_line();
            let strip = line_decoration(marker, text);
            lines.push(CommentLine {
                text: text[strip..].to_string(),
                start: position_after(text_start, &text[..strip]),
            });
            self.cur.advance(text.len());

            let Some(next) = self.cur.rest().strip_prefix('\n') else {
                break;
            };
            let ws = next.len() - next.trim_start_matches([' ', '\t']).len();
            if !next[ws..].starts_with(marker.as_str()) {
                break;
            }
            self.cur.bump();
            self.cur.advance(ws);
            merged = true;
        }
        (lines, merged)
    }

    fn read_block_comment(&mut self, i: usize, form: CommentForm, start: Position) -> Vec<CommentLine> {
        let a = self.adapter;
        let open = &a.grammar().block_comments[i].0;
        self.cur.advance(open.len());
        let content_start = self.cur.position();

        let content_end = loop {
            if let Some(len) = a.comment_end(&self.cur, form) {
                let end = self.cur.position();
                self.cur.advance(len);
                break end;
            }
            if self.cur.bump().is_none() {
                tracing::debug!(at = %start, "unterminated comment");
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnterminatedComment,
                    self.cur.span_from(start),
                    "comment never closed; closed at end of input",
                ));
                break self.cur.position();
            }
        };

        let raw = &self.cur.source()[content_start.offset..content_end.offset];
        block_comment_lines(raw, content_start)
    }

    fn parse_comment(&mut self) {
        let Some(block) = self.comment.take() else {
            self.enter(ScanState::ScanningCode);
            return;
        };

        let mut tags = Vec::new();
        let mut once_seen = HashSet::new();
        let mut at = next_header(&block.lines, 0);
        while let Some(i) = at {
            let ParsedTag {
                tag,
                diagnostics,
                next,
            } = parse_tag(&block.lines, i, self.registry);
            self.diagnostics.extend(diagnostics);

            let once = self
                .registry
                .get(&tag.name)
                .is_some_and(|d| d.multiplicity == Multiplicity::ZeroOrOne);
            if once && !once_seen.insert(tag.name.clone()) {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DuplicateTag,
                    tag.span,
                    format!("@{} given more than once in one comment", tag.name),
                ));
            }
            tracing::trace!(tag = %tag.name, at = %tag.span.start, "tag");
            tags.push(tag);
            at = next_header(&block.lines, next);
        }

        if !tags.is_empty() {
            self.builder.comment_block(tags, block.span, self.cur.depth());
        }
        self.enter(ScanState::ScanningCode);
    }

    // -- end of input ---------------------------------------------------------

    fn finish(mut self) -> ScanOutput {
        let end = self.cur.position();
        self.cur.clear_overflow();
        while let Some(ctx) = self.cur.pop() {
            self.unwind(ctx, end, None);
        }
        let (tree, mut diagnostics) = self.builder.finish(end);
        diagnostics.append(&mut self.diagnostics);
        diagnostics.sort_by_key(|d| d.span.start.offset);
        ScanOutput { tree, diagnostics }
    }
}

/// Bytes of marker decoration (`///`, `//!`, `##`) plus one space.
fn line_decoration(marker: &str, text: &str) -> usize {
    let repeat = marker.chars().last();
    let deco = text.len() - text.trim_start_matches(|c| Some(c) == repeat || c == '!').len();
    deco + usize::from(text[deco..].starts_with(' '))
}

/// Split block comment content into lines, dropping the `/**` stars and the
/// `*` gutter when every continuation line has one.
fn block_comment_lines(raw: &str, start: Position) -> Vec<CommentLine> {
    let gutter = raw
        .split('\n')
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .all(|l| l.trim_start().starts_with('*'));

    let mut pos = start;
    let mut lines = Vec::new();
    for (i, line) in raw.split('\n').enumerate() {
        let strip = if i == 0 {
            let deco = line.len() - line.trim_start_matches(['*', '!']).len();
            deco + usize::from(line[deco..].starts_with(' '))
        } else if gutter {
            let ws = line.len() - line.trim_start().len();
            match line[ws..].strip_prefix('*') {
                Some(after) => ws + 1 + usize::from(after.starts_with(' ')),
                None => ws,
            }
        } else {
            0
        };
        lines.push(CommentLine {
            text: line[strip..].to_string(),
            start: position_after(pos, &line[..strip]),
        });
        pos = position_after(pos, line);
        pos = position_after(pos, "\n");
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::GrammarAdapter;
    use crate::grammar::GrammarSpec;
    use crate::tree::AnchorKind;

    fn scan(grammar: &GrammarSpec, source: &str) -> ScanOutput {
        let registry = TagRegistry::standard();
        Scanner::new(GrammarAdapter::new(grammar), &registry, ScanOptions::default()).run(source)
    }

    fn kinds(out: &ScanOutput) -> Vec<DiagnosticKind> {
        out.diagnostics.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn jsdoc_gutter_is_stripped() {
        let lines = block_comment_lines("*\n * @param a\n *   indented\n ", Position::START);
        assert_eq!(lines[1].text, "@param a");
        assert_eq!(lines[1].start.column, 4);
        assert_eq!(lines[2].text, "  indented");
    }

    #[test]
    fn line_comment_decoration() {
        assert_eq!(line_decoration("//", "/ doc"), 2);
        assert_eq!(line_decoration("//", "! inner"), 2);
        assert_eq!(line_decoration("#", "## @module x"), 3);
        assert_eq!(line_decoration("#", "@module x"), 0);
    }

    #[test]
    fn consecutive_line_comments_form_one_block() {
        let js = GrammarSpec::javascript();
        let out = scan(&js, "// @function\n// @param a\n// @returns {int}\nfunction f(a) {}\n");
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let f = out.tree.root.find("f").unwrap();
        assert_eq!(f.tags.len(), 3);
    }

    #[test]
    fn class_methods_nest() {
        let js = GrammarSpec::javascript();
        let src = "class Widget {\n  /** @method */\n  render() {\n    return 1;\n  }\n}\n";
        let out = scan(&js, src);
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let widget = out.tree.root.find("Widget").unwrap();
        assert_eq!(widget.children.len(), 1);
        let render = &widget.children[0];
        assert_eq!(render.anchor.as_ref().map(|a| a.kind), Some(AnchorKind::Method));
        assert_eq!(render.tags[0].name, "method");
    }

    #[test]
    fn strings_hide_comment_markers() {
        let js = GrammarSpec::javascript();
        let out = scan(&js, "var s = \"/* not a comment\";\nvar r = /\\/\\*/g;\n");
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert!(out.tree.root.children.is_empty());
    }

    #[test]
    fn stray_closer_is_reported_and_ignored() {
        let js = GrammarSpec::javascript();
        let out = scan(&js, "foo());\n/** @function */\nfunction g() {}\n");
        assert_eq!(kinds(&out), [DiagnosticKind::UnbalancedBlock]);
        assert_eq!(out.tree.root.find("g").unwrap().tags.len(), 1);
    }

    #[test]
    fn mismatched_closer_unwinds() {
        let js = GrammarSpec::javascript();
        let out = scan(&js, "function f() { call(a, b }\n");
        assert_eq!(kinds(&out), [DiagnosticKind::UnbalancedBlock]);
        let f = out.tree.root.find("f").unwrap();
        assert_eq!(f.span.end.column, 27);
    }

    #[test]
    fn single_line_string_stops_at_newline() {
        let js = GrammarSpec::javascript();
        let out = scan(&js, "var s = 'oops\n// @function\nfunction g() {}\n");
        assert_eq!(kinds(&out), [DiagnosticKind::UnterminatedString]);
        assert_eq!(out.tree.root.find("g").unwrap().tags.len(), 1);
    }

    #[test]
    fn unterminated_block_at_eof() {
        let js = GrammarSpec::javascript();
        let out = scan(&js, "function f() {\n  if (x) {\n");
        assert_eq!(
            kinds(&out),
            [DiagnosticKind::UnterminatedBlock, DiagnosticKind::UnterminatedBlock]
        );
        assert!(out.tree.root.find("f").is_some());
    }

    #[test]
    fn depth_cap_overflows_once() {
        let js = GrammarSpec::javascript();
        let registry = TagRegistry::standard();
        let options = ScanOptions::default().with_max_depth(4);
        let src = format!("{}{}\n/** @function */\nfunction g() {{}}\n", "(".repeat(10), ")".repeat(10));
        let out = Scanner::new(GrammarAdapter::new(&js), &registry, options).run(&src);
        assert_eq!(kinds(&out), [DiagnosticKind::NestingTooDeep]);
        assert_eq!(out.tree.root.find("g").unwrap().tags.len(), 1);
    }

    #[test]
    fn duplicate_once_tag() {
        let js = GrammarSpec::javascript();
        let out = scan(&js, "/**\n * @returns {int}\n * @returns {string}\n */\nfunction f() {}\n");
        assert_eq!(kinds(&out), [DiagnosticKind::DuplicateTag]);
        assert_eq!(out.tree.root.find("f").unwrap().tags.len(), 2);
    }

    #[test]
    fn python_indentation_bodies() {
        let py = GrammarSpec::python();
        let src = "\
class Greeter:
    # @method
    def greet(self):
        return 'hi'

# @function
def main():
    pass
";
        let out = scan(&py, src);
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        let greeter = out.tree.root.find("Greeter").unwrap();
        assert_eq!(greeter.children.len(), 1);
        assert_eq!(greeter.children[0].tags[0].name, "method");
        let main = out.tree.root.find("main").unwrap();
        assert_eq!(main.tags[0].name, "function");
        assert_eq!(out.tree.root.children.len(), 2);
    }

    #[test]
    fn skip_by_line_ignores_separators() {
        let js = GrammarSpec::javascript();
        let registry = TagRegistry::standard();
        let options = ScanOptions::default().with_skip_lookahead(SkipLookahead::Line);
        let out = Scanner::new(GrammarAdapter::new(&js), &registry, options)
            .run("x = 1; function hidden() {}\nfunction seen() {}\n");
        assert!(out.tree.root.find("hidden").is_none());
        assert!(out.tree.root.find("seen").is_some());

        let out = scan(&js, "x = 1; function found() {}\n");
        assert!(out.tree.root.find("found").is_some());
    }
}
