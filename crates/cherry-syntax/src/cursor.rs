//! Scan cursor — position tracking plus the open-context stack.
//!
//! The stack is explicit (never recursion) so deeply nested or malformed input
//! cannot exhaust the call stack. Past `max_depth`, opens become no-ops that
//! later closes cancel out.

use crate::span::{Position, Span};

/// What the scanner is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// A bracket pair, by index into `GrammarSpec::blocks`.
    Block { pair: usize, opened: Position },
    /// The body of an anchor; `indent` is set for indentation bodies.
    Body {
        opened: Position,
        indent: Option<usize>,
    },
    /// String literal, by index into `GrammarSpec::strings`.
    StringLiteral { delim: usize, opened: Position },
    Comment { opened: Position },
}

impl Context {
    pub fn opened(&self) -> Position {
        match self {
            Context::Block { opened, .. }
            | Context::Body { opened, .. }
            | Context::StringLiteral { opened, .. }
            | Context::Comment { opened } => *opened,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pushed {
    Yes,
    /// Over the depth cap; `first` marks the start of an overflow episode.
    Overflow { first: bool },
}

#[derive(Debug)]
pub struct ScanCursor<'s> {
    source: &'s str,
    pos: Position,
    stack: Vec<Context>,
    max_depth: usize,
    overflow: usize,
    last_significant: Option<char>,
}

impl<'s> ScanCursor<'s> {
    pub fn new(source: &'s str, max_depth: usize) -> Self {
        ScanCursor {
            source,
            pos: Position::START,
            stack: Vec::new(),
            max_depth,
            overflow: 0,
            last_significant: None,
        }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn rest(&self) -> &'s str {
        &self.source[self.pos.offset..]
    }

    pub fn is_eof(&self) -> bool {
        self.pos.offset >= self.source.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn starts_with(&self, token: &str) -> bool {
        !token.is_empty() && self.rest().starts_with(token)
    }

    /// Last non-whitespace character consumed.
    pub fn last_significant(&self) -> Option<char> {
        self.last_significant
    }

    /// Consume one character.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos.offset += c.len_utf8();
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        if !c.is_whitespace() {
            self.last_significant = Some(c);
        }
        Some(c)
    }

    /// Consume `bytes` bytes, clamped to a char boundary and the input end.
    pub fn advance(&mut self, bytes: usize) {
        let target = (self.pos.offset + bytes).min(self.source.len());
        while self.pos.offset < target {
            if self.bump().is_none() {
                break;
            }
        }
    }

    /// Text from the cursor up to (not including) the next newline.
    pub fn rest_of_line(&self) -> &'s str {
        let rest = self.rest();
        match rest.find('\n') {
            Some(i) => &rest[..i],
            None => rest,
        }
    }

    /// Leading whitespace width of the current line, in characters.
    pub fn line_indent(&self) -> usize {
        let line_start = self.source[..self.pos.offset]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        self.source[line_start..]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .count()
    }

    pub fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.pos)
    }

    // -- context stack --------------------------------------------------------

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn top(&self) -> Option<&Context> {
        self.stack.last()
    }

    pub fn contexts(&self) -> &[Context] {
        &self.stack
    }

    pub fn push(&mut self, ctx: Context) -> Pushed {
        if self.overflow > 0 || self.stack.len() >= self.max_depth {
            self.overflow += 1;
            return Pushed::Overflow {
                first: self.overflow == 1,
            };
        }
        self.stack.push(ctx);
        Pushed::Yes
    }

    pub fn pop(&mut self) -> Option<Context> {
        self.stack.pop()
    }

    /// Cancel one no-op open. Returns false when not overflowing.
    pub fn absorb_overflow_close(&mut self) -> bool {
        if self.overflow == 0 {
            return false;
        }
        self.overflow -= 1;
        true
    }

    /// Drop every no-op open, used when input ends mid-overflow.
    pub fn clear_overflow(&mut self) {
        self.overflow = 0;
    }
}

/// Position reached by walking `text` starting from `start`.
pub fn position_after(start: Position, text: &str) -> Position {
    let mut pos = start;
    for c in text.chars() {
        pos.offset += c.len_utf8();
        if c == '\n' {
            pos.line += 1;
            pos.column = 1;
        } else {
            pos.column += 1;
        }
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_tracks_lines_and_columns() {
        let mut cur = ScanCursor::new("ab\nç", 8);
        cur.advance(3);
        assert_eq!(cur.position().line, 2);
        assert_eq!(cur.position().column, 1);
        assert_eq!(cur.bump(), Some('ç'));
        assert_eq!(cur.position().column, 2);
        assert_eq!(cur.position().offset, 5);
        assert!(cur.is_eof());
        assert_eq!(cur.bump(), None);
    }

    #[test]
    fn advance_clamps_to_end() {
        let mut cur = ScanCursor::new("abc", 8);
        cur.advance(99);
        assert!(cur.is_eof());
        assert_eq!(cur.position().offset, 3);
    }

    #[test]
    fn push_past_max_depth_overflows() {
        let mut cur = ScanCursor::new("", 1);
        let ctx = Context::Comment {
            opened: Position::START,
        };
        assert_eq!(cur.push(ctx), Pushed::Yes);
        assert_eq!(cur.push(ctx), Pushed::Overflow { first: true });
        assert_eq!(cur.push(ctx), Pushed::Overflow { first: false });
        assert_eq!(cur.depth(), 1);
        assert!(cur.absorb_overflow_close());
        assert!(cur.absorb_overflow_close());
        assert!(!cur.absorb_overflow_close());
    }

    #[test]
    fn indent_and_rest_of_line() {
        let mut cur = ScanCursor::new("x\n    def f", 8);
        cur.advance(6);
        assert_eq!(cur.line_indent(), 4);
        cur.advance(1);
        assert_eq!(cur.rest_of_line(), "ef f");
    }

    #[test]
    fn position_after_counts_newlines() {
        let p = position_after(Position::START, "a\nbc");
        assert_eq!((p.offset, p.line, p.column), (4, 2, 3));
    }
}
