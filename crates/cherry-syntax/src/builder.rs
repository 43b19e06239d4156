//! Document tree builder — attaches tags to anchors as the scanner emits them.
//!
//! Open anchor bodies form a stack of frames. `NextAnchor` tags wait in a
//! pending list keyed by the cursor depth of their comment; the next anchor at
//! that depth takes them. Pending tags that outlive their block go to the
//! unresolved bucket, never silently dropped.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::registry::Placement;
use crate::span::{Position, Span};
use crate::tree::{AnchorKind, AnnotationTag, CodeAnchor, DocNode, DocTree};

/// Tags waiting for the next anchor.
#[derive(Debug)]
struct Pending {
    tags: Vec<AnnotationTag>,
    comment: Span,
    depth: usize,
}

/// An anchor node whose body is open.
#[derive(Debug)]
struct Frame {
    node: DocNode,
    /// Index in the parent's children where the node goes back on close.
    slot: usize,
}

#[derive(Debug)]
pub struct TreeBuilder<'s> {
    source: &'s str,
    max_blank_lines: usize,
    root: DocNode,
    frames: Vec<Frame>,
    pending: Vec<Pending>,
    unresolved: Vec<AnnotationTag>,
    /// Index of the latest anchor node in the current top's children.
    last_anchor: Option<usize>,
    diagnostics: Vec<Diagnostic>,
}

impl<'s> TreeBuilder<'s> {
    pub fn new(source: &'s str, max_blank_lines: usize) -> Self {
        TreeBuilder {
            source,
            max_blank_lines,
            root: DocNode::default(),
            frames: Vec::new(),
            pending: Vec::new(),
            unresolved: Vec::new(),
            last_anchor: None,
            diagnostics: Vec::new(),
        }
    }

    fn top(&mut self) -> &mut DocNode {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.node,
            None => &mut self.root,
        }
    }

    /// Kind of the anchor whose body is innermost.
    pub fn enclosing_kind(&self) -> Option<AnchorKind> {
        self.frames
            .last()
            .and_then(|f| f.node.anchor.as_ref())
            .map(|a| a.kind)
    }

    /// Route the tags of one finished comment block by placement.
    pub fn comment_block(&mut self, tags: Vec<AnnotationTag>, comment: Span, depth: usize) {
        let mut next = Vec::new();
        let mut free = Vec::new();
        for mut tag in tags {
            match tag.placement {
                Placement::NextAnchor => next.push(tag),
                Placement::FreeFloating => {
                    tag.resolved = true;
                    free.push(tag);
                }
                Placement::EnclosingAnchor => {
                    tag.resolved = true;
                    self.top().tags.push(tag);
                }
            }
        }

        if !next.is_empty() {
            // Nearest preceding comment wins: an older block at this depth
            // falls back to free-floating.
            if self.pending.last().is_some_and(|p| p.depth == depth) {
                if let Some(old) = self.pending.pop() {
                    tracing::debug!(tags = old.tags.len(), "pending tags superseded by a nearer comment");
                    self.fallback(old, "superseded by a later comment block");
                }
            }
            self.pending.push(Pending {
                tags: next,
                comment,
                depth,
            });
        }

        if !free.is_empty() {
            let node = DocNode {
                span: comment,
                tags: free,
                ..Default::default()
            };
            insert_sorted(self.top(), node);
        }
    }

    /// A new anchor at cursor depth `depth`.
    pub fn anchor(&mut self, anchor: CodeAnchor, depth: usize) {
        let mut node = DocNode::anchored(anchor);

        if self.pending.last().is_some_and(|p| p.depth == depth) {
            if let Some(pending) = self.pending.pop() {
                let gap = self
                    .source
                    .get(pending.comment.end.offset..node.span.start.offset)
                    .unwrap_or_default();
                if blank_lines(gap) > self.max_blank_lines {
                    self.fallback(pending, "separated from the next anchor by blank lines");
                } else {
                    node.tags = pending
                        .tags
                        .into_iter()
                        .map(|mut t| {
                            t.resolved = true;
                            t
                        })
                        .collect();
                }
            }
        }

        let index = insert_sorted(self.top(), node);
        self.last_anchor = Some(index);
    }

    /// Can the latest anchor take a body?
    pub fn can_enter_body(&self) -> bool {
        let top = match self.frames.last() {
            Some(frame) => &frame.node,
            None => &self.root,
        };
        self.last_anchor
            .and_then(|slot| top.children.get(slot))
            .is_some_and(|n| n.anchor.is_some())
    }

    /// The latest anchor's body opened at `at`. Check [`Self::can_enter_body`]
    /// first; otherwise this is a no-op.
    pub fn enter_body(&mut self, at: Position) {
        if !self.can_enter_body() {
            return;
        }
        let Some(slot) = self.last_anchor.take() else {
            return;
        };
        let mut node = self.top().children.remove(slot);
        node.span.end = at;
        self.frames.push(Frame { node, slot });
    }

    /// The innermost body closed; `end` is just past its closer.
    pub fn leave_body(&mut self, end: Position) {
        let Some(Frame { mut node, slot }) = self.frames.pop() else {
            return;
        };
        node.span.end = end;
        let top = self.top();
        let slot = slot.min(top.children.len());
        top.children.insert(slot, node);
        self.last_anchor = None;
    }

    /// A block closed and the cursor is back at `depth`.
    pub fn block_closed(&mut self, depth: usize) {
        while self.pending.last().is_some_and(|p| p.depth > depth) {
            if let Some(p) = self.pending.pop() {
                self.bucket(p, "no anchor before the enclosing block closed");
            }
        }
    }

    /// Close everything and hand over the tree. `end` is the end of input.
    pub fn finish(mut self, end: Position) -> (DocTree, Vec<Diagnostic>) {
        while let Some(p) = self.pending.pop() {
            self.bucket(p, "no anchor before end of input");
        }
        while !self.frames.is_empty() {
            self.leave_body(end);
        }
        self.root.span = Span::new(Position::START, end);
        // Buckets were filled innermost-first.
        self.unresolved.sort_by_key(|t| t.span.start.offset);
        self.diagnostics.sort_by_key(|d| d.span.start.offset);
        (
            DocTree {
                root: self.root,
                unresolved: self.unresolved,
            },
            self.diagnostics,
        )
    }

    fn unresolved_diagnostic(&mut self, tag: &AnnotationTag, why: &str) {
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::UnresolvedTag,
            tag.span,
            format!("@{} not attached: {why}", tag.name),
        ));
    }

    /// Unresolved tags stay in place as a free-floating node.
    fn fallback(&mut self, pending: Pending, why: &str) {
        for tag in &pending.tags {
            self.unresolved_diagnostic(tag, why);
        }
        let node = DocNode {
            span: pending.comment,
            tags: pending.tags,
            ..Default::default()
        };
        insert_sorted(self.top(), node);
    }

    fn bucket(&mut self, pending: Pending, why: &str) {
        for tag in pending.tags {
            self.unresolved_diagnostic(&tag, why);
            self.unresolved.push(tag);
        }
    }
}

/// Source offset a child sorts by: its earliest tag, or the anchor itself
/// when that comes first.
fn order_key(node: &DocNode) -> usize {
    let first_tag = node.tags.first().map(|t| t.span.start.offset);
    match (&node.anchor, first_tag) {
        (None, Some(tag)) => tag,
        (_, Some(tag)) => tag.min(node.span.start.offset),
        (_, None) => node.span.start.offset,
    }
}

/// Insert keeping children in source order; returns the index used.
fn insert_sorted(parent: &mut DocNode, node: DocNode) -> usize {
    let key = order_key(&node);
    let at = parent.children.partition_point(|c| order_key(c) <= key);
    parent.children.insert(at, node);
    at
}

/// Lines in `gap` holding only whitespace, excluding the partial first and last.
fn blank_lines(gap: &str) -> usize {
    let mut lines: Vec<&str> = gap.split('\n').collect();
    if lines.len() < 3 {
        return 0;
    }
    lines.pop();
    lines
        .iter()
        .skip(1)
        .filter(|l| l.trim().is_empty())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::position_after;

    fn span_of(source: &str, needle: &str) -> Span {
        let at = source.find(needle).unwrap();
        let start = position_after(Position::START, &source[..at]);
        Span::new(start, position_after(start, needle))
    }

    fn tag(name: &str, placement: Placement, span: Span) -> AnnotationTag {
        AnnotationTag {
            name: name.into(),
            args: Vec::new(),
            body: String::new(),
            span,
            placement,
            resolved: false,
        }
    }

    fn anchor(source: &str, name: &str) -> CodeAnchor {
        CodeAnchor {
            kind: AnchorKind::Function,
            name: name.into(),
            span: span_of(source, name),
        }
    }

    #[test]
    fn blank_line_counting() {
        assert_eq!(blank_lines(" */\nfunction"), 0);
        assert_eq!(blank_lines("\n\nfunction"), 1);
        assert_eq!(blank_lines("\n  \n\t\nfunction"), 2);
        assert_eq!(blank_lines("\nvar x;\n\nfunction"), 1);
    }

    #[test]
    fn pending_tags_attach_to_next_anchor() {
        let src = "/* @function */\nfunction a() {}\n";
        let mut b = TreeBuilder::new(src, 1);
        let c = span_of(src, "/* @function */");
        b.comment_block(vec![tag("function", Placement::NextAnchor, c)], c, 0);
        b.anchor(anchor(src, "a"), 0);
        let (tree, diags) = b.finish(position_after(Position::START, src));
        assert!(diags.is_empty());
        assert_eq!(tree.root.children.len(), 1);
        assert!(tree.root.children[0].tags[0].resolved);
    }

    #[test]
    fn too_many_blank_lines_fall_back_to_free_floating() {
        let src = "// @function\n\n\nfunction a() {}\n";
        let mut b = TreeBuilder::new(src, 1);
        let c = span_of(src, "// @function");
        b.comment_block(vec![tag("function", Placement::NextAnchor, c)], c, 0);
        b.anchor(anchor(src, "a"), 0);
        let (tree, diags) = b.finish(position_after(Position::START, src));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnresolvedTag);
        assert_eq!(tree.root.children.len(), 2);
        assert!(tree.root.children[0].anchor.is_none());
        assert!(!tree.root.children[0].tags[0].resolved);
        assert!(tree.root.children[1].tags.is_empty());
    }

    #[test]
    fn body_nodes_nest_children() {
        let src = "class K { m() {} }";
        let mut b = TreeBuilder::new(src, 1);
        b.anchor(anchor(src, "K"), 0);
        assert!(b.can_enter_body());
        b.enter_body(span_of(src, "{").start);
        assert_eq!(b.enclosing_kind(), Some(AnchorKind::Function));
        b.anchor(anchor(src, "m"), 1);
        b.leave_body(position_after(Position::START, src));
        let (tree, _) = b.finish(position_after(Position::START, src));
        assert_eq!(tree.root.children.len(), 1);
        let k = &tree.root.children[0];
        assert_eq!(k.children.len(), 1);
        assert!(k.span.contains(&k.children[0].span));
    }

    #[test]
    fn pending_inside_closed_block_goes_to_bucket() {
        let src = "f(/* @param x */)";
        let mut b = TreeBuilder::new(src, 1);
        let c = span_of(src, "/* @param x */");
        b.comment_block(vec![tag("param", Placement::NextAnchor, c)], c, 1);
        b.block_closed(0);
        let (tree, diags) = b.finish(position_after(Position::START, src));
        assert_eq!(tree.unresolved.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnresolvedTag);
    }

    #[test]
    fn attached_tags_sort_before_later_free_blocks() {
        let src = "/** @function */\n// @module m\nfunction g() {}\n";
        let mut b = TreeBuilder::new(src, 1);
        let pending = span_of(src, "/** @function */");
        b.comment_block(vec![tag("function", Placement::NextAnchor, pending)], pending, 0);
        let free = span_of(src, "// @module m");
        b.comment_block(vec![tag("module", Placement::FreeFloating, free)], free, 0);
        b.anchor(anchor(src, "g"), 0);
        let (tree, diags) = b.finish(position_after(Position::START, src));
        assert!(diags.is_empty());
        let names: Vec<_> = tree.root.all_tags().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["function", "module"]);
        assert_eq!(tree.root.children[0].name(), Some("g"));
    }

    #[test]
    fn enclosing_tags_go_to_open_body() {
        let src = "class K { /* @attribute n */ }";
        let mut b = TreeBuilder::new(src, 1);
        b.anchor(anchor(src, "K"), 0);
        b.enter_body(span_of(src, "{").start);
        let c = span_of(src, "/* @attribute n */");
        b.comment_block(vec![tag("attribute", Placement::EnclosingAnchor, c)], c, 1);
        b.leave_body(position_after(Position::START, src));
        let (tree, diags) = b.finish(position_after(Position::START, src));
        assert!(diags.is_empty());
        assert_eq!(tree.root.children[0].tags[0].name, "attribute");
    }
}
