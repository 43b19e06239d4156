//! Output model — anchors, tags and the document tree.
//!
//! Everything here is format-agnostic and serde-serializable; renderers and
//! other consumers receive a [`ScanOutput`] and nothing else.

use crate::diagnostics::Diagnostic;
use crate::registry::{ArgKind, Placement};
use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorKind {
    Module,
    Class,
    Function,
    Method,
    Attribute,
    Unknown,
}

impl AnchorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorKind::Module => "module",
            AnchorKind::Class => "class",
            AnchorKind::Function => "function",
            AnchorKind::Method => "method",
            AnchorKind::Attribute => "attribute",
            AnchorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A code construct that tags document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeAnchor {
    pub kind: AnchorKind,
    /// Empty for anonymous constructs.
    pub name: String,
    pub span: Span,
}

/// One parsed argument of a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgValue {
    Parsed {
        slot: String,
        kind: ArgKind,
        text: String,
    },
    /// Kept verbatim because it did not fit the schema (or the tag is unknown).
    Raw(String),
}

impl ArgValue {
    pub fn text(&self) -> &str {
        match self {
            ArgValue::Parsed { text, .. } => text,
            ArgValue::Raw(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationTag {
    pub name: String,
    pub args: Vec<ArgValue>,
    /// Free text after the header, up to the next tag or the comment end.
    pub body: String,
    pub span: Span,
    /// Effective placement; unknown tags use `NextAnchor`.
    pub placement: Placement,
    /// Attached to an anchor or confirmed free-floating.
    pub resolved: bool,
}

impl AnnotationTag {
    /// Parsed argument for `slot`, if present.
    pub fn arg(&self, slot: &str) -> Option<&str> {
        self.args.iter().find_map(|a| match a {
            ArgValue::Parsed { slot: s, text, .. } if s == slot => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocNode {
    pub anchor: Option<CodeAnchor>,
    pub tags: Vec<AnnotationTag>,
    pub children: Vec<DocNode>,
    pub span: Span,
}

/// A node seen during [`DocNode::walk`], with its parent.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    pub node: &'a DocNode,
    pub parent: Option<&'a DocNode>,
    pub depth: usize,
}

impl DocNode {
    pub fn anchored(anchor: CodeAnchor) -> Self {
        DocNode {
            span: anchor.span,
            anchor: Some(anchor),
            ..Default::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.anchor.as_ref().map(|a| a.name.as_str())
    }

    /// Depth-first, left-to-right traversal starting at this node.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![NodeRef {
                node: self,
                parent: None,
                depth: 0,
            }],
        }
    }

    /// Every tag in traversal order.
    pub fn all_tags(&self) -> impl Iterator<Item = &AnnotationTag> {
        self.walk().flat_map(|r| r.node.tags.iter())
    }

    /// First node (depth-first) whose anchor is named `name`.
    pub fn find(&self, name: &str) -> Option<&DocNode> {
        self.walk().map(|r| r.node).find(|n| n.name() == Some(name))
    }
}

pub struct Walk<'a> {
    stack: Vec<NodeRef<'a>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<NodeRef<'a>> {
        let current = self.stack.pop()?;
        for child in current.node.children.iter().rev() {
            self.stack.push(NodeRef {
                node: child,
                parent: Some(current.node),
                depth: current.depth + 1,
            });
        }
        Some(current)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocTree {
    /// Spans the whole file.
    pub root: DocNode,
    /// Tags that never found their anchor.
    pub unresolved: Vec<AnnotationTag>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutput {
    pub tree: DocTree,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> DocNode {
        DocNode::anchored(CodeAnchor {
            kind: AnchorKind::Function,
            name: name.into(),
            span: Span::default(),
        })
    }

    #[test]
    fn walk_is_depth_first_left_to_right() {
        let mut a = leaf("a");
        a.children.push(leaf("a1"));
        a.children.push(leaf("a2"));
        let root = DocNode {
            children: vec![a, leaf("b")],
            ..Default::default()
        };
        let names: Vec<_> = root.walk().filter_map(|r| r.node.name()).collect();
        assert_eq!(names, ["a", "a1", "a2", "b"]);
    }

    #[test]
    fn walk_reports_parent_and_depth() {
        let mut a = leaf("a");
        a.children.push(leaf("a1"));
        let root = DocNode {
            children: vec![a],
            ..Default::default()
        };
        let a1 = root.walk().find(|r| r.node.name() == Some("a1")).unwrap();
        assert_eq!(a1.depth, 2);
        assert_eq!(a1.parent.and_then(|p| p.name()), Some("a"));
    }
}
