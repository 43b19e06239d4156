//! Indented outline renderer, for eyeballing what attached where.

use crate::render::{tag_header, Renderer};
use anyhow::Result;
use cherry_syntax::{AnnotationTag, DocNode, ScanOutput};

pub struct TreeRenderer;

impl Renderer for TreeRenderer {
    fn render(&self, file: &str, out: &ScanOutput) -> Result<String> {
        let root = &out.tree.root;
        let mut lines = vec![file.to_string()];
        for tag in &root.tags {
            lines.push(tag_line(tag, 1));
        }
        for child in &root.children {
            write_node(&mut lines, child, 1);
        }
        if !out.tree.unresolved.is_empty() {
            lines.push("unresolved:".to_string());
            for tag in &out.tree.unresolved {
                lines.push(format!("{} {}", tag_line(tag, 1), tag.span.start));
            }
        }
        let mut text = lines.join("\n");
        text.push('\n');
        Ok(text)
    }

    fn file_extension(&self) -> &str {
        "txt"
    }
}

fn write_node(lines: &mut Vec<String>, node: &DocNode, depth: usize) {
    let label = match node.anchor {
        Some(ref a) if a.name.is_empty() => format!("{} <anonymous>", a.kind),
        Some(ref a) => format!("{} {}", a.kind, a.name),
        None => "(free)".to_string(),
    };
    lines.push(format!("{}{} {}", indent(depth), label, node.span.start));
    for tag in &node.tags {
        lines.push(tag_line(tag, depth + 1));
    }
    for child in &node.children {
        write_node(lines, child, depth + 1);
    }
}

fn tag_line(tag: &AnnotationTag, depth: usize) -> String {
    let mut line = format!("{}{}", indent(depth), tag_header(tag));
    let body = tag.body.split_whitespace().collect::<Vec<_>>().join(" ");
    if !body.is_empty() {
        line.push(' ');
        line.push_str(&body);
    }
    line
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}
