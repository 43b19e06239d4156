//! GitHub-flavored markdown renderer.
//!
//! One heading per anchored node, nested names joined with `.`, an index on
//! top, and `{@link name}` references turned into in-page links.

use crate::render::{tag_header, Renderer};
use crate::toc::{self, Slugger};
use anyhow::Result;
use cherry_syntax::{AnnotationTag, DocNode, ScanOutput};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

pub struct MarkdownRenderer;

static RE_INLINE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{@link\s+([^}\s]+)\s*\}").unwrap());

/// Tags whose body describes the node itself.
const DESCRIBING: &[&str] = &["module", "class", "classmethod", "function", "method", "type"];

struct Section<'a> {
    title: String,
    depth: usize,
    node: &'a DocNode,
}

impl Renderer for MarkdownRenderer {
    fn render(&self, file: &str, out: &ScanOutput) -> Result<String> {
        let root = &out.tree.root;
        let mut sections = Vec::new();
        collect(root, None, 0, &mut sections);

        let mut slugger = Slugger::new();
        let slugs: Vec<String> = sections.iter().map(|s| slugger.slug(&s.title)).collect();
        let mut links: HashMap<&str, &str> = HashMap::new();
        for (section, slug) in sections.iter().zip(&slugs) {
            links.entry(section.title.as_str()).or_insert(slug);
            if let Some(name) = section.node.name() {
                links.entry(name).or_insert(slug);
            }
        }

        let mut output = String::new();

        // Title from the first @module, else the file name
        let top_tags: Vec<&AnnotationTag> = own_tags(root).collect();
        let module = top_tags.iter().find(|t| t.name == "module");
        let title = module.and_then(|t| t.arg("name")).unwrap_or(file);
        output.push_str(&format!("# {}\n\n", title));
        output.push_str(&render_tags(&top_tags, &links));

        if !sections.is_empty() {
            output.push_str("## Index\n\n");
            for (section, slug) in sections.iter().zip(&slugs) {
                output.push_str(&toc::render_toc_item(&section.title, slug, section.depth));
                output.push('\n');
            }
            output.push('\n');
        }

        for section in &sections {
            output.push_str(&render_section(section, &links));
        }

        Ok(output)
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}

/// Anchored descendants in document order, with dotted titles.
fn collect<'a>(node: &'a DocNode, prefix: Option<&str>, depth: usize, out: &mut Vec<Section<'a>>) {
    for child in &node.children {
        let Some(ref anchor) = child.anchor else {
            continue;
        };
        let name = if anchor.name.is_empty() {
            "(anonymous)"
        } else {
            anchor.name.as_str()
        };
        let title = match prefix {
            Some(p) => format!("{}.{}", p, name),
            None => name.to_string(),
        };
        out.push(Section {
            title: title.clone(),
            depth,
            node: child,
        });
        collect(child, Some(&title), depth + 1, out);
    }
}

/// A node's tags plus those of its free-floating children.
fn own_tags(node: &DocNode) -> impl Iterator<Item = &AnnotationTag> {
    node.tags.iter().chain(
        node.children
            .iter()
            .filter(|c| c.anchor.is_none())
            .flat_map(|c| c.tags.iter()),
    )
}

fn render_section(section: &Section, links: &HashMap<&str, &str>) -> String {
    let level = (section.depth + 2).min(6);
    let mut out = format!("{} {}\n\n", "#".repeat(level), section.title);
    if let Some(ref anchor) = section.node.anchor {
        out.push_str(&format!("`{}` (line {})\n\n", anchor.kind, anchor.span.start.line));
    }
    let tags: Vec<&AnnotationTag> = own_tags(section.node).collect();
    out.push_str(&render_tags(&tags, links));
    out
}

fn render_tags(tags: &[&AnnotationTag], links: &HashMap<&str, &str>) -> String {
    let mut out = String::new();
    let mut params = Vec::new();
    let mut attributes = Vec::new();
    let mut returns = None;
    let mut examples = Vec::new();
    let mut see = Vec::new();
    let mut other = Vec::new();

    for tag in tags {
        match tag.name.as_str() {
            "deprecated" => {
                let note = body_text(tag, links);
                if note.is_empty() {
                    out.push_str("> **Deprecated**\n\n");
                } else {
                    out.push_str(&format!("> **Deprecated**: {}\n\n", note));
                }
            }
            name if DESCRIBING.contains(&name) => {
                let body = body_text(tag, links);
                if !body.is_empty() {
                    out.push_str(&body);
                    out.push_str("\n\n");
                }
            }
            "param" => params.push(*tag),
            "attribute" => attributes.push(*tag),
            "returns" => returns = Some(*tag),
            "example" => examples.push(*tag),
            "see" => see.push(*tag),
            _ => other.push(*tag),
        }
    }

    if !params.is_empty() {
        out.push_str("**Parameters**\n\n");
        for tag in &params {
            out.push_str(&typed_item(tag, links));
        }
        out.push('\n');
    }
    if !attributes.is_empty() {
        out.push_str("**Attributes**\n\n");
        for tag in &attributes {
            out.push_str(&typed_item(tag, links));
        }
        out.push('\n');
    }
    if let Some(tag) = returns {
        let mut line = String::from("**Returns**");
        if let Some(ty) = tag.arg("type") {
            line.push_str(&format!(": `{}`", ty));
        }
        let body = body_text(tag, links);
        if !body.is_empty() {
            line.push(' ');
            line.push_str(&body);
        }
        out.push_str(&line);
        out.push_str("\n\n");
    }
    for tag in &examples {
        out.push_str("**Example**\n\n```\n");
        out.push_str(tag.body.trim_end());
        out.push_str("\n```\n\n");
    }
    if !see.is_empty() {
        let targets: Vec<String> = see
            .iter()
            .map(|t| link_to(t.arg("target").unwrap_or_default(), links))
            .collect();
        out.push_str(&format!("**See also**: {}\n\n", targets.join(", ")));
    }
    for tag in &other {
        let mut line = format!("* `{}`", tag_header(tag));
        let body = body_text(tag, links);
        if !body.is_empty() {
            line.push(' ');
            line.push_str(&body);
        }
        out.push_str(&line);
        out.push('\n');
    }
    if !other.is_empty() {
        out.push('\n');
    }
    out
}

/// `* `name` (`Type`): text`, falling back to the raw arguments.
fn typed_item(tag: &AnnotationTag, links: &HashMap<&str, &str>) -> String {
    let mut line = match tag.arg("name") {
        Some(name) => format!("* `{}`", name),
        None => format!("* `{}`", tag_header(tag)),
    };
    if let Some(ty) = tag.arg("type") {
        line.push_str(&format!(" (`{}`)", ty));
    }
    let body = body_text(tag, links);
    if !body.is_empty() {
        line.push_str(": ");
        line.push_str(&body);
    }
    line.push('\n');
    line
}

/// Body as a single paragraph with inline links resolved.
fn body_text(tag: &AnnotationTag, links: &HashMap<&str, &str>) -> String {
    let flat = tag.body.split_whitespace().collect::<Vec<_>>().join(" ");
    RE_INLINE_LINK
        .replace_all(&flat, |caps: &regex::Captures| link_to(&caps[1], links))
        .into_owned()
}

fn link_to(target: &str, links: &HashMap<&str, &str>) -> String {
    match links.get(target) {
        Some(slug) => format!("[{}](#{})", target, slug),
        None => format!("`{}`", target),
    }
}
