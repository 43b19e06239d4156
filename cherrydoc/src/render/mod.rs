//! Renderer module — trait-based format dispatch.

pub mod json;
pub mod markdown;
pub mod tree;

use anyhow::{anyhow, Result};
use cherry_syntax::{AnnotationTag, ArgValue, ScanOutput};

/// Trait for rendering one file's scan result into a specific output format.
pub trait Renderer {
    fn render(&self, file: &str, out: &ScanOutput) -> Result<String>;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "markdown" | "md" => Ok(Box::new(markdown::MarkdownRenderer)),
        "tree" => Ok(Box::new(tree::TreeRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!(
            "unknown format: {}. Use markdown, tree, or json",
            format
        )),
    }
}

/// `@name(arg, arg)` as written, with raw arguments kept verbatim.
fn tag_header(tag: &AnnotationTag) -> String {
    if tag.args.is_empty() {
        return format!("@{}", tag.name);
    }
    let args: Vec<&str> = tag.args.iter().map(ArgValue::text).collect();
    format!("@{}({})", tag.name, args.join(", "))
}
