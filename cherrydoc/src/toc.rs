//! GitHub-flavored markdown anchor/slug generation.

use std::collections::HashMap;

/// Hands out heading anchors the way GitHub does, numbering repeats
/// (`run`, `run-1`, `run-2`).
#[derive(Default)]
pub struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slug(&mut self, text: &str) -> String {
        let base = github_slug(text);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base
        } else {
            format!("{}-{}", base, count)
        };
        *count += 1;
        slug
    }
}

/// Generate a TOC list item, indented two spaces per nesting level.
pub fn render_toc_item(title: &str, slug: &str, depth: usize) -> String {
    format!("{}* [{}](#{})", "  ".repeat(depth), title, slug)
}

/// GitHub heading anchor slug.
///
/// - lowercase
/// - keep alphanumerics, spaces, hyphens and underscores
/// - replace spaces with hyphens
fn github_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
            slug.push(c);
        }
    }
    slug.replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_simple() {
        assert_eq!(github_slug("hello world"), "hello-world");
    }

    #[test]
    fn slug_drops_punctuation() {
        assert_eq!(github_slug("Selection.prototype"), "selectionprototype");
        assert_eq!(github_slug("Circle.area()"), "circlearea");
        assert_eq!(github_slug("_private"), "_private");
    }

    #[test]
    fn repeated_headings_are_numbered() {
        let mut s = Slugger::new();
        assert_eq!(s.slug("run"), "run");
        assert_eq!(s.slug("Run"), "run-1");
        assert_eq!(s.slug("run"), "run-2");
        assert_eq!(s.slug("stop"), "stop");
    }

    #[test]
    fn toc_item_indents_by_depth() {
        assert_eq!(render_toc_item("A", "a", 0), "* [A](#a)");
        assert_eq!(render_toc_item("A.run", "arun", 1), "  * [A.run](#arun)");
    }
}
