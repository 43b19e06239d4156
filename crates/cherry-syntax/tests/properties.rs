//! Property tests: totality, order preservation, attachment locality and
//! resilience to unrecognized input.

use cherry_syntax::{
    scan, scan_with, DocNode, LanguageSet, Placement, ScanOptions, ScanOutput, TagRegistry,
};
use proptest::prelude::*;

fn run(language: &str, source: &str) -> ScanOutput {
    scan(source, language, &LanguageSet::builtin(), &TagRegistry::standard()).unwrap()
}

/// Tag names per anchor name, in tree order.
fn attachments(out: &ScanOutput) -> Vec<(String, Vec<String>)> {
    out.tree
        .root
        .walk()
        .filter_map(|r| {
            let name = r.node.name()?;
            let tags = r.node.tags.iter().map(|t| t.name.clone()).collect();
            Some((name.to_string(), tags))
        })
        .collect()
}

// -- strategies --

fn code_soup() -> impl Strategy<Value = String> {
    let piece = prop::sample::select(vec![
        "{", "}", "(", ")", "[", "]", "/*", "*/", "//", "#", "\"", "'", "`", "\"\"\"", "/", ":",
        ";", "\n", "    ", "@param x", "@param(a, ", "@module m", "function f", "class K",
        "def g", "func (r T) M", " = ", "=>", "\\", "é",
    ]);
    prop::collection::vec(piece, 0..80).prop_map(|parts| parts.concat())
}

/// One well-formed top-level JavaScript construct.
fn unit() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(|n| format!("// @module m_{n}\n")),
        "[a-z]{1,8}".prop_map(|n| format!("/**\n * @function\n * @param x\n */\nfunction f_{n}(x) {{}}\n")),
        "[a-z]{1,8}".prop_map(|n| format!("function p_{n}(a) {{\n  return a;\n}}\n")),
        ("[a-z]{1,6}", "[a-z]{1,6}").prop_map(|(c, m)| format!(
            "/** @class */\nclass C_{c} {{\n  /** @method\n   * @param x\n   */\n  m_{m}(x) {{\n    return x;\n  }}\n}}\n"
        )),
        // A free block between a pending block and its anchor.
        "[a-z]{1,8}".prop_map(|n| format!("/** @function */\n// @module m_{n}\nfunction g_{n}() {{}}\n")),
    ]
}

/// One well-formed top-level Python construct.
fn py_unit() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(|n| format!("# @module m_{n}\n")),
        "[a-z]{1,8}".prop_map(|n| format!("# @function\n# @param x\ndef f_{n}(x):\n    return x\n")),
        "[a-z]{1,8}".prop_map(|n| format!("# @function\n# @module m_{n}\ndef g_{n}():\n    pass\n")),
        ("[a-z]{1,6}", "[a-z]{1,6}").prop_map(|(c, m)| format!(
            "# @class\nclass C_{c}:\n    # @method\n    def m_{m}(self):\n        pass\n    # @module inner_{c}\n"
        )),
    ]
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(unit(), 0..8).prop_map(|units| units.join("\n"))
}

fn py_document() -> impl Strategy<Value = String> {
    prop::collection::vec(py_unit(), 0..8).prop_map(|units| units.join("\n"))
}

/// Any well-formed document with its language.
fn any_document() -> impl Strategy<Value = (&'static str, String)> {
    prop_oneof![
        document().prop_map(|d| ("javascript", d)),
        py_document().prop_map(|d| ("python", d)),
    ]
}

/// A line of junk that breaks structure.
fn breaker() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(")".to_string()),
        Just("]".to_string()),
        Just("}".to_string()),
        Just("foo(1));".to_string()),
        "[a-z ]{0,10}".prop_map(|s| format!("'{s}")),
        "[a-z ]{0,10}".prop_map(|s| format!("x = \"{s}")),
    ]
}

/// A line of junk that is merely uninteresting.
fn plain() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("x = 1;".to_string()),
        Just("foo(bar, baz);".to_string()),
        Just("a.b.c = d".to_string()),
        Just("if (x) { y(); }".to_string()),
        Just("var q = [1, 2, 3];".to_string()),
        Just("z++;".to_string()),
        "[a-z]{1,10}".prop_map(|s| format!("v_{s};")),
    ]
}

fn junk() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(plain(), 0..3),
        breaker(),
        prop::collection::vec(plain(), 0..3),
    )
        .prop_map(|(before, bad, after)| {
            let mut lines = before;
            lines.push(bad);
            lines.extend(after);
            lines.join("\n")
        })
}

const ANNOTATED_PAIR: (&str, &str) = (
    "/**\n * @function alpha\n * @param x\n */\nfunction alpha(x) {\n  return x;\n}\n",
    "/**\n * @function beta\n * @returns {int}\n */\nfunction beta() {\n  return 1;\n}\n",
);

fn check_spans(node: &DocNode, len: usize) {
    for r in node.walk() {
        assert!(r.node.span.start.offset <= r.node.span.end.offset);
        assert!(r.node.span.end.offset <= len);
        if let Some(parent) = r.parent {
            assert!(
                parent.span.contains(&r.node.span),
                "{:?} {} does not contain {:?} {}",
                parent.name(),
                parent.span,
                r.node.name(),
                r.node.span
            );
        }
        for tag in &r.node.tags {
            assert!(tag.span.end.offset <= len);
        }
    }
}

proptest! {
    #[test]
    fn scan_is_total_on_any_text(src in "(?s).{0,300}") {
        for lang in ["javascript", "python", "go"] {
            let out = run(lang, &src);
            check_spans(&out.tree.root, src.len());
        }
    }

    #[test]
    fn scan_is_total_on_code_soup(src in code_soup(), depth in 1usize..8) {
        let languages = LanguageSet::builtin();
        let registry = TagRegistry::standard();
        let options = ScanOptions::default().with_max_depth(depth);
        for lang in ["javascript", "python", "go"] {
            let out = scan_with(&src, lang, &languages, &registry, &options).unwrap();
            check_spans(&out.tree.root, src.len());
        }
    }

    #[test]
    fn well_formed_documents_scan_cleanly((lang, src) in any_document()) {
        let out = run(lang, &src);
        prop_assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        prop_assert!(out.tree.unresolved.is_empty());
        check_spans(&out.tree.root, src.len());
    }

    #[test]
    fn tag_order_follows_source_order((lang, src) in any_document()) {
        let out = run(lang, &src);
        let starts: Vec<usize> = out.tree.root.all_tags().map(|t| t.span.start.offset).collect();
        prop_assert!(starts.windows(2).all(|w| w[0] < w[1]), "{:?}", starts);
    }

    #[test]
    fn tags_bind_to_the_nearest_anchor(src in document()) {
        let out = run("javascript", &src);
        let anchored: Vec<_> = out
            .tree
            .root
            .walk()
            .filter(|r| r.node.anchor.is_some())
            .collect();
        for r in &anchored {
            let start = r.node.span.start.offset;
            for tag in r.node.tags.iter().filter(|t| t.placement == Placement::NextAnchor) {
                let between = anchored.iter().any(|o| {
                    let s = o.node.span.start.offset;
                    o.depth == r.depth && tag.span.end.offset <= s && s < start
                });
                prop_assert!(!between, "@{} skipped over an anchor", tag.name);
            }
        }
    }

    #[test]
    fn junk_between_constructs_changes_nothing(junk in junk()) {
        let (a, b) = ANNOTATED_PAIR;
        let clean = run("javascript", &format!("{a}\n{b}"));
        let dirty = run("javascript", &format!("{a}{junk}\n\n{b}"));
        prop_assert_eq!(attachments(&clean), attachments(&dirty));
        prop_assert!(
            dirty.diagnostics.iter().any(|d| d.kind.is_recovery()),
            "{:?}",
            dirty.diagnostics
        );
    }
}
