//! Tag grammar registry — which `@tags` exist and how they bind.

use crate::diagnostics::SyntaxError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What an argument slot expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgKind {
    /// Any single word, quotes stripped when present.
    String,
    /// Dotted identifier path (`$` allowed, as in JavaScript).
    Identifier,
    /// Type expression; brackets must balance.
    TypeExpression,
    /// Rest of the header line.
    FreeText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSlot {
    pub name: String,
    pub kind: ArgKind,
    pub optional: bool,
}

impl ArgSlot {
    pub fn required(name: &str, kind: ArgKind) -> Self {
        ArgSlot {
            name: name.to_string(),
            kind,
            optional: false,
        }
    }

    pub fn optional(name: &str, kind: ArgKind) -> Self {
        ArgSlot {
            name: name.to_string(),
            kind,
            optional: true,
        }
    }
}

/// How often a tag may appear in one comment block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Multiplicity {
    ZeroOrOne,
    ZeroOrMany,
}

/// Where a parsed tag ends up in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    /// Buffered until the next anchor at the same depth.
    NextAnchor,
    /// Attached to the enclosing scope without an anchor.
    FreeFloating,
    /// Attached to the anchor whose body currently encloses the comment.
    EnclosingAnchor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDefinition {
    /// Case-sensitive, without the leading `@`.
    pub name: String,
    pub slots: Vec<ArgSlot>,
    pub multiplicity: Multiplicity,
    pub placement: Placement,
}

impl TagDefinition {
    pub fn new(name: &str, placement: Placement) -> Self {
        TagDefinition {
            name: name.to_string(),
            slots: Vec::new(),
            multiplicity: Multiplicity::ZeroOrMany,
            placement,
        }
    }

    pub fn slot(mut self, slot: ArgSlot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn once(mut self) -> Self {
        self.multiplicity = Multiplicity::ZeroOrOne;
        self
    }

    /// Number of slots that must be filled.
    pub fn required_arity(&self) -> usize {
        self.slots.iter().filter(|s| !s.optional).count()
    }
}

/// Name → definition map, read-only once handed to a scan.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    tags: BTreeMap<String, TagDefinition>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: TagDefinition) -> Result<(), SyntaxError> {
        if self.tags.contains_key(&def.name) {
            return Err(SyntaxError::DuplicateTag(def.name));
        }
        self.tags.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TagDefinition> {
        self.tags.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagDefinition> {
        self.tags.values()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// NaturalDocs/JSDoc-flavoured tag set used by the CLI and the tests.
    pub fn standard() -> Self {
        use ArgKind::*;
        use Placement::*;

        let defs = [
            TagDefinition::new("module", FreeFloating)
                .slot(ArgSlot::required("name", String))
                .once(),
            TagDefinition::new("function", NextAnchor)
                .slot(ArgSlot::optional("name", Identifier))
                .once(),
            TagDefinition::new("method", NextAnchor)
                .slot(ArgSlot::optional("name", Identifier))
                .once(),
            TagDefinition::new("class", NextAnchor)
                .slot(ArgSlot::optional("name", Identifier))
                .once(),
            TagDefinition::new("classmethod", NextAnchor)
                .slot(ArgSlot::optional("name", Identifier))
                .once(),
            TagDefinition::new("param", NextAnchor)
                .slot(ArgSlot::required("name", Identifier))
                .slot(ArgSlot::optional("type", TypeExpression)),
            TagDefinition::new("returns", NextAnchor)
                .slot(ArgSlot::optional("type", TypeExpression))
                .once(),
            TagDefinition::new("type", NextAnchor)
                .slot(ArgSlot::required("type", TypeExpression))
                .once(),
            TagDefinition::new("example", NextAnchor),
            TagDefinition::new("parent", NextAnchor)
                .slot(ArgSlot::required("name", Identifier))
                .once(),
            TagDefinition::new("see", NextAnchor).slot(ArgSlot::required("target", FreeText)),
            TagDefinition::new("deprecated", NextAnchor).once(),
            TagDefinition::new("attribute", EnclosingAnchor)
                .slot(ArgSlot::required("name", Identifier))
                .slot(ArgSlot::optional("type", TypeExpression)),
        ];

        let mut registry = TagRegistry::new();
        for def in defs {
            registry.tags.insert(def.name.clone(), def);
        }
        registry
    }
}
