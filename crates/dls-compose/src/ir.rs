//! The parsed shape of a Compose document: a YAML node tree carrying
//! byte spans, plus the anchor/alias registry resolved during parsing.
//!
//! Built by [`crate::parser`] instead of leaning on a third-party YAML
//! crate, the same call [`dls_bake::ir`] made for HCL: the query layer
//! below only ever touches this IR.

use std::ops::Range;

use rustc_hash::FxHashMap;

pub type Span = Range<usize>;

#[derive(Debug, Clone, PartialEq)]
pub struct YamlDocument {
    pub root: Option<Node>,
    pub anchors: FxHashMap<String, AnchorDef>,
    pub aliases: Vec<Alias>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnchorDef {
    pub name_span: Span,
    pub node: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Mapping(Mapping),
    Sequence(Sequence),
    Scalar(Scalar),
    Alias(Alias),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub entries: Vec<MappingEntry>,
    pub anchor: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub key: Scalar,
    pub value: Node,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub items: Vec<Node>,
    pub anchor: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub text: String,
    pub anchor: Option<String>,
    pub quoted: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub name: String,
    pub span: Span,
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Mapping(m) => m.span.clone(),
            Node::Sequence(s) => s.span.clone(),
            Node::Scalar(s) => s.span.clone(),
            Node::Alias(a) => a.span.clone(),
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Node::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_scalar_text(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => Some(s.text.as_str()),
            _ => None,
        }
    }

    /// Children in source order, for recursive position resolution.
    /// Traverses through aliases is *not* done here (callers that need
    /// alias-transparent traversal resolve via [`YamlDocument::resolve`]
    /// first).
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Mapping(m) => m.entries.iter().flat_map(|e| [&e.value]).collect(),
            Node::Sequence(s) => s.items.iter().collect(),
            Node::Scalar(_) | Node::Alias(_) => Vec::new(),
        }
    }
}

impl Mapping {
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|e| e.key.text == key).map(|e| &e.value)
    }

    pub fn get_entry(&self, key: &str) -> Option<&MappingEntry> {
        self.entries.iter().find(|e| e.key.text == key)
    }
}

impl YamlDocument {
    /// Resolves an [`Alias`] node to the [`Node`] its anchor defines;
    /// traversal through an alias recurses into its anchor's subtree.
    pub fn resolve<'a>(&'a self, node: &'a Node) -> Option<&'a Node> {
        match node {
            Node::Alias(alias) => self.anchors.get(&alias.name).map(|def| &def.node),
            other => Some(other),
        }
    }

    pub fn resolve_mapping<'a>(&'a self, node: &'a Node) -> Option<&'a Mapping> {
        self.resolve(node).and_then(Node::as_mapping)
    }
}
