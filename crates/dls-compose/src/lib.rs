//! Compose (YAML) document analysis: parsing and the full LSP query
//! surface over `services`/`networks`/`volumes`/`configs`/`secrets`/
//! `models` entries.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]

pub mod ir;
pub mod lexer;
pub mod parser;
pub mod queries;
pub mod schema;

use ir::{Node, YamlDocument};
use parser::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseErrorSpan {
    pub message: String,
    pub span: ir::Span,
}

/// A parsed Compose file: the source text plus its YAML node tree.
#[derive(Debug, Clone)]
pub struct ComposeDocument {
    pub bytes: String,
    pub yaml: YamlDocument,
    pub parse_errors: Vec<ParseErrorSpan>,
}

const TOP_LEVEL_MAPS: &[&str] = &["services", "networks", "volumes", "configs", "secrets", "models"];

impl ComposeDocument {
    pub fn parse(bytes: &str) -> Self {
        let (yaml, errors) = parser::parse(bytes);
        let parse_errors = errors
            .into_iter()
            .map(|ParseError { message, span }| ParseErrorSpan { message, span })
            .collect();
        ComposeDocument { bytes: bytes.to_string(), yaml, parse_errors }
    }

    fn root_mapping(&self) -> Option<&ir::Mapping> {
        self.yaml.root.as_ref().and_then(Node::as_mapping)
    }

    fn top_level(&self, key: &str) -> Option<&ir::Mapping> {
        self.root_mapping().and_then(|m| m.get(key)).and_then(|n| self.yaml.resolve_mapping(n))
    }

    /// Entries of a top-level map-of-named-things section (e.g.
    /// `services`), transparent to anchors/aliases on the section value.
    fn named_entries<'a>(&'a self, key: &'static str) -> Box<dyn Iterator<Item = &'a ir::MappingEntry> + 'a> {
        match self.top_level(key) {
            Some(mapping) => Box::new(mapping.entries.iter()),
            None => Box::new(std::iter::empty()),
        }
    }

    pub fn services(&self) -> impl Iterator<Item = &ir::MappingEntry> {
        self.named_entries("services")
    }

    pub fn networks(&self) -> impl Iterator<Item = &ir::MappingEntry> {
        self.named_entries("networks")
    }

    pub fn volumes(&self) -> impl Iterator<Item = &ir::MappingEntry> {
        self.named_entries("volumes")
    }

    pub fn configs(&self) -> impl Iterator<Item = &ir::MappingEntry> {
        self.named_entries("configs")
    }

    pub fn secrets(&self) -> impl Iterator<Item = &ir::MappingEntry> {
        self.named_entries("secrets")
    }

    pub fn models(&self) -> impl Iterator<Item = &ir::MappingEntry> {
        self.named_entries("models")
    }

    pub fn find_service(&self, name: &str) -> Option<&ir::MappingEntry> {
        self.services().find(|e| e.key.text == name)
    }

    /// Every `(section, entry)` pair across the six named top-level
    /// sections, used by cross-reference walks that don't care which
    /// kind of thing is being referenced.
    pub fn all_named_entries(&self) -> impl Iterator<Item = (&'static str, &ir::MappingEntry)> {
        TOP_LEVEL_MAPS.iter().flat_map(move |section| self.named_entries(section).map(move |e| (*section, e)))
    }

    /// `include:` entries: either a bare string path or a mapping with a
    /// `path` (string or string-sequence).
    pub fn include_paths(&self) -> Vec<String> {
        let Some(root) = self.root_mapping() else { return Vec::new() };
        let Some(include) = root.get("include") else { return Vec::new() };
        let Some(sequence) = self.yaml.resolve(include).and_then(Node::as_sequence) else { return Vec::new() };
        sequence
            .items
            .iter()
            .flat_map(|item| self.include_entry_paths(item))
            .collect()
    }

    fn include_entry_paths(&self, item: &Node) -> Vec<String> {
        let Some(resolved) = self.yaml.resolve(item) else { return Vec::new() };
        if let Some(text) = resolved.as_scalar_text() {
            return vec![text.to_string()];
        }
        let Some(mapping) = resolved.as_mapping() else { return Vec::new() };
        let Some(path) = mapping.get("path") else { return Vec::new() };
        let Some(path) = self.yaml.resolve(path) else { return Vec::new() };
        if let Some(text) = path.as_scalar_text() {
            vec![text.to_string()]
        } else if let Some(seq) = path.as_sequence() {
            seq.items.iter().filter_map(|n| self.yaml.resolve(n)).filter_map(Node::as_scalar_text).map(str::to_string).collect()
        } else {
            Vec::new()
        }
    }

    /// Compose has no cheap structural fingerprint, so every edit is
    /// treated as a change, the same policy as Bake.
    pub fn changed_from(&self, _previous: &ComposeDocument) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_services_and_their_anchors() {
        let doc = ComposeDocument::parse("services:\n  web:\n    image: nginx\n  db:\n    image: postgres\n");
        let names: Vec<_> = doc.services().map(|e| e.key.text.clone()).collect();
        assert_eq!(names, vec!["web", "db"]);
    }

    #[test]
    fn collects_include_paths_from_strings_and_mappings() {
        let doc = ComposeDocument::parse("include:\n  - ./common.yaml\n  - path: ./other.yaml\n");
        assert_eq!(doc.include_paths(), vec!["./common.yaml", "./other.yaml"]);
    }

    #[test]
    fn collects_include_paths_from_path_sequences() {
        let doc = ComposeDocument::parse("include:\n  - path:\n      - ./a.yaml\n      - ./b.yaml\n");
        assert_eq!(doc.include_paths(), vec!["./a.yaml", "./b.yaml"]);
    }
}
