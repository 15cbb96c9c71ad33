//! Definition: cross-reference resolution between a
//! service's `depends_on`/`networks`/`volumes`/`configs`/`secrets`/
//! `models`/`extends` entries and the top-level section they name, plus
//! `build.target` into a caller-supplied sibling Dockerfile's stages.

use dls_core::LineIndex;
use dls_dockerfile::DockerfileDocument;
use lsp_types::{Position, Range};

use crate::ir::Node;
use crate::queries::position::{focus_at, span_covers};
use crate::ComposeDocument;

#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionResult {
    pub origin_selection_range: Range,
    pub target_range: Range,
}

/// Sections a service-level array/scalar attribute can name an entry
/// in, keyed by the attribute name that holds the reference.
pub(crate) const REFERENCE_ATTRIBUTES: &[(&str, &str)] =
    &[("depends_on", "services"), ("networks", "networks"), ("configs", "configs"), ("secrets", "secrets"), ("models", "models")];

pub fn definition(doc: &ComposeDocument, position: Position, dockerfile: Option<&DockerfileDocument>) -> Option<DefinitionResult> {
    let focus = focus_at(doc, position)?;
    let index = LineIndex::new(&doc.bytes);
    let path = focus.key_path();

    if path.first() == Some(&"services") && path.len() >= 3 {
        let attribute = path[2];

        if attribute == "extends" {
            return definition_in_named_section(doc, &index, focus.node, focus.offset, "services");
        }

        if attribute == "build" && path.get(3) == Some(&"target") {
            let stage_name = focus.node.as_scalar_text()?;
            let dockerfile = dockerfile?;
            let stage = dockerfile.stage_by_reference(stage_name)?;
            return Some(DefinitionResult {
                origin_selection_range: index.range(&doc.bytes, focus.node.span()),
                target_range: stage.range,
            });
        }

        if attribute == "volumes" {
            let text = focus.node.as_scalar_text()?;
            let name = text.split(':').next().unwrap_or(text);
            if name.starts_with('.') || name.starts_with('/') || name.is_empty() {
                return None;
            }
            return definition_by_name(doc, &index, name, focus.node.span(), "volumes");
        }

        for (attr_name, section) in REFERENCE_ATTRIBUTES {
            if attribute != *attr_name {
                continue;
            }
            return definition_in_named_section(doc, &index, focus.node, focus.offset, section);
        }
    }

    None
}

fn definition_in_named_section(doc: &ComposeDocument, index: &LineIndex, node: &Node, offset: usize, section: &'static str) -> Option<DefinitionResult> {
    // The referenced entry may be a bare scalar ("app") or a mapping
    // with a source-like key (`service:`, `source:`).
    if let Some(text) = node.as_scalar_text() {
        if !span_covers(&node.span(), offset) {
            return None;
        }
        return definition_by_name(doc, index, text, node.span(), section);
    }
    let mapping = node.as_mapping()?;
    for key in ["service", "source"] {
        let Some(entry) = mapping.get_entry(key) else { continue };
        if span_covers(&entry.value.span(), offset) {
            let text = entry.value.as_scalar_text()?;
            return definition_by_name(doc, index, text, entry.value.span(), section);
        }
    }
    None
}

fn definition_by_name(doc: &ComposeDocument, index: &LineIndex, name: &str, origin_span: std::ops::Range<usize>, section: &'static str) -> Option<DefinitionResult> {
    let entries: Vec<_> = match section {
        "services" => doc.services().collect(),
        "networks" => doc.networks().collect(),
        "volumes" => doc.volumes().collect(),
        "configs" => doc.configs().collect(),
        "secrets" => doc.secrets().collect(),
        "models" => doc.models().collect(),
        _ => return None,
    };
    let entry = entries.into_iter().find(|e| e.key.text == name)?;
    Some(DefinitionResult {
        origin_selection_range: index.range(&doc.bytes, origin_span),
        target_range: index.range(&doc.bytes, entry.key.span.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depends_on_entry_resolves_to_service_key() {
        let source = "services:\n  web:\n    depends_on:\n      - db\n  db:\n    image: postgres\n";
        let doc = ComposeDocument::parse(source);
        let offset = doc.bytes.rfind("- db").unwrap() + 2;
        let index = LineIndex::new(&doc.bytes);
        let position = index.offset_to_position(&doc.bytes, offset);
        let result = definition(&doc, position, None).unwrap();
        let db_key_offset = doc.bytes.find("db:").unwrap();
        assert_eq!(result.target_range, index.range(&doc.bytes, db_key_offset..(db_key_offset + 2)));
    }

    #[test]
    fn network_reference_resolves_to_top_level_network() {
        let source = "services:\n  web:\n    networks:\n      - frontend\nnetworks:\n  frontend:\n    driver: bridge\n";
        let doc = ComposeDocument::parse(source);
        let offset = doc.bytes.rfind("frontend").unwrap();
        let index = LineIndex::new(&doc.bytes);
        let position = index.offset_to_position(&doc.bytes, offset + 1);
        let result = definition(&doc, position, None).unwrap();
        let network_key_offset = doc.bytes.rfind("frontend:").unwrap();
        assert_eq!(result.target_range.start, index.offset_to_position(&doc.bytes, network_key_offset));
    }
}
