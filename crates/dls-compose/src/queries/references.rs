//! References: every occurrence that *resolves to* a named entry in a
//! top-level section (`services`/`networks`/`volumes`/`configs`/
//! `secrets`/`models`), the inverse of [`crate::queries::definition`].

use dls_core::LineIndex;
use lsp_types::{Location, Position, Url};

use crate::ir::{Mapping, Node};
use crate::queries::definition::REFERENCE_ATTRIBUTES;
use crate::queries::position::focus_at;
use crate::ComposeDocument;

/// Byte spans of every site across the document referencing `name` as
/// belonging to `section` (e.g. `section = "networks"`).
pub fn target_occurrences(doc: &ComposeDocument, section: &str, name: &str) -> Vec<std::ops::Range<usize>> {
    let mut spans = Vec::new();
    let Some(services) = services_mapping(doc) else { return spans };

    for service in &services.entries {
        let Some(body) = service.value.as_mapping() else { continue };

        if section == "services" {
            if let Some(entry) = body.get_entry("depends_on") {
                collect_matches(&entry.value, name, &mut spans);
            }
            if let Some(entry) = body.get_entry("extends") {
                collect_matches(&entry.value, name, &mut spans);
            }
        }

        for (attribute, attr_section) in REFERENCE_ATTRIBUTES {
            if *attr_section != section || *attribute == "depends_on" {
                continue;
            }
            let Some(entry) = body.get_entry(attribute) else { continue };
            collect_matches(&entry.value, name, &mut spans);
        }

        if section == "volumes" {
            if let Some(entry) = body.get_entry("volumes") {
                if let Some(sequence) = entry.value.as_sequence() {
                    for item in &sequence.items {
                        let Some(text) = item.as_scalar_text() else { continue };
                        let volume_name = text.split(':').next().unwrap_or(text);
                        if volume_name == name && !volume_name.starts_with('.') && !volume_name.starts_with('/') {
                            spans.push(item.span());
                        }
                    }
                }
            }
        }
    }
    spans
}

fn collect_matches(node: &Node, name: &str, out: &mut Vec<std::ops::Range<usize>>) {
    if let Some(text) = node.as_scalar_text() {
        if text == name {
            out.push(node.span());
        }
        return;
    }
    if let Some(mapping) = node.as_mapping() {
        for key in ["service", "source"] {
            if let Some(entry) = mapping.get_entry(key) {
                if let Some(text) = entry.value.as_scalar_text() {
                    if text == name {
                        out.push(entry.value.span());
                    }
                }
            }
        }
        return;
    }
    if let Some(sequence) = node.as_sequence() {
        for item in &sequence.items {
            collect_matches(item, name, out);
        }
    }
}

fn services_mapping(doc: &ComposeDocument) -> Option<&Mapping> {
    doc.yaml.root.as_ref()?.as_mapping()?.get("services")?.as_mapping()
}

pub fn references(doc: &ComposeDocument, position: Position, uri: &Url, include_declaration: bool) -> Vec<Location> {
    let index = LineIndex::new(&doc.bytes);

    let (section, name, declaration_span) = match focused_entry(doc, position) {
        Some(found) => found,
        None => {
            let Some((section, name)) = focused_occurrence(doc, position) else { return Vec::new() };
            let Some(declaration_span) = declaration_key_span(doc, section, &name) else { return Vec::new() };
            (section, name, declaration_span)
        }
    };

    let mut locations: Vec<Location> = target_occurrences(doc, section, &name)
        .into_iter()
        .map(|span| Location { uri: uri.clone(), range: index.range(&doc.bytes, span) })
        .collect();

    if include_declaration {
        locations.insert(0, Location { uri: uri.clone(), range: index.range(&doc.bytes, declaration_span) });
    }
    locations
}

fn declaration_key_span(doc: &ComposeDocument, section: &'static str, name: &str) -> Option<std::ops::Range<usize>> {
    let entries: Vec<_> = match section {
        "services" => doc.services().collect(),
        "networks" => doc.networks().collect(),
        "volumes" => doc.volumes().collect(),
        "configs" => doc.configs().collect(),
        "secrets" => doc.secrets().collect(),
        "models" => doc.models().collect(),
        _ => return None,
    };
    entries.into_iter().find(|e| e.key.text == name).map(|e| e.key.span.clone())
}

/// If `position` lands on an occurrence inside some service's
/// `depends_on`/`networks`/`volumes`/`configs`/`secrets`/`models`/
/// `extends` attribute, returns the section and referenced name.
pub(crate) fn focused_occurrence(doc: &ComposeDocument, position: Position) -> Option<(&'static str, String)> {
    let focus = focus_at(doc, position)?;
    let path = focus.key_path();
    if path.first() != Some(&"services") || path.len() < 3 {
        return None;
    }
    let attribute = path[2];
    let text = focus.node.as_scalar_text().or_else(|| {
        let mapping = focus.node.as_mapping()?;
        ["service", "source"].iter().find_map(|key| mapping.get(key)).and_then(Node::as_scalar_text)
    })?;

    if attribute == "extends" {
        return Some(("services", text.to_string()));
    }
    if attribute == "volumes" {
        let name = text.split(':').next().unwrap_or(text);
        if name.starts_with('.') || name.starts_with('/') || name.is_empty() {
            return None;
        }
        return Some(("volumes", name.to_string()));
    }
    for (attr_name, section) in REFERENCE_ATTRIBUTES {
        if attribute == *attr_name {
            return Some((section, text.to_string()));
        }
    }
    None
}

/// If `position` lands on a top-level named entry's key (`services.web`,
/// `networks.frontend`, ...), returns its section, name, and key span.
pub(crate) fn focused_entry(doc: &ComposeDocument, position: Position) -> Option<(&'static str, String, std::ops::Range<usize>)> {
    let focus = focus_at(doc, position)?;
    let path = focus.key_path();
    if path.len() != 1 {
        return None;
    }
    let section = *["services", "networks", "volumes", "configs", "secrets", "models"]
        .iter()
        .find(|s| **s == path[0])?;
    let entry = focus.path[0];
    if !(entry.key.span.start <= focus.offset && focus.offset <= entry.key.span.end) {
        return None;
    }
    Some((section, entry.key.text.clone(), entry.key.span.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_every_reference_to_a_service() {
        let source = "services:\n  db:\n    image: postgres\n  web:\n    depends_on:\n      - db\n  worker:\n    depends_on:\n      - db\n";
        let doc = ComposeDocument::parse(source);
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.find("db:").unwrap();
        let position = index.offset_to_position(&doc.bytes, offset);
        let uri = Url::parse("file:///workspace/compose.yaml").unwrap();
        let locations = references(&doc, position, &uri, true);
        assert_eq!(locations.len(), 3);
    }
}
