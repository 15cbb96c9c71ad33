//! Hover: schema descriptions for attribute keys, and a markdown render
//! of the referenced entry's subtree for `depends_on`/`networks`/
//! `volumes`/`configs`/`secrets`/`models` occurrences.

use lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};

use crate::ir::{Mapping, Node};
use crate::queries::definition::REFERENCE_ATTRIBUTES;
use crate::queries::position::{focus_at, span_covers};
use crate::schema;
use crate::ComposeDocument;

pub fn hover(doc: &ComposeDocument, position: Position) -> Option<Hover> {
    let focus = focus_at(doc, position)?;
    let path = focus.key_path();

    if let Some(entry) = focus.path.last() {
        if span_covers(&entry.key.span, focus.offset) {
            if path.len() >= 3 {
                if let Some(attr) = schema::attribute_doc(path[0], &entry.key.text) {
                    return Some(markdown_hover(attr.description.to_string()));
                }
            }
            if path.len() == 1 {
                if let Some(section) = schema::section_schema(path[0]) {
                    return Some(markdown_hover(section.description.to_string()));
                }
            }
        }
    }

    if path.first() == Some(&"services") && path.len() >= 3 {
        let attribute = path[2];
        let referenced = REFERENCE_ATTRIBUTES
            .iter()
            .find(|(name, _)| *name == attribute)
            .map(|(_, section)| *section)
            .or_else(|| (attribute == "extends").then_some("services"))
            .or_else(|| (attribute == "volumes").then_some("volumes"));

        if let Some(section) = referenced {
            let text = focus.node.as_scalar_text().or_else(|| {
                focus.node.as_mapping().and_then(|m| ["service", "source"].iter().find_map(|k| m.get(k)).and_then(Node::as_scalar_text))
            })?;
            let name = if section == "volumes" { text.split(':').next().unwrap_or(text) } else { text };
            return hover_for_named_entry(doc, section, name);
        }
    }

    None
}

fn hover_for_named_entry(doc: &ComposeDocument, section: &'static str, name: &str) -> Option<Hover> {
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
    let mut value = format!("```yaml\n{}:\n", entry.key.text);
    render_node(&entry.value, 1, &mut value);
    value.push_str("```");
    Some(markdown_hover(value))
}

fn render_node(node: &Node, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Mapping(mapping) => render_mapping(mapping, depth, out),
        Node::Sequence(sequence) => {
            for item in &sequence.items {
                out.push_str(&indent);
                out.push_str("- ");
                if let Some(text) = item.as_scalar_text() {
                    out.push_str(text);
                    out.push('\n');
                } else {
                    out.push('\n');
                    render_node(item, depth + 1, out);
                }
            }
        }
        Node::Scalar(scalar) => {
            out.push_str(&indent);
            out.push_str(&scalar.text);
            out.push('\n');
        }
        Node::Alias(alias) => {
            out.push_str(&indent);
            out.push('*');
            out.push_str(&alias.name);
            out.push('\n');
        }
    }
}

fn render_mapping(mapping: &Mapping, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for entry in &mapping.entries {
        out.push_str(&indent);
        out.push_str(&entry.key.text);
        out.push(':');
        if let Some(text) = entry.value.as_scalar_text() {
            out.push(' ');
            out.push_str(text);
            out.push('\n');
        } else {
            out.push('\n');
            render_node(&entry.value, depth + 1, out);
        }
    }
}

fn markdown_hover(value: String) -> Hover {
    Hover { contents: HoverContents::Markup(MarkupContent { kind: MarkupKind::Markdown, value }), range: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dls_core::LineIndex;

    #[test]
    fn hovering_attribute_key_shows_schema_description() {
        let doc = ComposeDocument::parse("services:\n  web:\n    image: nginx\n");
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.find("image").unwrap();
        let position = index.offset_to_position(&doc.bytes, offset);
        let hover = hover(&doc, position).unwrap();
        match hover.contents {
            HoverContents::Markup(content) => assert!(content.value.contains("start the container")),
            _ => panic!("expected markup"),
        }
    }

    #[test]
    fn hovering_depends_on_entry_renders_target_service() {
        let doc = ComposeDocument::parse("services:\n  db:\n    image: postgres\n  web:\n    depends_on:\n      - db\n");
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.rfind("- db").unwrap() + 2;
        let position = index.offset_to_position(&doc.bytes, offset);
        let hover = hover(&doc, position).unwrap();
        match hover.contents {
            HoverContents::Markup(content) => assert!(content.value.contains("postgres")),
            _ => panic!("expected markup"),
        }
    }
}
