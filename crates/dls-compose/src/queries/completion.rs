//! Completion: attribute-name completion driven by [`crate::schema`],
//! plus reference-aware completions for `depends_on`/`networks`/
//! `volumes`/`configs`/`secrets`/`models` entries and `build.target`.

use dls_dockerfile::DockerfileDocument;
use lsp_types::{CompletionItem, CompletionItemKind, InsertTextFormat, Position};

use crate::queries::definition::REFERENCE_ATTRIBUTES;
use crate::queries::position::focus_at;
use crate::schema;
use crate::ComposeDocument;

pub fn completion(doc: &ComposeDocument, position: Position, dockerfile: Option<&DockerfileDocument>) -> Vec<CompletionItem> {
    let Some(focus) = focus_at(doc, position) else {
        return top_level_completions();
    };
    let path = focus.key_path();

    if path.is_empty() {
        return top_level_completions();
    }

    if path[0] == "services" && path.len() >= 3 {
        let attribute = path[2];
        if attribute == "build" && path.get(3) == Some(&"target") {
            if let Some(dockerfile) = dockerfile {
                return stage_completions(dockerfile);
            }
            return Vec::new();
        }
        if attribute == "volumes" {
            return doc
                .volumes()
                .map(|entry| CompletionItem {
                    label: entry.key.text.clone(),
                    kind: Some(CompletionItemKind::VALUE),
                    insert_text: Some(entry.key.text.clone()),
                    ..CompletionItem::default()
                })
                .collect();
        }
        if attribute == "extends" {
            return named_entry_completions(doc, "services");
        }
        for (attr_name, section) in REFERENCE_ATTRIBUTES {
            if attribute == *attr_name {
                return named_entry_completions(doc, section);
            }
        }
    }

    // Attribute-name completion: path[0] names a schema'd section and
    // path.len() == 2 means we're directly inside a named entry's body.
    if path.len() == 2 {
        if let Some(section) = schema::section_schema(path[0]) {
            return section
                .attributes
                .iter()
                .map(|attr| CompletionItem {
                    label: attr.name.to_string(),
                    kind: Some(CompletionItemKind::PROPERTY),
                    detail: Some(attr.description.to_string()),
                    insert_text: Some(format!("{}: ", attr.name)),
                    insert_text_format: Some(InsertTextFormat::PLAIN_TEXT),
                    ..CompletionItem::default()
                })
                .collect();
        }
    }

    Vec::new()
}

fn named_entry_completions(doc: &ComposeDocument, section: &'static str) -> Vec<CompletionItem> {
    let entries: Vec<_> = match section {
        "services" => doc.services().collect(),
        "networks" => doc.networks().collect(),
        "configs" => doc.configs().collect(),
        "secrets" => doc.secrets().collect(),
        "models" => doc.models().collect(),
        _ => Vec::new(),
    };
    entries
        .into_iter()
        .map(|entry| CompletionItem {
            label: entry.key.text.clone(),
            kind: Some(CompletionItemKind::VALUE),
            insert_text: Some(entry.key.text.clone()),
            ..CompletionItem::default()
        })
        .collect()
}

fn stage_completions(dockerfile: &DockerfileDocument) -> Vec<CompletionItem> {
    dockerfile
        .stages()
        .into_iter()
        .filter_map(|stage| stage.name)
        .map(|name| CompletionItem { label: name.clone(), kind: Some(CompletionItemKind::CLASS), insert_text: Some(name), ..CompletionItem::default() })
        .collect()
}

fn top_level_completions() -> Vec<CompletionItem> {
    schema::TOP_LEVEL_SECTIONS
        .iter()
        .filter(|ident| !ident.ends_with('-'))
        .map(|ident| CompletionItem {
            label: ident.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            insert_text: Some(format!("{ident}:\n  ")),
            insert_text_format: Some(InsertTextFormat::PLAIN_TEXT),
            ..CompletionItem::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dls_core::LineIndex;

    #[test]
    fn depends_on_suggests_other_service_names() {
        let doc = ComposeDocument::parse("services:\n  db:\n    image: postgres\n  web:\n    depends_on:\n      - \n");
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.rfind("- ").unwrap() + 2;
        let position = index.offset_to_position(&doc.bytes, offset);
        let items = completion(&doc, position, None);
        assert!(items.iter().any(|i| i.label == "db"));
    }

    #[test]
    fn service_body_suggests_schema_attributes() {
        let doc = ComposeDocument::parse("services:\n  web:\n    image: nginx\n");
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.find("image").unwrap();
        let position = index.offset_to_position(&doc.bytes, offset);
        let items = completion(&doc, position, None);
        assert!(items.iter().any(|i| i.label == "ports"));
    }
}
