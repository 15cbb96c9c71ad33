//! Rename / prepare-rename.
//!
//! Single-document only: an `include:`-reachable file's own declarations
//! aren't renamed, only references within this document.

use dls_core::LineIndex;
use lsp_types::{Position, Range, TextEdit, Url, WorkspaceEdit};
use std::collections::HashMap;

use crate::queries::references::{focused_entry, focused_occurrence, target_occurrences};
use crate::ComposeDocument;

fn focused_declaration(doc: &ComposeDocument, position: Position) -> Option<(&'static str, String, std::ops::Range<usize>)> {
    if let Some(found) = focused_entry(doc, position) {
        return Some(found);
    }
    let (section, name) = focused_occurrence(doc, position)?;
    let span = match section {
        "services" => doc.find_service(&name)?.key.span.clone(),
        "networks" => doc.networks().find(|e| e.key.text == name)?.key.span.clone(),
        "volumes" => doc.volumes().find(|e| e.key.text == name)?.key.span.clone(),
        "configs" => doc.configs().find(|e| e.key.text == name)?.key.span.clone(),
        "secrets" => doc.secrets().find(|e| e.key.text == name)?.key.span.clone(),
        "models" => doc.models().find(|e| e.key.text == name)?.key.span.clone(),
        _ => return None,
    };
    Some((section, name, span))
}

pub fn prepare_rename(doc: &ComposeDocument, position: Position) -> Option<Range> {
    let (_, _, span) = focused_declaration(doc, position)?;
    let index = LineIndex::new(&doc.bytes);
    Some(index.range(&doc.bytes, span))
}

pub fn rename(doc: &ComposeDocument, uri: &Url, position: Position, new_name: &str) -> Option<WorkspaceEdit> {
    let (section, name, declaration_span) = focused_declaration(doc, position)?;
    let index = LineIndex::new(&doc.bytes);

    let mut edits = vec![TextEdit { range: index.range(&doc.bytes, declaration_span), new_text: new_name.to_string() }];
    for span in target_occurrences(doc, section, &name) {
        edits.push(TextEdit { range: index.range(&doc.bytes, span), new_text: new_name.to_string() });
    }

    let mut changes = HashMap::new();
    changes.insert(uri.clone(), edits);
    Some(WorkspaceEdit { changes: Some(changes), ..WorkspaceEdit::default() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_service_declaration_and_dependents() {
        let source = "services:\n  db:\n    image: postgres\n  web:\n    depends_on:\n      - db\n";
        let doc = ComposeDocument::parse(source);
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.find("db:").unwrap();
        let position = index.offset_to_position(&doc.bytes, offset);
        let uri = Url::parse("file:///workspace/compose.yaml").unwrap();
        let edit = rename(&doc, &uri, position, "database").unwrap();
        let edits = &edit.changes.unwrap()[&uri];
        assert_eq!(edits.len(), 2);
        assert!(edits.iter().all(|e| e.new_text == "database"));
    }
}
