//! Rename / prepare-rename.
//!
//! Single-document only: cross-file Bake references are out of scope.

use dls_core::LineIndex;
use lsp_types::{Position, Range, TextEdit, Url, WorkspaceEdit};
use std::collections::HashMap;

use crate::queries::references::target_occurrences;
use crate::BakeDocument;

/// Returns the declaration's range (the label with quotes trimmed) if
/// `position` lands on a renamable `target` label or an occurrence of one.
pub fn prepare_rename(doc: &BakeDocument, position: Position) -> Option<Range> {
    let label = focused_declaration(doc, position)?;
    let target = doc.find_target(&label)?;
    let index = LineIndex::new(&doc.bytes);
    let span = target.labels.first()?.unquoted_span();
    Some(index.range(&doc.bytes, span))
}

pub fn rename(doc: &BakeDocument, uri: &Url, position: Position, new_name: &str) -> Option<WorkspaceEdit> {
    let label = focused_declaration(doc, position)?;
    let index = LineIndex::new(&doc.bytes);
    let target = doc.find_target(&label)?;

    let mut edits = vec![TextEdit {
        range: index.range(&doc.bytes, target.labels.first()?.unquoted_span()),
        new_text: new_name.to_string(),
    }];
    for span in target_occurrences(doc, &label) {
        edits.push(TextEdit {
            range: index.range(&doc.bytes, span),
            new_text: new_name.to_string(),
        });
    }

    let mut changes = HashMap::new();
    changes.insert(uri.clone(), edits);
    Some(WorkspaceEdit {
        changes: Some(changes),
        ..WorkspaceEdit::default()
    })
}

fn focused_declaration(doc: &BakeDocument, position: Position) -> Option<String> {
    let offset = crate::queries::position::offset_at(doc, position);
    for target in doc.targets() {
        let Some(label) = target.labels.first() else { continue };
        if label.span.start <= offset && offset <= label.span.end {
            return Some(label.text.clone());
        }
        for span in target_occurrences(doc, &label.text) {
            if span.start <= offset && offset <= span.end {
                return Some(label.text.clone());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_declaration_and_every_reference() {
        let doc = BakeDocument::parse("target \"base\" {}\ntarget \"app\" {\n  inherits = [\"base\"]\n}\n");
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.find("base").unwrap();
        let position = index.offset_to_position(&doc.bytes, offset);
        let uri = Url::parse("file:///workspace/docker-bake.hcl").unwrap();
        let edit = rename(&doc, &uri, position, "foundation").unwrap();
        let edits = &edit.changes.unwrap()[&uri];
        assert_eq!(edits.len(), 2);
        assert!(edits.iter().all(|e| e.new_text == "foundation"));
    }
}
