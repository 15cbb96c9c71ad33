//! Document highlight: shares the occurrence-finding walk with
//! [`crate::queries::references`], classifying the declaring key as
//! `Write` and every referencing site as `Read`.

use dls_core::LineIndex;
use lsp_types::{DocumentHighlight, DocumentHighlightKind, Position};

use crate::queries::references::{focused_entry, focused_occurrence, target_occurrences};
use crate::ComposeDocument;

pub fn document_highlight(doc: &ComposeDocument, position: Position) -> Option<Vec<DocumentHighlight>> {
    let index = LineIndex::new(&doc.bytes);

    let (section, name, declaration_span) = match focused_entry(doc, position) {
        Some(found) => found,
        None => {
            let (section, name) = focused_occurrence(doc, position)?;
            let declaration_span = match section {
                "services" => doc.find_service(&name)?.key.span.clone(),
                "networks" => doc.networks().find(|e| e.key.text == name)?.key.span.clone(),
                "volumes" => doc.volumes().find(|e| e.key.text == name)?.key.span.clone(),
                "configs" => doc.configs().find(|e| e.key.text == name)?.key.span.clone(),
                "secrets" => doc.secrets().find(|e| e.key.text == name)?.key.span.clone(),
                "models" => doc.models().find(|e| e.key.text == name)?.key.span.clone(),
                _ => return None,
            };
            (section, name, declaration_span)
        }
    };

    let mut highlights = vec![DocumentHighlight {
        range: index.range(&doc.bytes, declaration_span),
        kind: Some(DocumentHighlightKind::WRITE),
    }];
    for span in target_occurrences(doc, section, &name) {
        highlights.push(DocumentHighlight { range: index.range(&doc.bytes, span), kind: Some(DocumentHighlightKind::READ) });
    }
    Some(highlights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_declaration_and_depends_on_reference() {
        let source = "services:\n  db:\n    image: postgres\n  web:\n    depends_on:\n      - db\n";
        let doc = ComposeDocument::parse(source);
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.find("db:").unwrap();
        let position = index.offset_to_position(&doc.bytes, offset);
        let highlights = document_highlight(&doc, position).unwrap();
        assert_eq!(highlights.len(), 2);
        assert_eq!(highlights[0].kind, Some(DocumentHighlightKind::WRITE));
        assert_eq!(highlights[1].kind, Some(DocumentHighlightKind::READ));
    }
}
