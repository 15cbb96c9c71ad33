//! Document highlight: every occurrence of a focused target label.
//!
//! Shares the occurrence-finding walk with [`crate::queries::references`]:
//! highlight additionally classifies the declaring label as `Write` and
//! every referencing literal as `Read`, which `references` doesn't need.

use dls_core::LineIndex;
use lsp_types::{DocumentHighlight, DocumentHighlightKind, Position};

use crate::queries::position::focus_at;
use crate::queries::references::target_occurrences;
use crate::BakeDocument;

/// `position` must land on a `target` block's own label or on a literal
/// inside some `group.targets` array; returns `None` otherwise.
pub fn document_highlight(doc: &BakeDocument, position: Position) -> Option<Vec<DocumentHighlight>> {
    let focus = focus_at(doc, position);
    let index = LineIndex::new(&doc.bytes);

    let label = focused_target_label(doc, &focus, position)?;
    let target = doc.find_target(&label)?;
    let declaration_span = target.labels.first()?.unquoted_span();

    let mut highlights = vec![DocumentHighlight {
        range: index.range(&doc.bytes, declaration_span),
        kind: Some(DocumentHighlightKind::WRITE),
    }];
    for span in target_occurrences(doc, &label) {
        highlights.push(DocumentHighlight {
            range: index.range(&doc.bytes, span),
            kind: Some(DocumentHighlightKind::READ),
        });
    }
    Some(highlights)
}

fn focused_target_label(doc: &BakeDocument, focus: &crate::queries::position::Focus<'_>, position: Position) -> Option<String> {
    let _ = position;
    let block = focus.innermost_block()?;
    if block.ident == "target" {
        if let Some(label) = block.labels.first() {
            if label.span.start <= focus.offset && focus.offset <= label.span.end {
                return Some(label.text.clone());
            }
        }
    }
    if block.ident == "group" {
        let attr = block.attribute("targets")?;
        for (text, span) in attr.value.array_literals() {
            if span.start <= focus.offset && focus.offset <= span.end {
                return Some(text.to_string());
            }
        }
    }
    // Also allow focusing the label from within an `inherits` literal.
    if block.ident == "target" {
        if let Some(attr) = block.attribute("inherits") {
            for (text, span) in attr.value.array_literals() {
                if span.start <= focus.offset && focus.offset <= span.end {
                    return Some(text.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_declaration_and_inherits_reference() {
        let doc = BakeDocument::parse("target \"base\" {}\ntarget \"app\" {\n  inherits = [\"base\"]\n}\n");
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.find("base").unwrap();
        let position = index.offset_to_position(&doc.bytes, offset);
        let highlights = document_highlight(&doc, position).unwrap();
        assert_eq!(highlights.len(), 2);
        assert_eq!(highlights[0].kind, Some(DocumentHighlightKind::WRITE));
        assert_eq!(highlights[1].kind, Some(DocumentHighlightKind::READ));
    }
}
