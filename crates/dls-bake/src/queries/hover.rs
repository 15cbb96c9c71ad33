//! Hover: renders documentation for the focused expression or block.

use lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};

use crate::ir::Expr;
use crate::queries::position::focus_at;
use crate::schema;
use crate::BakeDocument;

pub fn hover(doc: &BakeDocument, position: Position) -> Option<Hover> {
    let focus = focus_at(doc, position);
    let block = focus.innermost_block()?;

    if block.ident == "variable" {
        if let Some(label) = block.labels.first() {
            if span_covers(&label.span, focus.offset) {
                return variable_hover(block);
            }
        }
    }

    if let Some(expr) = focus.expr {
        if let Expr::Traversal { segments, .. } = expr {
            if let Some((name, span)) = segments.first() {
                if span_covers(span, focus.offset) {
                    if let Some(variable) = doc.find_variable(name) {
                        return variable_hover(variable);
                    }
                }
            }
        }
    }

    if let Some(attr) = focus.attribute {
        if span_covers(&attr.name_span, focus.offset) {
            if let Some(doc_entry) = schema::attribute_doc(block.ident, &attr.name) {
                return Some(markdown_hover(doc_entry.description));
            }
        }
    }

    schema::block_schema(block.ident).map(|s| markdown_hover(s.description))
}

fn variable_hover(block: &crate::ir::Block) -> Option<Hover> {
    let attr = block.attribute("default")?;
    let text = attr.value.as_literal_str().map(str::to_string).unwrap_or_else(|| format!("{:?}", attr.value));
    Some(markdown_hover(&format!("default = \"{text}\"")))
}

fn markdown_hover(text: &str) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: text.to_string(),
        }),
        range: None,
    }
}

fn span_covers(span: &std::ops::Range<usize>, offset: usize) -> bool {
    span.start <= offset && offset <= span.end
}

#[cfg(test)]
mod tests {
    use super::*;
    use dls_core::LineIndex;

    #[test]
    fn hovering_variable_label_shows_its_default() {
        let doc = BakeDocument::parse("variable \"TAG\" {\n  default = \"latest\"\n}\n");
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.find("TAG").unwrap();
        let position = index.offset_to_position(&doc.bytes, offset);
        let hover = hover(&doc, position).unwrap();
        match hover.contents {
            HoverContents::Markup(content) => assert!(content.value.contains("latest")),
            _ => panic!("expected markup"),
        }
    }

    #[test]
    fn hovering_attribute_name_shows_schema_description() {
        let doc = BakeDocument::parse("target \"app\" {\n  context = \".\"\n}\n");
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.find("context").unwrap();
        let position = index.offset_to_position(&doc.bytes, offset);
        let hover = hover(&doc, position).unwrap();
        match hover.contents {
            HoverContents::Markup(content) => assert!(content.value.contains("Build context")),
            _ => panic!("expected markup"),
        }
    }
}
