//! Completion: suggests labels, stage names, and ARG names at the focused
//! position, falling back to schema-driven suggestions elsewhere.

use dls_core::LineIndex;
use dls_dockerfile::DockerfileDocument;
use lsp_types::{CompletionItem, CompletionItemKind, InsertTextFormat, Position};

use crate::ir::Expr;
use crate::queries::position::focus_at;
use crate::schema;
use crate::BakeDocument;

pub fn completion(doc: &BakeDocument, position: Position, dockerfile: Option<&DockerfileDocument>) -> Vec<CompletionItem> {
    let focus = focus_at(doc, position);
    let Some(block) = focus.innermost_block() else {
        return top_level_completions();
    };

    if block.ident == "target" {
        if let Some(attr) = focus.attribute {
            if attr.name == "inherits" && span_covers(&attr.value.span(), focus.offset) {
                return inherits_completions(doc, block, &attr.value, focus.offset);
            }
            if attr.name == "target" {
                if let Some(dockerfile) = dockerfile {
                    if block.attribute("dockerfile-inline").is_none() {
                        return stage_completions(dockerfile);
                    }
                }
                return Vec::new();
            }
            if attr.name == "args" {
                if let Expr::Object { .. } = &attr.value {
                    if let Some(dockerfile) = dockerfile {
                        if key_position(&attr.value, focus.offset) {
                            return arg_key_completions(dockerfile);
                        }
                    }
                }
            }
        }
    }

    schema_driven_completions(block.ident)
}

fn span_covers(span: &std::ops::Range<usize>, offset: usize) -> bool {
    span.start <= offset && offset <= span.end
}

fn key_position(expr: &Expr, offset: usize) -> bool {
    let Expr::Object { items, .. } = expr else { return false };
    items.iter().any(|item| span_covers(&item.key.span(), offset)) || items.is_empty()
}

fn inherits_completions(doc: &BakeDocument, block: &crate::ir::Block, list: &Expr, offset: usize) -> Vec<CompletionItem> {
    let own_label = block.labels.first().map(|l| l.text.as_str());
    let is_empty = matches!(list, Expr::Array { items, .. } if items.is_empty());
    let adjacent_quoted = matches!(list, Expr::Array { items, .. } if items.iter().any(|item| {
        matches!(item, Expr::String { span, .. } if span_covers(span, offset))
    }));

    doc.targets()
        .filter(|target| target.labels.first().map(|l| l.text.as_str()) != own_label)
        .filter_map(|target| {
            let label = target.labels.first()?;
            let insert_text = if is_empty && !adjacent_quoted {
                format!("\"{}\"", label.text)
            } else {
                label.text.clone()
            };
            Some(CompletionItem {
                label: label.text.clone(),
                kind: Some(CompletionItemKind::VALUE),
                insert_text: Some(insert_text),
                ..CompletionItem::default()
            })
        })
        .collect()
}

fn stage_completions(dockerfile: &DockerfileDocument) -> Vec<CompletionItem> {
    dockerfile
        .stages()
        .into_iter()
        .filter_map(|stage| stage.name)
        .map(|name| CompletionItem {
            label: name.clone(),
            kind: Some(CompletionItemKind::CLASS),
            insert_text: Some(name),
            ..CompletionItem::default()
        })
        .collect()
}

fn arg_key_completions(dockerfile: &DockerfileDocument) -> Vec<CompletionItem> {
    dockerfile
        .args()
        .into_iter()
        .map(|arg| CompletionItem {
            label: arg.name.clone(),
            kind: Some(CompletionItemKind::VARIABLE),
            detail: arg.default.clone(),
            insert_text: Some(arg.name),
            ..CompletionItem::default()
        })
        .collect()
}

fn schema_driven_completions(block_ident: &str) -> Vec<CompletionItem> {
    let Some(block_schema) = schema::block_schema(block_ident) else { return Vec::new() };
    block_schema
        .attributes
        .iter()
        .map(|attr| {
            let (insert_text, format) = match attr.required_snippet {
                Some(snippet) => (format!("{} = {snippet}", attr.name), InsertTextFormat::SNIPPET),
                None => (format!("{} = ", attr.name), InsertTextFormat::PLAIN_TEXT),
            };
            CompletionItem {
                label: attr.name.to_string(),
                kind: Some(CompletionItemKind::PROPERTY),
                detail: Some(attr.description.to_string()),
                insert_text: Some(insert_text),
                insert_text_format: Some(format),
                ..CompletionItem::default()
            }
        })
        .collect()
}

fn top_level_completions() -> Vec<CompletionItem> {
    schema::TOP_LEVEL_BLOCKS
        .iter()
        .map(|ident| CompletionItem {
            label: ident.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            insert_text: Some(format!("{ident} \"$1\" {{\n  $0\n}}")),
            insert_text_format: Some(InsertTextFormat::SNIPPET),
            ..CompletionItem::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dls_core::LineIndex;

    #[test]
    fn inherits_suggests_other_target_labels_with_quotes_when_empty() {
        let doc = BakeDocument::parse("target \"base\" {}\ntarget \"app\" {\n  inherits = []\n}\n");
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.rfind('[').unwrap() + 1;
        let position = index.offset_to_position(&doc.bytes, offset);
        let items = completion(&doc, position, None);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].insert_text.as_deref(), Some("\"base\""));
    }

    #[test]
    fn target_attribute_suggests_dockerfile_stage_names() {
        let doc = BakeDocument::parse("target \"app\" {\n  target = \"\"\n}\n");
        let dockerfile = DockerfileDocument::parse("FROM scratch AS build\n");
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.rfind("\"\"").unwrap() + 1;
        let position = index.offset_to_position(&doc.bytes, offset);
        let items = completion(&doc, position, Some(&dockerfile));
        assert_eq!(items[0].label, "build");
    }

    #[test]
    fn falls_back_to_schema_driven_attribute_completion() {
        let doc = BakeDocument::parse("target \"app\" {\n  \n}\n");
        let index = LineIndex::new(&doc.bytes);
        let position = Position::new(1, 2);
        let items = completion(&doc, position, None);
        assert!(items.iter().any(|item| item.label == "context"));
    }
}
