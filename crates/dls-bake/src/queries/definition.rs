//! Definition: resolves a focused expression to its declaration.
//!
//! Dockerfile-side results (stage / ARG declarations) are resolved
//! against a caller-supplied [`dls_dockerfile::DockerfileDocument`]:
//! this crate never reads peer files itself, the dispatcher looks the
//! target's Dockerfile up through the document manager first and
//! passes the parsed result in.

use dls_core::LineIndex;
use dls_dockerfile::DockerfileDocument;
use lsp_types::{Position, Range};

use crate::ir::{Block, Expr};
use crate::queries::position::{expr_at, focus_at};
use crate::BakeDocument;

#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionResult {
    pub origin_selection_range: Range,
    pub target_range: Range,
}

pub fn definition(doc: &BakeDocument, position: Position, dockerfile: Option<&DockerfileDocument>) -> Option<DefinitionResult> {
    let focus = focus_at(doc, position);
    let index = LineIndex::new(&doc.bytes);
    let block = focus.innermost_block()?;

    if block.ident == "target" {
        if let Some(result) = definition_in_target(doc, block, focus.offset, dockerfile, &index) {
            return Some(result);
        }
    }
    if block.ident == "group" {
        if let Some(result) = definition_in_group_targets(doc, block, focus.offset, &index) {
            return Some(result);
        }
    }

    let expr = focus.expr?;
    if let Expr::Traversal { segments, .. } = expr {
        return definition_for_traversal(doc, segments, focus.offset, &index);
    }
    if let Expr::FuncCall { name, name_span, .. } = expr {
        if span_covers(name_span, focus.offset) {
            let function = doc.find_function(name)?;
            return Some(DefinitionResult {
                origin_selection_range: index.range(&doc.bytes, name_span.clone()),
                target_range: label_range(&index, &doc.bytes, function),
            });
        }
    }
    None
}

fn definition_in_target(
    doc: &BakeDocument,
    block: &Block,
    offset: usize,
    dockerfile: Option<&DockerfileDocument>,
    index: &LineIndex,
) -> Option<DefinitionResult> {
    if let Some(attr) = block.attribute("inherits") {
        if span_covers(&attr.value.span(), offset) {
            for (text, span) in attr.value.array_literals() {
                if span_covers(&span, offset) {
                    let target = doc.find_target(text)?;
                    return Some(DefinitionResult {
                        origin_selection_range: index.range(&doc.bytes, span),
                        target_range: label_range(index, &doc.bytes, target),
                    });
                }
            }
        }
    }

    for attr_name in ["target", "no-cache-filter"] {
        let Some(attr) = block.attribute(attr_name) else { continue };
        if !span_covers(&attr.value.span(), offset) {
            continue;
        }
        let stage_name = attr.value.as_literal_str()?;
        let doc_file = dockerfile?;
        let stage = doc_file.stage_by_reference(stage_name)?;
        return Some(DefinitionResult {
            origin_selection_range: index.range(&doc.bytes, attr.value.span()),
            target_range: stage.range,
        });
    }

    if let Some(attr) = block.attribute("args") {
        if let Expr::Object { items, .. } = &attr.value {
            for item in items {
                if !span_covers(&item.key.span(), offset) {
                    continue;
                }
                let key = item.key.as_literal_str()?;
                let doc_file = dockerfile?;
                let arg = doc_file.args().into_iter().find(|a| a.name == key)?;
                return Some(DefinitionResult {
                    origin_selection_range: index.range(&doc.bytes, item.key.span()),
                    target_range: arg.range,
                });
            }
        }
    }

    None
}

fn definition_in_group_targets(doc: &BakeDocument, block: &Block, offset: usize, index: &LineIndex) -> Option<DefinitionResult> {
    let attr = block.attribute("targets")?;
    for (text, span) in attr.value.array_literals() {
        if span_covers(&span, offset) {
            let target = doc.find_target(text)?;
            return Some(DefinitionResult {
                origin_selection_range: index.range(&doc.bytes, span),
                target_range: label_range(index, &doc.bytes, target),
            });
        }
    }
    None
}

/// Rules 2 and 4: bare scope traversal, or `target.<name>.<attr>`.
fn definition_for_traversal(
    doc: &BakeDocument,
    segments: &[(String, std::ops::Range<usize>)],
    offset: usize,
    index: &LineIndex,
) -> Option<DefinitionResult> {
    if segments.len() >= 2 && segments[0].0 == "target" {
        // `target.<name>.<attr>`: the leading `target` keyword resolves to nothing.
        if span_covers(&segments[0].1, offset) {
            return None;
        }
        let (name, name_span) = &segments[1];
        if span_covers(name_span, offset) {
            let target = doc.find_target(name)?;
            return Some(DefinitionResult {
                origin_selection_range: index.range(&doc.bytes, name_span.clone()),
                target_range: label_range(index, &doc.bytes, target),
            });
        }
        if let Some((attr_name, attr_span)) = segments.get(2) {
            if span_covers(attr_span, offset) {
                let target = doc.find_target(name)?;
                let attr = target.attribute(attr_name)?;
                return Some(DefinitionResult {
                    origin_selection_range: index.range(&doc.bytes, attr_span.clone()),
                    target_range: index.range(&doc.bytes, attr.name_span.clone()),
                });
            }
        }
        return None;
    }

    let (name, name_span) = segments.first()?;
    if !span_covers(name_span, offset) {
        return None;
    }
    if let Some(variable) = doc.find_variable(name) {
        return Some(DefinitionResult {
            origin_selection_range: index.range(&doc.bytes, name_span.clone()),
            target_range: label_range(index, &doc.bytes, variable),
        });
    }
    if let Some(top_level) = doc.attributes().find(|a| &a.name == name) {
        return Some(DefinitionResult {
            origin_selection_range: index.range(&doc.bytes, name_span.clone()),
            target_range: index.range(&doc.bytes, top_level.name_span.clone()),
        });
    }
    None
}

fn label_range(index: &LineIndex, bytes: &str, block: &Block) -> Range {
    let span = block.labels.first().map(|l| l.unquoted_span()).unwrap_or_else(|| block.ident_span.clone());
    index.range(bytes, span)
}

fn span_covers(span: &std::ops::Range<usize>, offset: usize) -> bool {
    span.start <= offset && offset <= span.end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherits_literal_resolves_to_target_label() {
        let doc = BakeDocument::parse("target \"base\" {}\ntarget \"app\" {\n  inherits = [\"base\"]\n}\n");
        let offset = doc.bytes.rfind("base").unwrap();
        let index = LineIndex::new(&doc.bytes);
        let position = index.offset_to_position(&doc.bytes, offset + 1);
        let result = definition(&doc, position, None).unwrap();
        assert_eq!(result.target_range, index.range(&doc.bytes, 8..12));
    }

    #[test]
    fn bare_identifier_resolves_to_variable_label() {
        let doc = BakeDocument::parse("variable \"TAG\" {\n  default = \"x\"\n}\ntarget \"app\" {\n  args = { V = TAG }\n}\n");
        let offset = doc.bytes.rfind("TAG").unwrap();
        let index = LineIndex::new(&doc.bytes);
        let position = index.offset_to_position(&doc.bytes, offset + 1);
        let result = definition(&doc, position, None).unwrap();
        assert_eq!(result.target_range, index.range(&doc.bytes, 10..13));
    }
}
