//! References: the inverse of definition, every occurrence that
//! *resolves to* a `target`/`variable` label rather than the single
//! declaration a literal resolves to.

use dls_core::LineIndex;
use lsp_types::{Location, Position, Url};

use crate::ir::{Expr, Span, Structure};
use crate::queries::position::focus_at;
use crate::BakeDocument;

/// Byte spans of every site referencing `label` as a target name: array
/// literals in `inherits`/`targets`, and `target.<label>` traversals.
pub fn target_occurrences(doc: &BakeDocument, label: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    for block in doc.blocks() {
        if block.ident == "target" {
            if let Some(attr) = block.attribute("inherits") {
                collect_array_literal_matches(attr.value.array_literals(), label, &mut spans);
            }
        }
        if block.ident == "group" {
            if let Some(attr) = block.attribute("targets") {
                collect_array_literal_matches(attr.value.array_literals(), label, &mut spans);
            }
        }
        walk_structures(&block.body, label, &mut spans);
    }
    walk_structures(&doc.file.body, label, &mut spans);
    spans
}

fn collect_array_literal_matches(literals: Vec<(&str, Span)>, label: &str, out: &mut Vec<Span>) {
    for (text, span) in literals {
        if text == label {
            out.push(span);
        }
    }
}

fn walk_structures(body: &[Structure], label: &str, out: &mut Vec<Span>) {
    for structure in body {
        match structure {
            Structure::Block(block) => walk_structures(&block.body, label, out),
            Structure::Attribute(attr) => walk_expr(&attr.value, label, out),
        }
    }
}

fn walk_expr(expr: &Expr, label: &str, out: &mut Vec<Span>) {
    if let Expr::Traversal { segments, .. } = expr {
        if segments.len() >= 2 && segments[0].0 == "target" && segments[1].0 == label {
            out.push(segments[1].1.clone());
        }
    }
    for child in expr.children() {
        walk_expr(child, label, out);
    }
}

pub fn references(doc: &BakeDocument, position: Position, uri: &Url, include_declaration: bool) -> Vec<Location> {
    let focus = focus_at(doc, position);
    let index = LineIndex::new(&doc.bytes);
    let Some(label) = focused_label(doc, &focus) else { return Vec::new() };

    let mut locations: Vec<Location> = target_occurrences(doc, &label)
        .into_iter()
        .map(|span| Location { uri: uri.clone(), range: index.range(&doc.bytes, span) })
        .collect();

    if include_declaration {
        if let Some(target) = doc.find_target(&label) {
            let span = target.labels.first().map(|l| l.unquoted_span()).unwrap_or_default();
            locations.insert(0, Location { uri: uri.clone(), range: index.range(&doc.bytes, span) });
        }
    }
    locations
}

fn focused_label(doc: &BakeDocument, focus: &crate::queries::position::Focus<'_>) -> Option<String> {
    let block = focus.innermost_block()?;
    if block.ident == "target" {
        if let Some(label) = block.labels.first() {
            if label.span.start <= focus.offset && focus.offset <= label.span.end {
                return Some(label.text.clone());
            }
        }
    }
    for candidate in doc.targets() {
        let Some(label) = candidate.labels.first() else { continue };
        for span in target_occurrences(doc, &label.text) {
            if span.start <= focus.offset && focus.offset <= span.end {
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
    fn finds_every_reference_to_a_target_label() {
        let doc = BakeDocument::parse(
            "target \"base\" {}\ntarget \"app\" {\n  inherits = [\"base\"]\n}\ngroup \"all\" {\n  targets = [\"base\", \"app\"]\n}\n",
        );
        let index = LineIndex::new(&doc.bytes);
        let offset = doc.bytes.find("base").unwrap();
        let position = index.offset_to_position(&doc.bytes, offset);
        let uri = Url::parse("file:///workspace/docker-bake.hcl").unwrap();
        let locations = references(&doc, position, &uri, true);
        assert_eq!(locations.len(), 3);
    }
}
