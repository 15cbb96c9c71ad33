//! Position to expression resolution.

use dls_core::LineIndex;
use lsp_types::Position;

use crate::ir::{Attribute, Block, Expr, Structure};
use crate::BakeDocument;

pub struct Focus<'a> {
    /// Enclosing blocks, outermost first, innermost last.
    pub block_path: Vec<&'a Block>,
    pub attribute: Option<&'a Attribute>,
    pub expr: Option<&'a Expr>,
    pub offset: usize,
}

impl<'a> Focus<'a> {
    pub fn innermost_block(&self) -> Option<&'a Block> {
        self.block_path.last().copied()
    }
}

pub fn offset_at(doc: &BakeDocument, position: Position) -> usize {
    LineIndex::new(&doc.bytes).position_to_offset(&doc.bytes, position)
}

pub fn focus_at(doc: &BakeDocument, position: Position) -> Focus<'_> {
    let offset = offset_at(doc, position);
    let mut block_path = Vec::new();
    let mut attribute = None;
    let mut expr = None;
    find_in_body(&doc.file.body, offset, &mut block_path, &mut attribute, &mut expr);
    Focus { block_path, attribute, expr, offset }
}

fn find_in_body<'a>(
    body: &'a [Structure],
    offset: usize,
    block_path: &mut Vec<&'a Block>,
    attribute: &mut Option<&'a Attribute>,
    expr: &mut Option<&'a Expr>,
) {
    for structure in body {
        match structure {
            Structure::Block(block) if span_covers(&block.span, offset) => {
                block_path.push(block);
                find_in_body(&block.body, offset, block_path, attribute, expr);
                return;
            }
            Structure::Attribute(attr) if span_covers(&attr.span, offset) => {
                *attribute = Some(attr);
                *expr = Some(expr_at(&attr.value, offset));
                return;
            }
            _ => {}
        }
    }
}

fn span_covers(span: &std::ops::Range<usize>, offset: usize) -> bool {
    span.start <= offset && offset <= span.end
}

/// The smallest sub-expression of `expr` whose span contains `offset`,
/// recursing into template parts, conditional branches, binary operands,
/// `for` collections/conditions, object keys/values, and tuple elements.
pub fn expr_at(expr: &Expr, offset: usize) -> &Expr {
    for child in expr.children() {
        if span_covers(&child.span(), offset) {
            return expr_at(child, offset);
        }
    }
    expr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focuses_the_enclosing_attribute_and_block() {
        let doc = BakeDocument::parse("target \"app\" {\n  context = \".\"\n}\n");
        let position = Position::new(1, 14);
        let focus = focus_at(&doc, position);
        assert_eq!(focus.innermost_block().unwrap().ident, "target");
        assert_eq!(focus.attribute.unwrap().name, "context");
    }

    #[test]
    fn focuses_nested_expression_inside_a_conditional() {
        let doc = BakeDocument::parse("target \"app\" {\n  platforms = cond ? \"a\" : \"b\"\n}\n");
        let needle = doc.bytes.find("\"a\"").unwrap() + 1;
        let offset_position = {
            let index = dls_core::LineIndex::new(&doc.bytes);
            index.offset_to_position(&doc.bytes, needle)
        };
        let focus = focus_at(&doc, offset_position);
        assert_eq!(focus.expr.unwrap().as_literal_str(), Some("a"));
    }
}
