//! Formatting: normalizes indentation to the client's requested
//! tab/space width, leaving every other byte (scalar text, comments,
//! anchors, flow collections) untouched.
//!
//! Full re-serialization the way [`dls_bake::queries::formatting`] does
//! for HCL would lose comments, since [`crate::ir`] doesn't carry them.
//! YAML's structure is indentation itself, so instead this walks
//! [`crate::lexer::split_lines`] and rewrites each line's leading
//! whitespace to a consistent depth computed from a stack of the
//! original indent widths, the same normalize-in-place approach as
//! [`dls_core::uri::normalize`] applies to `.`/`..` path components.

use dls_core::LineIndex;
use lsp_types::{FormattingOptions, Position, Range, TextEdit};

use crate::lexer::split_lines;
use crate::ComposeDocument;

pub fn formatting(doc: &ComposeDocument, options: &FormattingOptions) -> Option<Vec<TextEdit>> {
    if !doc.parse_errors.is_empty() {
        return None;
    }
    let width = options.tab_size.max(1) as usize;
    let indent_unit = if options.insert_spaces { " ".repeat(width) } else { "\t".to_string() };
    let formatted = format_document(&doc.bytes, &indent_unit);
    if formatted == doc.bytes {
        return Some(Vec::new());
    }
    let index = LineIndex::new(&doc.bytes);
    let end = index.offset_to_position(&doc.bytes, doc.bytes.len());
    Some(vec![TextEdit { range: Range::new(Position::new(0, 0), end), new_text: formatted }])
}

fn format_document(source: &str, indent_unit: &str) -> String {
    let lines = split_lines(source);
    let mut out = String::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for line in &lines {
        let text = line.text(source);
        let comment = line.comment.as_ref().map(|span| &source[span.clone()]);
        if text.is_empty() && comment.is_none() {
            out.push('\n');
            continue;
        }

        while stack.last().is_some_and(|(orig, _)| *orig >= line.indent) {
            stack.pop();
        }
        let depth = stack.last().map(|(_, d)| d + 1).unwrap_or(0);
        stack.push((line.indent, depth));

        for _ in 0..depth {
            out.push_str(indent_unit);
        }
        out.push_str(text);
        if let Some(comment) = comment {
            if !text.is_empty() {
                out.push(' ');
            }
            out.push_str(comment);
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> FormattingOptions {
        FormattingOptions { tab_size: 2, insert_spaces: true, ..Default::default() }
    }

    #[test]
    fn normalizes_inconsistent_indent_width() {
        let doc = ComposeDocument::parse("services:\n    web:\n        image: nginx\n");
        let edits = formatting(&doc, &options()).unwrap();
        assert_eq!(edits[0].new_text, "services:\n  web:\n    image: nginx\n");
    }

    #[test]
    fn preserves_comments_and_already_formatted_text() {
        let doc = ComposeDocument::parse("services:\n  web:\n    image: nginx # pin\n");
        let edits = formatting(&doc, &options()).unwrap();
        assert!(edits.is_empty());
    }

    #[test]
    fn bails_out_on_syntax_errors() {
        let mut doc = ComposeDocument::parse("services:\n  web:\n    image: nginx\n");
        doc.parse_errors.push(crate::ParseErrorSpan { message: "unexpected token".into(), span: 0..1 });
        assert!(formatting(&doc, &options()).is_none());
    }
}
