//! Inlay hints: shows the resolved ARG default value next to each
//! `target.args` entry.

use dls_core::LineIndex;
use dls_dockerfile::DockerfileDocument;
use lsp_types::{InlayHint, InlayHintLabel, Position, Range};

use crate::ir::Expr;
use crate::BakeDocument;

pub fn inlay_hints(doc: &BakeDocument, range: Range, dockerfile: &DockerfileDocument) -> Vec<InlayHint> {
    let index = LineIndex::new(&doc.bytes);
    let args = dockerfile.args();
    let mut hints = Vec::new();

    for target in doc.targets() {
        let Some(attr) = target.attribute("args") else { continue };
        let Expr::Object { items, .. } = &attr.value else { continue };
        for item in items {
            let Some(key) = item.key.as_literal_str() else { continue };
            let key_range = index.range(&doc.bytes, item.key.span());
            if key_range.start < range.start || key_range.start > range.end {
                continue;
            }
            let Some(arg) = args.iter().find(|a| a.name == key) else { continue };
            let Some(default) = &arg.default else { continue };
            if default.is_empty() {
                continue;
            }
            let line_end = end_of_line(&doc.bytes, &index, item.span.end);
            hints.push(InlayHint {
                position: line_end,
                label: InlayHintLabel::String(format!("(default value: {default})")),
                kind: None,
                text_edits: None,
                tooltip: None,
                padding_left: Some(true),
                padding_right: Some(false),
                data: None,
            });
        }
    }
    hints
}

fn end_of_line(bytes: &str, index: &LineIndex, offset: usize) -> Position {
    let pos = index.offset_to_position(bytes, offset);
    let line_start = bytes
        .split('\n')
        .take(pos.line as usize)
        .map(|l| l.len() + 1)
        .sum::<usize>();
    let line_text = bytes[line_start..].split('\n').next().unwrap_or("");
    Position {
        line: pos.line,
        character: line_text.trim_end_matches(['\r']).chars().map(char::len_utf16).sum::<usize>() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_hint_for_arg_with_default() {
        let doc = BakeDocument::parse("target \"t1\" {\n  args = {\n    defined = \"test\"\n  }\n}\n");
        let dockerfile = DockerfileDocument::parse("ARG defined=value\nFROM scratch\n");
        let hints = inlay_hints(&doc, Range::new(Position::new(0, 0), Position::new(10, 0)), &dockerfile);
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].position.line, 2);
        match &hints[0].label {
            InlayHintLabel::String(text) => assert_eq!(text, "(default value: value)"),
            _ => panic!("expected string label"),
        }
    }
}
