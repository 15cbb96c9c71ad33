//! Inlay hints: default-value hints for `build.args` entries, the same
//! algorithm [`dls_bake::queries::inlay`] uses for Bake's `args` block.

use dls_core::LineIndex;
use dls_dockerfile::DockerfileDocument;
use lsp_types::{InlayHint, InlayHintLabel, Position, Range};

use crate::ir::Node;
use crate::ComposeDocument;

pub fn inlay_hints(doc: &ComposeDocument, range: Range, dockerfile: &DockerfileDocument) -> Vec<InlayHint> {
    let index = LineIndex::new(&doc.bytes);
    let args = dockerfile.args();
    let mut hints = Vec::new();

    for service in doc.services() {
        let Some(build) = service.value.as_mapping().and_then(|m| m.get_entry("build")) else { continue };
        let Some(build_mapping) = build.value.as_mapping() else { continue };
        let Some(args_entry) = build_mapping.get_entry("args") else { continue };

        let pairs: Vec<(&str, std::ops::Range<usize>)> = match &args_entry.value {
            Node::Mapping(mapping) => mapping.entries.iter().map(|e| (e.key.text.as_str(), e.span.clone())).collect(),
            Node::Sequence(sequence) => sequence
                .items
                .iter()
                .filter_map(|item| item.as_scalar_text().map(|t| (t.split('=').next().unwrap_or(t), item.span())))
                .collect(),
            _ => Vec::new(),
        };

        for (key, span) in pairs {
            let key_range = index.range(&doc.bytes, span.clone());
            if key_range.start < range.start || key_range.start > range.end {
                continue;
            }
            let Some(arg) = args.iter().find(|a| a.name == key) else { continue };
            let Some(default) = &arg.default else { continue };
            if default.is_empty() {
                continue;
            }
            let line_end = end_of_line(&doc.bytes, &index, span.end);
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
    let line_start = bytes.split('\n').take(pos.line as usize).map(|l| l.len() + 1).sum::<usize>();
    let line_text = bytes[line_start..].split('\n').next().unwrap_or("");
    Position { line: pos.line, character: line_text.trim_end_matches(['\r']).chars().map(char::len_utf16).sum::<usize>() as u32 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_hint_for_mapping_style_build_arg_with_default() {
        let doc = ComposeDocument::parse("services:\n  web:\n    build:\n      context: .\n      args:\n        defined: test\n");
        let dockerfile = DockerfileDocument::parse("ARG defined=value\nFROM scratch\n");
        let hints = inlay_hints(&doc, Range::new(Position::new(0, 0), Position::new(10, 0)), &dockerfile);
        assert_eq!(hints.len(), 1);
        match &hints[0].label {
            InlayHintLabel::String(text) => assert_eq!(text, "(default value: value)"),
            _ => panic!("expected string label"),
        }
    }
}
