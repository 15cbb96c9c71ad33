//! Inline completion: suggests a whole `target` block per Dockerfile
//! stage not yet referenced, when the cursor sits on an otherwise-empty
//! line.

use dls_core::LineIndex;
use dls_dockerfile::DockerfileDocument;
use lsp_types::Position;
use rustc_hash::FxHashSet;

use crate::BakeDocument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineCompletion {
    pub insert_text: String,
}

pub fn inline_completions(doc: &BakeDocument, position: Position, dockerfile: &DockerfileDocument) -> Vec<InlineCompletion> {
    if !cursor_on_empty_line(doc, position) {
        return Vec::new();
    }

    let referenced: FxHashSet<String> = doc
        .targets()
        .flat_map(|target| {
            let from_attr = target.attribute("target").and_then(|a| a.value.as_literal_str()).map(str::to_string);
            let from_label = target.labels.first().map(|l| l.text.clone());
            [from_attr, from_label].into_iter().flatten()
        })
        .collect();

    dockerfile
        .stages()
        .into_iter()
        .filter_map(|stage| stage.name)
        .filter(|name| !referenced.contains(name))
        .map(|name| InlineCompletion {
            insert_text: build_block(&name, dockerfile),
        })
        .collect()
}

fn build_block(stage_name: &str, dockerfile: &DockerfileDocument) -> String {
    // Only ARGs declared before the first FROM are global (pre-stage) args.
    let first_from_line = dockerfile
        .stages()
        .first()
        .map(|s| s.range.start.line)
        .unwrap_or(u32::MAX);
    let pre_from_args: Vec<_> = dockerfile
        .args()
        .into_iter()
        .filter(|arg| arg.range.start.line < first_from_line)
        .collect();

    if pre_from_args.is_empty() {
        format!("target \"{stage_name}\" {{\n  target = \"{stage_name}\"\n}}\n")
    } else {
        let mut out = format!("target \"{stage_name}\" {{\n  target = \"{stage_name}\"\n  args = {{\n");
        for arg in &pre_from_args {
            let default = arg.default.clone().unwrap_or_default();
            out.push_str(&format!("    {} = \"{default}\"\n", arg.name));
        }
        out.push_str("  }\n}\n");
        out
    }
}

fn cursor_on_empty_line(doc: &BakeDocument, position: Position) -> bool {
    let index = LineIndex::new(&doc.bytes);
    let offset = index.position_to_offset(&doc.bytes, position);
    let line_start = doc.bytes[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = doc.bytes[offset..].find('\n').map(|i| offset + i).unwrap_or(doc.bytes.len());
    doc.bytes[line_start..line_end].trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_a_target_block_for_each_missing_stage() {
        let doc = BakeDocument::parse("");
        let dockerfile = DockerfileDocument::parse("FROM scratch AS simple\n");
        let completions = inline_completions(&doc, Position::new(0, 0), &dockerfile);
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].insert_text, "target \"simple\" {\n  target = \"simple\"\n}\n");
    }

    #[test]
    fn skips_stages_already_referenced() {
        let doc = BakeDocument::parse("target \"simple\" {\n  target = \"simple\"\n}\n\n");
        let dockerfile = DockerfileDocument::parse("FROM scratch AS simple\n");
        let position = Position::new(3, 0);
        let completions = inline_completions(&doc, position, &dockerfile);
        assert!(completions.is_empty());
    }
}
