//! Standalone Dockerfile diagnostics that don't require cross-referencing
//! Bake or Compose documents.

use lsp_types::{Diagnostic, DiagnosticSeverity};
use rustc_hash::FxHashSet;

use crate::DockerfileDocument;

const SOURCE: &str = "docker-language-server";

pub fn duplicate_stage_names(doc: &DockerfileDocument) -> Vec<Diagnostic> {
    let mut seen = FxHashSet::default();
    let mut diagnostics = Vec::new();
    for stage in doc.stages() {
        let Some(name) = stage.name else { continue };
        if !seen.insert(name.clone()) {
            diagnostics.push(Diagnostic {
                range: stage.range,
                severity: Some(DiagnosticSeverity::ERROR),
                source: Some(SOURCE.to_string()),
                message: format!("stage name \"{name}\" is already used by an earlier stage"),
                ..Diagnostic::default()
            });
        }
    }
    diagnostics
}

/// Flags `FROM <name>` where `<name>` looks like a reference to an earlier
/// stage (no registry-like punctuation) but no stage with that name or
/// index exists.
pub fn undefined_stage_reference(doc: &DockerfileDocument) -> Vec<Diagnostic> {
    let stages = doc.stages();
    let mut diagnostics = Vec::new();
    for (position, stage) in stages.iter().enumerate() {
        if !looks_like_stage_reference(&stage.base) {
            continue;
        }
        let resolved = stages[..position]
            .iter()
            .any(|earlier| earlier.name.as_deref() == Some(stage.base.as_str()))
            || stage.base.parse::<usize>().is_ok_and(|index| index < position);
        if !resolved {
            diagnostics.push(Diagnostic {
                range: stage.range,
                severity: Some(DiagnosticSeverity::ERROR),
                source: Some(SOURCE.to_string()),
                message: format!("FROM references undefined build stage \"{}\"", stage.base),
                ..Diagnostic::default()
            });
        }
    }
    diagnostics
}

fn looks_like_stage_reference(base: &str) -> bool {
    !base.is_empty()
        && !base.contains('/')
        && !base.contains('.')
        && !base.contains(':')
        && !base.eq_ignore_ascii_case("scratch")
}

/// Flags `ARG` declarations never interpolated via `$NAME`/`${NAME}` by a
/// later instruction before the next `FROM` (or end of file).
pub fn unused_args(doc: &DockerfileDocument) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for arg in doc.args() {
        let used = doc
            .instructions
            .iter()
            .any(|instruction| instruction.start_line > arg_line(doc, &arg) && references_name(&instruction.args, &arg.name));
        if !used {
            diagnostics.push(Diagnostic {
                range: arg.range,
                severity: Some(DiagnosticSeverity::WARNING),
                source: Some(SOURCE.to_string()),
                message: format!("ARG \"{}\" is never used", arg.name),
                ..Diagnostic::default()
            });
        }
    }
    diagnostics
}

fn arg_line(_doc: &DockerfileDocument, arg: &crate::queries::ArgDeclaration) -> u32 {
    arg.range.start.line
}

fn references_name(args: &str, name: &str) -> bool {
    let plain = format!("${name}");
    let braced = format!("${{{name}}}");
    args.contains(&plain) || args.contains(&braced)
}

pub fn all(doc: &DockerfileDocument) -> Vec<Diagnostic> {
    let mut diagnostics = duplicate_stage_names(doc);
    diagnostics.extend(undefined_stage_reference(doc));
    diagnostics.extend(unused_args(doc));
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_duplicate_stage_names() {
        let doc = DockerfileDocument::parse("FROM scratch AS build\nFROM scratch AS build\n");
        assert_eq!(duplicate_stage_names(&doc).len(), 1);
    }

    #[test]
    fn flags_undefined_stage_reference() {
        let doc = DockerfileDocument::parse("FROM builder\n");
        assert_eq!(undefined_stage_reference(&doc).len(), 1);
    }

    #[test]
    fn does_not_flag_registry_images_as_stage_references() {
        let doc = DockerfileDocument::parse("FROM golang:1.22-alpine\nFROM scratch\n");
        assert!(undefined_stage_reference(&doc).is_empty());
    }

    #[test]
    fn flags_unused_arg() {
        let doc = DockerfileDocument::parse("FROM scratch\nARG VERSION=1.0\nRUN echo hi\n");
        assert_eq!(unused_args(&doc).len(), 1);
    }

    #[test]
    fn does_not_flag_arg_interpolated_later() {
        let doc = DockerfileDocument::parse("FROM scratch\nARG VERSION=1.0\nRUN echo $VERSION\n");
        assert!(unused_args(&doc).is_empty());
    }
}
