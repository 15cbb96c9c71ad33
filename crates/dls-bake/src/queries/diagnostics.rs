//! Diagnostics, run per edit after the document manager's debounce
//! settles.
//!
//! Every check here that needs the sibling Dockerfile takes it as a
//! caller-supplied `Option<&DockerfileDocument>` (or a slice of them for
//! the `inherits`-ancestor union), the same boundary `definition`/`inlay`
//! use - this crate never reads peer files itself.

use dls_core::LineIndex;
use dls_dockerfile::DockerfileDocument;
use dls_imagecache::ImageReport;
use lsp_types::{Diagnostic, DiagnosticSeverity, DiagnosticTag, NumberOrString, Range};

use crate::ir::{Block, Expr};
use crate::BakeDocument;

const SOURCE: &str = "docker-language-server";

/// Built-in ARGs exempt from the "not defined in your Dockerfile" check.
pub const BUILTIN_ARGS: &[&str] = &[
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "FTP_PROXY",
    "ALL_PROXY",
    "NO_PROXY",
    "BUILDKIT_CACHE_MOUNT_NS",
    "BUILDKIT_MULTI_PLATFORM",
    "BUILDKIT_SANDBOX_HOSTNAME",
    "BUILDKIT_DOCKERFILE_CHECK",
    "BUILDKIT_CONTEXT_KEEP_GIT_DIR",
    "SOURCE_DATE_EPOCH",
    "BUILDKIT_SYNTAX",
];

pub fn parse_error_diagnostics(doc: &BakeDocument) -> Vec<Diagnostic> {
    let index = LineIndex::new(&doc.bytes);
    doc.parse_errors
        .iter()
        .map(|err| Diagnostic {
            range: index.range(&doc.bytes, err.span.clone()),
            severity: Some(DiagnosticSeverity::ERROR),
            source: Some(SOURCE.to_string()),
            message: err.message.clone(),
            ..Diagnostic::default()
        })
        .collect()
}

/// A `target` with both `dockerfile` and `dockerfile-inline` set:
/// `dockerfile` is unnecessary and the quick fix deletes its line.
pub fn dockerfile_inline_conflicts(doc: &BakeDocument) -> Vec<Diagnostic> {
    let index = LineIndex::new(&doc.bytes);
    doc.targets()
        .filter_map(|target| {
            let dockerfile_attr = target.attribute("dockerfile")?;
            target.attribute("dockerfile-inline")?;
            Some(Diagnostic {
                range: index.range(&doc.bytes, dockerfile_attr.span.clone()),
                severity: Some(DiagnosticSeverity::WARNING),
                source: Some(SOURCE.to_string()),
                message: "\"dockerfile\" is unnecessary when \"dockerfile-inline\" is set".to_string(),
                tags: Some(vec![DiagnosticTag::UNNECESSARY]),
                code: Some(NumberOrString::String("bake/unnecessary-dockerfile".to_string())),
                ..Diagnostic::default()
            })
        })
        .collect()
}

/// The whole-line range to delete as the quick fix for
/// [`dockerfile_inline_conflicts`].
pub fn delete_attribute_line_range(doc: &BakeDocument, target: &Block) -> Option<Range> {
    let attr = target.attribute("dockerfile")?;
    let index = LineIndex::new(&doc.bytes);
    let start = index.offset_to_position(&doc.bytes, attr.span.start);
    let line_start = Range::new(
        lsp_types::Position::new(start.line, 0),
        lsp_types::Position::new(start.line + 1, 0),
    );
    Some(line_start)
}

/// `args` map keys that resolve to neither a built-in ARG nor one
/// declared by any of `dockerfiles` (the target's own resolved Dockerfile
/// plus every `inherits` ancestor's). Skipped entirely by the caller when
/// `dockerfile-inline` is set or the Dockerfile path isn't deterministic.
pub fn undefined_arg_diagnostics(doc: &BakeDocument, target: &Block, dockerfiles: &[&DockerfileDocument]) -> Vec<Diagnostic> {
    let Some(attr) = target.attribute("args") else { return Vec::new() };
    let Expr::Object { items, .. } = &attr.value else { return Vec::new() };
    let index = LineIndex::new(&doc.bytes);

    let mut known: Vec<String> = BUILTIN_ARGS.iter().map(|s| s.to_string()).collect();
    for dockerfile in dockerfiles {
        known.extend(dockerfile.args().into_iter().map(|a| a.name));
    }

    items
        .iter()
        .filter_map(|item| {
            let key = item.key.as_literal_str()?;
            if known.iter().any(|name| name == key) {
                return None;
            }
            Some(Diagnostic {
                range: index.range(&doc.bytes, item.key.span()),
                severity: Some(DiagnosticSeverity::ERROR),
                source: Some(SOURCE.to_string()),
                message: format!("'{key}' not defined as an ARG in your Dockerfile"),
                ..Diagnostic::default()
            })
        })
        .collect()
}

/// `tags` literal spans for every target, handed to the caller to drive
/// through the image intelligence cache, which this crate doesn't query
/// itself.
pub fn tag_literals(target: &Block) -> Vec<(String, std::ops::Range<usize>)> {
    let Some(attr) = target.attribute("tags") else { return Vec::new() };
    attr.value
        .array_literals()
        .into_iter()
        .map(|(text, span)| (text.to_string(), span))
        .collect()
}

/// Builds the vulnerability-advisory diagnostic for one `tags` entry, if
/// the cached report flagged anything (configuration-gated by the caller).
pub fn vulnerability_diagnostic(doc: &BakeDocument, span: std::ops::Range<usize>, report: &ImageReport) -> Option<Diagnostic> {
    let flagged = report.diagnostics.iter().any(|value| {
        value.get("critical_high_vulnerabilities").is_some() || value.get("vulnerabilities").is_some()
    });
    if !flagged {
        return None;
    }
    let index = LineIndex::new(&doc.bytes);
    Some(Diagnostic {
        range: index.range(&doc.bytes, span),
        severity: Some(DiagnosticSeverity::WARNING),
        source: Some(SOURCE.to_string()),
        message: format!("image \"{}\" has known vulnerabilities", report.image),
        ..Diagnostic::default()
    })
}

const VALID_ENTITLEMENTS: &[&str] = &["network.host", "security.insecure"];
const VALID_NETWORKS: &[&str] = &["default", "host", "none"];

pub fn entitlements_diagnostics(doc: &BakeDocument) -> Vec<Diagnostic> {
    enum_value_diagnostics(doc, "entitlements", VALID_ENTITLEMENTS)
}

pub fn network_diagnostics(doc: &BakeDocument) -> Vec<Diagnostic> {
    doc.targets()
        .filter_map(|target| {
            let attr = target.attribute("network")?;
            let literal = attr.value.as_literal_str()?;
            if VALID_NETWORKS.contains(&literal) {
                return None;
            }
            let index = LineIndex::new(&doc.bytes);
            Some(Diagnostic {
                range: index.range(&doc.bytes, attr.value.span()),
                severity: Some(DiagnosticSeverity::ERROR),
                source: Some(SOURCE.to_string()),
                message: format!("\"{literal}\" is not a valid network mode (expected one of: default, host, none)"),
                ..Diagnostic::default()
            })
        })
        .collect()
}

fn enum_value_diagnostics(doc: &BakeDocument, attribute_name: &str, valid: &[&str]) -> Vec<Diagnostic> {
    let index = LineIndex::new(&doc.bytes);
    doc.targets()
        .filter_map(|target| target.attribute(attribute_name))
        .flat_map(|attr| attr.value.array_literals())
        .filter(|(text, _)| !valid.contains(text))
        .map(|(text, span)| Diagnostic {
            range: index.range(&doc.bytes, span),
            severity: Some(DiagnosticSeverity::ERROR),
            source: Some(SOURCE.to_string()),
            message: format!("\"{text}\" is not a valid entitlement (expected one of: {})", valid.join(", ")),
            ..Diagnostic::default()
        })
        .collect()
}

/// A `target` attribute naming a stage absent from the resolved
/// Dockerfile.
pub fn undefined_target_stage_diagnostics(doc: &BakeDocument, target: &Block, dockerfile: Option<&DockerfileDocument>) -> Vec<Diagnostic> {
    let Some(dockerfile) = dockerfile else { return Vec::new() };
    let Some(attr) = target.attribute("target") else { return Vec::new() };
    let Some(literal) = attr.value.as_literal_str() else { return Vec::new() };
    if dockerfile.stage_by_reference(literal).is_some() {
        return Vec::new();
    }
    let index = LineIndex::new(&doc.bytes);
    vec![Diagnostic {
        range: index.range(&doc.bytes, attr.value.span()),
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some(SOURCE.to_string()),
        message: format!("stage \"{literal}\" is not defined in the Dockerfile"),
        ..Diagnostic::default()
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_dockerfile_unnecessary_with_dockerfile_inline() {
        let doc = BakeDocument::parse("target \"t\" {\n  dockerfile = \"Dockerfile\"\n  dockerfile-inline = \"FROM scratch\"\n}\n");
        let diagnostics = dockerfile_inline_conflicts(&doc);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::WARNING));
    }

    #[test]
    fn flags_undefined_arg() {
        let doc = BakeDocument::parse("target \"t1\" {\n  args = {\n    missing = \"value\"\n  }\n}\n");
        let dockerfile = DockerfileDocument::parse("FROM scratch\nARG valid=value\n");
        let target = doc.find_target("t1").unwrap();
        let diagnostics = undefined_arg_diagnostics(&doc, target, &[&dockerfile]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "'missing' not defined as an ARG in your Dockerfile");
        assert_eq!(diagnostics[0].range.start, lsp_types::Position::new(2, 4));
        assert_eq!(diagnostics[0].range.end, lsp_types::Position::new(2, 11));
    }

    #[test]
    fn exempts_builtin_args() {
        let doc = BakeDocument::parse("target \"t1\" {\n  args = {\n    HTTP_PROXY = \"x\"\n  }\n}\n");
        let dockerfile = DockerfileDocument::parse("FROM scratch\n");
        let target = doc.find_target("t1").unwrap();
        assert!(undefined_arg_diagnostics(&doc, target, &[&dockerfile]).is_empty());
    }

    #[test]
    fn flags_invalid_network_literal() {
        let doc = BakeDocument::parse("target \"t\" {\n  network = \"weird\"\n}\n");
        assert_eq!(network_diagnostics(&doc).len(), 1);
    }

    #[test]
    fn flags_invalid_entitlement() {
        let doc = BakeDocument::parse("target \"t\" {\n  entitlements = [\"network.host\", \"bogus\"]\n}\n");
        assert_eq!(entitlements_diagnostics(&doc).len(), 1);
    }

    #[test]
    fn flags_target_naming_missing_stage() {
        let doc = BakeDocument::parse("target \"t\" {\n  target = \"missing\"\n}\n");
        let dockerfile = DockerfileDocument::parse("FROM scratch AS build\n");
        let target = doc.find_target("t").unwrap();
        assert_eq!(undefined_target_stage_diagnostics(&doc, target, Some(&dockerfile)).len(), 1);
    }
}
