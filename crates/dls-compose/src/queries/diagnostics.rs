//! Diagnostics: YAML syntax errors reported by
//! [`crate::parser`], surfaced the same way the Bake analyzer turns its
//! own parse errors into diagnostics (`dls_bake::queries::diagnostics`).

use dls_core::LineIndex;
use lsp_types::{Diagnostic, DiagnosticSeverity};

use crate::ComposeDocument;

const SOURCE: &str = "docker-language-server";

pub fn parse_error_diagnostics(doc: &ComposeDocument) -> Vec<Diagnostic> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_diagnostics_for_well_formed_documents() {
        let doc = ComposeDocument::parse("services:\n  web:\n    image: nginx\n");
        assert!(parse_error_diagnostics(&doc).is_empty());
    }
}
