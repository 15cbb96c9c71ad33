//! `workspace/executeCommand` handlers: the three Bake build-target
//! commands a code lens triggers, and the quick-fix command a
//! diagnostic's code action offers.

use lsp_types::{ExecuteCommandParams, TextEdit, Url, WorkspaceEdit};
use serde_json::Value;
use std::collections::HashMap;

use crate::document::ParsedDocument;
use crate::workspace::Workspace;

pub const BAKE_BUILD: &str = "dockerLspClient.bake.build";
pub const BAKE_CHECK: &str = "dockerLspClient.bake.check";
pub const BAKE_PRINT: &str = "dockerLspClient.bake.print";
pub const APPLY_DIAGNOSTIC_FIX: &str = "server.textDocument.codeAction.diagnostics";

/// Returns the raw arguments the client should hand to its own Bake CLI
/// invocation; this server doesn't shell out, the command's body is the
/// client's to run.
pub fn bake_build_arguments(params: &ExecuteCommandParams) -> Option<&Value> {
    params.arguments.first()
}

/// Deletes the line range of a target's `dockerfile`/`dockerfile-inline`
/// attribute, used by the `dockerfile-inline` conflict quick fix.
pub fn apply_diagnostic_fix(ws: &Workspace, uri: &Url, target_label: &str) -> Option<WorkspaceEdit> {
    let snapshot = ws.documents.get(uri)?;
    let ParsedDocument::Bake(doc) = &*snapshot.parsed else { return None };
    let target = dls_bake::queries::symbols::all_block_labels(doc)
        .into_iter()
        .find(|b| b.ident == "target" && b.labels.first().map(|l| l.text.as_str()) == Some(target_label))?;
    let range = dls_bake::queries::diagnostics::delete_attribute_line_range(doc, target)?;
    let edit = TextEdit { range, new_text: String::new() };
    let mut changes = HashMap::new();
    changes.insert(uri.clone(), vec![edit]);
    Some(WorkspaceEdit { changes: Some(changes), document_changes: None, change_annotations: None })
}
