//! LSP request dispatch: each function here looks at a document's
//! [`dls_core::LanguageIdentifier`] and forwards to the matching
//! analyzer crate's query.

mod peer;

use std::sync::Arc;

use dls_core::LanguageIdentifier;
use lsp_types::*;

use crate::document::ParsedDocument;
use crate::workspace::Workspace;

pub use peer::{resolve_bake_target_dockerfile, resolve_compose_service_dockerfile};

/// Computes the full diagnostic set for one document: the analyzer's
/// own structural diagnostics plus, for Bake, the vulnerability/
/// undefined-arg/undefined-stage checks that need peer documents and
/// the image cache.
pub async fn diagnostics(ws: &Workspace, uri: &Url) -> Vec<Diagnostic> {
    let Ok(snapshot) = ws.documents.read(uri) else { return Vec::new() };
    let config = ws.config_for(uri);

    match &*snapshot.parsed {
        ParsedDocument::Dockerfile(doc) => dls_dockerfile::diagnostics::all(doc),
        ParsedDocument::Compose(doc) => dls_compose::queries::diagnostics::parse_error_diagnostics(doc),
        ParsedDocument::Bake(doc) => {
            let mut out = dls_bake::queries::diagnostics::parse_error_diagnostics(doc);
            out.extend(dls_bake::queries::diagnostics::dockerfile_inline_conflicts(doc));
            out.extend(dls_bake::queries::diagnostics::entitlements_diagnostics(doc));
            out.extend(dls_bake::queries::diagnostics::network_diagnostics(doc));

            let Some(base) = ws.base_folder_for(uri) else { return out };
            for target in dls_bake::queries::symbols::all_block_labels(doc).into_iter().filter(|b| b.ident == "target") {
                let Some(label) = target.labels.first() else { continue };
                let dockerfile = resolve_bake_target_dockerfile(ws, doc, &base, &label.text);
                out.extend(dls_bake::queries::diagnostics::undefined_target_stage_diagnostics(doc, target, dockerfile.as_deref()));
                if config.diagnostics.bake_undefined_args {
                    if let Some(dockerfile) = dockerfile.as_deref() {
                        out.extend(dls_bake::queries::diagnostics::undefined_arg_diagnostics(doc, target, &[dockerfile]));
                    }
                }
                if config.diagnostics.vulnerability_scanning {
                    for (tag, span) in dls_bake::queries::diagnostics::tag_literals(target) {
                        if let Ok(report) = ws.images.get(&tag).await {
                            out.extend(dls_bake::queries::diagnostics::vulnerability_diagnostic(doc, span, &report));
                        }
                    }
                }
            }
            out
        }
    }
}

pub fn hover(ws: &Workspace, uri: &Url, position: Position) -> Option<Hover> {
    let snapshot = ws.documents.get(uri)?;
    match &*snapshot.parsed {
        ParsedDocument::Dockerfile(_) => None,
        ParsedDocument::Bake(doc) => dls_bake::queries::hover::hover(doc, position),
        ParsedDocument::Compose(doc) => dls_compose::queries::hover::hover(doc, position),
    }
}

pub fn completion(ws: &Workspace, uri: &Url, position: Position) -> Vec<CompletionItem> {
    let Some(snapshot) = ws.documents.get(uri) else { return Vec::new() };
    let base = ws.base_folder_for(uri);
    match &*snapshot.parsed {
        ParsedDocument::Dockerfile(_) => Vec::new(),
        ParsedDocument::Bake(doc) => {
            let dockerfile = base
                .as_ref()
                .and_then(|base| resolve_bake_target_dockerfile(ws, doc, base, &focused_bake_target(doc, position)?));
            dls_bake::queries::completion::completion(doc, position, dockerfile.as_deref())
        }
        ParsedDocument::Compose(doc) => {
            let dockerfile = base.as_ref().and_then(|base| resolve_compose_service_dockerfile(ws, doc, base, position));
            dls_compose::queries::completion::completion(doc, position, dockerfile.as_deref())
        }
    }
}

pub fn inline_completions(ws: &Workspace, uri: &Url, position: Position) -> Vec<dls_bake::queries::inline_completion::InlineCompletion> {
    let Some(snapshot) = ws.documents.get(uri) else { return Vec::new() };
    let ParsedDocument::Bake(doc) = &*snapshot.parsed else { return Vec::new() };
    let Some(base) = ws.base_folder_for(uri) else { return Vec::new() };
    let Some(label) = focused_bake_target(doc, position) else { return Vec::new() };
    let Some(dockerfile) = resolve_bake_target_dockerfile(ws, doc, &base, &label) else { return Vec::new() };
    dls_bake::queries::inline_completion::inline_completions(doc, position, &dockerfile)
}

pub fn definition(ws: &Workspace, uri: &Url, position: Position) -> Option<GotoDefinitionResponse> {
    let snapshot = ws.documents.get(uri)?;
    let base = ws.base_folder_for(uri);
    let result = match &*snapshot.parsed {
        ParsedDocument::Dockerfile(_) => None,
        ParsedDocument::Bake(doc) => {
            let dockerfile = base
                .as_ref()
                .and_then(|base| focused_bake_target(doc, position).and_then(|label| resolve_bake_target_dockerfile(ws, doc, base, &label)));
            dls_bake::queries::definition::definition(doc, position, dockerfile.as_deref())
        }
        ParsedDocument::Compose(doc) => {
            let dockerfile = base.as_ref().and_then(|base| resolve_compose_service_dockerfile(ws, doc, base, position));
            dls_compose::queries::definition::definition(doc, position, dockerfile.as_deref())
        }
    }?;

    if ws.capabilities.location_link.load(std::sync::atomic::Ordering::Relaxed) {
        Some(GotoDefinitionResponse::Link(vec![LocationLink {
            origin_selection_range: Some(result.origin_selection_range),
            target_uri: uri.clone(),
            target_range: result.target_range,
            target_selection_range: result.target_range,
        }]))
    } else {
        Some(GotoDefinitionResponse::Scalar(Location { uri: uri.clone(), range: result.target_range }))
    }
}

pub fn references(ws: &Workspace, uri: &Url, position: Position, include_declaration: bool) -> Vec<Location> {
    let Some(snapshot) = ws.documents.get(uri) else { return Vec::new() };
    match &*snapshot.parsed {
        ParsedDocument::Dockerfile(_) => Vec::new(),
        ParsedDocument::Bake(doc) => dls_bake::queries::references::references(doc, position, uri, include_declaration),
        ParsedDocument::Compose(doc) => dls_compose::queries::references::references(doc, position, uri, include_declaration),
    }
}

pub fn document_highlight(ws: &Workspace, uri: &Url, position: Position) -> Option<Vec<DocumentHighlight>> {
    let snapshot = ws.documents.get(uri)?;
    match &*snapshot.parsed {
        ParsedDocument::Dockerfile(_) => None,
        ParsedDocument::Bake(doc) => dls_bake::queries::highlight::document_highlight(doc, position),
        ParsedDocument::Compose(doc) => dls_compose::queries::highlight::document_highlight(doc, position),
    }
}

pub fn document_symbol(ws: &Workspace, uri: &Url) -> Option<DocumentSymbolResponse> {
    let snapshot = ws.documents.get(uri)?;
    let symbols = match &*snapshot.parsed {
        ParsedDocument::Dockerfile(_) => return None,
        ParsedDocument::Bake(doc) => dls_bake::queries::symbols::document_symbols(doc),
        ParsedDocument::Compose(doc) => dls_compose::queries::symbols::document_symbols(doc),
    };
    Some(DocumentSymbolResponse::Nested(symbols))
}

pub fn document_link(ws: &Workspace, uri: &Url) -> Vec<DocumentLink> {
    let Some(snapshot) = ws.documents.get(uri) else { return Vec::new() };
    match &*snapshot.parsed {
        ParsedDocument::Dockerfile(_) => Vec::new(),
        ParsedDocument::Bake(doc) => {
            let Some(base) = ws.base_folder_for(uri) else { return Vec::new() };
            dls_bake::queries::symbols::document_links(doc, &base)
        }
        ParsedDocument::Compose(doc) => dls_compose::queries::symbols::document_links(doc),
    }
}

pub fn code_lens(ws: &Workspace, uri: &Url) -> Vec<CodeLens> {
    let Some(snapshot) = ws.documents.get(uri) else { return Vec::new() };
    let ParsedDocument::Bake(doc) = &*snapshot.parsed else { return Vec::new() };
    let Some(cwd) = crate::workspace::command_cwd(uri) else { return Vec::new() };
    let cwd = cwd.to_string_lossy().into_owned();
    dls_bake::queries::symbols::code_lenses(doc)
        .into_iter()
        .map(|entry| {
            let command = Command {
                title: format!("{} {}", entry.call, entry.target),
                command: format!("dockerLspClient.bake.{}", entry.call),
                arguments: Some(vec![entry.command_arguments(&cwd)]),
            };
            CodeLens { range: entry.range, command: Some(command), data: None }
        })
        .collect()
}

pub fn semantic_tokens_full(ws: &Workspace, uri: &Url) -> Option<SemanticTokensResult> {
    let snapshot = ws.documents.get(uri)?;
    let ParsedDocument::Bake(doc) = &*snapshot.parsed else { return None };
    let data = dls_bake::queries::symbols::semantic_tokens(doc);
    Some(SemanticTokensResult::Tokens(SemanticTokens { result_id: None, data }))
}

pub fn inlay_hint(ws: &Workspace, uri: &Url, range: Range) -> Vec<InlayHint> {
    let Some(snapshot) = ws.documents.get(uri) else { return Vec::new() };
    let Some(base) = ws.base_folder_for(uri) else { return Vec::new() };
    match &*snapshot.parsed {
        ParsedDocument::Dockerfile(_) => Vec::new(),
        ParsedDocument::Bake(doc) => dls_bake::queries::symbols::all_block_labels(doc)
            .into_iter()
            .filter(|b| b.ident == "target")
            .filter_map(|target| {
                let label = target.labels.first()?;
                resolve_bake_target_dockerfile(ws, doc, &base, &label.text)
            })
            .flat_map(|dockerfile| dls_bake::queries::inlay::inlay_hints(doc, range, &dockerfile))
            .collect(),
        ParsedDocument::Compose(doc) => doc
            .services()
            .filter_map(|service| {
                let dockerfile_ref = crate::compose_xref::service_dockerfile_ref(doc, service, &base);
                peer::dockerfile_from_ref(ws, dockerfile_ref)
            })
            .flat_map(|dockerfile| dls_compose::queries::inlay::inlay_hints(doc, range.clone(), &dockerfile))
            .collect(),
    }
}

pub fn formatting(ws: &Workspace, uri: &Url, options: &FormattingOptions) -> Option<Vec<TextEdit>> {
    let snapshot = ws.documents.get(uri)?;
    match &*snapshot.parsed {
        ParsedDocument::Dockerfile(_) => None,
        ParsedDocument::Bake(doc) => dls_bake::queries::formatting::formatting(doc, options),
        ParsedDocument::Compose(doc) => dls_compose::queries::formatting::formatting(doc, options),
    }
}

pub fn prepare_rename(ws: &Workspace, uri: &Url, position: Position) -> Option<Range> {
    let snapshot = ws.documents.get(uri)?;
    match &*snapshot.parsed {
        ParsedDocument::Dockerfile(_) => None,
        ParsedDocument::Bake(doc) => dls_bake::queries::rename::prepare_rename(doc, position),
        ParsedDocument::Compose(doc) => dls_compose::queries::rename::prepare_rename(doc, position),
    }
}

pub fn rename(ws: &Workspace, uri: &Url, position: Position, new_name: &str) -> Option<WorkspaceEdit> {
    let snapshot = ws.documents.get(uri)?;
    match &*snapshot.parsed {
        ParsedDocument::Dockerfile(_) => None,
        ParsedDocument::Bake(doc) => dls_bake::queries::rename::rename(doc, uri, position, new_name),
        ParsedDocument::Compose(doc) => dls_compose::queries::rename::rename(doc, uri, position, new_name),
    }
}

fn focused_bake_target(doc: &dls_bake::BakeDocument, position: Position) -> Option<String> {
    let focus = dls_bake::queries::position::focus_at(doc, position);
    let block = focus.innermost_block()?;
    if block.ident != "target" {
        return None;
    }
    block.labels.first().map(|label| label.text.clone())
}

/// `language` advertised for a URI under `didOpen`, used to decide
/// which diagnostics/capability set applies before the document is
/// necessarily cached.
pub fn language_for(language_id: &str) -> Option<LanguageIdentifier> {
    match language_id {
        "dockerfile" => Some(LanguageIdentifier::Dockerfile),
        "dockerbake" | "hcl" => Some(LanguageIdentifier::Bake),
        "dockercompose" | "yaml" => Some(LanguageIdentifier::Compose),
        _ => None,
    }
}

pub fn arc_snapshot(ws: &Workspace, uri: &Url) -> Option<Arc<ParsedDocument>> {
    ws.documents.get(uri).map(|snapshot| snapshot.parsed)
}
