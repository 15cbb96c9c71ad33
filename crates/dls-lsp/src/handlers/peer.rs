//! Resolves a Bake target's or Compose service's sibling Dockerfile
//! through [`dls_xref`], then loads it (if already open or on disk)
//! through the document manager as a peer read.

use std::sync::Arc;

use dls_bake::BakeDocument;
use dls_compose::ComposeDocument;
use dls_dockerfile::DockerfileDocument;
use dls_xref::{BaseFolder, DockerfileRef};
use lsp_types::Position;

use crate::document::ParsedDocument;
use crate::workspace::Workspace;

pub fn resolve_bake_target_dockerfile(ws: &Workspace, doc: &BakeDocument, base: &BaseFolder, label: &str) -> Option<Arc<DockerfileDocument>> {
    dockerfile_from_ref(ws, dls_bake::inherits::resolve_target_dockerfile(doc, label, base))
}

pub fn resolve_compose_service_dockerfile(ws: &Workspace, doc: &ComposeDocument, base: &BaseFolder, position: Position) -> Option<Arc<DockerfileDocument>> {
    let focus = dls_compose::queries::position::focus_at(doc, position)?;
    let path = focus.key_path();
    if path.first() != Some(&"services") {
        return None;
    }
    let name = path.get(1)?;
    let service = doc.find_service(name)?;
    dockerfile_from_ref(ws, crate::compose_xref::service_dockerfile_ref(doc, service, base))
}

pub fn dockerfile_from_ref(ws: &Workspace, reference: DockerfileRef) -> Option<Arc<DockerfileDocument>> {
    let DockerfileRef::Resolved { uri, .. } = reference else { return None };
    let snapshot = ws.documents.read(&uri).ok()?;
    match &*snapshot.parsed {
        ParsedDocument::Dockerfile(doc) => Some(Arc::clone(doc)),
        _ => None,
    }
}
