//! Compose to Dockerfile cross-reference: extracts a service's `build`
//! attributes into a [`dls_xref::BuildRef`] the same way
//! `dls_bake::inherits` does for a Bake target, then defers to
//! [`dls_xref::resolve_dockerfile_ref`].

use dls_compose::ir::{MappingEntry, Node};
use dls_compose::ComposeDocument;
use dls_xref::{BaseFolder, BuildRef, DockerfileRef, RefValue};

/// `build:` can be a bare string (context only) or a mapping with
/// `context`/`dockerfile`/`dockerfile_inline` keys.
pub fn service_dockerfile_ref(doc: &ComposeDocument, service: &MappingEntry, base: &BaseFolder) -> DockerfileRef {
    let build = doc
        .yaml
        .resolve_mapping(&service.value)
        .and_then(|mapping| mapping.get("build"));
    let Some(build) = build else {
        return dls_xref::resolve_dockerfile_ref(base, &BuildRef::default());
    };
    let Some(build) = doc.yaml.resolve(build) else { return DockerfileRef::Unresolvable };

    if let Some(context) = build.as_scalar_text() {
        let build_ref = BuildRef { context: Some(RefValue::Literal(context.to_string())), ..BuildRef::default() };
        return dls_xref::resolve_dockerfile_ref(base, &build_ref);
    }

    let Some(build_mapping) = build.as_mapping() else { return DockerfileRef::Unresolvable };
    let build_ref = BuildRef {
        context: build_mapping.get("context").and_then(Node::as_scalar_text).map(|s| RefValue::Literal(s.to_string())),
        dockerfile: build_mapping.get("dockerfile").and_then(Node::as_scalar_text).map(|s| RefValue::Literal(s.to_string())),
        dockerfile_inline: build_mapping.get("dockerfile_inline").is_some(),
    };
    dls_xref::resolve_dockerfile_ref(base, &build_ref)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseFolder {
        BaseFolder { native: "/workspace/app".to_string(), wsl_distro: None }
    }

    #[test]
    fn bare_string_build_is_a_context_only_reference() {
        let doc = ComposeDocument::parse("services:\n  web:\n    build: backend\n");
        let service = doc.find_service("web").unwrap();
        match service_dockerfile_ref(&doc, service, &base()) {
            DockerfileRef::Resolved { native_path, .. } => assert_eq!(native_path, "/workspace/app/backend/Dockerfile"),
            other => panic!("expected resolved, got {other:?}"),
        }
    }

    #[test]
    fn mapping_build_with_explicit_dockerfile() {
        let doc = ComposeDocument::parse("services:\n  web:\n    build:\n      context: backend\n      dockerfile: Dockerfile.prod\n");
        let service = doc.find_service("web").unwrap();
        match service_dockerfile_ref(&doc, service, &base()) {
            DockerfileRef::Resolved { native_path, .. } => assert_eq!(native_path, "/workspace/app/backend/Dockerfile.prod"),
            other => panic!("expected resolved, got {other:?}"),
        }
    }

    #[test]
    fn no_build_block_defaults_to_sibling_dockerfile() {
        let doc = ComposeDocument::parse("services:\n  web:\n    image: nginx\n");
        let service = doc.find_service("web").unwrap();
        match service_dockerfile_ref(&doc, service, &base()) {
            DockerfileRef::Resolved { native_path, .. } => assert_eq!(native_path, "/workspace/app/Dockerfile"),
            other => panic!("expected resolved, got {other:?}"),
        }
    }
}
