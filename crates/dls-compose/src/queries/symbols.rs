//! Document symbol and document link: named sections
//! and their entries as an outline, plus links from quoted `image:` and
//! `models:` values out to a registry/model-hub page.

use dls_core::LineIndex;
use lsp_types::{DocumentLink, DocumentSymbol, SymbolKind, Url};

use crate::ir::Node;
use crate::ComposeDocument;

const TOP_LEVEL_SECTIONS: &[&str] = &["services", "networks", "volumes", "configs", "secrets", "models"];

#[allow(deprecated)]
pub fn document_symbols(doc: &ComposeDocument) -> Vec<DocumentSymbol> {
    let index = LineIndex::new(&doc.bytes);
    let Some(root) = doc.yaml.root.as_ref().and_then(Node::as_mapping) else {
        return Vec::new();
    };
    root.entries
        .iter()
        .filter(|entry| TOP_LEVEL_SECTIONS.contains(&entry.key.text.as_str()))
        .map(|entry| {
            let children = entry
                .value
                .as_mapping()
                .map(|mapping| {
                    mapping
                        .entries
                        .iter()
                        .map(|child| DocumentSymbol {
                            name: child.key.text.clone(),
                            detail: None,
                            kind: SymbolKind::OBJECT,
                            tags: None,
                            deprecated: None,
                            range: index.range(&doc.bytes, child.span.clone()),
                            selection_range: index.range(&doc.bytes, child.key.span.clone()),
                            children: None,
                        })
                        .collect()
                })
                .unwrap_or_default();
            DocumentSymbol {
                name: entry.key.text.clone(),
                detail: None,
                kind: SymbolKind::NAMESPACE,
                tags: None,
                deprecated: None,
                range: index.range(&doc.bytes, entry.span.clone()),
                selection_range: index.range(&doc.bytes, entry.key.span.clone()),
                children: Some(children),
            }
        })
        .collect()
}

/// Quoted `services.<name>.image` values link to Docker Hub; entries in
/// the top-level `models:` section link to the Docker model hub.
pub fn document_links(doc: &ComposeDocument) -> Vec<DocumentLink> {
    let index = LineIndex::new(&doc.bytes);
    let mut links = Vec::new();

    for entry in doc.services() {
        let Some(mapping) = doc.yaml.resolve_mapping(&entry.value) else { continue };
        let Some(image) = mapping.get("image") else { continue };
        let Some(text) = image.as_scalar_text() else { continue };
        if let Some(url) = registry_url(text) {
            links.push(DocumentLink {
                range: index.range(&doc.bytes, image.span()),
                target: Some(url),
                tooltip: Some(text.to_string()),
                data: None,
            });
        }
    }

    for entry in doc.models() {
        if let Some(url) = model_hub_url(&entry.key.text) {
            links.push(DocumentLink {
                range: index.range(&doc.bytes, entry.key.span.clone()),
                target: Some(url),
                tooltip: Some(entry.key.text.clone()),
                data: None,
            });
        }
    }

    links
}

fn registry_url(image: &str) -> Option<Url> {
    let repo = image.split('@').next().unwrap_or(image);
    let repo = repo.rsplit_once(':').map_or(repo, |(name, _tag)| name);
    if repo.is_empty() {
        return None;
    }
    let path = if repo.contains('/') { repo.to_string() } else { format!("_/{repo}") };
    Url::parse(&format!("https://hub.docker.com/r/{path}")).ok()
}

fn model_hub_url(name: &str) -> Option<Url> {
    if name.is_empty() {
        return None;
    }
    Url::parse(&format!("https://hub.docker.com/ai/{name}")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outlines_services_and_their_entries() {
        let doc = ComposeDocument::parse("services:\n  web:\n    image: nginx\n  db:\n    image: postgres\n");
        let symbols = document_symbols(&doc);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "services");
        assert_eq!(symbols[0].children.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn image_values_link_to_docker_hub() {
        let doc = ComposeDocument::parse("services:\n  web:\n    image: nginx\n");
        let links = document_links(&doc);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target.as_ref().unwrap().as_str(), "https://hub.docker.com/r/_/nginx");
    }

    #[test]
    fn namespaced_image_links_without_the_library_prefix() {
        let doc = ComposeDocument::parse("services:\n  web:\n    image: bitnami/nginx:1.27\n");
        let links = document_links(&doc);
        assert_eq!(links[0].target.as_ref().unwrap().as_str(), "https://hub.docker.com/r/bitnami/nginx");
    }
}
