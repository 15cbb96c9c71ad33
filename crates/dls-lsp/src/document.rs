//! The tagged-variant `Document` the three analyzer crates' parsed
//! forms are wrapped in, plus the [`dls_core::manager::DocumentParser`]
//! and [`dls_core::manager::DocumentReader`] implementations the
//! [`dls_core::DocumentManager`] needs to stay agnostic of them.

use std::io;
use std::sync::Arc;

use dls_bake::BakeDocument;
use dls_compose::ComposeDocument;
use dls_core::manager::{DocumentParser, DocumentReader};
use dls_core::uri::uri_to_path;
use dls_core::LanguageIdentifier;
use dls_dockerfile::DockerfileDocument;
use lsp_types::Url;

/// One parsed document, shaped by its [`LanguageIdentifier`].
///
/// Shared URI/version/bytes fields live on [`dls_core::manager::Snapshot`]
/// rather than here; this enum only owns what differs per language.
#[derive(Debug, Clone)]
pub enum ParsedDocument {
    Dockerfile(Arc<DockerfileDocument>),
    Bake(Arc<BakeDocument>),
    Compose(Arc<ComposeDocument>),
}

impl ParsedDocument {
    pub fn as_dockerfile(&self) -> Option<&DockerfileDocument> {
        match self {
            ParsedDocument::Dockerfile(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_bake(&self) -> Option<&BakeDocument> {
        match self {
            ParsedDocument::Bake(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_compose(&self) -> Option<&ComposeDocument> {
        match self {
            ParsedDocument::Compose(doc) => Some(doc),
            _ => None,
        }
    }
}

/// Parses bytes according to the language the manager already decided
/// on (`didOpen`'s declared language, or [`LanguageIdentifier::infer`]
/// for a peer read), and runs each analyzer's own change-detection
/// rule.
pub struct AnalyzerParser;

impl DocumentParser<ParsedDocument> for AnalyzerParser {
    fn parse(&self, language: LanguageIdentifier, bytes: &str) -> ParsedDocument {
        match language {
            LanguageIdentifier::Dockerfile => ParsedDocument::Dockerfile(Arc::new(DockerfileDocument::parse(bytes))),
            LanguageIdentifier::Bake => ParsedDocument::Bake(Arc::new(BakeDocument::parse(bytes))),
            LanguageIdentifier::Compose => ParsedDocument::Compose(Arc::new(ComposeDocument::parse(bytes))),
        }
    }

    fn changed(&self, old: &ParsedDocument, new: &ParsedDocument) -> bool {
        match (old, new) {
            (ParsedDocument::Dockerfile(old), ParsedDocument::Dockerfile(new)) => new.changed_from(old),
            (ParsedDocument::Bake(old), ParsedDocument::Bake(new)) => new.changed_from(old),
            (ParsedDocument::Compose(old), ParsedDocument::Compose(new)) => new.changed_from(old),
            // A document's declared language never changes in place
            // (`overwrite` preserves it); reaching here means a stale
            // comparison slipped through, so be conservative.
            _ => true,
        }
    }
}

/// Reads peer files lazily from disk, the only I/O boundary the
/// document manager crosses.
pub struct FsReader;

impl DocumentReader for FsReader {
    fn read(&self, uri: &Url) -> io::Result<String> {
        let path = uri_to_path(uri).ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "unsupported URI"))?;
        std::fs::read_to_string(path)
    }
}
