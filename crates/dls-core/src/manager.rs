//! The document manager.
//!
//! Generic over the parsed-document shape so this crate never depends on
//! the per-language analyzer crates: callers supply a [`DocumentParser`]
//! that knows how to turn bytes into their own `Document` enum and how
//! to detect a semantically-meaningful edit.

use std::io;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lsp_types::Url;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::debounce::Debouncer;
use crate::error::CoreError;
use crate::language::LanguageIdentifier;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Supplies the parsing and change-detection behavior the manager itself
/// stays agnostic to.
pub trait DocumentParser<D>: Send + Sync {
    fn parse(&self, language: LanguageIdentifier, bytes: &str) -> D;
    /// `true` if `old` and `new` differ in a way that should invalidate
    /// dependent diagnostics/hovers.
    fn changed(&self, old: &D, new: &D) -> bool;
}

/// Reads bytes for a URI the manager doesn't have cached yet.
pub trait DocumentReader: Send + Sync {
    fn read(&self, uri: &Url) -> io::Result<String>;
}

struct Entry<D> {
    language: LanguageIdentifier,
    version: i32,
    bytes: String,
    parsed: Arc<D>,
    is_open: bool,
}

/// A read-only snapshot of one document at the version it was read.
#[derive(Clone)]
pub struct Snapshot<D> {
    pub uri: Url,
    pub language: LanguageIdentifier,
    pub version: i32,
    pub bytes: Arc<str>,
    pub parsed: Arc<D>,
}

pub struct DocumentManager<D> {
    documents: RwLock<FxHashMap<Url, Entry<D>>>,
    parser: Arc<dyn DocumentParser<D>>,
    reader: Arc<dyn DocumentReader>,
    debouncer: Debouncer,
    version_watermark: AtomicI32,
}

impl<D: Send + Sync + 'static> DocumentManager<D> {
    pub fn new(parser: Arc<dyn DocumentParser<D>>, reader: Arc<dyn DocumentReader>) -> Self {
        Self {
            documents: RwLock::new(FxHashMap::default()),
            parser,
            reader,
            debouncer: Debouncer::new(DEFAULT_DEBOUNCE),
            version_watermark: AtomicI32::new(0),
        }
    }

    /// Returns a snapshot, reading and parsing from disk through the
    /// injected reader if the document isn't cached yet.
    pub fn read(&self, uri: &Url) -> Result<Snapshot<D>, CoreError> {
        if let Some(snapshot) = self.get(uri) {
            return Ok(snapshot);
        }
        let bytes = self
            .reader
            .read(uri)
            .map_err(|_| CoreError::NotFound(uri.clone()))?;
        let file_name = uri
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default();
        let language = LanguageIdentifier::infer(file_name);
        let parsed = self.parser.parse(language, &bytes);
        let snapshot = Snapshot {
            uri: uri.clone(),
            language,
            version: 0,
            bytes: Arc::from(bytes.as_str()),
            parsed: Arc::new(parsed),
        };
        let mut documents = self.documents.write();
        documents.entry(uri.clone()).or_insert_with(|| Entry {
            language,
            version: 0,
            bytes,
            parsed: Arc::clone(&snapshot.parsed),
            is_open: false,
        });
        Ok(snapshot)
    }

    /// Creates or replaces a document. Returns whether a semantically
    /// meaningful change occurred (always `true` for a brand-new URI).
    pub fn write(&self, uri: Url, language: LanguageIdentifier, version: i32, bytes: String) -> bool {
        let parsed = self.parser.parse(language, &bytes);
        let mut documents = self.documents.write();
        let changed = match documents.get(&uri) {
            Some(old) => self.parser.changed(&old.parsed, &parsed),
            None => true,
        };
        documents.insert(
            uri,
            Entry {
                language,
                version,
                bytes,
                parsed: Arc::new(parsed),
                is_open: true,
            },
        );
        changed
    }

    /// Like [`write`](Self::write) but preserves the previously-declared
    /// language, inferring one from the file name only if the URI was
    /// never seen before.
    pub fn overwrite(&self, uri: Url, version: i32, bytes: String) -> bool {
        let language = self
            .documents
            .read()
            .get(&uri)
            .map(|entry| entry.language)
            .unwrap_or_else(|| {
                let file_name = uri
                    .path_segments()
                    .and_then(|mut segments| segments.next_back())
                    .unwrap_or_default();
                LanguageIdentifier::infer(file_name)
            });
        self.write(uri, language, version, bytes)
    }

    pub fn version(&self, uri: &Url) -> Result<i32, CoreError> {
        self.documents
            .read()
            .get(uri)
            .map(|entry| entry.version)
            .ok_or_else(|| CoreError::NotFound(uri.clone()))
    }

    /// Returns the live entry without touching the injected reader.
    pub fn get(&self, uri: &Url) -> Option<Snapshot<D>> {
        let documents = self.documents.read();
        let entry = documents.get(uri)?;
        Some(Snapshot {
            uri: uri.clone(),
            language: entry.language,
            version: entry.version,
            bytes: Arc::from(entry.bytes.as_str()),
            parsed: Arc::clone(&entry.parsed),
        })
    }

    pub fn remove(&self, uri: &Url) {
        self.documents.write().remove(uri);
        self.debouncer.remove(uri);
    }

    pub fn close(&self, uri: &Url) {
        if let Some(entry) = self.documents.write().get_mut(uri) {
            entry.is_open = false;
        }
    }

    pub fn is_open(&self, uri: &Url) -> bool {
        self.documents
            .read()
            .get(uri)
            .map(|entry| entry.is_open)
            .unwrap_or(false)
    }

    pub fn keys(&self) -> Vec<Url> {
        self.documents.read().keys().cloned().collect()
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Reserves the next version number for documents this manager
    /// creates itself (peer reads that assign synthetic versions).
    pub fn next_synthetic_version(&self) -> i32 {
        self.version_watermark.fetch_sub(1, Ordering::SeqCst) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct EchoParser;
    impl DocumentParser<String> for EchoParser {
        fn parse(&self, _language: LanguageIdentifier, bytes: &str) -> String {
            bytes.to_string()
        }
        fn changed(&self, old: &String, new: &String) -> bool {
            old.trim() != new.trim()
        }
    }

    struct FailingReader;
    impl DocumentReader for FailingReader {
        fn read(&self, _uri: &Url) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }

    struct MapReader(Mutex<FxHashMap<Url, String>>);
    impl DocumentReader for MapReader {
        fn read(&self, uri: &Url) -> io::Result<String> {
            self.0
                .lock()
                .unwrap()
                .get(uri)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        }
    }

    fn manager() -> DocumentManager<String> {
        DocumentManager::new(Arc::new(EchoParser), Arc::new(FailingReader))
    }

    #[test]
    fn read_missing_document_fails_not_found() {
        let uri = Url::parse("file:///workspace/Dockerfile").unwrap();
        assert!(manager().read(&uri).is_err());
    }

    #[test]
    fn write_reports_semantic_change_only_when_content_differs() {
        let mgr = manager();
        let uri = Url::parse("file:///workspace/a.hcl").unwrap();
        assert!(mgr.write(uri.clone(), LanguageIdentifier::Bake, 1, "target \"a\" {}".into()));
        assert!(!mgr.write(
            uri.clone(),
            LanguageIdentifier::Bake,
            2,
            "target \"a\" {}  ".into()
        ));
        assert!(mgr.write(uri, LanguageIdentifier::Bake, 3, "target \"b\" {}".into()));
    }

    #[test]
    fn overwrite_preserves_previously_declared_language() {
        let mgr = manager();
        let uri = Url::parse("file:///workspace/unknown").unwrap();
        mgr.write(uri.clone(), LanguageIdentifier::Bake, 1, "x".into());
        mgr.overwrite(uri.clone(), 2, "y".into());
        assert_eq!(mgr.get(&uri).unwrap().language, LanguageIdentifier::Bake);
    }

    #[test]
    fn version_is_monotonic_across_writes() {
        let mgr = manager();
        let uri = Url::parse("file:///workspace/a.hcl").unwrap();
        mgr.write(uri.clone(), LanguageIdentifier::Bake, 1, "a".into());
        mgr.write(uri.clone(), LanguageIdentifier::Bake, 2, "b".into());
        assert_eq!(mgr.version(&uri).unwrap(), 2);
    }

    #[test]
    fn read_through_injected_reader_caches_the_result() {
        let uri = Url::parse("file:///workspace/peer.hcl").unwrap();
        let mut files = FxHashMap::default();
        files.insert(uri.clone(), "target \"p\" {}".to_string());
        let mgr = DocumentManager::new(Arc::new(EchoParser), Arc::new(MapReader(Mutex::new(files))));
        let snapshot = mgr.read(&uri).unwrap();
        assert_eq!(&*snapshot.bytes, "target \"p\" {}");
        assert!(mgr.get(&uri).is_some());
    }

    #[test]
    fn remove_drops_the_entry_and_cancels_debounce() {
        let mgr = manager();
        let uri = Url::parse("file:///workspace/a.hcl").unwrap();
        mgr.write(uri.clone(), LanguageIdentifier::Bake, 1, "a".into());
        mgr.remove(&uri);
        assert!(mgr.get(&uri).is_none());
    }
}
