//! Server-wide state: the document manager, image cache, per-root
//! configuration, and the bits of client capability negotiated during
//! `initialize` that the handlers need later.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use dls_core::uri::{absolute_folder, workspace_folder};
use dls_core::DocumentManager;
use dls_imagecache::ImageCache;
use dls_xref::BaseFolder;
use lsp_types::{Url, WorkspaceFolder};
use parking_lot::RwLock;

use crate::config::ProjectConfig;
use crate::document::ParsedDocument;
use crate::telemetry::TelemetryCollector;

/// Client capabilities the handlers branch on. Populated once during
/// `initialize`, read-only after.
#[derive(Debug, Default)]
pub struct ClientCapabilities {
    pub location_link: AtomicBool,
    pub hierarchical_document_symbol: AtomicBool,
    pub configuration: AtomicBool,
}

pub struct Workspace {
    pub documents: DocumentManager<ParsedDocument>,
    pub images: ImageCache,
    pub capabilities: ClientCapabilities,
    folders: RwLock<Vec<WorkspaceFolder>>,
    configs: RwLock<Vec<(Url, ProjectConfig)>>,
    pub telemetry: TelemetryCollector,
}

impl Workspace {
    pub fn new(documents: DocumentManager<ParsedDocument>, images: ImageCache, telemetry: TelemetryCollector) -> Self {
        Workspace {
            documents,
            images,
            capabilities: ClientCapabilities::default(),
            folders: RwLock::new(Vec::new()),
            configs: RwLock::new(Vec::new()),
            telemetry,
        }
    }

    pub fn set_folders(&self, folders: Vec<WorkspaceFolder>) {
        let configs = folders
            .iter()
            .filter_map(|folder| absolute_folder(&folder.uri).map(|path| (folder.uri.clone(), ProjectConfig::load(&path))))
            .collect();
        *self.configs.write() = configs;
        *self.folders.write() = folders;
    }

    pub fn add_folder(&self, folder: WorkspaceFolder) {
        let config = absolute_folder(&folder.uri).map(|path| ProjectConfig::load(&path)).unwrap_or_default();
        self.configs.write().push((folder.uri.clone(), config));
        self.folders.write().push(folder);
    }

    pub fn remove_folder(&self, uri: &Url) {
        self.folders.write().retain(|folder| &folder.uri != uri);
        self.configs.write().retain(|(root, _)| root != uri);
    }

    pub fn folders(&self) -> Vec<Url> {
        self.folders.read().iter().map(|folder| folder.uri.clone()).collect()
    }

    /// Longest-matching-prefix config lookup: multi-root workspaces use
    /// whichever folder's settings the document is under.
    pub fn config_for(&self, uri: &Url) -> ProjectConfig {
        let folders = self.folders();
        let configs = self.configs.read();
        match workspace_folder(uri, &folders) {
            Some((root, _, _)) => configs
                .iter()
                .find(|(candidate, _)| candidate == &root)
                .map(|(_, config)| config.clone())
                .unwrap_or_default(),
            None => configs.first().map(|(_, config)| config.clone()).unwrap_or_default(),
        }
    }

    pub fn merge_configuration(&self, uri: &Url, value: &serde_json::Value) {
        let mut configs = self.configs.write();
        if let Some((_, config)) = configs.iter_mut().find(|(root, _)| root == uri) {
            config.merge_json(value);
        }
    }

    pub fn merge_configuration_all(&self, value: &serde_json::Value) {
        let mut configs = self.configs.write();
        for (_, config) in configs.iter_mut() {
            config.merge_json(value);
        }
    }

    /// Base folder for cross-reference resolution: the document's own
    /// directory, native form, carrying its WSL distro if any.
    pub fn base_folder_for(&self, uri: &Url) -> Option<BaseFolder> {
        let path = dls_core::uri::document_path(uri)?;
        Some(BaseFolder { native: path.folder, wsl_distro: path.wsl_distro })
    }

    pub fn client_configuration_supported(&self) -> bool {
        self.capabilities.configuration.load(Ordering::Relaxed)
    }
}

/// Resolves a workspace-relative path for `workspace/executeCommand`
/// arguments: code lenses pass the folder the build command should run
/// in.
pub fn command_cwd(uri: &Url) -> Option<PathBuf> {
    absolute_folder(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AnalyzerParser, FsReader};
    use dls_imagecache::HttpImageFetcher;
    use std::sync::Arc;

    fn workspace() -> Workspace {
        let documents = DocumentManager::new(Arc::new(AnalyzerParser), Arc::new(FsReader));
        let images = ImageCache::new(Arc::new(HttpImageFetcher::new("https://example.invalid")));
        Workspace::new(documents, images, TelemetryCollector::new(None))
    }

    #[test]
    fn config_for_unknown_uri_without_folders_uses_defaults() {
        let ws = workspace();
        let uri = Url::parse("file:///workspace/Dockerfile").unwrap();
        assert_eq!(ws.config_for(&uri), ProjectConfig::default());
    }

    #[test]
    fn adding_and_removing_a_folder_updates_the_folder_list() {
        let ws = workspace();
        let folder = WorkspaceFolder { uri: Url::parse("file:///workspace").unwrap(), name: "workspace".into() };
        ws.add_folder(folder.clone());
        assert_eq!(ws.folders(), vec![folder.uri.clone()]);
        ws.remove_folder(&folder.uri);
        assert!(ws.folders().is_empty());
    }
}
