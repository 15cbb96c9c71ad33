//! Entry point: CLI parsing, logging setup, and the `tower_lsp`
//! `LanguageServer` implementation wiring requests to `handlers`.

mod commands;
mod compose_xref;
mod config;
mod document;
mod handlers;
mod telemetry;
mod workspace;

use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use dls_core::manager::DocumentManager;
use dls_core::LanguageIdentifier;
use dls_imagecache::{HttpImageFetcher, ImageCache};
use lsp_types::*;
use tower_lsp::jsonrpc::Result as RpcResult;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::document::{AnalyzerParser, FsReader};
use crate::telemetry::TelemetryEvent;
use crate::workspace::Workspace;

const IMAGE_INTELLIGENCE_ENDPOINT: &str = "https://hub.docker.com/api/lsp/v1/images";

#[derive(Parser)]
#[command(name = "docker-language-server", version, about = "Language Server Protocol implementation for Dockerfile, Bake, and Compose files")]
struct Cli {
    /// Increase log verbosity to info. Repeatable.
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Increase log verbosity to debug. Repeatable.
    #[arg(long, action = clap::ArgAction::Count, global = true)]
    debug: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server.
    Start {
        #[arg(long)]
        stdio: bool,
        #[arg(long)]
        address: Option<String>,
    },
}

fn init_logging(verbose: u8, debug: u8) {
    let default_level = if debug > 0 {
        "debug"
    } else if verbose > 0 {
        "info"
    } else {
        "error"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

struct Backend {
    client: Client,
    workspace: Arc<Workspace>,
}

impl Backend {
    /// A panic in one request's handler must not take the whole
    /// connection down with it.
    fn guard<T>(&self, method: &'static str, f: impl FnOnce() -> T + std::panic::UnwindSafe, default: T) -> T {
        match std::panic::catch_unwind(f) {
            Ok(value) => value,
            Err(_) => {
                error!("panic handling {method}, returning empty result");
                default
            }
        }
    }

    async fn record_telemetry(&self, name: &str, started: Instant, outcome: &'static str) {
        self.workspace.telemetry.record(TelemetryEvent::new(name, started.elapsed(), outcome));
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> RpcResult<InitializeResult> {
        if let Some(capabilities) = params.capabilities.text_document.as_ref().and_then(|td| td.definition.as_ref()) {
            self.workspace
                .capabilities
                .location_link
                .store(capabilities.link_support.unwrap_or(false), Ordering::Relaxed);
        }
        if let Some(symbol) = params.capabilities.text_document.as_ref().and_then(|td| td.document_symbol.as_ref()) {
            self.workspace
                .capabilities
                .hierarchical_document_symbol
                .store(symbol.hierarchical_document_symbol_support.unwrap_or(false), Ordering::Relaxed);
        }
        self.workspace
            .capabilities
            .configuration
            .store(params.capabilities.workspace.as_ref().and_then(|w| w.configuration).unwrap_or(false), Ordering::Relaxed);

        let folders = params.workspace_folders.unwrap_or_default();
        self.workspace.set_folders(folders);

        let legend = SemanticTokensLegend {
            token_types: dls_bake::queries::symbols::TOKEN_TYPES
                .iter()
                .map(|t| SemanticTokenType::new(format!("{t:?}").to_ascii_lowercase().leak()))
                .collect(),
            token_modifiers: Vec::new(),
        };

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string(), "\"".to_string(), "$".to_string()]),
                    ..Default::default()
                }),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_highlight_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                document_link_provider: Some(DocumentLinkOptions { resolve_provider: Some(false), work_done_progress_options: Default::default() }),
                code_lens_provider: Some(CodeLensOptions { resolve_provider: Some(false) }),
                document_formatting_provider: Some(OneOf::Left(true)),
                rename_provider: Some(OneOf::Right(RenameOptions { prepare_provider: Some(true), work_done_progress_options: Default::default() })),
                inlay_hint_provider: Some(OneOf::Left(true)),
                semantic_tokens_provider: Some(SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
                    legend,
                    full: Some(SemanticTokensFullOptions::Bool(true)),
                    ..Default::default()
                })),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        commands::BAKE_BUILD.to_string(),
                        commands::BAKE_CHECK.to_string(),
                        commands::BAKE_PRINT.to_string(),
                        commands::APPLY_DIAGNOSTIC_FIX.to_string(),
                    ],
                    ..Default::default()
                }),
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities { supported: Some(true), change_notifications: Some(OneOf::Left(true)) }),
                    file_operations: None,
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo { name: "docker-language-server".to_string(), version: Some(env!("CARGO_PKG_VERSION").to_string()) }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("server initialized");
    }

    async fn shutdown(&self) -> RpcResult<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let Some(language) = handlers::language_for(&doc.language_id) else { return };
        self.workspace.documents.write(doc.uri.clone(), language, doc.version, doc.text);
        // First view of the document: nothing to debounce against yet.
        self.publish_diagnostics(doc.uri).await;
    }

    async fn did_change(&self, mut params: DidChangeTextDocumentParams) {
        let Some(change) = params.content_changes.pop() else { return };
        let uri = params.text_document.uri;
        self.workspace.documents.overwrite(uri.clone(), params.text_document.version, change.text);
        self.schedule_diagnostics(uri);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.workspace.documents.close(&uri);
        // Pending debounced work for a closed document becomes a no-op
        // rather than publishing stale diagnostics.
        self.workspace.documents.debouncer().remove(&uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.workspace.merge_configuration_all(&params.settings);
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        for removed in params.event.removed {
            self.workspace.remove_folder(&removed.uri);
        }
        for added in params.event.added {
            self.workspace.add_folder(added);
        }
    }

    async fn hover(&self, params: HoverParams) -> RpcResult<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let ws = Arc::clone(&self.workspace);
        Ok(self.guard("textDocument/hover", AssertUnwindSafe(move || handlers::hover(&ws, &uri, position)), None))
    }

    async fn completion(&self, params: CompletionParams) -> RpcResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let ws = Arc::clone(&self.workspace);
        let items = self.guard("textDocument/completion", AssertUnwindSafe(move || handlers::completion(&ws, &uri, position)), Vec::new());
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn goto_definition(&self, params: GotoDefinitionParams) -> RpcResult<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let ws = Arc::clone(&self.workspace);
        Ok(self.guard("textDocument/definition", AssertUnwindSafe(move || handlers::definition(&ws, &uri, position)), None))
    }

    async fn references(&self, params: ReferenceParams) -> RpcResult<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let include_declaration = params.context.include_declaration;
        let ws = Arc::clone(&self.workspace);
        let locations = self.guard(
            "textDocument/references",
            AssertUnwindSafe(move || handlers::references(&ws, &uri, position, include_declaration)),
            Vec::new(),
        );
        Ok(Some(locations))
    }

    async fn document_highlight(&self, params: DocumentHighlightParams) -> RpcResult<Option<Vec<DocumentHighlight>>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let ws = Arc::clone(&self.workspace);
        Ok(self.guard("textDocument/documentHighlight", AssertUnwindSafe(move || handlers::document_highlight(&ws, &uri, position)), None))
    }

    async fn document_symbol(&self, params: DocumentSymbolParams) -> RpcResult<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let ws = Arc::clone(&self.workspace);
        Ok(self.guard("textDocument/documentSymbol", AssertUnwindSafe(move || handlers::document_symbol(&ws, &uri)), None))
    }

    async fn document_link(&self, params: DocumentLinkParams) -> RpcResult<Option<Vec<DocumentLink>>> {
        let uri = params.text_document.uri;
        let ws = Arc::clone(&self.workspace);
        let links = self.guard("textDocument/documentLink", AssertUnwindSafe(move || handlers::document_link(&ws, &uri)), Vec::new());
        Ok(Some(links))
    }

    async fn code_lens(&self, params: CodeLensParams) -> RpcResult<Option<Vec<CodeLens>>> {
        let uri = params.text_document.uri;
        let ws = Arc::clone(&self.workspace);
        let lenses = self.guard("textDocument/codeLens", AssertUnwindSafe(move || handlers::code_lens(&ws, &uri)), Vec::new());
        Ok(Some(lenses))
    }

    async fn inlay_hint(&self, params: InlayHintParams) -> RpcResult<Option<Vec<InlayHint>>> {
        let uri = params.text_document.uri;
        let range = params.range;
        let ws = Arc::clone(&self.workspace);
        let hints = self.guard("textDocument/inlayHint", AssertUnwindSafe(move || handlers::inlay_hint(&ws, &uri, range)), Vec::new());
        Ok(Some(hints))
    }

    async fn semantic_tokens_full(&self, params: SemanticTokensParams) -> RpcResult<Option<SemanticTokensResult>> {
        let uri = params.text_document.uri;
        let ws = Arc::clone(&self.workspace);
        Ok(self.guard("textDocument/semanticTokens/full", AssertUnwindSafe(move || handlers::semantic_tokens_full(&ws, &uri)), None))
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> RpcResult<Option<Vec<TextEdit>>> {
        let uri = params.text_document.uri;
        let options = params.options;
        let ws = Arc::clone(&self.workspace);
        Ok(self.guard("textDocument/formatting", AssertUnwindSafe(move || handlers::formatting(&ws, &uri, &options)), None))
    }

    async fn prepare_rename(&self, params: TextDocumentPositionParams) -> RpcResult<Option<PrepareRenameResponse>> {
        let uri = params.text_document.uri;
        let position = params.position;
        let ws = Arc::clone(&self.workspace);
        let range = self.guard("textDocument/prepareRename", AssertUnwindSafe(move || handlers::prepare_rename(&ws, &uri, position)), None);
        Ok(range.map(PrepareRenameResponse::Range))
    }

    async fn rename(&self, params: RenameParams) -> RpcResult<Option<WorkspaceEdit>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let new_name = params.new_name;
        let ws = Arc::clone(&self.workspace);
        Ok(self.guard("textDocument/rename", AssertUnwindSafe(move || handlers::rename(&ws, &uri, position, &new_name)), None))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> RpcResult<Option<serde_json::Value>> {
        match params.command.as_str() {
            commands::APPLY_DIAGNOSTIC_FIX => {
                let Some(Value::Object(args)) = params.arguments.first().map(|v| v.to_owned()) else { return Ok(None) };
                let uri = args.get("uri").and_then(|v| v.as_str()).and_then(|s| Url::parse(s).ok());
                let target = args.get("target").and_then(|v| v.as_str()).map(str::to_string);
                let (Some(uri), Some(target)) = (uri, target) else { return Ok(None) };
                if let Some(edit) = commands::apply_diagnostic_fix(&self.workspace, &uri, &target) {
                    let _ = self.client.apply_edit(edit).await;
                }
                Ok(None)
            }
            _ => Ok(commands::bake_build_arguments(&params).cloned()),
        }
    }
}

use serde_json::Value;

impl Backend {
    async fn publish_diagnostics(&self, uri: Url) {
        let started = Instant::now();
        let version = self.workspace.documents.version(&uri).ok();
        let diagnostics = handlers::diagnostics(&self.workspace, &uri).await;
        self.client.publish_diagnostics(uri, diagnostics, version).await;
        self.record_telemetry("textDocument/publishDiagnostics", started, "ok").await;
    }

    /// Queues diagnostics for `uri` behind the per-URI debounce slot.
    /// Diagnostics are pushed back asynchronously after the debounced
    /// work settles. A later `did_change` for the same URI replaces
    /// this closure before it ever runs.
    fn schedule_diagnostics(&self, uri: Url) {
        let client = self.client.clone();
        let workspace = Arc::clone(&self.workspace);
        workspace.documents.debouncer().queue(uri.clone(), move || {
            Box::pin(async move {
                let started = Instant::now();
                let version = workspace.documents.version(&uri).ok();
                let diagnostics = handlers::diagnostics(&workspace, &uri).await;
                client.publish_diagnostics(uri, diagnostics, version).await;
                workspace.telemetry.record(TelemetryEvent::new("textDocument/publishDiagnostics", started.elapsed(), "ok"));
            })
        });
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    let Commands::Start { stdio, address } = cli.command;

    let documents = DocumentManager::new(Arc::new(AnalyzerParser), Arc::new(FsReader));
    let images = ImageCache::new(Arc::new(HttpImageFetcher::new(IMAGE_INTELLIGENCE_ENDPOINT)));
    let telemetry_sink = std::env::var("DOCKER_LANGUAGE_SERVER_TELEMETRY_FILE").ok().map(std::path::PathBuf::from);
    let workspace = Arc::new(Workspace::new(documents, images, crate::telemetry::TelemetryCollector::new(telemetry_sink)));

    let (service, socket) = LspService::new(|client| Backend { client, workspace: Arc::clone(&workspace) });

    if let Some(address) = address {
        let listener = match tokio::net::TcpListener::bind(&address).await {
            Ok(listener) => listener,
            Err(err) => {
                error!("failed to bind {address}: {err}");
                std::process::exit(1);
            }
        };
        let (stream, _) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                error!("failed to accept connection on {address}: {err}");
                std::process::exit(1);
            }
        };
        let (read, write) = tokio::io::split(stream);
        Server::new(read, write, socket).serve(service).await;
    } else if stdio {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        Server::new(stdin, stdout, socket).serve(service).await;
    } else {
        error!("one of --stdio or --address must be given");
        std::process::exit(2);
    }
}
