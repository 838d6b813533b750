//! LSP protocol handler implementations
//!
//! - Lifecycle handlers (initialize, initialized, shutdown)
//! - Document lifecycle (did_open, did_change, did_close)
//! - Navigation (goto_definition, document_link)
//! - Outline (document_symbol, folding_range)

use std::time::Instant;

use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams, DocumentLink,
    DocumentLinkOptions, DocumentLinkParams, DocumentSymbolParams, DocumentSymbolResponse, FoldingRange,
    FoldingRangeParams, FoldingRangeProviderCapability, GotoDefinitionParams, GotoDefinitionResponse,
    InitializeParams, InitializeResult, InitializedParams, Location, MessageType, ServerCapabilities, ServerInfo,
    TextDocumentSyncCapability, TextDocumentSyncKind, Url,
};
use tower_lsp::{jsonrpc, LanguageServer};
use tracing::{debug, info, warn};

use crate::config::IndexConfig;

use super::state::ClarionBackend;

impl ClarionBackend {
    /// `initializationOptions`, then the startup configuration, then the workspace root
    fn config_for(&self, params: &InitializeParams) -> Option<IndexConfig> {
        if let Some(options) = params.initialization_options.clone() {
            match IndexConfig::from_json_value(options) {
                Ok(config) => return Some(config),
                Err(e) => warn!("Ignoring initializationOptions: {}", e),
            }
        }
        if let Some(config) = &self.startup_config {
            return Some(config.clone());
        }
        #[allow(deprecated)]
        let root = params.root_uri.as_ref().and_then(|uri| uri.to_file_path().ok());
        root.map(|root| IndexConfig::for_workspace_root(&root))
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for ClarionBackend {
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        info!("Received initialize: {:?}", params);

        match self.config_for(&params) {
            Some(config) => {
                if let Err(e) = self.workspace.configure(&config.with_env_redirections()) {
                    warn!("Failed to configure projects: {}", e);
                    self.client
                        .show_message(MessageType::WARNING, format!("Clarion projects not loaded: {}", e))
                        .await;
                }
            }
            None => info!("No workspace root or configuration; only open documents are indexed"),
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                definition_provider: Some(tower_lsp::lsp_types::OneOf::Left(true)),
                document_symbol_provider: Some(tower_lsp::lsp_types::OneOf::Left(true)),
                folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
                document_link_provider: Some(DocumentLinkOptions {
                    resolve_provider: Some(false),
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, params: InitializedParams) {
        info!("Initialized: {:?}", params);
        self.client
            .log_message(MessageType::INFO, "Clarion language server initialized")
            .await;
    }

    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Received shutdown request");
        let stats = self.workspace.cache_stats();
        info!(
            "Token cache: {} queries, {:.1}% hits, {} evictions",
            stats.total_queries,
            stats.hit_rate() * 100.0,
            stats.evictions
        );
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        info!(
            "Opening document: URI={}, version={}",
            params.text_document.uri, params.text_document.version
        );
        let doc = params.text_document;
        let document = self.workspace.open(doc.uri, doc.version, doc.text).await;
        debug!("Tokenized {:?}: {} tokens", document.path, document.stream.len());
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        debug!("textDocument/didChange: {} v{}", uri, version);

        // Full sync: the last change carries the whole buffer
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        if self.workspace.change(&uri, version, change.text).await.is_none() {
            warn!("Failed to find document with URI={}", uri);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        match self.workspace.close(&uri).await {
            Some(document) => info!("Closed document: {}, version: {}", uri, document.version),
            None => warn!("Failed to find document with URI={}", uri),
        }
    }

    async fn goto_definition(&self, params: GotoDefinitionParams) -> LspResult<Option<GotoDefinitionResponse>> {
        let start = Instant::now();
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let response = self.workspace.definition(&uri, position).await.and_then(|location| {
            let target = Url::from_file_path(&location.path).ok()?;
            Some(GotoDefinitionResponse::Scalar(Location {
                uri: target,
                range: location.range,
            }))
        });

        info!(
            "goto_definition completed in {:.3}ms ({})",
            start.elapsed().as_secs_f64() * 1000.0,
            if response.is_some() { "found" } else { "not found" }
        );
        Ok(response)
    }

    async fn document_symbol(&self, params: DocumentSymbolParams) -> LspResult<Option<DocumentSymbolResponse>> {
        let symbols = self.workspace.symbols(&params.text_document.uri).await;
        Ok(symbols.map(DocumentSymbolResponse::Nested))
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> LspResult<Option<Vec<FoldingRange>>> {
        Ok(self.workspace.folding(&params.text_document.uri).await)
    }

    async fn document_link(&self, params: DocumentLinkParams) -> LspResult<Option<Vec<DocumentLink>>> {
        Ok(self.workspace.links(&params.text_document.uri).await)
    }
}
