//! Open documents, the layered source index and the dependency graph
//!
//! Kept apart from the `tower_lsp::Client` so the request logic can be
//! driven directly from tests.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::lsp_types::{DocumentLink, DocumentSymbol, FoldingRange, Position, Url};
use tracing::{debug, error, info};

use crate::config::IndexConfig;
use crate::document_cache::{CacheStats, TokenCache};
use crate::ir::directives::extract_directives;
use crate::ir::symbol_resolution::{DefinitionResolver, Location, ResolutionRequest};
use crate::ir::token_stream::TokenStream;
use crate::lsp::features::{document_links, document_symbols, folding_ranges};
use crate::project::{normalize_path, resolve_reference, FsSourceIndex, OverlayIndex, ProjectResult, SourceIndex};

use super::dependency_graph::DependencyGraph;

/// An editor buffer and its token stream
#[derive(Debug)]
pub struct OpenDocument {
    pub uri: Url,
    pub path: PathBuf,
    pub version: i32,
    pub text: Arc<str>,
    pub stream: Arc<TokenStream>,
}

pub struct Workspace {
    documents: RwLock<HashMap<Url, Arc<OpenDocument>>>,
    overlay: parking_lot::RwLock<OverlayIndex>,
    cache: Arc<TokenCache>,
    graph: DependencyGraph,
}

impl Workspace {
    pub fn new(base: Arc<dyn SourceIndex>) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            overlay: parking_lot::RwLock::new(OverlayIndex::new(base)),
            cache: Arc::new(TokenCache::new()),
            graph: DependencyGraph::new(),
        }
    }

    /// Rebuilds the filesystem index from `config`; open buffers survive.
    pub fn configure(&self, config: &IndexConfig) -> ProjectResult<()> {
        let index = FsSourceIndex::from_config(config)?;
        info!(
            "Configured {} projects, {} redirection paths",
            index.projects().count(),
            config.redirection_paths.len()
        );
        self.set_index(Arc::new(index));
        Ok(())
    }

    pub fn set_index(&self, base: Arc<dyn SourceIndex>) {
        let mut overlay = self.overlay.write();
        *overlay = overlay.with_base(base);
    }

    fn index(&self) -> Arc<dyn SourceIndex> {
        Arc::new(self.overlay.read().clone())
    }

    pub async fn open(&self, uri: Url, version: i32, text: String) -> Arc<OpenDocument> {
        let path = path_of(&uri);
        let text: Arc<str> = Arc::from(text);
        self.overlay.read().open(&path, text.clone());
        let stream = self.cache.get_or_tokenize(&path, &text);
        let document = Arc::new(OpenDocument {
            uri: uri.clone(),
            path,
            version,
            text,
            stream,
        });
        self.refresh_dependencies(&document);
        self.documents.write().await.insert(uri, document.clone());
        document
    }

    /// Replaces the buffer of an open document. `None` when it is not open.
    pub async fn change(&self, uri: &Url, version: i32, text: String) -> Option<Arc<OpenDocument>> {
        if !self.documents.read().await.contains_key(uri) {
            return None;
        }
        Some(self.open(uri.clone(), version, text).await)
    }

    pub async fn close(&self, uri: &Url) -> Option<Arc<OpenDocument>> {
        let document = self.documents.write().await.remove(uri)?;
        self.overlay.read().close(&document.path);
        self.cache.remove(&document.path);
        Some(document)
    }

    pub async fn document(&self, uri: &Url) -> Option<Arc<OpenDocument>> {
        self.documents.read().await.get(uri).cloned()
    }

    /// Runs the definition chain off the async runtime
    pub async fn definition(&self, uri: &Url, position: Position) -> Option<Location> {
        let document = self.document(uri).await?;
        let resolver = DefinitionResolver::new(self.index(), self.cache.clone());
        let request = ResolutionRequest::new(document.path.clone(), position.line, position.character);
        match tokio::task::spawn_blocking(move || resolver.resolve_definition(&document.stream, &request)).await {
            Ok(location) => location,
            Err(e) => {
                error!("Definition task failed: {}", e);
                None
            }
        }
    }

    pub async fn symbols(&self, uri: &Url) -> Option<Vec<DocumentSymbol>> {
        let document = self.document(uri).await?;
        Some(document_symbols(&document.stream))
    }

    pub async fn folding(&self, uri: &Url) -> Option<Vec<FoldingRange>> {
        let document = self.document(uri).await?;
        Some(folding_ranges(&document.stream))
    }

    pub async fn links(&self, uri: &Url) -> Option<Vec<DocumentLink>> {
        let document = self.document(uri).await?;
        let index = self.index();
        Some(document_links(&document.stream, &document.path, index.as_ref(), &self.cache))
    }

    /// Files whose definitions may change when `uri` changes
    pub fn dependents(&self, uri: &Url) -> HashSet<PathBuf> {
        self.graph.get_dependents(&path_of(uri))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn refresh_dependencies(&self, document: &OpenDocument) {
        let index = self.index();
        let project = index.find_project_for_file(&document.path);
        let targets: Vec<PathBuf> = extract_directives(&document.stream)
            .into_iter()
            .filter_map(|d| resolve_reference(index.as_ref(), &d.file, &document.path, project.as_deref()))
            .collect();
        debug!("{:?} references {} files", document.path, targets.len());
        self.graph.set_dependencies(&document.path, targets);
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("graph", &self.graph)
            .field("cache", &self.cache.stats())
            .finish()
    }
}

fn path_of(uri: &Url) -> PathBuf {
    normalize_path(&uri.to_file_path().unwrap_or_else(|_| PathBuf::from(uri.path())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::InMemoryIndex;
    use indoc::indoc;

    fn uri(path: &str) -> Url {
        Url::from_file_path(path).expect("absolute path")
    }

    fn workspace() -> Workspace {
        let index = InMemoryIndex::new().with_file(
            "/app/Keys.inc",
            indoc! {"
                KeyEsc EQUATE(27)
            "},
        );
        Workspace::new(Arc::new(index))
    }

    #[tokio::test]
    async fn test_definition_sees_included_file() {
        let ws = workspace();
        let main = uri("/app/Main.clw");
        ws.open(main.clone(), 1, "  INCLUDE('Keys.inc')\n  CODE\n  x = KeyEsc\n".to_string())
            .await;

        let location = ws.definition(&main, Position::new(2, 7)).await.expect("definition");
        assert_eq!(location.path, PathBuf::from("/app/Keys.inc"));
        assert_eq!(location.range.start.line, 0);

        assert!(ws.dependents(&uri("/app/Keys.inc")).contains(&PathBuf::from("/app/Main.clw")));
    }

    #[tokio::test]
    async fn test_unsaved_buffer_shadows_index() {
        let ws = workspace();
        let keys = uri("/app/Keys.inc");
        let main = uri("/app/Main.clw");
        ws.open(keys.clone(), 1, "\nKeyEnter EQUATE(13)\n".to_string()).await;
        ws.open(main.clone(), 1, "  INCLUDE('Keys.inc')\n  CODE\n  x = KeyEnter\n".to_string())
            .await;

        let location = ws.definition(&main, Position::new(2, 6)).await.expect("definition");
        assert_eq!(location.range.start.line, 1);

        ws.close(&keys).await;
        assert_eq!(ws.definition(&main, Position::new(2, 6)).await, None);
    }

    #[tokio::test]
    async fn test_change_requires_open_document() {
        let ws = workspace();
        let main = uri("/app/Main.clw");
        assert!(ws.change(&main, 2, String::new()).await.is_none());

        ws.open(main.clone(), 1, "  INCLUDE('Keys.inc')\n".to_string()).await;
        let changed = ws.change(&main, 2, "Main PROCEDURE\n  CODE\n".to_string()).await.expect("open");
        assert_eq!(changed.version, 2);
        assert!(ws.dependents(&uri("/app/Keys.inc")).is_empty());
        assert_eq!(ws.symbols(&main).await.map(|s| s.len()), Some(1));
        assert_eq!(ws.folding(&main).await.map(|f| f.len()), Some(1));
    }
}
