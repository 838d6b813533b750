//! Backend state
//!
//! `ClarionBackend` pairs the LSP client with the shared [`Workspace`] and
//! the configuration given on the command line.

use std::sync::Arc;

use tower_lsp::Client;

use crate::config::IndexConfig;

use super::workspace::Workspace;

/// The Clarion language server backend, managing state and handling LSP requests.
#[derive(Clone)]
pub struct ClarionBackend {
    pub(super) client: Client,
    pub(super) workspace: Arc<Workspace>,
    /// Configuration from `--config`/`--root`; `initializationOptions` take precedence
    pub(super) startup_config: Option<IndexConfig>,
}

impl ClarionBackend {
    pub fn new(client: Client, workspace: Arc<Workspace>, startup_config: Option<IndexConfig>) -> Self {
        Self {
            client,
            workspace,
            startup_config,
        }
    }

    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }
}

// Manual Debug implementation since Client doesn't implement Debug
impl std::fmt::Debug for ClarionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClarionBackend")
            .field("workspace", &self.workspace)
            .field("startup_config", &self.startup_config.is_some())
            .finish()
    }
}
