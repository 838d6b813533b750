//! Index configuration
//!
//! Describes the projects of a workspace, where their sources live and how
//! file names are resolved. Loaded from a JSON file passed with `--config`,
//! replaced by the client's `initializationOptions` when present, and
//! otherwise derived from the workspace root.
//!
//! ```json
//! {
//!   "projects": [
//!     {
//!       "name": "Invoice",
//!       "root": "C:/Apps/Invoice",
//!       "sourceFiles": ["Invoice.clw", "Invoi001.clw"],
//!       "searchPaths": { ".inc": ["C:/Clarion/LibSrc"], "*": ["C:/Apps/Shared"] }
//!     }
//!   ],
//!   "redirectionPaths": ["C:/Clarion/LibSrc/win"],
//!   "lookupExtensions": [".clw", ".inc", ".equ", ".eq", ".int"]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Extensions tried, in order, when a file is referenced without one
pub const DEFAULT_EXTENSIONS: &[&str] = &[".clw", ".inc", ".equ", ".eq", ".int"];

/// Extensions of compiled project sources
pub const DEFAULT_SOURCE_EXTENSIONS: &[&str] = &[".clw"];

/// Platform path list appended to `redirectionPaths`
pub const REDIRECTION_ENV_VAR: &str = "CLARION_REDIRECTION_PATHS";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in '{origin}': {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexConfig {
    pub projects: Vec<ProjectConfig>,
    pub redirection_paths: Vec<PathBuf>,
    pub lookup_extensions: Vec<String>,
    pub source_extensions: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            redirection_paths: Vec::new(),
            lookup_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            source_extensions: DEFAULT_SOURCE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub name: String,
    pub root: PathBuf,
    /// Explicit source list, relative to `root`. Discovered on disk when absent.
    #[serde(default)]
    pub source_files: Option<Vec<PathBuf>>,
    /// Directories keyed by extension (`".inc"`), `"*"` applies to all
    #[serde(default)]
    pub search_paths: HashMap<String, Vec<PathBuf>>,
}

impl IndexConfig {
    /// Reads a JSON configuration file. Relative paths inside it are taken
    /// relative to the file's directory.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        debug!("Loaded configuration from {:?}: {} projects", path, config.projects.len());
        Ok(config)
    }

    /// Parses LSP `initializationOptions`
    pub fn from_json_value(value: serde_json::Value) -> ConfigResult<Self> {
        serde_json::from_value(value).map_err(|source| ConfigError::Parse {
            origin: "initializationOptions".to_string(),
            source,
        })
    }

    /// A single project rooted at `root` whose sources are discovered on disk
    pub fn for_workspace_root(root: &Path) -> Self {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workspace".to_string());
        Self {
            projects: vec![ProjectConfig {
                name,
                root: root.to_path_buf(),
                source_files: None,
                search_paths: HashMap::new(),
            }],
            ..Self::default()
        }
    }

    /// Appends the directories listed in `CLARION_REDIRECTION_PATHS`.
    pub fn with_env_redirections(mut self) -> Self {
        if let Some(value) = std::env::var_os(REDIRECTION_ENV_VAR) {
            self.redirection_paths.extend(std::env::split_paths(&value));
        }
        self
    }

    /// Makes every relative root, search path and redirection path absolute
    /// against `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let absolutize = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for project in &mut self.projects {
            absolutize(&mut project.root);
            for dirs in project.search_paths.values_mut() {
                dirs.iter_mut().for_each(absolutize);
            }
        }
        self.redirection_paths.iter_mut().for_each(absolutize);
    }
}
