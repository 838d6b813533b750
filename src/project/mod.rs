//! Project source index
//!
//! The resolution engine never touches the filesystem directly. Everything it
//! needs about files and projects goes through [`SourceIndex`]:
//!
//! - `read_file`: file contents, `None` when missing or unreadable
//! - `find_project_for_file`: the project a file belongs to
//! - `resolve_include_or_file`: search-path and redirection lookup of a
//!   file name
//!
//! and [`Project`] (enumerated sources and extension-keyed search paths).
//!
//! Implementations:
//! - [`InMemoryIndex`]: fixed file set, used by tests and embedding hosts
//! - [`FsSourceIndex`]: the real filesystem, built from [`IndexConfig`](crate::config::IndexConfig)
//! - [`OverlayIndex`]: open editor buffers layered over another index

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

pub mod filesystem;
pub mod memory;
pub mod overlay;

pub use filesystem::FsSourceIndex;
pub use memory::InMemoryIndex;
pub use overlay::OverlayIndex;

/// Extensions that mark a word as a file name. Also the lookup order for a
/// file referenced without an extension when the index configures none.
pub const FILE_EXTENSIONS: &[&str] = &[".clw", ".inc", ".txa", ".tpl", ".tpw", ".trn", ".int", ".equ", ".def"];

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Project '{name}' root does not exist: {}", root.display())]
    MissingRoot { name: String, root: PathBuf },
}

/// A source file of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File name with extension (`Invoi001.clw`)
    pub name: String,
    /// Path relative to the project root
    pub relative_path: PathBuf,
}

pub trait Project: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn root(&self) -> &Path;

    fn source_files(&self) -> Vec<SourceFile>;

    /// Directories to search for files with `extension` (`".inc"`)
    fn search_paths(&self, extension: &str) -> Vec<PathBuf>;

    fn contains(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        path.starts_with(normalize_path(self.root()))
            || self
                .source_files()
                .iter()
                .any(|f| normalize_path(&self.root().join(&f.relative_path)) == path)
    }
}

pub trait SourceIndex: Send + Sync {
    fn read_file(&self, path: &Path) -> Option<String>;

    fn find_project_for_file(&self, path: &Path) -> Option<Arc<dyn Project>>;

    /// Resolves a file name through the project's search paths, then the
    /// redirection paths. Returns an absolute path of an existing file.
    fn resolve_include_or_file(&self, name: &str, project: Option<&dyn Project>) -> Option<PathBuf>;

    /// Extensions tried, in order, for a file referenced without one
    fn lookup_extensions(&self) -> Vec<String> {
        FILE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    }
}

/// Project with a fixed source list and search-path table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticProject {
    name: String,
    root: PathBuf,
    sources: Vec<SourceFile>,
    search_paths: HashMap<String, Vec<PathBuf>>,
}

impl StaticProject {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            sources: Vec::new(),
            search_paths: HashMap::new(),
        }
    }

    pub fn with_source(mut self, relative_path: impl Into<PathBuf>) -> Self {
        let relative_path = relative_path.into();
        let name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.sources.push(SourceFile { name, relative_path });
        self
    }

    /// Adds a search directory for `extension`; `"*"` applies to every extension.
    pub fn with_search_path(mut self, extension: &str, dir: impl Into<PathBuf>) -> Self {
        self.search_paths
            .entry(normalize_extension(extension))
            .or_default()
            .push(dir.into());
        self
    }
}

impl Project for StaticProject {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn source_files(&self) -> Vec<SourceFile> {
        self.sources.clone()
    }

    fn search_paths(&self, extension: &str) -> Vec<PathBuf> {
        let key = normalize_extension(extension);
        let mut dirs = self.search_paths.get(&key).cloned().unwrap_or_default();
        if key != "*" {
            dirs.extend(self.search_paths.get("*").cloned().unwrap_or_default());
        }
        dirs
    }
}

/// `"INC"`, `"inc"` and `".inc"` all become `".inc"`
pub fn normalize_extension(extension: &str) -> String {
    let lower = extension.trim().to_ascii_lowercase();
    if lower == "*" || lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// Normalizes a configured extension list, falling back to [`FILE_EXTENSIONS`]
/// when it is empty.
pub(crate) fn lookup_order(extensions: &[String]) -> Vec<String> {
    let mut order: Vec<String> = Vec::with_capacity(extensions.len());
    for extension in extensions.iter().map(|e| normalize_extension(e)) {
        if extension != "*" && extension != "." && !order.contains(&extension) {
            order.push(extension);
        }
    }
    if order.is_empty() {
        order = FILE_EXTENSIONS.iter().map(|e| e.to_string()).collect();
    }
    order
}

/// Extension of a file name including the dot, lowercased
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
}

/// Lexically normalizes a path: drops `.` components and folds `..`.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Shared lookup order of `resolve_include_or_file`: an absolute name as is,
/// then the project's search paths for the extension, the project root, and
/// finally the redirection paths.
pub(crate) fn resolve_candidates(
    name: &str,
    project: Option<&dyn Project>,
    redirection_paths: &[PathBuf],
    exists: impl Fn(&Path) -> bool,
) -> Option<PathBuf> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let as_path = Path::new(name);
    if as_path.is_absolute() {
        let path = normalize_path(as_path);
        return exists(&path).then_some(path);
    }

    let extension = extension_of(name).unwrap_or_else(|| "*".to_string());
    let mut dirs: Vec<PathBuf> = Vec::new();
    if let Some(project) = project {
        dirs.extend(project.search_paths(&extension));
        dirs.push(project.root().to_path_buf());
    }
    dirs.extend(redirection_paths.iter().cloned());

    dirs.into_iter()
        .map(|dir| normalize_path(&dir.join(as_path)))
        .find(|candidate| exists(candidate))
}

/// Resolves a file named by a directive in `from`: the index's search and
/// redirection lookup first, then the directory of `from`.
pub fn resolve_reference(
    index: &dyn SourceIndex,
    name: &str,
    from: &Path,
    project: Option<&dyn Project>,
) -> Option<PathBuf> {
    if let Some(path) = index.resolve_include_or_file(name, project) {
        return Some(path);
    }
    let sibling = normalize_path(&from.parent()?.join(name.trim()));
    index.read_file(&sibling).map(|_| sibling)
}
