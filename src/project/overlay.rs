//! Open editor buffers layered over another index
//!
//! Definition lookups must see unsaved edits, so `read_file` and file
//! resolution consult the open buffers before the underlying index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use super::{normalize_path, Project, SourceIndex};

#[derive(Clone)]
pub struct OverlayIndex {
    base: Arc<dyn SourceIndex>,
    buffers: Arc<DashMap<PathBuf, Arc<str>>>,
}

impl OverlayIndex {
    pub fn new(base: Arc<dyn SourceIndex>) -> Self {
        Self {
            base,
            buffers: Arc::new(DashMap::new()),
        }
    }

    pub fn open(&self, path: &Path, text: impl Into<Arc<str>>) {
        self.buffers.insert(normalize_path(path), text.into());
    }

    pub fn close(&self, path: &Path) {
        self.buffers.remove(&normalize_path(path));
    }

    pub fn buffer(&self, path: &Path) -> Option<Arc<str>> {
        self.buffers.get(&normalize_path(path)).map(|entry| entry.value().clone())
    }

    pub fn open_paths(&self) -> Vec<PathBuf> {
        self.buffers.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Swaps the underlying index, keeping open buffers
    pub fn with_base(&self, base: Arc<dyn SourceIndex>) -> Self {
        Self {
            base,
            buffers: self.buffers.clone(),
        }
    }
}

impl SourceIndex for OverlayIndex {
    fn read_file(&self, path: &Path) -> Option<String> {
        self.buffer(path)
            .map(|text| text.to_string())
            .or_else(|| self.base.read_file(path))
    }

    fn find_project_for_file(&self, path: &Path) -> Option<Arc<dyn Project>> {
        self.base.find_project_for_file(path)
    }

    fn resolve_include_or_file(&self, name: &str, project: Option<&dyn Project>) -> Option<PathBuf> {
        self.base.resolve_include_or_file(name, project)
    }

    fn lookup_extensions(&self) -> Vec<String> {
        self.base.lookup_extensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::InMemoryIndex;

    #[test]
    fn test_buffer_shadows_base() {
        let base = Arc::new(InMemoryIndex::new().with_file("/app/Main.clw", "old"));
        let overlay = OverlayIndex::new(base);
        let path = Path::new("/app/Main.clw");
        assert_eq!(overlay.read_file(path).as_deref(), Some("old"));

        overlay.open(path, "new");
        assert_eq!(overlay.read_file(path).as_deref(), Some("new"));

        overlay.close(path);
        assert_eq!(overlay.read_file(path).as_deref(), Some("old"));
    }

    #[test]
    fn test_with_base_keeps_buffers() {
        let overlay = OverlayIndex::new(Arc::new(InMemoryIndex::new()));
        overlay.open(Path::new("/a.clw"), "text");
        let swapped = overlay.with_base(Arc::new(InMemoryIndex::new()));
        assert_eq!(swapped.open_paths(), vec![PathBuf::from("/a.clw")]);
    }
}
