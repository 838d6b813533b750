//! In-memory source index

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{lookup_order, normalize_path, resolve_candidates, Project, SourceIndex, StaticProject};

/// Source index over a fixed set of files held in memory
#[derive(Debug, Default, Clone)]
pub struct InMemoryIndex {
    files: HashMap<PathBuf, String>,
    projects: Vec<Arc<StaticProject>>,
    redirection_paths: Vec<PathBuf>,
    lookup_extensions: Option<Vec<String>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert_file(path, text);
        self
    }

    pub fn insert_file(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files.insert(normalize_path(path.as_ref()), text.into());
    }

    pub fn with_project(mut self, project: StaticProject) -> Self {
        self.projects.push(Arc::new(project));
        self
    }

    pub fn with_redirection_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.redirection_paths.push(dir.into());
        self
    }

    pub fn with_lookup_extensions(mut self, extensions: &[&str]) -> Self {
        let extensions: Vec<String> = extensions.iter().map(|e| e.to_string()).collect();
        self.lookup_extensions = Some(lookup_order(&extensions));
        self
    }

    /// Looks a path up exactly, then ignoring ASCII case.
    fn lookup(&self, path: &Path) -> Option<(&PathBuf, &String)> {
        let path = normalize_path(path);
        self.files.get_key_value(&path).or_else(|| {
            let wanted = path.to_string_lossy().to_ascii_lowercase();
            self.files
                .iter()
                .find(|(candidate, _)| candidate.to_string_lossy().to_ascii_lowercase() == wanted)
        })
    }
}

impl SourceIndex for InMemoryIndex {
    fn read_file(&self, path: &Path) -> Option<String> {
        self.lookup(path).map(|(_, text)| text.clone())
    }

    fn find_project_for_file(&self, path: &Path) -> Option<Arc<dyn Project>> {
        self.projects
            .iter()
            .find(|p| p.contains(path))
            .map(|p| p.clone() as Arc<dyn Project>)
    }

    fn resolve_include_or_file(&self, name: &str, project: Option<&dyn Project>) -> Option<PathBuf> {
        resolve_candidates(name, project, &self.redirection_paths, |p| self.lookup(p).is_some())
            .and_then(|p| self.lookup(&p).map(|(stored, _)| stored.clone()))
    }

    fn lookup_extensions(&self) -> Vec<String> {
        match &self.lookup_extensions {
            Some(extensions) => extensions.clone(),
            None => lookup_order(&[]),
        }
    }
}
