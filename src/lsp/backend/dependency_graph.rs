//! Include/member dependency graph between Clarion source files
//!
//! # Architecture
//!
//! - **Forward edges**: `file A → files A names in INCLUDE/MEMBER/MODULE`
//! - **Reverse edges**: `file B → files that name B` (for invalidation)
//! - **Transitive closure**: BFS over reverse edges finds every file whose
//!   resolution results may change when B is edited
//!
//! Edges are refreshed per file from its directives whenever the file is
//! opened or changed, so a removed `INCLUDE` drops its edge.

use dashmap::{DashMap, DashSet};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Tracks which source files reference which
///
/// Uses DashMap for lock-free concurrent access from LSP handlers.
#[derive(Clone, Debug)]
pub struct DependencyGraph {
    /// Forward edges: file → files it references
    forward: Arc<DashMap<PathBuf, Arc<DashSet<PathBuf>>>>,

    /// Reverse edges: file → files that reference it
    reverse: Arc<DashMap<PathBuf, Arc<DashSet<PathBuf>>>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            forward: Arc::new(DashMap::new()),
            reverse: Arc::new(DashMap::new()),
        }
    }

    /// Add a dependency edge: `dependent → dependency`
    pub fn add_dependency(&self, dependent: PathBuf, dependency: PathBuf) {
        self.forward
            .entry(dependent.clone())
            .or_insert_with(|| Arc::new(DashSet::new()))
            .insert(dependency.clone());

        self.reverse
            .entry(dependency.clone())
            .or_insert_with(|| Arc::new(DashSet::new()))
            .insert(dependent.clone());

        debug!("Added dependency: {:?} → {:?}", dependent, dependency);
    }

    /// Replace the forward edges of `dependent`
    ///
    /// Reverse edges of files that no longer appear are dropped; edges
    /// pointing at `dependent` from other files are kept.
    pub fn set_dependencies(&self, dependent: &Path, dependencies: Vec<PathBuf>) {
        if let Some((_, old)) = self.forward.remove(dependent) {
            for dep in old.iter() {
                if let Some(reverse_deps) = self.reverse.get(dep.key()) {
                    reverse_deps.remove(dependent);
                }
            }
        }
        for dependency in dependencies {
            if dependency != dependent {
                self.add_dependency(dependent.to_path_buf(), dependency);
            }
        }
    }

    /// All files that depend on `file`, transitively
    ///
    /// The file itself is never part of the result, even on a cycle.
    pub fn get_dependents(&self, file: &Path) -> HashSet<PathBuf> {
        let mut dependents = HashSet::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        visited.insert(file.to_path_buf());
        queue.push_back(file.to_path_buf());

        while let Some(current) = queue.pop_front() {
            if let Some(direct_dependents) = self.reverse.get(&current) {
                for dep in direct_dependents.iter() {
                    let dep_path = dep.key().clone();
                    if visited.insert(dep_path.clone()) {
                        dependents.insert(dep_path.clone());
                        queue.push_back(dep_path);
                    }
                }
            }
        }

        debug!("Found {} transitive dependents for {:?}", dependents.len(), file);
        dependents
    }

    /// Direct dependencies of a file (non-transitive)
    pub fn get_dependencies(&self, file: &Path) -> HashSet<PathBuf> {
        self.forward
            .get(file)
            .map(|deps| deps.iter().map(|d| d.key().clone()).collect())
            .unwrap_or_default()
    }

    /// Remove every edge involving `file`
    pub fn remove_file(&self, file: &Path) {
        if let Some((_, deps)) = self.forward.remove(file) {
            for dep in deps.iter() {
                if let Some(reverse_deps) = self.reverse.get(dep.key()) {
                    reverse_deps.remove(file);
                }
            }
        }

        if let Some((_, dependents)) = self.reverse.remove(file) {
            for dependent in dependents.iter() {
                if let Some(forward_deps) = self.forward.get(dependent.key()) {
                    forward_deps.remove(file);
                }
            }
        }

        debug!("Removed file from dependency graph: {:?}", file);
    }

    pub fn has_dependencies(&self, file: &Path) -> bool {
        self.forward.get(file).is_some_and(|deps| !deps.is_empty())
    }

    pub fn has_dependents(&self, file: &Path) -> bool {
        self.reverse.get(file).is_some_and(|deps| !deps.is_empty())
    }

    /// Number of files that either reference or are referenced
    pub fn file_count(&self) -> usize {
        let mut files: HashSet<PathBuf> = self.forward.iter().map(|e| e.key().clone()).collect();
        files.extend(self.reverse.iter().map(|e| e.key().clone()));
        files.len()
    }

    pub fn edge_count(&self) -> usize {
        self.forward.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn clear(&self) {
        self.forward.clear();
        self.reverse.clear();
        debug!("Cleared dependency graph");
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty() && self.reverse.is_empty()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
