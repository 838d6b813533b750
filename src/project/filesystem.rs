//! Filesystem-backed source index
//!
//! Projects come from [`IndexConfig`]. A project without an explicit source
//! list gets every file under its root whose extension is one of the
//! configured source extensions, discovered with `walkdir`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::IndexConfig;

use super::{
    lookup_order, normalize_extension, normalize_path, resolve_candidates, Project, ProjectError, ProjectResult,
    SourceIndex, StaticProject,
};

#[derive(Debug, Clone)]
pub struct FsSourceIndex {
    projects: Vec<Arc<StaticProject>>,
    redirection_paths: Vec<PathBuf>,
    lookup_extensions: Vec<String>,
}

impl FsSourceIndex {
    pub fn from_config(config: &IndexConfig) -> ProjectResult<Self> {
        let source_extensions: Vec<String> =
            config.source_extensions.iter().map(|e| normalize_extension(e)).collect();

        let mut projects = Vec::with_capacity(config.projects.len());
        for project_config in &config.projects {
            if !project_config.root.is_dir() {
                return Err(ProjectError::MissingRoot {
                    name: project_config.name.clone(),
                    root: project_config.root.clone(),
                });
            }

            let mut project = StaticProject::new(&project_config.name, normalize_path(&project_config.root));
            let sources = match &project_config.source_files {
                Some(files) => files.clone(),
                None => discover_sources(&project_config.root, &source_extensions),
            };
            for source in sources {
                project = project.with_source(source);
            }
            for (extension, dirs) in &project_config.search_paths {
                for dir in dirs {
                    project = project.with_search_path(extension, dir.clone());
                }
            }
            debug!(
                "Project '{}' at {:?}: {} source files",
                project_config.name,
                project_config.root,
                project.source_files().len()
            );
            projects.push(Arc::new(project));
        }

        Ok(Self {
            projects,
            redirection_paths: config.redirection_paths.clone(),
            lookup_extensions: lookup_order(&config.lookup_extensions),
        })
    }

    pub fn projects(&self) -> impl Iterator<Item = &Arc<StaticProject>> {
        self.projects.iter()
    }
}

fn discover_sources(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| normalize_extension(&ext.to_string_lossy()))
                .is_some_and(|ext| extensions.contains(&ext))
        })
        .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    sources.sort();
    sources
}

impl SourceIndex for FsSourceIndex {
    fn read_file(&self, path: &Path) -> Option<String> {
        // Clarion sources are often Windows-1252; undecodable bytes become U+FFFD
        match fs::read(path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                debug!("Cannot read {:?}: {}", path, e);
                None
            }
        }
    }

    fn find_project_for_file(&self, path: &Path) -> Option<Arc<dyn Project>> {
        let found = self.projects.iter().find(|p| p.contains(path));
        if found.is_none() {
            warn!("No project contains {:?}", path);
        }
        found.map(|p| p.clone() as Arc<dyn Project>)
    }

    fn resolve_include_or_file(&self, name: &str, project: Option<&dyn Project>) -> Option<PathBuf> {
        resolve_candidates(name, project, &self.redirection_paths, Path::is_file)
    }

    fn lookup_extensions(&self) -> Vec<String> {
        self.lookup_extensions.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use std::collections::HashMap;

    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::create_dir_all(dir.path().join("app/sub")).expect("mkdir");
        fs::create_dir_all(dir.path().join("libsrc")).expect("mkdir");
        fs::write(dir.path().join("app/Main.clw"), "  PROGRAM\n").expect("write");
        fs::write(dir.path().join("app/sub/Mod1.clw"), "  MEMBER('Main.clw')\n").expect("write");
        fs::write(dir.path().join("app/Notes.txt"), "notes").expect("write");
        fs::write(dir.path().join("libsrc/Std.inc"), "StdVal EQUATE(1)\n").expect("write");
        dir
    }

    fn config(root: &Path) -> IndexConfig {
        IndexConfig {
            projects: vec![ProjectConfig {
                name: "App".to_string(),
                root: root.join("app"),
                source_files: None,
                search_paths: HashMap::new(),
            }],
            redirection_paths: vec![root.join("libsrc")],
            ..IndexConfig::default()
        }
    }

    #[test]
    fn test_discovers_sources_by_extension() {
        let dir = workspace();
        let index = FsSourceIndex::from_config(&config(dir.path())).expect("index");
        let project = index.projects().next().expect("project");
        let names: Vec<String> = project.source_files().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["Main.clw".to_string(), "Mod1.clw".to_string()]);
    }

    #[test]
    fn test_resolves_through_redirection() {
        let dir = workspace();
        let index = FsSourceIndex::from_config(&config(dir.path())).expect("index");
        let main = dir.path().join("app/Main.clw");
        let project = index.find_project_for_file(&main).expect("project");
        let resolved = index.resolve_include_or_file("Std.inc", Some(project.as_ref()));
        assert_eq!(resolved, Some(normalize_path(&dir.path().join("libsrc/Std.inc"))));
        assert!(index.read_file(&main).is_some());
        assert!(index.read_file(&dir.path().join("app/Missing.clw")).is_none());
    }

    #[test]
    fn test_lookup_extensions_follow_config() {
        let dir = workspace();
        let mut config = config(dir.path());
        config.lookup_extensions = vec!["INC".to_string(), ".clw".to_string(), ".inc".to_string()];
        let index = FsSourceIndex::from_config(&config).expect("index");
        assert_eq!(index.lookup_extensions(), vec![".inc".to_string(), ".clw".to_string()]);

        config.lookup_extensions.clear();
        let index = FsSourceIndex::from_config(&config).expect("index");
        assert_eq!(index.lookup_extensions().first().map(String::as_str), Some(".clw"));
    }

    #[test]
    fn test_reads_non_utf8_source() {
        let dir = workspace();
        let path = dir.path().join("app/Names.inc");
        // `Café` in Windows-1252
        fs::write(&path, b"Caf\xe9Label LONG\nCount LONG\n").expect("write");
        let index = FsSourceIndex::from_config(&config(dir.path())).expect("index");
        let text = index.read_file(&path).expect("lossy text");
        assert!(text.starts_with("Caf\u{fffd}Label LONG"));
        assert!(text.contains("Count LONG"));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = FsSourceIndex::from_config(&config(dir.path())).expect_err("missing root");
        assert!(matches!(err, ProjectError::MissingRoot { .. }));
    }
}
