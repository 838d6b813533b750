//! Definition resolution
//!
//! Given an enriched [`TokenStream`] and a cursor, finds the single location
//! where the identifier under the cursor is declared. Resolution is a strict
//! short-circuiting chain of [`SymbolResolver`] stages; the first stage that
//! yields a location wins.
//!
//! # Architecture
//!
//! ```text
//! ResolutionRequest (path, position)
//!     ↓ word_at
//! ResolutionContext ──────────────────────────────────────────────┐
//!     ↓                                                           │
//! 1. StructureFieldResolver    Queue.Field / Pre:Field            │
//! 2. LocalLabelResolver        column-0 labels, innermost scope   │ TokenCache
//! 3. StructureDeclResolver     structure owner labels             │ SourceIndex
//! 4. LexicalScopeResolver      scope chain → project files →      │
//!                              <word>.clw → IncludeSearch →       │
//!                              procedure/routine/method openers   │
//! 5. FileReferenceResolver     'Keys.inc' → start of file         │
//!     ↓                                                           │
//! Option<Location> ◄──────────────────────────────────────────────┘
//! ```
//!
//! Stages read other files only through [`SourceIndex`]; token streams of
//! those files come from the shared [`TokenCache`]. A [`VisitedSet`] scoped
//! to one top-level request stops cycles through mutually including files.
//! Missing files and projects degrade a stage to "no match".

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tower_lsp::lsp_types::{Position, Range};
use tracing::debug;

use crate::document_cache::TokenCache;
use crate::ir::token::{Token, TokenId, TokenKind};
use crate::ir::token_stream::TokenStream;
use crate::project::{normalize_path, resolve_reference, Project, SourceIndex};

pub mod file_reference;
pub mod global;
pub mod includes;
pub mod lexical_scope;
pub mod local;
pub mod structure_field;
pub mod word;

pub use file_reference::FileReferenceResolver;
pub use includes::IncludeSearch;
pub use lexical_scope::LexicalScopeResolver;
pub use local::{LocalLabelResolver, StructureDeclResolver};
pub use structure_field::StructureFieldResolver;
pub use word::{file_word_at, word_at, Word};

/// Definition location: a file and the range of the defining token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub range: Range,
}

impl Location {
    pub fn of_token(path: &Path, token: &Token) -> Self {
        Self {
            path: path.to_path_buf(),
            range: Range {
                start: Position {
                    line: token.line as u32,
                    character: token.column as u32,
                },
                end: Position {
                    line: token.line as u32,
                    character: token.end_column() as u32,
                },
            },
        }
    }

    /// Start of a file (0:0)
    pub fn file_start(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            range: Range::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    /// Path of the file the stream was produced from
    pub path: PathBuf,
    pub position: Position,
}

impl ResolutionRequest {
    pub fn new(path: impl Into<PathBuf>, line: u32, character: u32) -> Self {
        Self {
            path: path.into(),
            position: Position { line, character },
        }
    }
}

/// Files already searched during one top-level request
#[derive(Debug, Default, Clone)]
pub struct VisitedSet {
    paths: HashSet<PathBuf>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when `path` was already visited
    pub fn insert(&mut self, path: &Path) -> bool {
        self.paths.insert(normalize_path(path))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(&normalize_path(path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Everything a stage needs to know about one request
pub struct ResolutionContext<'a> {
    pub stream: &'a TokenStream,
    pub path: &'a Path,
    pub line: usize,
    pub character: usize,
    pub word: Word,
    pub project: Option<Arc<dyn Project>>,
    pub index: &'a dyn SourceIndex,
    pub cache: &'a TokenCache,
}

impl ResolutionContext<'_> {
    pub fn project(&self) -> Option<&dyn Project> {
        self.project.as_deref()
    }

    /// Innermost procedure, routine or method scope around the cursor
    pub fn innermost_scope(&self) -> Option<&Token> {
        self.stream
            .innermost_scope_at(self.line)
            .and_then(|id| self.stream.get(id))
    }

    /// Token stream of another file, read through the index and cache
    pub fn stream_for(&self, path: &Path) -> Option<Arc<TokenStream>> {
        let text = self.index.read_file(path)?;
        Some(self.cache.get_or_tokenize(path, &text))
    }

    /// Resolves a referenced file name: search paths and redirection first,
    /// then next to the referencing file.
    pub fn resolve_file(&self, name: &str, from: &Path, project: Option<&dyn Project>) -> Option<PathBuf> {
        resolve_reference(self.index, name, from, project)
    }

    pub fn is_origin(&self, path: &Path) -> bool {
        normalize_path(path) == normalize_path(self.path)
    }
}

/// Column-0 labels whose text matches `name`, in file order
pub fn column_zero_labels<'s>(stream: &'s TokenStream, name: &'s str) -> impl Iterator<Item = (TokenId, &'s Token)> {
    stream
        .iter()
        .filter(move |(_, t)| t.kind == TokenKind::Label && t.column == 0 && t.text_eq(name))
}

/// One stage of the definition chain
pub trait SymbolResolver: Send + Sync {
    fn resolve_symbol(&self, ctx: &ResolutionContext<'_>, visited: &mut VisitedSet) -> Option<Location>;

    fn name(&self) -> &'static str;
}

/// Runs the resolution chain against a source index
pub struct DefinitionResolver {
    index: Arc<dyn SourceIndex>,
    cache: Arc<TokenCache>,
    stages: Vec<Box<dyn SymbolResolver>>,
}

impl DefinitionResolver {
    pub fn new(index: Arc<dyn SourceIndex>, cache: Arc<TokenCache>) -> Self {
        Self {
            index,
            cache,
            stages: vec![
                Box::new(StructureFieldResolver),
                Box::new(LocalLabelResolver),
                Box::new(StructureDeclResolver),
                Box::new(LexicalScopeResolver::new()),
                Box::new(FileReferenceResolver),
            ],
        }
    }

    pub fn index(&self) -> &Arc<dyn SourceIndex> {
        &self.index
    }

    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    pub fn resolve_definition(&self, stream: &TokenStream, request: &ResolutionRequest) -> Option<Location> {
        let mut visited = VisitedSet::new();
        self.resolve_definition_with_visited(stream, request, &mut visited)
    }

    /// Like [`resolve_definition`](Self::resolve_definition), sharing the
    /// caller's visited set.
    pub fn resolve_definition_with_visited(
        &self,
        stream: &TokenStream,
        request: &ResolutionRequest,
        visited: &mut VisitedSet,
    ) -> Option<Location> {
        let line = request.position.line as usize;
        let character = request.position.character as usize;

        let Some(word) = word_at(stream, line, character) else {
            debug!("No word at {}:{} in {:?}", line, character, request.path);
            return None;
        };

        let ctx = ResolutionContext {
            stream,
            path: &request.path,
            line,
            character,
            project: self.index.find_project_for_file(&request.path),
            word,
            index: self.index.as_ref(),
            cache: self.cache.as_ref(),
        };

        for stage in &self.stages {
            if let Some(location) = stage.resolve_symbol(&ctx, visited) {
                debug!(
                    "{}: '{}' -> {:?} {}:{}",
                    stage.name(),
                    ctx.word.text,
                    location.path,
                    location.range.start.line,
                    location.range.start.character
                );
                return Some(location);
            }
        }

        debug!("No definition for '{}' ({} files visited)", ctx.word.text, visited.len());
        None
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::project::InMemoryIndex;

    /// Resolves at the first occurrence of `marker` on `line`, offset by `offset` chars
    pub fn resolve_in(index: InMemoryIndex, path: &str, line: u32, marker: &str, offset: u32) -> Option<Location> {
        let text = crate::project::SourceIndex::read_file(&index, Path::new(path)).expect("fixture file");
        let stream = crate::tokenize(&text);
        let line_text = stream.line_text(line as usize).expect("fixture line");
        let byte = line_text.find(marker).expect("marker on line");
        let character = line_text[..byte].chars().count() as u32 + offset;

        let resolver = DefinitionResolver::new(Arc::new(index), Arc::new(TokenCache::new()));
        resolver.resolve_definition(&stream, &ResolutionRequest::new(path, line, character))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::resolve_in;
    use super::*;
    use crate::project::InMemoryIndex;
    use indoc::indoc;

    #[test]
    fn test_visited_set_normalizes() {
        let mut visited = VisitedSet::new();
        assert!(visited.insert(Path::new("/app/./Main.clw")));
        assert!(!visited.insert(Path::new("/app/sub/../Main.clw")));
        assert!(visited.contains(Path::new("/app/Main.clw")));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_no_word_is_not_found() {
        let index = InMemoryIndex::new().with_file("/app/Main.clw", "Count LONG\n  Count = 1 + 2\n");
        assert_eq!(resolve_in(index, "/app/Main.clw", 1, "+", 0), None);
    }

    #[test]
    fn test_unknown_symbol_is_not_found() {
        let source = indoc! {"
            Main PROCEDURE
              CODE
              Missing = 1
        "};
        let index = InMemoryIndex::new().with_file("/app/Main.clw", source);
        assert_eq!(resolve_in(index, "/app/Main.clw", 2, "Missing", 0), None);
    }

    #[test]
    fn test_location_of_token() {
        let token = Token::new(TokenKind::Label, "Total", 4, 0);
        let location = Location::of_token(Path::new("/a.clw"), &token);
        assert_eq!(location.range.start, Position { line: 4, character: 0 });
        assert_eq!(location.range.end, Position { line: 4, character: 5 });
        assert_eq!(Location::file_start(Path::new("/a.clw")).range, Range::default());
    }
}
