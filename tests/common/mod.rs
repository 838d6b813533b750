#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use clarion_language_server::document_cache::TokenCache;
use clarion_language_server::ir::symbol_resolution::{DefinitionResolver, Location, ResolutionRequest};
use clarion_language_server::project::SourceIndex;
use clarion_language_server::tokenize;

/// Cursor on `line`, at the first occurrence of `marker` plus `offset` characters
pub fn cursor(text: &str, line: u32, marker: &str, offset: u32) -> u32 {
    let line_text = text.lines().nth(line as usize).expect("fixture line");
    let byte = line_text.find(marker).expect("marker on line");
    line_text[..byte].chars().count() as u32 + offset
}

/// Resolves the word at `marker` in `path`, reading the file through `index`
pub fn resolve_at(
    index: Arc<dyn SourceIndex>,
    path: &str,
    line: u32,
    marker: &str,
    offset: u32,
) -> Option<Location> {
    let text = index.read_file(Path::new(path)).expect("fixture file");
    let stream = tokenize(&text);
    let character = cursor(&text, line, marker, offset);
    let resolver = DefinitionResolver::new(index, Arc::new(TokenCache::new()));
    resolver.resolve_definition(&stream, &ResolutionRequest::new(path, line, character))
}
