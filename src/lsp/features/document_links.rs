//! Links from `INCLUDE`, `MODULE` and `MEMBER` file names to their targets
//!
//! A sectioned include (`INCLUDE('Equates.clw','Keys')`) links to the line of
//! the matching `SECTION('Keys')` in the target.

use std::path::Path;

use regex::Regex;
use tower_lsp::lsp_types::{DocumentLink, Position, Range, Url};
use tracing::debug;

use crate::document_cache::TokenCache;
use crate::ir::directives::{extract_directives, Directive};
use crate::ir::token_stream::TokenStream;
use crate::project::{resolve_reference, SourceIndex};

pub fn document_links(stream: &TokenStream, path: &Path, index: &dyn SourceIndex, cache: &TokenCache) -> Vec<DocumentLink> {
    let project = index.find_project_for_file(path);
    extract_directives(stream)
        .into_iter()
        .filter_map(|directive| {
            let Some(target) = resolve_reference(index, &directive.file, path, project.as_deref()) else {
                debug!("No link target for '{}'", directive.file);
                return None;
            };
            let mut url = Url::from_file_path(&target).ok()?;
            if let Some(line) = section_line(&directive, &target, index, cache) {
                url.set_fragment(Some(&format!("L{}", line + 1)));
            }
            Some(DocumentLink {
                range: Range {
                    start: Position::new(directive.line as u32, directive.start_column as u32),
                    end: Position::new(directive.line as u32, directive.end_column as u32),
                },
                target: Some(url),
                tooltip: Some(target.display().to_string()),
                data: None,
            })
        })
        .collect()
}

/// Line of `SECTION('name')` in the include target
fn section_line(directive: &Directive, target: &Path, index: &dyn SourceIndex, cache: &TokenCache) -> Option<usize> {
    let section = directive.section.as_deref()?;
    let pattern = Regex::new(&format!(r"(?i)\bSECTION\s*\(\s*'{}'\s*\)", regex::escape(section))).ok()?;
    let text = index.read_file(target)?;
    let stream = cache.get_or_tokenize(target, &text);
    (0..stream.line_count()).find(|&line| stream.line_text(line).is_some_and(|t| pattern.is_match(t)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::InMemoryIndex;
    use indoc::indoc;

    #[test]
    fn test_links_for_directives() {
        let index = InMemoryIndex::new()
            .with_file("/app/Keys.inc", "KeyA EQUATE(1)\n")
            .with_file(
                "/app/Equates.clw",
                indoc! {"
                      SECTION('Colors')
                    Red EQUATE(0FFh)
                      SECTION('Keys')
                    Esc EQUATE(27)
                "},
            );
        let stream = crate::tokenize(indoc! {"
              INCLUDE('Keys.inc'),ONCE
              INCLUDE('Equates.clw','Keys')
              INCLUDE('Missing.inc')
        "});
        let links = document_links(&stream, Path::new("/app/Main.clw"), &index, &TokenCache::new());
        assert_eq!(links.len(), 2);

        assert_eq!(links[0].range.start, Position::new(0, 11));
        let first = links[0].target.as_ref().expect("target");
        assert!(first.path().ends_with("/app/Keys.inc"));
        assert_eq!(first.fragment(), None);

        let second = links[1].target.as_ref().expect("target");
        assert_eq!(second.fragment(), Some("L3"));
    }
}
