//! File references: `INCLUDE('Keys.inc')`, `MODULE('Util')` and bare file names

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::project::{extension_of, normalize_path, FILE_EXTENSIONS};

use super::{column_zero_labels, file_word_at, Location, ResolutionContext, SymbolResolver, VisitedSet};

static FILE_DIRECTIVE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:INCLUDE|MEMBER|MODULE|USE|IMPORT|EQUATE|FROM|SOURCE)\b").expect("valid regex")
});

pub struct FileReferenceResolver;

impl FileReferenceResolver {
    fn is_known_extension(ext: &str, lookup: &[String]) -> bool {
        FILE_EXTENSIONS.contains(&ext) || lookup.iter().any(|e| e == ext)
    }

    /// `word` itself when it carries a known extension, else `word` with each
    /// lookup extension appended in order
    fn candidate_names(word: &str, lookup: &[String]) -> Vec<String> {
        match extension_of(word) {
            Some(ext) if Self::is_known_extension(&ext, lookup) => vec![word.to_string()],
            _ => lookup.iter().map(|ext| format!("{}{}", word, ext)).collect(),
        }
    }
}

impl SymbolResolver for FileReferenceResolver {
    fn resolve_symbol(&self, ctx: &ResolutionContext<'_>, _visited: &mut VisitedSet) -> Option<Location> {
        let word = file_word_at(ctx.stream, ctx.line, ctx.character)?;
        if column_zero_labels(ctx.stream, &word.text).next().is_some() {
            return None;
        }

        let in_directive = ctx
            .stream
            .line_text(ctx.line)
            .is_some_and(|line| FILE_DIRECTIVE_LINE.is_match(line));
        let lookup = ctx.index.lookup_extensions();
        let known_extension = extension_of(&word.text).is_some_and(|ext| Self::is_known_extension(&ext, &lookup));
        if !in_directive && !known_extension {
            return None;
        }

        for name in Self::candidate_names(&word.text, &lookup) {
            let from_search_path = ctx.project().and_then(|project| {
                let ext = extension_of(&name)?;
                project.search_paths(&ext).into_iter().find_map(|dir| {
                    let candidate = normalize_path(&dir.join(&name));
                    ctx.index
                        .resolve_include_or_file(&candidate.to_string_lossy(), Some(project))
                })
            });
            if let Some(path) = from_search_path.or_else(|| ctx.resolve_file(&name, ctx.path, ctx.project())) {
                debug!("FileReferenceResolver: '{}' -> {:?}", word.text, path);
                return Some(Location::file_start(&path));
            }
        }
        None
    }

    fn name(&self) -> &'static str {
        "FileReferenceResolver"
    }
}
