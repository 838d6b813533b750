//! Search through `INCLUDE` and `MEMBER` directives
//!
//! Starting from one file: a column-0 label match in the file wins; otherwise
//! its `INCLUDE`d files are searched last-declared-first, recursively, and
//! finally the module named by its `MEMBER` directive. Every file is entered
//! at most once per request.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::ir::directives::{directives_of, member_module, DirectiveKind};
use crate::ir::token_stream::TokenStream;
use crate::project::normalize_path;

use super::{column_zero_labels, Location, ResolutionContext, VisitedSet};

#[derive(Debug, Default, Clone, Copy)]
pub struct IncludeSearch;

impl IncludeSearch {
    pub fn search(&self, ctx: &ResolutionContext<'_>, path: &Path, visited: &mut VisitedSet) -> Option<Location> {
        let path = normalize_path(path);
        if !visited.insert(&path) {
            debug!("IncludeSearch: {:?} already visited", path);
            return None;
        }

        let loaded: Arc<TokenStream>;
        let stream: &TokenStream = if ctx.is_origin(&path) {
            ctx.stream
        } else {
            loaded = ctx.stream_for(&path)?;
            &loaded
        };

        if let Some((_, label)) = column_zero_labels(stream, &ctx.word.text).next() {
            return Some(Location::of_token(&path, label));
        }

        let project = ctx.index.find_project_for_file(&path).or_else(|| ctx.project.clone());
        let project = project.as_deref();

        for include in directives_of(stream, DirectiveKind::Include).iter().rev() {
            let Some(target) = ctx.resolve_file(&include.file, &path, project) else {
                debug!("IncludeSearch: cannot resolve '{}' from {:?}", include.file, path);
                continue;
            };
            if let Some(location) = self.search(ctx, &target, visited) {
                return Some(location);
            }
        }

        let module = member_module(stream)?;
        let target = ctx.resolve_file(&module, &path, project)?;
        if visited.contains(&target) {
            return None;
        }
        debug!("IncludeSearch: falling back to member module {:?}", target);
        self.search(ctx, &target, visited)
    }
}
