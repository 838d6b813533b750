//! Project-wide label lookup
//!
//! Searches the column-0 labels of every other source file of the
//! originating file's project, in the order the project lists them.

use tracing::debug;

use crate::project::normalize_path;

use super::{column_zero_labels, Location, ResolutionContext};

pub fn search_project_files(ctx: &ResolutionContext<'_>) -> Option<Location> {
    let project = ctx.project()?;
    let root = normalize_path(project.root());

    for source in project.source_files() {
        let path = normalize_path(&root.join(&source.relative_path));
        if ctx.is_origin(&path) {
            continue;
        }
        let Some(stream) = ctx.stream_for(&path) else {
            debug!("Project source {:?} is unreadable", path);
            continue;
        };
        if let Some((_, label)) = column_zero_labels(&stream, &ctx.word.text).next() {
            return Some(Location::of_token(&path, label));
        }
    }
    None
}
