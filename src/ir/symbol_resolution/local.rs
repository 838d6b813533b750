//! Same-file label and structure declaration lookup

use crate::ir::token::TokenKind;

use super::{column_zero_labels, Location, ResolutionContext, SymbolResolver, VisitedSet};

/// Column-0 labels of the current file. A label inside the cursor's
/// innermost scope wins over the first one in file order.
pub struct LocalLabelResolver;

impl SymbolResolver for LocalLabelResolver {
    fn resolve_symbol(&self, ctx: &ResolutionContext<'_>, _visited: &mut VisitedSet) -> Option<Location> {
        let labels: Vec<_> = column_zero_labels(ctx.stream, &ctx.word.text).map(|(_, t)| t).collect();
        let scoped = ctx
            .innermost_scope()
            .and_then(|scope| labels.iter().find(|label| scope.covers_line(label.line)));
        scoped
            .or_else(|| labels.first())
            .map(|label| Location::of_token(ctx.path, label))
    }

    fn name(&self) -> &'static str {
        "LocalLabelResolver"
    }
}

/// Structures declared under the word, answered with their owning label
pub struct StructureDeclResolver;

impl SymbolResolver for StructureDeclResolver {
    fn resolve_symbol(&self, ctx: &ResolutionContext<'_>, _visited: &mut VisitedSet) -> Option<Location> {
        ctx.stream
            .tokens()
            .iter()
            .filter(|t| t.kind == TokenKind::Structure)
            .filter_map(|s| s.parent.and_then(|id| ctx.stream.get(id)))
            .find(|owner| owner.text_eq(&ctx.word.text))
            .map(|owner| Location::of_token(ctx.path, owner))
    }

    fn name(&self) -> &'static str {
        "StructureDeclResolver"
    }
}
