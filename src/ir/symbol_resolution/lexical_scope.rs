//! Symbol lookup along the lexical scope chain
//!
//! Column-0 variables are searched in the cursor's innermost scope first,
//! then each enclosing scope outward, then among declarations outside every
//! scope. A cursor outside any scope sees the whole file. Locals of sibling
//! procedures are never visible. When the file has no declaration the search
//! widens:
//!
//! 1. labels in the project's other source files
//! 2. a label in `<word>.clw` found through the redirection resolver
//! 3. the include/member graph ([`IncludeSearch`])
//! 4. procedure, routine and method declarations by name

use tracing::debug;

use crate::ir::token::{Token, TokenKind};

use super::{column_zero_labels, global, IncludeSearch, Location, ResolutionContext, SymbolResolver, VisitedSet};

#[derive(Debug, Default)]
pub struct LexicalScopeResolver {
    includes: IncludeSearch,
}

impl LexicalScopeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column-0 variables named like the word, minus the occurrence under the cursor
    fn declarations<'s>(&self, ctx: &'s ResolutionContext<'_>) -> Vec<&'s Token> {
        ctx.stream
            .tokens()
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Variable | TokenKind::ImplicitVariable))
            .filter(|t| t.column == 0 && t.text_eq(&ctx.word.text))
            .filter(|t| !t.touches(ctx.line, ctx.character))
            .collect()
    }

    fn find_in_scope_chain(&self, ctx: &ResolutionContext<'_>) -> Option<Location> {
        let declarations = self.declarations(ctx);
        if declarations.is_empty() {
            return None;
        }

        let chain = ctx.stream.enclosing_scopes(ctx.line);
        if chain.is_empty() {
            return declarations.first().map(|found| Location::of_token(ctx.path, found));
        }

        for scope_id in chain {
            let Some(scope) = ctx.stream.get(scope_id) else {
                continue;
            };
            if let Some(found) = declarations.iter().find(|t| scope.covers_line(t.line)) {
                debug!("LexicalScopeResolver: '{}' found in scope {}", ctx.word.text, scope.text);
                return Some(Location::of_token(ctx.path, found));
            }
        }
        declarations
            .iter()
            .find(|t| ctx.stream.enclosing_scopes(t.line).is_empty())
            .map(|found| Location::of_token(ctx.path, found))
    }

    fn find_in_named_file(&self, ctx: &ResolutionContext<'_>) -> Option<Location> {
        let name = format!("{}.clw", ctx.word.text);
        let path = ctx.index.resolve_include_or_file(&name, ctx.project())?;
        let stream = ctx.stream_for(&path)?;
        let (_, label) = column_zero_labels(&stream, &ctx.word.text).next()?;
        Some(Location::of_token(&path, label))
    }

    fn find_scope_declaration(&self, ctx: &ResolutionContext<'_>) -> Option<Location> {
        let id = ctx.stream.find_scope_opener(&ctx.word.text, None)?;
        ctx.stream.get(id).map(|opener| Location::of_token(ctx.path, opener))
    }
}

impl SymbolResolver for LexicalScopeResolver {
    fn resolve_symbol(&self, ctx: &ResolutionContext<'_>, visited: &mut VisitedSet) -> Option<Location> {
        debug!(
            "LexicalScopeResolver: Resolving '{}' at {}:{}",
            ctx.word.text, ctx.line, ctx.character
        );

        self.find_in_scope_chain(ctx)
            .or_else(|| global::search_project_files(ctx))
            .or_else(|| self.find_in_named_file(ctx))
            .or_else(|| self.includes.search(ctx, ctx.path, visited))
            .or_else(|| self.find_scope_declaration(ctx))
    }

    fn name(&self) -> &'static str {
        "LexicalScopeResolver"
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::resolve_in;
    use crate::project::{InMemoryIndex, StaticProject};
    use indoc::indoc;
    use std::path::PathBuf;

    #[test]
    fn test_bare_variable_in_enclosing_scope() {
        let source = indoc! {"
            Counter
            Main PROCEDURE
            Counter
              CODE
              Counter += 1
        "};
        let index = InMemoryIndex::new().with_file("/app/Main.clw", source);
        let location = resolve_in(index, "/app/Main.clw", 4, "Counter", 0).expect("variable");
        assert_eq!(location.range.start.line, 2);
    }

    #[test]
    fn test_sibling_procedure_local_is_not_visible() {
        let source = indoc! {"
            First PROCEDURE
            Counter
              CODE
            Second PROCEDURE
              CODE
              Counter += 1
        "};
        let index = InMemoryIndex::new().with_file("/app/Main.clw", source);
        assert_eq!(resolve_in(index, "/app/Main.clw", 5, "Counter", 0), None);
    }

    #[test]
    fn test_sibling_local_does_not_hide_included_global() {
        let index = InMemoryIndex::new()
            .with_file(
                "/app/Main.clw",
                "  INCLUDE('Globals.inc')\nFirst PROCEDURE\nCounter\n  CODE\nSecond PROCEDURE\n  CODE\n  Counter += 1\n",
            )
            .with_file("/app/Globals.inc", "Counter LONG\n");
        let location = resolve_in(index, "/app/Main.clw", 6, "Counter", 0).expect("included global");
        assert_eq!(location.path, PathBuf::from("/app/Globals.inc"));
        assert_eq!(location.range.start.line, 0);
    }

    #[test]
    fn test_file_level_declaration_visible_inside_procedure() {
        let source = indoc! {"
            Counter
            Main PROCEDURE
              CODE
              Counter += 1
        "};
        let index = InMemoryIndex::new().with_file("/app/Main.clw", source);
        let location = resolve_in(index, "/app/Main.clw", 3, "Counter", 0).expect("file-level");
        assert_eq!(location.range.start.line, 0);
    }

    #[test]
    fn test_named_source_file() {
        let index = InMemoryIndex::new()
            .with_file("/app/Main.clw", "  CODE\n  Totals()\n")
            .with_file("/lib/Totals.clw", "  MEMBER()\nTotals PROCEDURE\n  CODE\n")
            .with_redirection_path("/lib")
            .with_project(StaticProject::new("App", "/app").with_source("Main.clw"));
        let location = resolve_in(index, "/app/Main.clw", 1, "Totals", 0).expect("named file");
        assert_eq!(location.path, PathBuf::from("/lib/Totals.clw"));
        assert_eq!(location.range.start.line, 1);
    }

    #[test]
    fn test_method_name_falls_back_to_implementation() {
        let source = indoc! {"
            Counter.Reset PROCEDURE
              CODE
              SELF.Count = 0
            Main PROCEDURE
              CODE
              Reset
        "};
        let index = InMemoryIndex::new().with_file("/app/Main.clw", source);
        let location = resolve_in(index, "/app/Main.clw", 5, "Reset", 0).expect("method");
        assert_eq!(location.range.start.line, 0);
    }
}
