//! Structure field references: `Queue.Field` and `Pre:Field`

use tracing::debug;

use crate::ir::token::{Token, TokenId, TokenKind};
use crate::ir::token_stream::TokenStream;

use super::{Location, ResolutionContext, SymbolResolver, VisitedSet};

pub struct StructureFieldResolver;

#[derive(Debug, PartialEq, Eq)]
enum Qualifier {
    /// `Owner.Field`
    Dot(String),
    /// `Prefix:Field`
    Colon(String),
}

/// Reads the qualifier written immediately before the word at `start`.
fn qualifier_before(line_text: &str, start: usize) -> Option<Qualifier> {
    let chars: Vec<char> = line_text.chars().collect();
    let separator = *chars.get(start.checked_sub(1)?)?;
    if separator != '.' && separator != ':' {
        return None;
    }
    let end = start - 1;
    let mut begin = end;
    while begin > 0 && (chars[begin - 1].is_ascii_alphanumeric() || matches!(chars[begin - 1], '_' | ':')) {
        begin -= 1;
    }
    let segment: String = chars[begin..end].iter().collect();
    let segment = segment.trim_matches(':').to_string();
    if segment.is_empty() {
        return None;
    }
    Some(if separator == '.' {
        Qualifier::Dot(segment.rsplit(':').next().unwrap_or_default().to_string())
    } else {
        Qualifier::Colon(segment)
    })
}

/// Structure tokens a qualifier refers to
fn matching_structures(stream: &TokenStream, qualifier: &Qualifier) -> Vec<TokenId> {
    let structures = || stream.iter().filter(|(_, t)| t.kind == TokenKind::Structure);
    match qualifier {
        Qualifier::Dot(owner) => structures()
            .filter(|(_, s)| {
                s.parent
                    .and_then(|id| stream.get(id))
                    .is_some_and(|label| label.text_eq(owner))
            })
            .map(|(id, _)| id)
            .collect(),
        Qualifier::Colon(prefix) => {
            let by_prefix = |p: &str| -> Vec<TokenId> {
                structures()
                    .filter(|(_, s)| s.structure_prefix.as_deref().is_some_and(|sp| sp.eq_ignore_ascii_case(p)))
                    .map(|(id, _)| id)
                    .collect()
            };
            let exact = by_prefix(prefix);
            if !exact.is_empty() {
                return exact;
            }
            match prefix.split_once(':') {
                Some((first, _)) => by_prefix(first),
                None => Vec::new(),
            }
        }
    }
}

fn in_body(structure: &Token, line: usize) -> bool {
    line > structure.line && structure.scope_end.is_none_or(|end| line <= end)
}

impl SymbolResolver for StructureFieldResolver {
    fn resolve_symbol(&self, ctx: &ResolutionContext<'_>, _visited: &mut VisitedSet) -> Option<Location> {
        let qualifier = qualifier_before(ctx.stream.line_text(ctx.line)?, ctx.word.start)?;
        let structures = matching_structures(ctx.stream, &qualifier);
        debug!(
            "StructureFieldResolver: '{}' qualified by {:?}, {} candidate structures",
            ctx.word.text,
            qualifier,
            structures.len()
        );
        if structures.is_empty() {
            return None;
        }

        let fields: Vec<&Token> = ctx
            .stream
            .tokens()
            .iter()
            .filter(|t| t.kind == TokenKind::Label && t.is_structure_field && t.text_eq(&ctx.word.text))
            .filter(|t| {
                structures
                    .iter()
                    .filter_map(|&id| ctx.stream.get(id))
                    .any(|s| in_body(s, t.line))
            })
            .collect();

        let nearest = ctx
            .innermost_scope()
            .and_then(|scope| fields.iter().find(|f| scope.covers_line(f.line)));
        nearest
            .or_else(|| fields.first())
            .map(|field| Location::of_token(ctx.path, field))
    }

    fn name(&self) -> &'static str {
        "StructureFieldResolver"
    }
}
