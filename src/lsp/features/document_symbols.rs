//! Document outline built from the enriched token stream
//!
//! ```text
//! MEMBER('Main.clw')            (when the file is a member module)
//! ├── Main(...)                 procedures and methods
//! │   ├── Total     LONG        local data
//! │   └── Refresh   ROUTINE     routines of the procedure
//! └── CustomerQueue QUEUE       global data, structures with their fields
//!     └── Name      STRING
//! ```

use tower_lsp::lsp_types::{DocumentSymbol, Position, Range, SymbolKind};
use tracing::debug;

use crate::ir::directives::{directives_of, DirectiveKind};
use crate::ir::token::{ScopeKind, Token, TokenId, TokenKind};
use crate::ir::token_stream::{LabelRole, TokenStream};

pub fn document_symbols(stream: &TokenStream) -> Vec<DocumentSymbol> {
    let entries: Vec<TokenId> = stream
        .iter()
        .filter(|(id, t)| is_outline_entry(stream, *id, t))
        .map(|(id, _)| id)
        .collect();
    let containers: Vec<Option<TokenId>> = entries.iter().map(|&id| container_of(stream, id)).collect();

    let symbols = children_of(stream, &entries, &containers, None);
    debug!("Outline: {} top-level symbols", symbols.len());

    match directives_of(stream, DirectiveKind::Member).into_iter().next() {
        Some(member) => {
            let selection = Range {
                start: Position::new(member.line as u32, member.start_column as u32),
                end: Position::new(member.line as u32, member.end_column as u32),
            };
            vec![make_symbol(
                format!("MEMBER('{}')", member.file),
                Some("MEMBER".to_string()),
                SymbolKind::MODULE,
                Range {
                    start: Position::new(0, 0),
                    end: line_end(stream, stream.line_count().saturating_sub(1)),
                },
                selection,
                symbols,
            )]
        }
        None => symbols,
    }
}

fn is_outline_entry(stream: &TokenStream, id: TokenId, token: &Token) -> bool {
    token.kind == TokenKind::Label
        && (token.is_scope_opener()
            || token.is_structure_field
            || stream.label_role(id) == Some(LabelRole::Declaration))
}

/// Outline parent of an entry: routines sit under their procedure, fields
/// under their structure, other data under the innermost scope.
fn container_of(stream: &TokenStream, id: TokenId) -> Option<TokenId> {
    let token = stream.get(id)?;
    if token.is_structure_field {
        return token.structure_parent;
    }
    match token.scope_kind {
        Some(ScopeKind::Procedure | ScopeKind::Class) => None,
        Some(ScopeKind::Routine) => stream
            .enclosing_scopes(token.line)
            .into_iter()
            .find(|&scope| scope != id && stream.get(scope).is_some_and(|s| s.scope_kind != Some(ScopeKind::Routine))),
        None => stream.innermost_scope_at(token.line),
    }
}

fn children_of(
    stream: &TokenStream,
    entries: &[TokenId],
    containers: &[Option<TokenId>],
    parent: Option<TokenId>,
) -> Vec<DocumentSymbol> {
    entries
        .iter()
        .zip(containers)
        .filter(|(_, container)| **container == parent)
        .filter_map(|(&id, _)| {
            let children = children_of(stream, entries, containers, Some(id));
            entry_symbol(stream, id, children)
        })
        .collect()
}

fn entry_symbol(stream: &TokenStream, id: TokenId, children: Vec<DocumentSymbol>) -> Option<DocumentSymbol> {
    let token = stream.get(id)?;
    let declarer = stream.next_on_line(id).and_then(|next| stream.get(next).map(|t| (next, t)));
    let selection = Range {
        start: Position::new(token.line as u32, token.column as u32),
        end: Position::new(token.line as u32, token.end_column() as u32),
    };

    let (name, detail, kind, last_line) = match token.scope_kind {
        Some(scope) => {
            let keyword = declarer.map(|(_, t)| t.text.to_ascii_uppercase());
            let name = if scope != ScopeKind::Routine && takes_arguments(stream, token) {
                format!("{}(...)", token.text)
            } else {
                token.text.clone()
            };
            let kind = match scope {
                ScopeKind::Class => SymbolKind::METHOD,
                ScopeKind::Procedure | ScopeKind::Routine => SymbolKind::FUNCTION,
            };
            let last = token.scope_end.unwrap_or(stream.line_count().saturating_sub(1));
            (name, keyword, kind, last)
        }
        None => {
            let (kind, last) = match declarer {
                Some((sid, s)) if s.kind == TokenKind::Structure => {
                    let kind = if s.text_eq("CLASS") {
                        SymbolKind::CLASS
                    } else {
                        SymbolKind::STRUCT
                    };
                    let last = stream.get(sid).and_then(|s| s.scope_end).unwrap_or(token.line);
                    (kind, last)
                }
                Some((_, s)) if s.text_eq("EQUATE") => (SymbolKind::CONSTANT, token.line),
                _ => (SymbolKind::VARIABLE, token.line),
            };
            let detail = declarer.map(|(_, t)| t.text.to_ascii_uppercase());
            (token.text.clone(), detail, kind, last)
        }
    };

    let range = Range {
        start: Position::new(token.line as u32, 0),
        end: line_end(stream, last_line.max(token.line)),
    };
    Some(make_symbol(name, detail, kind, range, selection, children))
}

/// Whether a declaration lists parameters: `Main PROCEDURE(LONG x)`
fn takes_arguments(stream: &TokenStream, label: &Token) -> bool {
    let Some(text) = stream.line_text(label.line) else {
        return false;
    };
    let rest: String = text.chars().skip(label.end_column()).collect();
    let rest = rest.trim_start();
    let Some(keyword_end) = rest.find(|c: char| !c.is_ascii_alphabetic()) else {
        return false;
    };
    rest[keyword_end..]
        .trim_start()
        .strip_prefix('(')
        .and_then(|args| args.split_once(')'))
        .is_some_and(|(args, _)| !args.trim().is_empty())
}

fn line_end(stream: &TokenStream, line: usize) -> Position {
    let length = stream.line_text(line).map(|t| t.chars().count()).unwrap_or(0);
    Position::new(line as u32, length as u32)
}

fn make_symbol(
    name: String,
    detail: Option<String>,
    kind: SymbolKind,
    range: Range,
    selection_range: Range,
    children: Vec<DocumentSymbol>,
) -> DocumentSymbol {
    DocumentSymbol {
        name,
        detail,
        kind,
        tags: None,
        range,
        selection_range,
        children: Some(children),
        #[allow(deprecated)]
        deprecated: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn names(symbols: &[DocumentSymbol]) -> Vec<&str> {
        symbols.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_procedures_routines_and_data() {
        let stream = crate::tokenize(indoc! {"
            CustomerQueue QUEUE
              Name          STRING(30)
                          END
            Main PROCEDURE(LONG pId)
            Total LONG
              CODE
              DO Refresh
            Refresh ROUTINE
              Total = 0
            Other PROCEDURE
              CODE
        "});
        let symbols = document_symbols(&stream);
        assert_eq!(names(&symbols), vec!["CustomerQueue", "Main(...)", "Other"]);

        let queue = &symbols[0];
        assert_eq!(queue.kind, SymbolKind::STRUCT);
        assert_eq!(queue.range.end.line, 2);
        assert_eq!(names(queue.children.as_deref().unwrap_or_default()), vec!["Name"]);

        let main = &symbols[1];
        assert_eq!(main.kind, SymbolKind::FUNCTION);
        assert_eq!(main.range.end.line, 8);
        assert_eq!(names(main.children.as_deref().unwrap_or_default()), vec!["Total", "Refresh"]);
    }

    #[test]
    fn test_member_module_wraps_outline() {
        let stream = crate::tokenize(indoc! {"
              MEMBER('Main.clw')
            Helper PROCEDURE()
              CODE
        "});
        let symbols = document_symbols(&stream);
        assert_eq!(names(&symbols), vec!["MEMBER('Main.clw')"]);
        assert_eq!(symbols[0].kind, SymbolKind::MODULE);
        assert_eq!(names(symbols[0].children.as_deref().unwrap_or_default()), vec!["Helper"]);
    }

    #[test]
    fn test_method_implementation_kind() {
        let stream = crate::tokenize("Counter.Reset PROCEDURE\n  CODE\n");
        let symbols = document_symbols(&stream);
        assert_eq!(symbols[0].kind, SymbolKind::METHOD);
        assert_eq!(symbols[0].detail.as_deref(), Some("PROCEDURE"));
    }
}
