//! Structure bodies, field lists and field prefixes
//!
//! Walks the token list line by line with a stack of open structures.
//!
//! - An opener pushes; `END`, a line-ending `.` and a line-leading
//!   `UNTIL`/`WHILE` (for `LOOP`) pop the innermost structure and record its
//!   closing line in `scope_end`.
//! - Inside the body of a field-declaring structure (QUEUE, GROUP, CLASS,
//!   WINDOW...), column-0 labels and the leading identifier of an indented
//!   declaration line become field labels.
//! - `PRE(x)` on the opener line (continuations included) sets
//!   `structure_prefix`; nested structures inherit it.
//!
//! Scope candidates that sit inside a CLASS, INTERFACE or MAP body are
//! prototypes. They become fields instead of scope openers. A real
//! procedure or routine declaration closes every structure left open.

use std::collections::HashMap;
use std::ops::Range;

use tracing::trace;

use crate::ir::token::{ScopeKind, Token, TokenId, TokenKind};

/// Structures whose bodies declare named members
const FIELD_DECLARING: &[&str] = &[
    "APPLICATION", "CLASS", "DETAIL", "FILE", "FOOTER", "FORM", "GROUP", "HEADER", "INTERFACE", "ITEMIZE",
    "MAP", "MENU", "MENUBAR", "MODULE", "OLE", "OPTION", "QUEUE", "RECORD", "REPORT", "SHEET", "TAB",
    "TOOLBAR", "VIEW", "WINDOW", "BREAK",
];

/// Structures whose bodies hold procedure prototypes
const PROTOTYPE_HOLDERS: &[&str] = &["CLASS", "INTERFACE", "MAP", "MODULE"];

/// Structure keywords that never open a block
const NON_BLOCK: &[&str] = &["SECTION"];

#[derive(Debug)]
struct OpenStructure {
    id: TokenId,
    keyword: String,
    owner: Option<TokenId>,
    prefix: Option<String>,
}

impl OpenStructure {
    fn declares_fields(&self) -> bool {
        FIELD_DECLARING.iter().any(|k| self.keyword.eq_ignore_ascii_case(k))
    }

    fn holds_prototypes(&self) -> bool {
        PROTOTYPE_HOLDERS.iter().any(|k| self.keyword.eq_ignore_ascii_case(k))
    }
}

/// Runs the structure pass and returns the scope candidates that are real
/// implementations.
pub(crate) fn enrich_structures(
    tokens: &mut [Token],
    candidates: &[(TokenId, ScopeKind)],
) -> Vec<(TokenId, ScopeKind)> {
    let candidate_kinds: HashMap<TokenId, ScopeKind> = candidates.iter().copied().collect();
    let mut stack: Vec<OpenStructure> = Vec::new();
    let mut accepted = Vec::new();

    for range in line_ranges(tokens) {
        let first = range.start;
        let line = tokens[first].line;

        if let Some(&kind) = candidate_kinds.get(&first) {
            let is_prototype = kind != ScopeKind::Routine && stack.iter().any(OpenStructure::holds_prototypes);
            if !is_prototype {
                close_all(tokens, &mut stack, line.saturating_sub(1));
                accepted.push((first, kind));
            }
        }

        if let Some(top) = stack.last() {
            if top.declares_fields() {
                if let Some(label) = field_label(tokens, range.clone()) {
                    mark_field(tokens, label, top);
                }
            }
        }

        let mut opened_on_line = false;
        for id in range.clone() {
            let token = &tokens[id];
            match token.kind {
                TokenKind::Keyword if token.text_eq("END") => {
                    pop(tokens, &mut stack, line);
                }
                TokenKind::Keyword | TokenKind::Variable
                    if id == first
                        && (token.text_eq("UNTIL") || token.text_eq("WHILE"))
                        && stack.last().is_some_and(|s| s.keyword.eq_ignore_ascii_case("LOOP")) =>
                {
                    pop(tokens, &mut stack, line);
                }
                TokenKind::Delimiter if token.text == "." && is_last_on_line(tokens, id, &range) => {
                    pop(tokens, &mut stack, line);
                }
                TokenKind::Structure if !opened_on_line && opens_block(tokens, id, &range) => {
                    let owner = owning_label(tokens, id, &range);
                    let prefix = find_prefix(tokens, id)
                        .or_else(|| stack.iter().rev().find_map(|s| s.prefix.clone()));
                    tokens[id].parent = owner;
                    tokens[id].structure_prefix = prefix.clone();
                    trace!("Structure {} opens at line {} (prefix {:?})", tokens[id].text, line, prefix);
                    stack.push(OpenStructure {
                        id,
                        keyword: tokens[id].text.to_ascii_uppercase(),
                        owner,
                        prefix,
                    });
                    opened_on_line = true;
                }
                _ => {}
            }
        }
    }

    accepted
}

/// Token index ranges, one per non-empty line
fn line_ranges(tokens: &[Token]) -> Vec<Range<TokenId>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for id in 1..=tokens.len() {
        if id == tokens.len() || tokens[id].line != tokens[start].line {
            ranges.push(start..id);
            start = id;
        }
    }
    ranges
}

fn pop(tokens: &mut [Token], stack: &mut Vec<OpenStructure>, line: usize) {
    if let Some(open) = stack.pop() {
        tokens[open.id].scope_end = Some(line);
    }
}

fn close_all(tokens: &mut [Token], stack: &mut Vec<OpenStructure>, line: usize) {
    while let Some(open) = stack.pop() {
        trace!("Structure {} left open, closed at line {}", tokens[open.id].text, line);
        tokens[open.id].scope_end = Some(line.max(tokens[open.id].line));
    }
}

fn mark_field(tokens: &mut [Token], label: TokenId, structure: &OpenStructure) {
    let token = &mut tokens[label];
    token.kind = TokenKind::Label;
    token.is_structure_field = true;
    token.structure_parent = structure.owner;
    token.parent = Some(structure.id);
}

/// Field label declared on this line: a column-0 label, or an indented
/// identifier followed by a declaring token (`  Name STRING(30)`).
fn field_label(tokens: &[Token], range: Range<TokenId>) -> Option<TokenId> {
    let first = range.start;
    let token = &tokens[first];
    if token.kind == TokenKind::Label && token.column == 0 {
        return Some(first);
    }
    if token.kind != TokenKind::Variable || token.column == 0 {
        return None;
    }
    let next = tokens[first + 1..range.end].iter().find(|t| t.kind != TokenKind::Comment)?;
    match next.kind {
        TokenKind::Operator
        | TokenKind::Delimiter
        | TokenKind::LineContinuation
        | TokenKind::String
        | TokenKind::Number => None,
        _ => Some(first),
    }
}

fn opens_block(tokens: &[Token], id: TokenId, range: &Range<TokenId>) -> bool {
    let token = &tokens[id];
    if NON_BLOCK.iter().any(|k| token.text_eq(k)) {
        return false;
    }
    // `,MODULE(...)` attributes and `Pre:Record` qualified names
    if id > range.start {
        let prev = &tokens[id - 1];
        if prev.kind == TokenKind::Delimiter && matches!(prev.text.as_str(), "," | ":" | ".") {
            return false;
        }
    }
    // the BREAK statement vs. the report `BREAK(var)` band
    if token.text_eq("BREAK") {
        return tokens
            .get(id + 1)
            .is_some_and(|next| next.line == token.line && next.text == "(");
    }
    true
}

fn owning_label(tokens: &[Token], id: TokenId, range: &Range<TokenId>) -> Option<TokenId> {
    if id == range.start {
        return None;
    }
    let prev = id - 1;
    (tokens[prev].kind == TokenKind::Label).then_some(prev)
}

fn is_last_on_line(tokens: &[Token], id: TokenId, range: &Range<TokenId>) -> bool {
    tokens[id + 1..range.end].iter().all(|t| t.kind == TokenKind::Comment)
}

/// Argument of a `PRE(...)` attribute following the opener, on its line or
/// on `|` continuation lines.
fn find_prefix(tokens: &[Token], opener: TokenId) -> Option<String> {
    let mut line = tokens[opener].line;
    let mut saw_pre = false;
    for token in &tokens[opener + 1..] {
        if token.line != line {
            let continued = tokens[opener + 1..]
                .iter()
                .any(|t| t.line == line && t.kind == TokenKind::LineContinuation);
            if !continued || token.line != line + 1 {
                return None;
            }
            line = token.line;
        }
        match token.kind {
            TokenKind::Property | TokenKind::Attribute if token.text_eq("PRE") => saw_pre = true,
            TokenKind::Variable if saw_pre => return Some(token.text.clone()),
            TokenKind::Delimiter if saw_pre && token.text == "(" => {}
            _ if saw_pre => saw_pre = false,
            _ => {}
        }
    }
    None
}
