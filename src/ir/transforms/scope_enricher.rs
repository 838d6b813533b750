//! Procedure, routine and method scopes
//!
//! Clarion has no end-of-scope marker. A scope runs until the line before the
//! next declaration that closes it:
//!
//! - a new procedure or method closes an open routine and an open procedure
//! - a new routine closes only an open routine
//!
//! Scopes still open at end of file keep `scope_end = None`.

use tracing::trace;

use crate::ir::token::{ScopeKind, Token, TokenId, TokenKind};

const PROCEDURE_KEYWORDS: &[&str] = &["PROCEDURE", "FUNCTION", "PROC"];

/// Column-0 labels directly followed by `PROCEDURE`/`FUNCTION`/`ROUTINE`.
///
/// Some of these are prototypes inside CLASS or MAP bodies; the structure
/// pass decides which ones really open a scope.
pub(crate) fn scope_candidates(tokens: &[Token]) -> Vec<(TokenId, ScopeKind)> {
    let mut candidates = Vec::new();
    for (id, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Label || token.column != 0 {
            continue;
        }
        let Some(next) = tokens[id + 1..]
            .iter()
            .take_while(|t| t.line == token.line)
            .find(|t| t.kind != TokenKind::Comment)
        else {
            continue;
        };
        if next.kind != TokenKind::Keyword {
            continue;
        }
        let kind = if next.text_eq("ROUTINE") {
            ScopeKind::Routine
        } else if PROCEDURE_KEYWORDS.iter().any(|k| next.text_eq(k)) {
            if token.text.contains('.') {
                ScopeKind::Class
            } else {
                ScopeKind::Procedure
            }
        } else {
            continue;
        };
        candidates.push((id, kind));
    }
    candidates
}

/// Stamps `scope_kind`/`scope_end` on the accepted openers, in file order.
pub(crate) fn assign_scopes(tokens: &mut [Token], openers: &[(TokenId, ScopeKind)]) {
    let mut open_procedure: Option<TokenId> = None;
    let mut open_routine: Option<TokenId> = None;

    for &(id, kind) in openers {
        let line = tokens[id].line;
        let previous_line = line.saturating_sub(1);

        if let Some(routine) = open_routine.take() {
            tokens[routine].scope_end = Some(previous_line);
        }
        if kind != ScopeKind::Routine {
            if let Some(procedure) = open_procedure.take() {
                tokens[procedure].scope_end = Some(previous_line);
            }
        }

        tokens[id].scope_kind = Some(kind);
        tokens[id].scope_end = None;
        match kind {
            ScopeKind::Routine => open_routine = Some(id),
            ScopeKind::Procedure | ScopeKind::Class => open_procedure = Some(id),
        }
        trace!("Scope {:?} '{}' opens at line {}", kind, tokens[id].text, line);
    }
}
