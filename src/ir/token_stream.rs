//! Immutable token sequence of one source file
//!
//! Tokens are stored in source order (line, then column). Every lookup the
//! resolver and editor features need (tokens on a line, token under a cursor,
//! scope chain at a line) is answered from that ordering without secondary
//! indexes.

use std::ops::Range;

use super::token::{ScopeKind, Token, TokenId, TokenKind};

/// Role of a column-0 label, derived from the token that follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRole {
    /// Procedure, routine, structure instance, equate, typed variable...
    Declaration,
    /// A bare label with nothing declaring after it
    Standalone,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    lines: Vec<String>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>, source: &str) -> Self {
        Self {
            tokens,
            lines: split_lines(source),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &Token)> {
        self.tokens.iter().enumerate()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Source text of a line, without its terminator
    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.lines.get(line).map(String::as_str)
    }

    /// Index range of the tokens that start on `line`
    pub fn line_range(&self, line: usize) -> Range<TokenId> {
        let start = self.tokens.partition_point(|t| t.line < line);
        let end = self.tokens.partition_point(|t| t.line <= line);
        start..end
    }

    pub fn tokens_on_line(&self, line: usize) -> &[Token] {
        &self.tokens[self.line_range(line)]
    }

    /// Token touching the cursor. When the cursor sits between two adjacent
    /// tokens the one starting at the cursor wins.
    pub fn token_at(&self, line: usize, character: usize) -> Option<TokenId> {
        let range = self.line_range(line);
        let mut hit = None;
        for id in range {
            let token = &self.tokens[id];
            if token.touches(line, character) {
                hit = Some(id);
                if token.column == character {
                    break;
                }
            }
        }
        hit
    }

    /// First token after `id` on the same line that is not a comment
    pub fn next_on_line(&self, id: TokenId) -> Option<TokenId> {
        let line = self.tokens.get(id)?.line;
        (id + 1..self.tokens.len())
            .take_while(|&next| self.tokens[next].line == line)
            .find(|&next| self.tokens[next].kind != TokenKind::Comment)
    }

    /// Labels that open procedure, routine or method scopes, in file order
    pub fn scope_openers(&self) -> impl Iterator<Item = (TokenId, &Token)> {
        self.iter().filter(|(_, t)| t.is_scope_opener())
    }

    /// Scopes whose range contains `line`, innermost first
    pub fn enclosing_scopes(&self, line: usize) -> Vec<TokenId> {
        let mut scopes: Vec<TokenId> = self
            .scope_openers()
            .filter(|(_, t)| t.covers_line(line))
            .map(|(id, _)| id)
            .collect();
        scopes.sort_by(|a, b| self.tokens[*b].line.cmp(&self.tokens[*a].line));
        scopes
    }

    pub fn innermost_scope_at(&self, line: usize) -> Option<TokenId> {
        self.enclosing_scopes(line).into_iter().next()
    }

    /// Scope opener of the given kind whose label matches `name`
    pub fn find_scope_opener(&self, name: &str, kind: Option<ScopeKind>) -> Option<TokenId> {
        self.scope_openers()
            .find(|(_, t)| {
                kind.is_none_or(|k| t.scope_kind == Some(k))
                    && (t.text_eq(name) || method_name(&t.text).is_some_and(|m| m.eq_ignore_ascii_case(name)))
            })
            .map(|(id, _)| id)
    }

    /// Classifies a column-0 label by the kind of the token that follows it.
    /// Returns `None` for tokens that are not column-0 labels.
    pub fn label_role(&self, id: TokenId) -> Option<LabelRole> {
        let token = self.tokens.get(id)?;
        if token.kind != TokenKind::Label || token.column != 0 {
            return None;
        }
        let role = match self.next_on_line(id).map(|next| self.tokens[next].kind) {
            Some(
                TokenKind::Keyword
                | TokenKind::Structure
                | TokenKind::Type
                | TokenKind::Directive
                | TokenKind::Function
                | TokenKind::FunctionArgumentParameter
                | TokenKind::TypeAnnotation
                | TokenKind::Class
                | TokenKind::Variable
                | TokenKind::Attribute,
            ) => LabelRole::Declaration,
            _ => LabelRole::Standalone,
        };
        Some(role)
    }
}

/// `Method` part of a `Class.Method` label
fn method_name(label: &str) -> Option<&str> {
    label.rsplit_once('.').map(|(_, method)| method)
}

fn split_lines(source: &str) -> Vec<String> {
    source
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}
