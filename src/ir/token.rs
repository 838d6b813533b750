//! Classified lexemes of a Clarion source file
//!
//! A [`Token`] starts life as a plain lexeme (kind, text, position) produced by
//! the lexer. The enricher later fills in the derived fields (scope metadata,
//! structure prefixes and field back-references) exactly once; after that the
//! token is never mutated.
//!
//! Back-references between tokens are [`TokenId`]s, i.e. indices into the
//! owning [`TokenStream`](super::token_stream::TokenStream).

use std::fmt;

/// Index of a token inside its owning stream
pub type TokenId = usize;

/// Lexical class of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    Comment,
    String,
    Keyword,
    Directive,
    Function,
    Variable,
    Number,
    Operator,
    Label,
    Class,
    Attribute,
    Property,
    Constant,
    Type,
    TypeAnnotation,
    ImplicitVariable,
    Structure,
    LineContinuation,
    Delimiter,
    FunctionArgumentParameter,
    PointerParameter,
    FieldEquateLabel,
    PropertyFunction,
    Unknown,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Comment => "Comment",
            TokenKind::String => "String",
            TokenKind::Keyword => "Keyword",
            TokenKind::Directive => "Directive",
            TokenKind::Function => "Function",
            TokenKind::Variable => "Variable",
            TokenKind::Number => "Number",
            TokenKind::Operator => "Operator",
            TokenKind::Label => "Label",
            TokenKind::Class => "Class",
            TokenKind::Attribute => "Attribute",
            TokenKind::Property => "Property",
            TokenKind::Constant => "Constant",
            TokenKind::Type => "Type",
            TokenKind::TypeAnnotation => "TypeAnnotation",
            TokenKind::ImplicitVariable => "ImplicitVariable",
            TokenKind::Structure => "Structure",
            TokenKind::LineContinuation => "LineContinuation",
            TokenKind::Delimiter => "Delimiter",
            TokenKind::FunctionArgumentParameter => "FunctionArgumentParameter",
            TokenKind::PointerParameter => "PointerParameter",
            TokenKind::FieldEquateLabel => "FieldEquateLabel",
            TokenKind::PropertyFunction => "PropertyFunction",
            TokenKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of lexical scope opened by a declaration label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// `Name PROCEDURE` / `Name FUNCTION`
    Procedure,
    /// `Name ROUTINE`, local to the enclosing procedure
    Routine,
    /// `Class.Method PROCEDURE`, a class method implementation
    Class,
}

/// A classified lexeme plus the metadata computed by the enricher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source substring
    pub text: String,
    /// 0-based line
    pub line: usize,
    /// 0-based column, in characters
    pub column: usize,

    /// Set on labels that open a procedure, routine or method scope
    pub scope_kind: Option<ScopeKind>,
    /// Last line (inclusive) covered by this token's scope or structure body.
    /// `None` on a scope opener means the scope runs to end of file.
    pub scope_end: Option<usize>,
    /// Field-access prefix exposed by a Structure token (`PRE(Cus)`)
    pub structure_prefix: Option<String>,
    /// True for a Label declared inside a structure's field list
    pub is_structure_field: bool,
    /// Field label -> owning Label of the enclosing structure
    pub structure_parent: Option<TokenId>,
    /// Structure token -> owning Label; field label -> enclosing Structure token
    pub parent: Option<TokenId>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
            scope_kind: None,
            scope_end: None,
            structure_prefix: None,
            is_structure_field: false,
            structure_parent: None,
            parent: None,
        }
    }

    /// Column one past the last character of the token
    pub fn end_column(&self) -> usize {
        self.column + self.text.chars().count()
    }

    /// Case-insensitive comparison against the token text
    pub fn text_eq(&self, other: &str) -> bool {
        self.text.eq_ignore_ascii_case(other)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text_eq(word)
    }

    /// True when `(line, character)` touches the token, including the
    /// position just past its last character.
    pub fn touches(&self, line: usize, character: usize) -> bool {
        self.line == line && character >= self.column && character <= self.end_column()
    }

    /// Label that opens a procedure, routine or method scope
    pub fn is_scope_opener(&self) -> bool {
        self.kind == TokenKind::Label && self.scope_kind.is_some()
    }

    /// Whether `line` lies between this token's line and its `scope_end`.
    pub fn covers_line(&self, line: usize) -> bool {
        line >= self.line && self.scope_end.is_none_or(|end| line <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_has_no_enrichment() {
        let token = Token::new(TokenKind::Label, "Init", 3, 0);
        assert_eq!(token.scope_kind, None);
        assert_eq!(token.scope_end, None);
        assert!(!token.is_structure_field);
        assert!(!token.is_scope_opener());
    }

    #[test]
    fn test_end_column_counts_characters() {
        let token = Token::new(TokenKind::String, "'Größe'", 0, 4);
        assert_eq!(token.end_column(), 11);
    }

    #[test]
    fn test_touches_includes_trailing_edge() {
        let token = Token::new(TokenKind::Variable, "Name", 2, 6);
        assert!(token.touches(2, 6));
        assert!(token.touches(2, 10));
        assert!(!token.touches(2, 11));
        assert!(!token.touches(3, 7));
    }

    #[test]
    fn test_covers_line_open_ended() {
        let mut token = Token::new(TokenKind::Label, "Main", 4, 0);
        token.scope_kind = Some(ScopeKind::Procedure);
        assert!(token.covers_line(400));
        token.scope_end = Some(9);
        assert!(token.covers_line(9));
        assert!(!token.covers_line(10));
        assert!(!token.covers_line(3));
    }
}
