//! Whole-file pass over the raw token list
//!
//! - `name(args)` call forms are split into a head, delimiters and one
//!   Variable per argument, each at its own column.
//! - A Structure keyword right after `(` is a parameter, not an opener.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::ir::token::{Token, TokenKind};

use super::patterns::PROPERTY_HEADS;

static CALL_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(\s*)\((.*)\)$").expect("valid regex"));

pub fn post_process(raw: Vec<Token>) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(raw.len());
    for token in raw {
        match token.kind {
            TokenKind::FunctionArgumentParameter | TokenKind::TypeAnnotation => {
                split_call_form(token, &mut tokens);
            }
            TokenKind::Structure => {
                let after_paren = tokens
                    .last()
                    .is_some_and(|prev: &Token| prev.kind == TokenKind::Delimiter && prev.text == "(");
                if after_paren {
                    trace!("Reclassified '{}' at line {} as parameter", token.text, token.line);
                    tokens.push(Token {
                        kind: TokenKind::FunctionArgumentParameter,
                        ..token
                    });
                } else {
                    tokens.push(token);
                }
            }
            _ => tokens.push(token),
        }
    }
    tokens
}

fn split_call_form(token: Token, out: &mut Vec<Token>) {
    let Some(caps) = CALL_FORM.captures(&token.text) else {
        out.push(token);
        return;
    };
    let head = &caps[1];
    let gap = caps[2].chars().count();
    let args = &caps[3];
    if args.contains('(') {
        out.push(token);
        return;
    }

    let head_kind = if PROPERTY_HEADS.iter().any(|p| head.eq_ignore_ascii_case(p)) {
        TokenKind::Property
    } else {
        TokenKind::Function
    };
    trace!("Split call form '{}' at line {}", token.text, token.line);

    let line = token.line;
    let mut column = token.column;
    out.push(Token::new(head_kind, head, line, column));
    column += head.chars().count() + gap;
    out.push(Token::new(TokenKind::Delimiter, "(", line, column));
    column += 1;

    for (index, arg) in split_arguments(args).into_iter().enumerate() {
        if index > 0 {
            out.push(Token::new(TokenKind::Delimiter, ",", line, column));
            column += 1;
        }
        let leading = arg.chars().take_while(|c| c.is_whitespace()).count();
        let trimmed = arg.trim();
        if !trimmed.is_empty() {
            out.push(Token::new(TokenKind::Variable, trimmed, line, column + leading));
        }
        column += arg.chars().count();
    }

    out.push(Token::new(TokenKind::Delimiter, ")", line, column));
}

/// Splits on commas outside single-quoted strings
fn split_arguments(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_string = false;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        match c {
            '\'' => in_string = !in_string,
            ',' if !in_string => {
                parts.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::clarion::lexer::Lexer;

    fn lex(text: &str) -> Vec<Token> {
        post_process(Lexer::new().scan(text))
    }

    #[test]
    fn test_pre_head_becomes_property() {
        let tokens = lex("Cust QUEUE,PRE(Cus)");
        let pre = tokens.iter().find(|t| t.text == "PRE").expect("PRE token");
        assert_eq!(pre.kind, TokenKind::Property);
        let arg = tokens.iter().find(|t| t.text == "Cus").expect("argument");
        assert_eq!(arg.kind, TokenKind::Variable);
        assert_eq!(arg.column, 15);
    }

    #[test]
    fn test_arguments_keep_their_columns() {
        let tokens = lex("  MESSAGE('a, b',  Title)");
        let texts: Vec<(&str, TokenKind, usize)> =
            tokens.iter().map(|t| (t.text.as_str(), t.kind, t.column)).collect();
        assert_eq!(
            texts,
            vec![
                ("MESSAGE", TokenKind::Function, 2),
                ("(", TokenKind::Delimiter, 9),
                ("'a, b'", TokenKind::Variable, 10),
                (",", TokenKind::Delimiter, 16),
                ("Title", TokenKind::Variable, 19),
                (")", TokenKind::Delimiter, 24),
            ]
        );
    }

    #[test]
    fn test_empty_argument_list() {
        let tokens = lex("  Refresh()");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Refresh", "(", ")"]);
    }

    #[test]
    fn test_structure_after_paren_is_parameter() {
        let tokens = lex("Show PROCEDURE(WINDOW w)");
        let window = tokens.iter().find(|t| t.text == "WINDOW").expect("WINDOW");
        assert_eq!(window.kind, TokenKind::FunctionArgumentParameter);
    }

    #[test]
    fn test_type_annotation_without_call_is_kept() {
        let tokens = lex("Fill PROCEDURE(LONG n, QUEUE q)");
        let annotation = tokens.iter().find(|t| t.kind == TokenKind::TypeAnnotation).expect("annotation");
        assert_eq!(annotation.text, "QUEUE q)");
    }
}
