//! Line scanner
//!
//! Turns source text into raw tokens, one line at a time. Columns are
//! reported in characters; the scanner itself walks byte offsets and converts
//! when emitting.

use tracing::trace;

use crate::ir::token::{Token, TokenKind};

use super::patterns::PATTERNS;

#[derive(Debug, Default)]
pub struct Lexer {
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans every line of `text` and returns the raw token list, before
    /// call-form splitting.
    pub fn scan(mut self, text: &str) -> Vec<Token> {
        for (line_number, raw_line) in text.split('\n').enumerate() {
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            self.scan_line(line, line_number);
        }
        trace!("Scanned {} raw tokens", self.tokens.len());
        self.tokens
    }

    fn scan_line(&mut self, line: &str, line_number: usize) {
        if line.trim().is_empty() {
            return;
        }

        let mut pos = 0;
        if let Some(label) = column_zero_label(line) {
            self.push(TokenKind::Label, label, line, line_number, 0);
            // label plus the single whitespace character that ends it
            pos = label.len() + line[label.len()..].chars().next().map_or(0, char::len_utf8);
        }

        while pos < line.len() {
            let Some(c) = line[pos..].chars().next() else {
                break;
            };
            if c.is_whitespace() {
                pos += c.len_utf8();
                continue;
            }

            let matched = PATTERNS
                .iter()
                .find_map(|pattern| pattern.match_at(line, pos).map(|len| (pattern.kind, len)));

            let (kind, len) = matched.unwrap_or((TokenKind::Unknown, c.len_utf8()));
            self.push(kind, &line[pos..pos + len], line, line_number, pos);
            pos += len;
        }
    }

    fn push(&mut self, kind: TokenKind, text: &str, line: &str, line_number: usize, byte_offset: usize) {
        let column = line[..byte_offset].chars().count();
        self.tokens.push(Token::new(kind, text, line_number, column));
    }
}

/// First word of a line that starts in column 0, when whitespace follows it.
/// Comment lines never carry a label.
fn column_zero_label(line: &str) -> Option<&str> {
    let first = line.chars().next()?;
    if first.is_whitespace() || first == '!' {
        return None;
    }
    let end = line.find(char::is_whitespace)?;
    Some(&line[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(TokenKind, String)> {
        Lexer::new()
            .scan(text)
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_label_at_column_zero() {
        let tokens = Lexer::new().scan("CustomerQueue QUEUE");
        assert_eq!(tokens[0].kind, TokenKind::Label);
        assert_eq!(tokens[0].text, "CustomerQueue");
        assert_eq!(tokens[0].column, 0);
        assert_eq!(tokens[1].kind, TokenKind::Structure);
        assert_eq!(tokens[1].column, 14);
    }

    #[test]
    fn test_no_label_without_trailing_whitespace() {
        assert_eq!(kinds("Done"), vec![(TokenKind::Variable, "Done".to_string())]);
    }

    #[test]
    fn test_comment_line_has_no_label() {
        assert_eq!(kinds("! a remark"), vec![(TokenKind::Comment, "! a remark".to_string())]);
    }

    #[test]
    fn test_blank_lines_emit_nothing() {
        assert!(Lexer::new().scan("   \n\t\n").is_empty());
    }

    #[test]
    fn test_trailing_comment_and_continuation() {
        let tokens = kinds("  x = 1 | \n  ! note");
        assert_eq!(tokens[0], (TokenKind::Variable, "x".to_string()));
        assert_eq!(tokens[3], (TokenKind::LineContinuation, "| ".to_string()));
        assert_eq!(tokens[4], (TokenKind::Comment, "! note".to_string()));
    }

    #[test]
    fn test_columns_are_characters() {
        let tokens = Lexer::new().scan("  s = 'Größe' + x");
        let x = tokens.last().expect("token");
        assert_eq!(x.text, "x");
        assert_eq!(x.column, 16);
    }

    #[test]
    fn test_crlf_line_endings() {
        let tokens = Lexer::new().scan("Main PROCEDURE\r\n  CODE\r\n");
        assert_eq!(tokens[1].text, "PROCEDURE");
        assert_eq!(tokens[2].line, 1);
        assert_eq!(tokens[2].text, "CODE");
    }
}
