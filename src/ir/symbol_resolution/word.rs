//! Word extraction around a cursor

use crate::ir::token_stream::TokenStream;

/// A word on one line, columns in characters (`end` exclusive)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_file_char(c: char) -> bool {
    is_identifier_char(c) || matches!(c, '.' | '-' | '\\' | '/')
}

/// Identifier under the cursor. A cursor just past the last character still
/// selects the word.
pub fn word_at(stream: &TokenStream, line: usize, character: usize) -> Option<Word> {
    word_matching(stream, line, character, is_identifier_char)
}

/// File-name-like word under the cursor (`..\libsrc\Keys.inc`)
pub fn file_word_at(stream: &TokenStream, line: usize, character: usize) -> Option<Word> {
    let word = word_matching(stream, line, character, is_file_char)?;
    let text = word.text.trim_end_matches('.');
    if text.is_empty() {
        return None;
    }
    Some(Word {
        end: word.start + text.chars().count(),
        text: text.to_string(),
        ..word
    })
}

fn word_matching(stream: &TokenStream, line: usize, character: usize, accept: fn(char) -> bool) -> Option<Word> {
    let chars: Vec<char> = stream.line_text(line)?.chars().collect();
    let anchor = if chars.get(character).copied().is_some_and(accept) {
        character
    } else if character > 0 && chars.get(character - 1).copied().is_some_and(accept) {
        character - 1
    } else {
        return None;
    };

    let mut start = anchor;
    while start > 0 && accept(chars[start - 1]) {
        start -= 1;
    }
    let mut end = anchor + 1;
    while end < chars.len() && accept(chars[end]) {
        end += 1;
    }

    Some(Word {
        text: chars[start..end].iter().collect(),
        line,
        start,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(text: &str) -> TokenStream {
        crate::tokenize(text)
    }

    #[test]
    fn test_word_at_cursor_positions() {
        let s = stream("  Cus:Name = Queue.Total\n");
        assert_eq!(word_at(&s, 0, 6).map(|w| w.text), Some("Name".to_string()));
        assert_eq!(word_at(&s, 0, 10).map(|w| w.text), Some("Name".to_string()));
        assert_eq!(word_at(&s, 0, 2).map(|w| w.text), Some("Cus".to_string()));
        let total = word_at(&s, 0, 20).expect("word");
        assert_eq!((total.text.as_str(), total.start, total.end), ("Total", 19, 24));
        assert_eq!(word_at(&s, 0, 0), None);
        assert_eq!(word_at(&s, 5, 0), None);
    }

    #[test]
    fn test_file_word_spans_path_characters() {
        let s = stream("  INCLUDE('..\\libsrc\\Keys.inc'),ONCE\n");
        let word = file_word_at(&s, 0, 24).expect("file word");
        assert_eq!(word.text, "..\\libsrc\\Keys.inc");
        assert_eq!(word.start, 11);
    }

    #[test]
    fn test_file_word_drops_trailing_dot() {
        let s = stream("  MEMBER('Main.clw').\n");
        assert_eq!(file_word_at(&s, 0, 11).map(|w| w.text), Some("Main.clw".to_string()));
        let s = stream("  X = Y.\n");
        assert_eq!(file_word_at(&s, 0, 6).map(|w| w.text), Some("Y".to_string()));
    }
}
