//! File-level directives: `INCLUDE`, `MEMBER` and `MODULE`
//!
//! The lexer classifies the directive head differently depending on context
//! (a split call head, a `MODULE` structure keyword, or part of a column-0
//! label when the directive starts the line). Extraction anchors on the head
//! token and reads the quoted arguments from the line text.
//!
//! A directive whose arguments are not properly quoted is skipped; the rest
//! of the file is unaffected.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use super::token::TokenKind;
use super::token_stream::TokenStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `INCLUDE('file'[, 'section'])`
    Include,
    /// `MEMBER('module')`, this file belongs to a program module
    Member,
    /// `MODULE('file')` inside a MAP or on a CLASS
    Module,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Referenced file name, unquoted
    pub file: String,
    /// Section name of a sectioned `INCLUDE`
    pub section: Option<String>,
    pub line: usize,
    /// Character columns of the file name inside its quotes
    pub start_column: usize,
    pub end_column: usize,
}

static DIRECTIVE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(INCLUDE|MEMBER|MODULE)\s*\(\s*'((?:[^']|'')*)'\s*(?:,\s*'((?:[^']|'')*)'\s*)?\)")
        .expect("valid regex")
});

const HEADS: &[(&str, DirectiveKind)] = &[
    ("INCLUDE", DirectiveKind::Include),
    ("MEMBER", DirectiveKind::Member),
    ("MODULE", DirectiveKind::Module),
];

/// All well-formed directives of the stream, in file order
pub fn extract_directives(stream: &TokenStream) -> Vec<Directive> {
    let mut directives = Vec::new();
    for (_, token) in stream.iter() {
        let head_matches = match token.kind {
            TokenKind::Function
            | TokenKind::Directive
            | TokenKind::Structure
            | TokenKind::Attribute
            | TokenKind::Variable => HEADS.iter().any(|(head, _)| token.text_eq(head)),
            TokenKind::Label => HEADS.iter().any(|(head, _)| starts_with_ignore_case(&token.text, head)),
            _ => false,
        };
        if !head_matches {
            continue;
        }
        let Some(line) = stream.line_text(token.line) else {
            continue;
        };
        let Some(offset) = line.char_indices().nth(token.column).map(|(byte, _)| byte) else {
            continue;
        };
        match parse_call(&line[offset..]) {
            Some((kind, file, section, start, end)) => {
                let prefix_chars = line[..offset].chars().count();
                directives.push(Directive {
                    kind,
                    file,
                    section,
                    line: token.line,
                    start_column: prefix_chars + start,
                    end_column: prefix_chars + end,
                });
            }
            None => trace!("Skipping malformed directive at line {}", token.line),
        }
    }
    directives
}

/// Directives of one kind, in file order
pub fn directives_of(stream: &TokenStream, kind: DirectiveKind) -> Vec<Directive> {
    extract_directives(stream)
        .into_iter()
        .filter(|d| d.kind == kind)
        .collect()
}

/// Module named by the file's `MEMBER` directive
pub fn member_module(stream: &TokenStream) -> Option<String> {
    directives_of(stream, DirectiveKind::Member)
        .into_iter()
        .map(|d| d.file)
        .find(|f| !f.trim().is_empty())
}

fn parse_call(text: &str) -> Option<(DirectiveKind, String, Option<String>, usize, usize)> {
    let caps = DIRECTIVE_CALL.captures(text)?;
    let head = caps.get(1)?.as_str();
    let kind = HEADS
        .iter()
        .find(|(name, _)| head.eq_ignore_ascii_case(name))
        .map(|(_, kind)| *kind)?;
    let file_match = caps.get(2)?;
    let file = unquote(file_match.as_str());
    if file.trim().is_empty() {
        return None;
    }
    let section = caps.get(3).map(|m| unquote(m.as_str()));
    let start = text[..file_match.start()].chars().count();
    let end = start + file_match.as_str().chars().count();
    Some((kind, file, section, start, end))
}

fn unquote(text: &str) -> String {
    text.replace("''", "'")
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
