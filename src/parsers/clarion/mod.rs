//! Clarion lexer
//!
//! # Architecture
//!
//! ```text
//! source text
//!     ↓  lexer::Lexer::scan       (column-0 labels + ordered patterns, per line)
//! raw tokens
//!     ↓  post_process             (call-form splitting, structure-as-parameter)
//! lexed tokens
//!     ↓  ir::transforms::enrich   (scopes, structures, fields, prefixes)
//! TokenStream
//! ```
//!
//! The lexer is total: every non-whitespace character of the input ends up in
//! exactly one token, and unrecognized characters become one-character
//! `Unknown` tokens.

pub mod lexer;
pub(crate) mod patterns;
pub mod post_process;

pub use lexer::Lexer;

use crate::ir::token::Token;

/// Lexes `text` into classified tokens without enrichment.
pub fn tokenize_raw(text: &str) -> Vec<Token> {
    post_process::post_process(Lexer::new().scan(text))
}
