pub mod config;
pub mod document_cache;
pub mod ir;
pub mod logging;
pub mod lsp;
pub mod parsers;
pub mod project;

use ir::token_stream::TokenStream;

/// Lexes and enriches one source file.
///
/// Pure and deterministic: the same text always yields an equal stream.
pub fn tokenize(text: &str) -> TokenStream {
    TokenStream::new(ir::transforms::enrich(parsers::tokenize_raw(text)), text)
}
