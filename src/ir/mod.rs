pub mod directives;
pub mod symbol_resolution;
pub mod token;
pub mod token_stream;
pub mod transforms;

pub use token::{ScopeKind, Token, TokenId, TokenKind};
pub use token_stream::{LabelRole, TokenStream};
