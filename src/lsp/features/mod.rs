//! Editor features computed from an enriched token stream

pub mod document_links;
pub mod document_symbols;
pub mod folding_ranges;

pub use document_links::document_links;
pub use document_symbols::document_symbols;
pub use folding_ranges::folding_ranges;
