//! Token enrichment
//!
//! Second pass over the lexed tokens. Computes the metadata definition
//! resolution depends on:
//!
//! 1. `scope_enricher::scope_candidates` finds column-0 labels declared as
//!    `PROCEDURE`, `FUNCTION` or `ROUTINE`.
//! 2. `structure_enricher` tracks structure bodies, promotes field labels,
//!    attaches prefixes, and filters out candidates that are prototypes.
//! 3. `scope_enricher::assign_scopes` stamps the scope ranges.
//!
//! The pass is total and deterministic. Derived fields are written once.

pub mod scope_enricher;
pub mod structure_enricher;

use tracing::debug;

use crate::ir::token::Token;

pub fn enrich(mut tokens: Vec<Token>) -> Vec<Token> {
    let candidates = scope_enricher::scope_candidates(&tokens);
    let openers = structure_enricher::enrich_structures(&mut tokens, &candidates);
    scope_enricher::assign_scopes(&mut tokens, &openers);
    debug!(
        "Enriched {} tokens: {} scopes ({} prototype candidates skipped)",
        tokens.len(),
        openers.len(),
        candidates.len() - openers.len()
    );
    tokens
}
