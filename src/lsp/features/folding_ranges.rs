//! Folding ranges from procedure/routine scopes and structure bodies

use tower_lsp::lsp_types::{FoldingRange, FoldingRangeKind};
use tracing::trace;

use crate::ir::token::TokenKind;
use crate::ir::token_stream::TokenStream;

pub fn folding_ranges(stream: &TokenStream) -> Vec<FoldingRange> {
    let last_line = last_content_line(stream);
    let mut ranges: Vec<FoldingRange> = stream
        .tokens()
        .iter()
        .filter_map(|token| {
            let end = if token.is_scope_opener() {
                token.scope_end.unwrap_or(last_line)
            } else if token.kind == TokenKind::Structure {
                token.scope_end?
            } else {
                return None;
            };
            (end > token.line).then(|| FoldingRange {
                start_line: token.line as u32,
                start_character: None,
                end_line: end as u32,
                end_character: None,
                kind: Some(FoldingRangeKind::Region),
                collapsed_text: None,
            })
        })
        .collect();

    ranges.sort_by_key(|r| (r.start_line, std::cmp::Reverse(r.end_line)));
    ranges.dedup_by_key(|r| r.start_line);
    trace!("Generated {} folding ranges", ranges.len());
    ranges
}

/// Last line holding anything but whitespace
fn last_content_line(stream: &TokenStream) -> usize {
    (0..stream.line_count())
        .rev()
        .find(|&line| stream.line_text(line).is_some_and(|t| !t.trim().is_empty()))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_scopes_and_structures_fold() {
        let stream = crate::tokenize(indoc! {"
            Main PROCEDURE
            Q      QUEUE
            A        LONG
                   END
              CODE
              IF A THEN
                A = 1
              END
        "});
        let spans: Vec<(u32, u32)> = folding_ranges(&stream).iter().map(|r| (r.start_line, r.end_line)).collect();
        assert_eq!(spans, vec![(0, 7), (1, 3), (5, 7)]);
    }

    #[test]
    fn test_single_line_structures_do_not_fold() {
        let stream = crate::tokenize("  IF x THEN y = 1.\n");
        assert!(folding_ranges(&stream).is_empty());
    }
}
