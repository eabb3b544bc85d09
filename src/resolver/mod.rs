// src/resolver/mod.rs
//
// Rebuilds the text an entity span covers from the tokens around it. Entity
// offsets come from a different recognizer than the tokens, so a span can
// start or end in the middle of a token; the resolver walks left to the
// token that covers the span start, stitches tokens rightwards until the
// span end, then cuts the overhang off both edges.

use log::trace;
use thiserror::Error;

use crate::index::TokenIndex;
use crate::types::Offset;
pub use crate::config::subsystems::resolver::ResolverConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpanError {
    #[error("span [{start}, {end}) is empty or inverted")]
    InvalidSpan { start: Offset, end: Offset },

    #[error("no token covers offset {start}: walked back to the document start")]
    RanOffDocumentStart { start: Offset },

    #[error("no token covers offset {start} within {limit} characters to its left")]
    WalkBackExhausted { start: Offset, limit: u64 },

    #[error("token at offset {start} has no text")]
    MissingTokenText { start: Offset },

    #[error("token at offset {start} has {actual} characters but {required} must be cut from it")]
    TextShorterThanToken { start: Offset, required: u64, actual: u64 },

    #[error("span [{start}, {end}) needed more than {limit} resolution steps")]
    StepLimitExceeded { start: Offset, end: Offset, limit: usize },
}

pub type Result<T> = std::result::Result<T, SpanError>;

/// Label reconstruction over one document's token index.
#[derive(Debug, Clone)]
pub struct SpanResolver<'a> {
    index: &'a TokenIndex,
    config: ResolverConfig,
}

impl<'a> SpanResolver<'a> {
    pub fn new(index: &'a TokenIndex, config: ResolverConfig) -> Self {
        Self { index, config }
    }

    /// Returns the document text covered by `[start, end)`.
    ///
    /// Tokens separated by a gap are joined with a single space whatever the
    /// gap width was; adjacent tokens are joined directly. A span edge that
    /// falls inside a gap contributes that single space.
    pub fn resolve(&self, start: Offset, end: Offset) -> Result<String> {
        if end <= start {
            return Err(SpanError::InvalidSpan { start, end });
        }

        let mut label = String::new();
        let mut cursor = start;
        // Characters of the first token left of `start`
        let mut trim: u64 = 0;
        let mut first_start = start;
        let mut stitching = false;
        let mut separated = false;
        let mut steps = 0usize;

        loop {
            steps += 1;
            if steps > self.config.max_steps {
                return Err(SpanError::StepLimitExceeded { start, end, limit: self.config.max_steps });
            }

            if stitching && cursor >= end {
                // The span ends inside a gap
                if separated {
                    label.push(' ');
                }
                break;
            }

            let token = match self.index.get(cursor) {
                Some(token) => token,
                None if !stitching => {
                    // The span starts inside a token that begins further left
                    if cursor == 0 {
                        return Err(SpanError::RanOffDocumentStart { start });
                    }
                    if start - cursor >= self.config.max_walk_back {
                        return Err(SpanError::WalkBackExhausted { start, limit: self.config.max_walk_back });
                    }
                    cursor -= 1;
                    trace!("No token at {}, walking back", cursor + 1);
                    continue;
                }
                None => {
                    cursor += 1;
                    separated = true;
                    continue;
                }
            };

            if !stitching && token.end <= start {
                // Walked back past the previous token: the span starts in a gap
                trace!("Span start {} lies in the gap after [{}, {})", start, token.start, token.end);
                stitching = true;
                separated = true;
                cursor = start;
                continue;
            }

            let text = token.text.as_deref()
                .ok_or(SpanError::MissingTokenText { start: token.start })?;
            let text_chars = text.chars().count() as u64;

            if !stitching {
                trim = start - token.start;
                first_start = token.start;
                if trim > text_chars {
                    return Err(SpanError::TextShorterThanToken {
                        start: token.start,
                        required: trim,
                        actual: text_chars,
                    });
                }
            }

            if separated {
                label.push(' ');
            }
            label.push_str(text);
            stitching = true;
            separated = false;

            trace!("Stitched token [{}, {}) {:?} -> {:?}", token.start, token.end, text, label);

            if token.end > end {
                let overhang = token.end - end;
                if overhang > text_chars {
                    return Err(SpanError::TextShorterThanToken {
                        start: token.start,
                        required: overhang,
                        actual: text_chars,
                    });
                }
                truncate_chars(&mut label, overhang);
                break;
            }
            if token.end == end {
                break;
            }
            cursor = token.end;
        }

        if trim > 0 {
            let label_chars = label.chars().count() as u64;
            if trim >= label_chars {
                return Err(SpanError::TextShorterThanToken {
                    start: first_start,
                    required: trim + 1,
                    actual: label_chars,
                });
            }
            // trim never exceeds a char count, so it fits in usize
            label = label.chars().skip(trim as usize).collect();
        }

        Ok(label)
    }
}

/// Drops the last `count` characters of `label`.
fn truncate_chars(label: &mut String, count: u64) {
    let total = label.chars().count() as u64;
    let keep = total.saturating_sub(count) as usize;
    let byte_end = label.char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(label.len());
    label.truncate(byte_end);
}

/// One-shot helper with default limits.
pub fn resolve_label(index: &TokenIndex, start: Offset, end: Offset) -> Result<String> {
    SpanResolver::new(index, ResolverConfig::default()).resolve(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Token;

    fn index(tokens: &[(Offset, Offset, &str)]) -> TokenIndex {
        TokenIndex::build(tokens.iter().map(|&(s, e, t)| Token::new(s, e, t)))
    }

    fn homo_sapiens() -> TokenIndex {
        // "Homo sapiens is"
        index(&[(0, 4, "Homo"), (5, 12, "sapiens"), (13, 15, "is")])
    }

    #[test]
    fn single_token_span() {
        let index = index(&[(0, 6, "canine")]);
        assert_eq!(resolve_label(&index, 0, 6).unwrap(), "canine");
    }

    #[test]
    fn gap_separated_tokens_join_with_single_space() {
        assert_eq!(resolve_label(&homo_sapiens(), 0, 12).unwrap(), "Homo sapiens");
        assert_eq!(resolve_label(&homo_sapiens(), 0, 15).unwrap(), "Homo sapiens is");
    }

    #[test]
    fn wide_gaps_still_join_with_single_space() {
        let index = index(&[(0, 4, "Homo"), (7, 14, "sapiens")]);
        assert_eq!(resolve_label(&index, 0, 14).unwrap(), "Homo sapiens");
    }

    #[test]
    fn adjacent_tokens_join_without_space() {
        // "Mus -domesticus"
        let index = index(&[(0, 3, "Mus"), (4, 5, "-"), (5, 15, "domesticus")]);
        assert_eq!(resolve_label(&index, 0, 15).unwrap(), "Mus -domesticus");
        assert_eq!(resolve_label(&index, 4, 15).unwrap(), "-domesticus");
    }

    #[test]
    fn right_edge_inside_token_is_truncated() {
        let index = index(&[(0, 10, "domesticus")]);
        assert_eq!(resolve_label(&index, 0, 6).unwrap(), "domest");
        assert_eq!(resolve_label(&homo_sapiens(), 0, 9).unwrap(), "Homo sapi");
    }

    #[test]
    fn left_edge_inside_token_is_trimmed() {
        let index = index(&[(0, 10, "domesticus")]);
        assert_eq!(resolve_label(&index, 3, 10).unwrap(), "esticus");
        assert_eq!(resolve_label(&homo_sapiens(), 2, 12).unwrap(), "mo sapiens");
    }

    #[test]
    fn both_edges_inside_one_token() {
        let index = index(&[(0, 10, "domesticus")]);
        assert_eq!(resolve_label(&index, 3, 6).unwrap(), "est");
    }

    #[test]
    fn left_trim_applies_to_leftmost_edge_across_adjacent_tokens() {
        let index = index(&[(0, 3, "Mus"), (3, 4, "-")]);
        assert_eq!(resolve_label(&index, 1, 4).unwrap(), "us-");
    }

    #[test]
    fn span_starting_in_a_gap_keeps_the_separator() {
        assert_eq!(resolve_label(&homo_sapiens(), 4, 12).unwrap(), " sapiens");
    }

    #[test]
    fn span_ending_in_a_gap_keeps_the_separator() {
        assert_eq!(resolve_label(&homo_sapiens(), 0, 5).unwrap(), "Homo ");
    }

    #[test]
    fn multibyte_text_is_cut_by_characters() {
        // offsets count characters, not bytes
        let index = index(&[(0, 5, "Ñandú"), (6, 11, "común")]);
        assert_eq!(resolve_label(&index, 1, 10).unwrap(), "andú comú");
    }

    #[test]
    fn empty_or_inverted_span_is_rejected() {
        assert_eq!(
            resolve_label(&homo_sapiens(), 4, 4).unwrap_err(),
            SpanError::InvalidSpan { start: 4, end: 4 }
        );
        assert!(matches!(resolve_label(&homo_sapiens(), 5, 2), Err(SpanError::InvalidSpan { .. })));
    }

    #[test]
    fn walking_off_the_document_start_fails() {
        let index = index(&[(5, 12, "sapiens")]);
        assert_eq!(
            resolve_label(&index, 3, 12).unwrap_err(),
            SpanError::RanOffDocumentStart { start: 3 }
        );
    }

    #[test]
    fn walk_back_is_bounded() {
        let index = index(&[(0, 40, "a_very_long_token_without_any_separator!")]);
        let config = ResolverConfig { max_walk_back: 8, ..ResolverConfig::default() };
        let resolver = SpanResolver::new(&index, config);
        assert_eq!(
            resolver.resolve(20, 30).unwrap_err(),
            SpanError::WalkBackExhausted { start: 20, limit: 8 }
        );
    }

    #[test]
    fn span_ending_past_the_last_token_ends_at_the_separator() {
        let index = index(&[(0, 4, "Homo")]);
        assert_eq!(resolve_label(&index, 0, 8).unwrap(), "Homo ");
    }

    #[test]
    fn span_starting_in_a_wide_gap_keeps_the_next_token_whole() {
        // "Homo   sapiens"
        let index = index(&[(0, 4, "Homo"), (7, 14, "sapiens")]);
        assert_eq!(resolve_label(&index, 6, 14).unwrap(), " sapiens");
        assert_eq!(resolve_label(&index, 4, 14).unwrap(), " sapiens");
        assert_eq!(resolve_label(&index, 2, 14).unwrap(), "mo sapiens");
    }

    #[test]
    fn span_ending_in_a_wide_gap_ends_at_the_separator() {
        let index = index(&[(0, 4, "Homo"), (7, 14, "sapiens")]);
        assert_eq!(resolve_label(&index, 0, 5).unwrap(), "Homo ");
        assert_eq!(resolve_label(&index, 0, 7).unwrap(), "Homo ");
        assert_eq!(resolve_label(&index, 5, 6).unwrap(), " ");
    }

    #[test]
    fn offsets_at_the_top_of_the_range() {
        let max = u64::MAX;
        // "Canis lupus" ending at u64::MAX
        let index = index(&[(max - 11, max - 6, "Canis"), (max - 5, max, "lupus")]);
        assert_eq!(resolve_label(&index, max - 11, max).unwrap(), "Canis lupus");
        assert_eq!(resolve_label(&index, max - 9, max).unwrap(), "nis lupus");
        assert_eq!(resolve_label(&index, max - 6, max).unwrap(), " lupus");
        assert_eq!(resolve_label(&index, max - 5, max - 1).unwrap(), "lupu");
    }

    #[test]
    fn token_without_text_fails() {
        let index = TokenIndex::build(vec![Token::without_text(0, 6)]);
        assert_eq!(resolve_label(&index, 0, 6).unwrap_err(), SpanError::MissingTokenText { start: 0 });
    }

    #[test]
    fn text_shorter_than_offsets_fails() {
        let index = index(&[(0, 10, "abc")]);
        assert!(matches!(resolve_label(&index, 0, 5), Err(SpanError::TextShorterThanToken { .. })));
        assert!(matches!(resolve_label(&index, 5, 10), Err(SpanError::TextShorterThanToken { .. })));
    }

    #[test]
    fn step_limit_stops_pathological_spans() {
        let tokens: Vec<(Offset, Offset, String)> = (0..50).map(|i| (i * 2, i * 2 + 1, "x".to_string())).collect();
        let index = TokenIndex::build(tokens.iter().map(|(s, e, t)| Token::new(*s, *e, t.as_str())));
        let config = ResolverConfig { max_steps: 10, ..ResolverConfig::default() };
        let resolver = SpanResolver::new(&index, config);
        assert!(matches!(resolver.resolve(0, 99), Err(SpanError::StepLimitExceeded { limit: 10, .. })));
        assert_eq!(SpanResolver::new(&index, ResolverConfig::default()).resolve(0, 5).unwrap(), "x x x");
    }
}
