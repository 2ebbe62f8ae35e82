//! Segmentation of normalized tokens into command groups.
//!
//! ## Algorithm
//!
//! Tokens are scanned left to right while identifier fragments accumulate
//! in a buffer:
//!
//! 1. A token containing a status variant closes the buffer into a
//!    `CommandGroup` with that status. An empty buffer drops the keyword.
//! 2. An identifier fragment (has a digit, is one character long, or its
//!    uppercase form prefixes a known order id) is buffered in uppercase.
//!    A numeric fragment following a bare letter is merged into it as
//!    `LETTER-DIGITS` ("a" "1017" → "A-1017").
//! 3. Anything else is noise.
//!
//! Identifiers left in the buffer at the end of the utterance are not
//! attached to any status and produce no group.

use serde::Serialize;

use crate::registry::OrderSummary;
use crate::vocab::{Status, StatusCatalog};

/// Identifiers spoken before one status keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandGroup {
    pub raw_ids: Vec<String>,
    pub status: Status,
}

/// Result of segmenting one utterance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    pub groups: Vec<CommandGroup>,
    /// Buffered identifiers never closed by a status keyword.
    pub leftover: Vec<String>,
    /// Tokens classified as neither keyword nor identifier.
    pub noise: Vec<String>,
    /// Status keywords seen with an empty identifier buffer.
    pub dropped_keywords: usize,
}

/// Segment normalized `tokens` against the status `catalog` and the current
/// registry `snapshot`.
pub fn segment<S: AsRef<str>>(
    tokens: &[S],
    catalog: &StatusCatalog,
    snapshot: &[OrderSummary],
) -> Segmentation {
    let mut out = Segmentation::default();
    let mut buffer: Vec<String> = Vec::new();

    for token in tokens {
        let token = token.as_ref();

        if let Some(status) = catalog.match_keyword(token) {
            if buffer.is_empty() {
                out.dropped_keywords += 1;
            } else {
                out.groups.push(CommandGroup {
                    raw_ids: std::mem::take(&mut buffer),
                    status,
                });
            }
            continue;
        }

        let upper = token.to_uppercase();
        if !is_identifier_fragment(token, &upper, snapshot) {
            out.noise.push(token.to_string());
            continue;
        }

        match buffer.last_mut() {
            Some(last) if is_bare_letter(last) && is_numeric(token) => {
                last.push('-');
                last.push_str(&upper);
            }
            _ => buffer.push(upper),
        }
    }

    out.leftover = buffer;
    out
}

fn is_identifier_fragment(token: &str, upper: &str, snapshot: &[OrderSummary]) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
        || token.chars().count() == 1
        || snapshot.iter().any(|order| order.id.starts_with(upper))
}

fn is_bare_letter(entry: &str) -> bool {
    let mut chars = entry.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if !c.is_ascii_digit())
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_transcript;
    use crate::vocab::{StatusEntry, Vocabulary};

    fn snapshot(ids: &[&str]) -> Vec<OrderSummary> {
        ids.iter()
            .map(|id| OrderSummary {
                id: id.to_string(),
                status: Status::Preparing,
            })
            .collect()
    }

    fn run(text: &str, ids: &[&str]) -> Segmentation {
        let vocab = Vocabulary::default();
        let tokens = normalize_transcript(text, &vocab);
        segment(&tokens, &vocab.statuses, &snapshot(ids))
    }

    #[test]
    fn letter_then_number_is_merged() {
        let seg = segment(&["a", "1017", "hazır"], &StatusCatalog::reference(), &[]);
        assert_eq!(
            seg.groups,
            vec![CommandGroup {
                raw_ids: vec!["A-1017".into()],
                status: Status::Prepared,
            }]
        );
    }

    #[test]
    fn spoken_place_word_merges_with_number() {
        let seg = run("ankara 1017 teslim", &[]);
        assert_eq!(seg.groups.len(), 1);
        assert_eq!(seg.groups[0].raw_ids, vec!["A-1017"]);
        assert_eq!(seg.groups[0].status, Status::Delivered);
    }

    #[test]
    fn multiple_groups_keep_keyword_order() {
        let seg = run("1001 1002 hazır 1003 teslim", &[]);
        assert_eq!(
            seg.groups,
            vec![
                CommandGroup {
                    raw_ids: vec!["1001".into(), "1002".into()],
                    status: Status::Prepared,
                },
                CommandGroup {
                    raw_ids: vec!["1003".into()],
                    status: Status::Delivered,
                },
            ]
        );
        assert!(seg.leftover.is_empty());
    }

    #[test]
    fn identifiers_without_keyword_produce_no_group() {
        let seg = run("1001 1002", &[]);
        assert!(seg.groups.is_empty());
        assert_eq!(seg.leftover, vec!["1001", "1002"]);
    }

    #[test]
    fn trailing_identifiers_after_last_keyword_are_dropped() {
        let seg = run("1001 hazır 1002 1003", &[]);
        assert_eq!(seg.groups.len(), 1);
        assert_eq!(seg.groups[0].raw_ids, vec!["1001"]);
        assert_eq!(seg.leftover, vec!["1002", "1003"]);
    }

    #[test]
    fn keyword_with_empty_buffer_is_dropped() {
        let seg = run("tamam 1001 hazır", &[]);
        assert_eq!(seg.dropped_keywords, 1);
        assert_eq!(seg.groups.len(), 1);
        assert_eq!(seg.groups[0].raw_ids, vec!["1001"]);
    }

    #[test]
    fn noise_words_are_discarded() {
        let seg = run("sipariş 1001 lütfen hazır", &[]);
        assert_eq!(seg.groups[0].raw_ids, vec!["1001"]);
        assert_eq!(seg.noise, vec!["sipariş", "lütfen"]);
    }

    #[test]
    fn known_id_prefix_makes_a_fragment() {
        let seg = run("kb 77 hazır", &["KB-77"]);
        assert_eq!(seg.groups[0].raw_ids, vec!["KB", "77"]);

        let seg = run("kb 77 hazır", &[]);
        assert_eq!(seg.groups[0].raw_ids, vec!["77"]);
        assert_eq!(seg.noise, vec!["kb"]);
    }

    #[test]
    fn letter_followed_by_letter_is_not_merged() {
        let seg = run("a b hazır", &[]);
        assert_eq!(seg.groups[0].raw_ids, vec!["A", "B"]);
    }

    #[test]
    fn digit_entry_is_not_a_merge_target() {
        let seg = run("5 1017 hazır", &[]);
        assert_eq!(seg.groups[0].raw_ids, vec!["5", "1017"]);
    }

    #[test]
    fn single_symbol_is_buffered_as_a_fragment() {
        let catalog = StatusCatalog::reference();
        let seg = segment(&["1001", "-", "hazır"], &catalog, &[]);
        assert_eq!(seg.groups[0].raw_ids, vec!["1001", "-"]);
        assert!(seg.noise.is_empty());

        // A one-character non-digit entry is a merge target.
        let seg = segment(&["?", "1017", "teslim"], &catalog, &[]);
        assert_eq!(seg.groups[0].raw_ids, vec!["?-1017"]);
    }

    #[test]
    fn turkish_letter_merges_with_number() {
        let seg = segment(&["ç", "1017", "hazır"], &StatusCatalog::reference(), &[]);
        assert_eq!(seg.groups[0].raw_ids, vec!["Ç-1017"]);
    }

    #[test]
    fn substring_match_accepts_inflected_words() {
        let seg = run("1001 hazırlanıyor", &[]);
        assert_eq!(seg.groups[0].status, Status::Prepared);
    }

    #[test]
    fn token_matching_both_statuses_resolves_to_first_entry() {
        let catalog = StatusCatalog::new(vec![
            StatusEntry::new(Status::Prepared, 30, "Hazır", &["x"]),
            StatusEntry::new(Status::Delivered, 40, "Teslim", &["x"]),
        ]);
        let seg = segment(&["1001", "xx"], &catalog, &[]);
        assert_eq!(seg.groups[0].status, Status::Prepared);
    }
}
