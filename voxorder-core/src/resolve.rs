//! Identifier resolution against the registry snapshot.
//!
//! Strategies are tried in order and the first registry hit wins:
//!
//! | # | Strategy | Example |
//! |---|----------|---------|
//! | 1 | exact | `A-1017` |
//! | 2 | first space → dash | `A 1017` → `A-1017` |
//! | 3 | dash between leading letters and digits | `A1017` → `A-1017` |
//!
//! Without a hit the id goes through [`fallback_id`], which may name an
//! order the registry does not know. The registry update reports that.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::registry::OrderSummary;

/// Which strategy produced a resolved id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    Exact,
    SpaceToDash,
    LetterDigitDash,
    /// No registry hit; best-effort normalization only.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub id: String,
    pub strategy: Strategy,
}

impl Resolution {
    /// Whether the id was confirmed against the snapshot.
    pub fn is_known(&self) -> bool {
        self.strategy != Strategy::Fallback
    }
}

fn letter_digit_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^([A-Za-z]+)(\d+)").ok())
        .as_ref()
}

/// `"A1017"` → `Some("A-1017")`. `None` when the id does not start with a
/// letter run immediately followed by a digit run.
pub fn insert_letter_digit_dash(raw: &str) -> Option<String> {
    let pattern = letter_digit_pattern()?;
    if !pattern.is_match(raw) {
        return None;
    }
    Some(pattern.replacen(raw, 1, "$1-$2").into_owned())
}

fn space_to_dash(raw: &str) -> Option<String> {
    raw.trim()
        .contains(' ')
        .then(|| raw.replacen(' ', "-", 1))
}

fn is_pure_number(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit())
}

/// Best-effort normalization used when no strategy hits the registry.
pub fn fallback_id(raw: &str) -> String {
    if raw.contains('-') || raw.chars().count() < 2 || is_pure_number(raw) {
        return raw.to_string();
    }
    insert_letter_digit_dash(raw).unwrap_or_else(|| raw.to_string())
}

/// Resolve one raw identifier against `snapshot`.
pub fn resolve(raw: &str, snapshot: &[OrderSummary]) -> Resolution {
    let known = |candidate: &str| snapshot.iter().any(|order| order.id == candidate);

    if known(raw) {
        return Resolution {
            id: raw.to_string(),
            strategy: Strategy::Exact,
        };
    }

    let candidates = [
        (Strategy::SpaceToDash, space_to_dash(raw)),
        (Strategy::LetterDigitDash, insert_letter_digit_dash(raw)),
    ];
    for (strategy, candidate) in candidates {
        if let Some(id) = candidate.filter(|c| known(c.as_str())) {
            return Resolution { id, strategy };
        }
    }

    Resolution {
        id: fallback_id(raw),
        strategy: Strategy::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::Status;

    fn snapshot(ids: &[&str]) -> Vec<OrderSummary> {
        ids.iter()
            .map(|id| OrderSummary {
                id: id.to_string(),
                status: Status::Preparing,
            })
            .collect()
    }

    #[test]
    fn exact_match_wins() {
        let snap = snapshot(&["1001", "A-1017"]);
        let r = resolve("A-1017", &snap);
        assert_eq!(r.id, "A-1017");
        assert_eq!(r.strategy, Strategy::Exact);
        assert!(r.is_known());
    }

    #[test]
    fn space_is_replaced_with_dash() {
        let snap = snapshot(&["A-1017"]);
        let r = resolve("A 1017", &snap);
        assert_eq!(r.id, "A-1017");
        assert_eq!(r.strategy, Strategy::SpaceToDash);
    }

    #[test]
    fn dash_is_inserted_between_letters_and_digits() {
        let snap = snapshot(&["A-1017"]);
        let r = resolve("A1017", &snap);
        assert_eq!(r.id, "A-1017");
        assert_eq!(r.strategy, Strategy::LetterDigitDash);
    }

    #[test]
    fn multi_letter_prefix_keeps_whole_run() {
        assert_eq!(insert_letter_digit_dash("KB77").as_deref(), Some("KB-77"));
        assert_eq!(insert_letter_digit_dash("1017A"), None);
        assert_eq!(insert_letter_digit_dash("A-1017"), None);
    }

    #[test]
    fn unmatched_alphanumeric_falls_back_to_dashed_form() {
        let r = resolve("B2002", &snapshot(&["A-1017"]));
        assert_eq!(r.id, "B-2002");
        assert_eq!(r.strategy, Strategy::Fallback);
        assert!(!r.is_known());
    }

    #[test]
    fn unmatched_number_passes_through() {
        let r = resolve("9999", &snapshot(&["1001"]));
        assert_eq!(r.id, "9999");
        assert_eq!(r.strategy, Strategy::Fallback);
    }

    #[test]
    fn dash_insertion_is_ascii_only() {
        let snap = snapshot(&["Ç-1017"]);
        assert_eq!(resolve("Ç-1017", &snap).strategy, Strategy::Exact);

        let r = resolve("Ç1017", &snap);
        assert_eq!(r.id, "Ç1017");
        assert_eq!(r.strategy, Strategy::Fallback);
    }

    #[test]
    fn fallback_keeps_dashed_and_single_char_ids() {
        assert_eq!(fallback_id("C-12"), "C-12");
        assert_eq!(fallback_id("C"), "C");
        assert_eq!(fallback_id("XYZ"), "XYZ");
    }
}
