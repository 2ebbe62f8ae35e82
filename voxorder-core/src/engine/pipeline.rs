//! Pure interpretation pipeline for one utterance.
//!
//! ## Stages
//!
//! ```text
//! 1. Lowercase + split on whitespace
//! 2. Normalize each word (number words, place-code words)
//! 3. Segment into command groups (status keywords close identifier lists)
//! 4. Resolve every identifier against the registry snapshot
//! ```
//!
//! No I/O happens here. The same transcript and snapshot always produce
//! the same `Interpretation`.

use serde::Serialize;

use crate::dispatch::{resolve_groups, ResolvedCommand};
use crate::normalize::normalize_transcript;
use crate::registry::OrderSummary;
use crate::segment::{segment, CommandGroup};
use crate::vocab::Vocabulary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    pub tokens: Vec<String>,
    pub groups: Vec<CommandGroup>,
    pub commands: Vec<ResolvedCommand>,
    /// Identifiers spoken after the last status keyword.
    pub leftover: Vec<String>,
    pub noise: Vec<String>,
}

impl Interpretation {
    pub fn is_recognized(&self) -> bool {
        !self.groups.is_empty()
    }
}

pub fn interpret(text: &str, vocab: &Vocabulary, snapshot: &[OrderSummary]) -> Interpretation {
    let lowered = text.to_lowercase();
    let tokens = normalize_transcript(&lowered, vocab);
    let segmentation = segment(&tokens, &vocab.statuses, snapshot);
    let commands = resolve_groups(&segmentation.groups, snapshot);

    Interpretation {
        tokens,
        groups: segmentation.groups,
        commands,
        leftover: segmentation.leftover,
        noise: segmentation.noise,
    }
}
