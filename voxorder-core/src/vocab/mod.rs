//! Vocabulary tables driving the interpreter.
//!
//! Everything the interpreter knows about spoken language lives here as
//! data: the status catalog (codes, labels, keyword variants) and the two
//! word tables used by the normalizer. Adding a spoken variant or a new
//! place-code word never touches the segmenter.

pub mod catalog;
pub mod reference;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoxorderError};

pub use catalog::{StatusCatalog, StatusEntry};

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Ticket received, kitchen is working on it.
    Preparing,
    /// Ready at the pass.
    Prepared,
    /// Handed over to the customer or courier.
    Delivered,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Preparing, Status::Prepared, Status::Delivered];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Preparing => "preparing",
            Status::Prepared => "prepared",
            Status::Delivered => "delivered",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The complete spoken vocabulary: status catalog plus normalizer tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct Vocabulary {
    pub statuses: StatusCatalog,
    /// Spoken number word → digit string.
    pub number_words: BTreeMap<String, String>,
    /// Spoken place-code word → single uppercase letter.
    pub alpha_codes: BTreeMap<String, String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            statuses: StatusCatalog::reference(),
            number_words: reference::number_words(),
            alpha_codes: reference::alpha_codes(),
        }
    }
}

impl Vocabulary {
    /// Check the tables for entries the interpreter cannot use safely.
    ///
    /// # Errors
    /// `VoxorderError::InvalidVocabulary` naming the first offending entry.
    pub fn validate(&self) -> Result<()> {
        self.statuses.validate()?;

        for (word, digits) in &self.number_words {
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(VoxorderError::InvalidVocabulary(format!(
                    "number word '{word}' maps to non-digit value '{digits}'"
                )));
            }
        }

        for (word, code) in &self.alpha_codes {
            let mut chars = code.chars();
            let single_upper = matches!(
                (chars.next(), chars.next()),
                (Some(c), None) if c.is_uppercase()
            );
            if !single_upper {
                return Err(VoxorderError::InvalidVocabulary(format!(
                    "alpha code word '{word}' maps to '{code}', expected one uppercase letter"
                )));
            }
        }

        Ok(())
    }
}
