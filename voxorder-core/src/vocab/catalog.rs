//! Status catalog: numeric codes, human labels and spoken keyword variants.
//!
//! Entry order is significant. When a token contains variants of more than
//! one status, the entry listed first wins.

use serde::{Deserialize, Serialize};

use super::{reference, Status};
use crate::error::{Result, VoxorderError};

/// One status as the interpreter and the registry both see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub status: Status,
    /// Wire code sent to the order registry (reference numbering 20/30/40).
    pub code: u16,
    /// Label used in spoken confirmations.
    pub label: String,
    /// Surface forms matched as substrings of a spoken token.
    #[serde(default)]
    pub variants: Vec<String>,
}

impl StatusEntry {
    pub fn new(status: Status, code: u16, label: &str, variants: &[&str]) -> Self {
        Self {
            status,
            code,
            label: label.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Whether `token` contains any of this entry's variants.
    pub fn matches(&self, token: &str) -> bool {
        self.variants
            .iter()
            .any(|variant| !variant.is_empty() && token.contains(variant.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCatalog {
    entries: Vec<StatusEntry>,
}

impl Default for StatusCatalog {
    fn default() -> Self {
        Self::reference()
    }
}

impl StatusCatalog {
    pub fn new(entries: Vec<StatusEntry>) -> Self {
        Self { entries }
    }

    /// The reference catalog: Preparing=20, Prepared=30, Delivered=40.
    pub fn reference() -> Self {
        Self::new(reference::status_entries())
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    pub fn entry(&self, status: Status) -> Option<&StatusEntry> {
        self.entries.iter().find(|e| e.status == status)
    }

    fn entry_mut(&mut self, status: Status) -> Option<&mut StatusEntry> {
        self.entries.iter_mut().find(|e| e.status == status)
    }

    /// First status (in catalog order) whose variants occur inside `token`.
    pub fn match_keyword(&self, token: &str) -> Option<Status> {
        self.entries
            .iter()
            .find(|entry| entry.matches(token))
            .map(|entry| entry.status)
    }

    pub fn code_of(&self, status: Status) -> Option<u16> {
        self.entry(status).map(|e| e.code)
    }

    pub fn status_for_code(&self, code: u16) -> Option<Status> {
        self.entries.iter().find(|e| e.code == code).map(|e| e.status)
    }

    /// Spoken label for `status`, or `"Bilinmiyor"` when the catalog lacks it.
    pub fn label_of(&self, status: Status) -> &str {
        self.entry(status)
            .map(|e| e.label.as_str())
            .unwrap_or("Bilinmiyor")
    }

    /// Override the wire code of `status`. Returns `false` if the catalog has
    /// no entry for it.
    pub fn set_code(&mut self, status: Status, code: u16) -> bool {
        match self.entry_mut(status) {
            Some(entry) => {
                entry.code = code;
                true
            }
            None => false,
        }
    }

    pub fn set_label(&mut self, status: Status, label: &str) -> bool {
        match self.entry_mut(status) {
            Some(entry) => {
                entry.label = label.to_string();
                true
            }
            None => false,
        }
    }

    /// Append extra spoken variants for `status`, skipping blanks and duplicates.
    pub fn extend_variants<I, S>(&mut self, status: Status, variants: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(entry) = self.entry_mut(status) else {
            return false;
        };
        for variant in variants {
            let variant = variant.as_ref().trim().to_lowercase();
            if variant.is_empty() || entry.variants.contains(&variant) {
                continue;
            }
            entry.variants.push(variant);
        }
        true
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (idx, entry) in self.entries.iter().enumerate() {
            if self.entries[..idx].iter().any(|e| e.status == entry.status) {
                return Err(VoxorderError::InvalidVocabulary(format!(
                    "status '{}' listed twice",
                    entry.status
                )));
            }
            if self.entries[..idx].iter().any(|e| e.code == entry.code) {
                return Err(VoxorderError::InvalidVocabulary(format!(
                    "status code {} assigned twice",
                    entry.code
                )));
            }
            if entry.variants.iter().any(|v| v.trim().is_empty()) {
                return Err(VoxorderError::InvalidVocabulary(format!(
                    "status '{}' has a blank variant",
                    entry.status
                )));
            }
        }
        Ok(())
    }
}
