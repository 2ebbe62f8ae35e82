//! Inbound utterances and outbound feedback events.
//!
//! ## Direction
//!
//! | Type | Direction |
//! |------|-----------|
//! | `Utterance` | ASR collaborator → engine |
//! | `FeedbackEvent` | engine → feedback collaborator (broadcast) |

use serde::{Deserialize, Serialize};

use crate::vocab::Status;

/// Phrase spoken back when an utterance or an order could not be handled.
pub const NOT_UNDERSTOOD_PHRASE: &str = "Anlayamadım";

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// One finalized speech segment delivered by the ASR collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utterance {
    /// Recognised text (lowercased by the engine before interpretation).
    pub text: String,
    /// Recogniser confidence in [0.0, 1.0].
    pub confidence: f32,
}

impl Utterance {
    /// Non-finite confidences are treated as 0.0.
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            text: text.into(),
            confidence,
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Emitted once per confirmation or rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    pub signal: FeedbackSignal,
}

impl FeedbackEvent {
    /// Turkish phrase for speech synthesis.
    pub fn spoken_text(&self) -> String {
        self.signal.spoken_text()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FeedbackSignal {
    /// The registry accepted the update.
    Confirmed {
        #[serde(rename = "orderId")]
        order_id: String,
        status: Status,
        label: String,
    },
    /// The utterance, or one order in it, could not be applied.
    NotUnderstood {
        reason: NotUnderstoodReason,
        #[serde(rename = "orderId")]
        order_id: Option<String>,
    },
}

impl FeedbackSignal {
    pub fn spoken_text(&self) -> String {
        match self {
            FeedbackSignal::Confirmed {
                order_id, label, ..
            } => format!("Sipariş {order_id} {label}"),
            FeedbackSignal::NotUnderstood { .. } => NOT_UNDERSTOOD_PHRASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotUnderstoodReason {
    /// No status keyword closed a non-empty identifier list.
    NoGroupsRecognized,
    /// The registry does not know the (resolved) id.
    IdentifierUnresolved,
    /// The registry could not be reached.
    CollaboratorUnavailable,
    /// Recogniser confidence fell below the configured floor.
    LowConfidence,
}
