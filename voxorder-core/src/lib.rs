//! # voxorder-core
//!
//! Spoken-command interpreter SDK for kitchen order boards.
//!
//! ## Architecture
//!
//! ```text
//! Utterance (lowercase ASR text)
//!      │
//!  normalize::normalize_transcript     number words → digits, place words → letters
//!      │
//!  segment::segment                    identifier buffer closed by status keywords
//!      │
//!  resolve::resolve                    exact / space→dash / letter-digit dash
//!      │
//!  dispatch::Dispatcher                OrderRegistry::update_status, in token order
//!      │
//! broadcast::Sender<FeedbackEvent>
//! ```
//!
//! Interpretation of one utterance is synchronous and deterministic for a
//! given transcript and registry snapshot.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod ipc;
pub mod normalize;
pub mod registry;
pub mod resolve;
pub mod segment;
pub mod vocab;

// Convenience re-exports for downstream crates
pub use engine::{CommandEngine, EngineConfig, Session};
pub use error::VoxorderError;
pub use ipc::events::{FeedbackEvent, FeedbackSignal, NotUnderstoodReason, Utterance};
pub use registry::{
    LocalRegistry, Order, OrderRegistry, OrderSummary, RegistryHandle, StatusMirror,
};
pub use vocab::{Status, StatusCatalog, StatusEntry, Vocabulary};
