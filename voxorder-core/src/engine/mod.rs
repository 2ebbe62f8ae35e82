//! `CommandEngine`: per-utterance controller.
//!
//! ## Flow
//!
//! ```text
//! handle_utterance(session, utterance)
//!     ├─► session listening?          else Err(NotListening)
//!     ├─► confidence ≥ floor?         else NotUnderstood(LowConfidence)
//!     ├─► registry.snapshot()         fresh for every utterance
//!     ├─► pipeline::interpret         normalize → segment → resolve
//!     └─► Dispatcher::dispatch        updates in token order
//!             └─► broadcast::Sender<FeedbackEvent>
//! ```
//!
//! Listening state lives in the caller-owned `Session`, not in the engine.

pub mod pipeline;

use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, info_span, warn};

use crate::{
    dispatch::{DispatchReport, Dispatcher},
    error::{Result, VoxorderError},
    ipc::events::{FeedbackEvent, FeedbackSignal, NotUnderstoodReason, Utterance},
    registry::RegistryHandle,
    vocab::Vocabulary,
};

use pipeline::Interpretation;

/// Broadcast channel capacity: 256 feedback events buffered for slow consumers.
const BROADCAST_CAP: usize = 256;

/// Configuration for `CommandEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Utterances below this recogniser confidence are rejected without
    /// interpretation. Default: 0.0 (accept everything).
    pub min_confidence: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
        }
    }
}

/// Listening state owned by the host and passed into every call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    listening: bool,
    utterances: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listening() -> Self {
        Self {
            listening: true,
            utterances: 0,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn set_listening(&mut self, listening: bool) {
        self.listening = listening;
    }

    /// Flip the listening flag and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.listening = !self.listening;
        self.listening
    }

    /// Utterances accepted in this session.
    pub fn utterances(&self) -> u64 {
        self.utterances
    }
}

#[derive(Default)]
pub struct EngineDiagnostics {
    pub utterances: AtomicUsize,
    pub low_confidence: AtomicUsize,
    pub groups_parsed: AtomicUsize,
    pub commands_dispatched: AtomicUsize,
    pub commands_updated: AtomicUsize,
    pub commands_failed: AtomicUsize,
    pub not_understood: AtomicUsize,
}

impl EngineDiagnostics {
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            utterances: self.utterances.load(Ordering::Relaxed),
            low_confidence: self.low_confidence.load(Ordering::Relaxed),
            groups_parsed: self.groups_parsed.load(Ordering::Relaxed),
            commands_dispatched: self.commands_dispatched.load(Ordering::Relaxed),
            commands_updated: self.commands_updated.load(Ordering::Relaxed),
            commands_failed: self.commands_failed.load(Ordering::Relaxed),
            not_understood: self.not_understood.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    pub utterances: usize,
    pub low_confidence: usize,
    pub groups_parsed: usize,
    pub commands_dispatched: usize,
    pub commands_updated: usize,
    pub commands_failed: usize,
    pub not_understood: usize,
}

/// Everything that happened for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtteranceReport {
    pub utterance: Utterance,
    /// `None` when the utterance was rejected before interpretation.
    pub interpretation: Option<Interpretation>,
    pub dispatch: DispatchReport,
}

/// The top-level interpreter handle.
///
/// `CommandEngine` is `Send + Sync`; share it as `Arc<CommandEngine>`.
pub struct CommandEngine {
    config: EngineConfig,
    vocabulary: RwLock<Vocabulary>,
    registry: RegistryHandle,
    feedback_tx: broadcast::Sender<FeedbackEvent>,
    seq: AtomicU64,
    diagnostics: Arc<EngineDiagnostics>,
}

impl CommandEngine {
    /// Create an engine over `vocabulary` and `registry`.
    ///
    /// # Errors
    /// `VoxorderError::InvalidVocabulary` if the tables fail validation.
    pub fn new(config: EngineConfig, vocabulary: Vocabulary, registry: RegistryHandle) -> Result<Self> {
        vocabulary.validate()?;
        let (feedback_tx, _) = broadcast::channel(BROADCAST_CAP);
        Ok(Self {
            config,
            vocabulary: RwLock::new(vocabulary),
            registry,
            feedback_tx,
            seq: AtomicU64::new(0),
            diagnostics: Arc::new(EngineDiagnostics::default()),
        })
    }

    /// Interpret one utterance and dispatch the resulting commands.
    ///
    /// # Errors
    /// - `VoxorderError::NotListening` if `session` is not listening.
    /// - `VoxorderError::CollaboratorUnavailable` if the snapshot cannot be fetched.
    pub fn handle_utterance(&self, session: &mut Session, utterance: &Utterance) -> Result<UtteranceReport> {
        if !session.is_listening() {
            return Err(VoxorderError::NotListening);
        }
        session.utterances += 1;
        self.diagnostics.utterances.fetch_add(1, Ordering::Relaxed);

        let span = info_span!("utterance", n = session.utterances);
        let _guard = span.enter();
        info!(text = %utterance.text, confidence = utterance.confidence, "utterance received");

        if utterance.confidence.is_nan() || utterance.confidence < self.config.min_confidence {
            warn!(
                confidence = utterance.confidence,
                floor = self.config.min_confidence,
                "utterance below confidence floor"
            );
            self.diagnostics.low_confidence.fetch_add(1, Ordering::Relaxed);
            let dispatch = DispatchReport {
                outcomes: Vec::new(),
                signals: vec![FeedbackSignal::NotUnderstood {
                    reason: NotUnderstoodReason::LowConfidence,
                    order_id: None,
                }],
            };
            self.emit(&dispatch.signals);
            return Ok(UtteranceReport {
                utterance: utterance.clone(),
                interpretation: None,
                dispatch,
            });
        }

        let snapshot = match self.registry.0.snapshot() {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "registry snapshot failed");
                self.emit(&[FeedbackSignal::NotUnderstood {
                    reason: NotUnderstoodReason::CollaboratorUnavailable,
                    order_id: None,
                }]);
                return Err(match e {
                    VoxorderError::CollaboratorUnavailable(msg) => {
                        VoxorderError::CollaboratorUnavailable(msg)
                    }
                    other => VoxorderError::CollaboratorUnavailable(other.to_string()),
                });
            }
        };

        let vocabulary = self.vocabulary.read();
        let interpretation = pipeline::interpret(&utterance.text, &vocabulary, &snapshot);
        debug!(
            tokens = ?interpretation.tokens,
            groups = interpretation.groups.len(),
            "utterance interpreted"
        );
        if !interpretation.leftover.is_empty() {
            info!(
                leftover = ?interpretation.leftover,
                "identifiers without a trailing status keyword dropped"
            );
        }

        let statuses = vocabulary.statuses.clone();
        drop(vocabulary);

        // Registry updates may block on the status mirror; no lock is held here.
        let dispatch = Dispatcher::new(&self.registry, &statuses)
            .dispatch(&interpretation.groups, interpretation.commands.clone());

        self.record(&interpretation, &dispatch);
        self.emit(&dispatch.signals);

        Ok(UtteranceReport {
            utterance: utterance.clone(),
            interpretation: Some(interpretation),
            dispatch,
        })
    }

    /// Interpret without dispatching. Useful for previews and dry runs.
    pub fn preview(&self, text: &str) -> Result<Interpretation> {
        let snapshot = self.registry.0.snapshot()?;
        Ok(pipeline::interpret(text, &self.vocabulary.read(), &snapshot))
    }

    /// Replace the vocabulary tables.
    ///
    /// # Errors
    /// `VoxorderError::InvalidVocabulary`; the previous tables stay active.
    pub fn set_vocabulary(&self, vocabulary: Vocabulary) -> Result<()> {
        vocabulary.validate()?;
        *self.vocabulary.write() = vocabulary;
        info!("vocabulary replaced");
        Ok(())
    }

    pub fn vocabulary(&self) -> Vocabulary {
        self.vocabulary.read().clone()
    }

    /// Subscribe to feedback events (confirmations and rejections).
    pub fn subscribe_feedback(&self) -> broadcast::Receiver<FeedbackEvent> {
        self.feedback_tx.subscribe()
    }

    pub fn diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn record(&self, interpretation: &Interpretation, dispatch: &DispatchReport) {
        let d = &self.diagnostics;
        d.groups_parsed
            .fetch_add(interpretation.groups.len(), Ordering::Relaxed);
        d.commands_dispatched
            .fetch_add(dispatch.outcomes.len(), Ordering::Relaxed);
        d.commands_updated
            .fetch_add(dispatch.updated_count(), Ordering::Relaxed);
        d.commands_failed
            .fetch_add(dispatch.failed_count(), Ordering::Relaxed);
    }

    fn emit(&self, signals: &[FeedbackSignal]) {
        for signal in signals {
            if matches!(signal, FeedbackSignal::NotUnderstood { .. }) {
                self.diagnostics.not_understood.fetch_add(1, Ordering::Relaxed);
            }
            let seq = self.seq.fetch_add(1, Ordering::Relaxed);
            // No subscribers is fine; feedback is best-effort.
            let _ = self.feedback_tx.send(FeedbackEvent {
                seq,
                signal: signal.clone(),
            });
        }
    }
}
