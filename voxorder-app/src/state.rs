//! Console application state shared by the command loop and background threads.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use parking_lot::Mutex;
use serde::Serialize;
use voxorder_core::{engine::DiagnosticsSnapshot, CommandEngine, LocalRegistry, Session};

use crate::mirror::SharedCatalog;
use crate::settings::AppSettings;

pub struct AppState {
    /// The interpreter. Cloned into the feedback-forwarding thread.
    pub engine: Arc<CommandEngine>,
    /// Authoritative order store; the engine holds a handle to the same value.
    pub registry: Arc<LocalRegistry>,
    /// Listening state for the single operator session.
    pub session: Arc<Mutex<Session>>,
    /// Count of feedback phrases printed by the forwarder.
    pub feedback_spoken: Arc<AtomicUsize>,
    /// Count of console lines that could not be handled.
    pub console_errors: Arc<AtomicUsize>,
    pub settings: Arc<Mutex<AppSettings>>,
    /// Absolute path to `settings.json`.
    pub settings_path: PathBuf,
    /// Status codes read by the HTTP mirror; replaced on reload.
    pub status_codes: SharedCatalog,
}

impl AppState {
    pub fn new(
        engine: Arc<CommandEngine>,
        registry: Arc<LocalRegistry>,
        settings: AppSettings,
        settings_path: PathBuf,
        status_codes: SharedCatalog,
    ) -> Self {
        let mut session = Session::new();
        session.set_listening(settings.start_listening);
        Self {
            engine,
            registry,
            session: Arc::new(Mutex::new(session)),
            feedback_spoken: Arc::new(AtomicUsize::new(0)),
            console_errors: Arc::new(AtomicUsize::new(0)),
            settings: Arc::new(Mutex::new(settings)),
            settings_path,
            status_codes,
        }
    }

    pub fn diagnostics_snapshot(&self) -> AppDiagnostics {
        let session = self.session.lock();
        AppDiagnostics {
            listening: session.is_listening(),
            session_utterances: session.utterances(),
            orders: self.registry.len(),
            feedback_spoken: self.feedback_spoken.load(Ordering::Relaxed),
            console_errors: self.console_errors.load(Ordering::Relaxed),
            engine: self.engine.diagnostics_snapshot(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDiagnostics {
    pub listening: bool,
    pub session_utterances: u64,
    pub orders: usize,
    pub feedback_spoken: usize,
    pub console_errors: usize,
    pub engine: DiagnosticsSnapshot,
}
