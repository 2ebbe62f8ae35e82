//! Voxorder console host.
//!
//! ## Threads
//!
//! ```text
//! stdin reader ──crossbeam──► main loop ──► CommandEngine::handle_utterance
//!                                                   │
//!                      feedback forwarder ◄─broadcast┘  prints spoken phrases
//! ```

mod commands;
mod mirror;
mod settings;
mod state;

use std::io::BufRead;
use std::sync::{atomic::Ordering, Arc};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use parking_lot::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use voxorder_core::{CommandEngine, EngineConfig, LocalRegistry, RegistryHandle};

use commands::{handle_line, Reply};
use mirror::{HttpStatusMirror, SharedCatalog};
use settings::{default_settings_path, load_settings, save_settings, AppSettings};
use state::AppState;

fn build_registry(
    settings: &AppSettings,
    status_codes: &SharedCatalog,
) -> anyhow::Result<Arc<LocalRegistry>> {
    let Some(base_url) = settings.update_status_base_url.as_deref() else {
        info!("no update-status service configured; orders stay local");
        return Ok(Arc::new(LocalRegistry::new()));
    };
    let mirror = HttpStatusMirror::new(
        base_url,
        Duration::from_secs(settings.mirror_timeout_secs),
        Arc::clone(status_codes),
    )
    .context("building update-status client")?;
    info!(endpoint = %mirror.endpoint(), "status mirror enabled");
    Ok(Arc::new(LocalRegistry::with_mirror(mirror)))
}

fn spawn_feedback_forwarder(state: &AppState) -> thread::JoinHandle<()> {
    let mut rx = state.engine.subscribe_feedback();
    let spoken = Arc::clone(&state.feedback_spoken);
    thread::spawn(move || loop {
        match rx.blocking_recv() {
            Ok(event) => {
                spoken.fetch_add(1, Ordering::Relaxed);
                println!("» {}", event.spoken_text());
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "feedback forwarder lagged");
            }
            Err(RecvError::Closed) => break,
        }
    })
}

fn spawn_stdin_reader() -> crossbeam_channel::Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "stdin read failed");
                    break;
                }
            }
        }
    });
    rx
}

fn main() -> anyhow::Result<()> {
    // ── Tracing ───────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("voxorder=info,voxorder_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Voxorder starting");

    let settings_path = default_settings_path();
    if !settings_path.exists() {
        if let Err(e) = save_settings(&settings_path, &AppSettings::default()) {
            warn!(error = %e, path = ?settings_path, "could not write default settings");
        }
    }
    let mut app_settings = load_settings(&settings_path);
    app_settings.apply_env_overrides();
    info!(
        settings_path = ?settings_path,
        mirror = app_settings.update_status_base_url.is_some(),
        min_confidence = app_settings.min_confidence,
        seed_orders = app_settings.seed_orders.len(),
        "runtime settings loaded"
    );

    // ── Engine setup ──────────────────────────────────────────────────────
    let vocabulary = app_settings.vocabulary();
    let status_codes: SharedCatalog = Arc::new(RwLock::new(vocabulary.statuses.clone()));
    let registry = build_registry(&app_settings, &status_codes)?;
    for id in &app_settings.seed_orders {
        registry.ingest(id)?;
    }

    let config = EngineConfig {
        min_confidence: app_settings.min_confidence,
    };
    let engine = CommandEngine::new(
        config,
        vocabulary,
        RegistryHandle::shared(Arc::clone(&registry)),
    )
    .context("engine rejected vocabulary from settings")?;

    let state = AppState::new(
        Arc::new(engine),
        registry,
        app_settings,
        settings_path,
        status_codes,
    );
    let _forwarder = spawn_feedback_forwarder(&state);
    let lines = spawn_stdin_reader();

    println!(
        "voxorder ready ({}). Commands: :ingest <id>, :list, :listen, :status, :preview <text>, :reload, :quit",
        if state.session.lock().is_listening() { "listening" } else { "idle" }
    );

    // ── Main loop ─────────────────────────────────────────────────────────
    for line in lines.iter() {
        if handle_line(&state, &line) == Reply::Quit {
            break;
        }
    }

    let diag = state.diagnostics_snapshot();
    info!(
        utterances = diag.engine.utterances,
        commands_updated = diag.engine.commands_updated,
        commands_failed = diag.engine.commands_failed,
        not_understood = diag.engine.not_understood,
        console_errors = diag.console_errors,
        "Voxorder stopping"
    );
    Ok(())
}
