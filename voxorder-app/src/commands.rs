//! Console command parsing and handlers.
//!
//! One stdin line maps to one `ConsoleCommand`. Lines starting with `:` are
//! host commands; everything else is a transcript.

use std::sync::atomic::Ordering;

use anyhow::Context;
use tracing::{info, warn};
use voxorder_core::{Utterance, VoxorderError};

use crate::settings::read_settings;
use crate::state::AppState;

/// Confidence assumed for transcripts typed without an `@<confidence>` suffix.
const TYPED_CONFIDENCE: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Ingest(String),
    List,
    ToggleListen,
    Status,
    Preview(String),
    Reload,
    Quit,
    Say { text: String, confidence: f32 },
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Continue(Option<String>),
    Quit,
}

pub fn parse_line(line: &str) -> std::result::Result<ConsoleCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleCommand::Empty);
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(parse_transcript(line));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name {
        "ingest" if !arg.is_empty() => Ok(ConsoleCommand::Ingest(arg.to_string())),
        "ingest" => Err("usage: :ingest <order-id>".into()),
        "list" => Ok(ConsoleCommand::List),
        "listen" => Ok(ConsoleCommand::ToggleListen),
        "status" => Ok(ConsoleCommand::Status),
        "preview" if !arg.is_empty() => Ok(ConsoleCommand::Preview(arg.to_string())),
        "preview" => Err("usage: :preview <transcript>".into()),
        "reload" => Ok(ConsoleCommand::Reload),
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        other => Err(format!("unknown command :{other}")),
    }
}

/// `1001 hazır @0.92` carries an explicit recogniser confidence.
fn parse_transcript(line: &str) -> ConsoleCommand {
    if let Some((text, suffix)) = line.rsplit_once('@') {
        if let Ok(confidence) = suffix.trim().parse::<f32>() {
            return ConsoleCommand::Say {
                text: text.trim_end().to_string(),
                confidence,
            };
        }
    }
    ConsoleCommand::Say {
        text: line.to_string(),
        confidence: TYPED_CONFIDENCE,
    }
}

pub fn execute(state: &AppState, command: ConsoleCommand) -> anyhow::Result<Reply> {
    let output = match command {
        ConsoleCommand::Empty => None,
        ConsoleCommand::Quit => return Ok(Reply::Quit),
        ConsoleCommand::Ingest(id) => {
            let order = state.registry.ingest(&id)?;
            Some(format!("order {} registered ({})", order.id, order.status))
        }
        ConsoleCommand::List => Some(serde_json::to_string_pretty(&state.registry.list())?),
        ConsoleCommand::ToggleListen => {
            let listening = state.session.lock().toggle();
            info!(listening, "listening toggled");
            Some(if listening { "listening" } else { "idle" }.to_string())
        }
        ConsoleCommand::Status => {
            Some(serde_json::to_string_pretty(&state.diagnostics_snapshot())?)
        }
        ConsoleCommand::Preview(text) => {
            let interpretation = state.engine.preview(&text)?;
            Some(serde_json::to_string_pretty(&interpretation)?)
        }
        ConsoleCommand::Reload => {
            let mut settings = read_settings(&state.settings_path)
                .context("settings reload failed; previous tables stay active")?;
            settings.apply_env_overrides();
            let vocabulary = settings.vocabulary();
            let statuses = vocabulary.statuses.clone();
            state
                .engine
                .set_vocabulary(vocabulary)
                .context("reloaded vocabulary rejected")?;
            *state.status_codes.write() = statuses;
            *state.settings.lock() = settings;
            info!(path = ?state.settings_path, "settings reloaded");
            Some(format!("settings reloaded from {}", state.settings_path.display()))
        }
        ConsoleCommand::Say { text, confidence } => say(state, text, confidence)?,
    };
    Ok(Reply::Continue(output))
}

fn say(state: &AppState, text: String, confidence: f32) -> anyhow::Result<Option<String>> {
    let utterance = Utterance::new(text, confidence);
    let mut session = state.session.lock();
    match state.engine.handle_utterance(&mut session, &utterance) {
        Ok(report) => {
            let summary = format!(
                "{} updated, {} failed",
                report.dispatch.updated_count(),
                report.dispatch.failed_count()
            );
            Ok(Some(summary))
        }
        Err(VoxorderError::NotListening) => {
            Ok(Some("not listening; type :listen to start".to_string()))
        }
        Err(e) => {
            warn!(error = %e, "utterance failed");
            Err(e.into())
        }
    }
}

/// Run one console line end to end, counting failures.
pub fn handle_line(state: &AppState, line: &str) -> Reply {
    let result = parse_line(line)
        .map_err(anyhow::Error::msg)
        .and_then(|command| execute(state, command));
    match result {
        Ok(Reply::Continue(Some(text))) => {
            println!("{text}");
            Reply::Continue(None)
        }
        Ok(reply) => reply,
        Err(e) => {
            state.console_errors.fetch_add(1, Ordering::Relaxed);
            eprintln!("error: {e:#}");
            Reply::Continue(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use parking_lot::RwLock;
    use voxorder_core::{
        CommandEngine, EngineConfig, LocalRegistry, RegistryHandle, Status, StatusCatalog,
        Vocabulary,
    };

    use crate::mirror::{HttpStatusMirror, SharedCatalog};
    use crate::settings::{save_settings, AppSettings};

    fn state_at(path: PathBuf, mirror_base: Option<&str>, config: EngineConfig) -> AppState {
        let status_codes: SharedCatalog = Arc::new(RwLock::new(StatusCatalog::reference()));
        let registry = Arc::new(match mirror_base {
            Some(base) => LocalRegistry::with_mirror(
                HttpStatusMirror::new(base, Duration::from_secs(5), Arc::clone(&status_codes))
                    .expect("build mirror"),
            ),
            None => LocalRegistry::new(),
        });
        let engine = CommandEngine::new(
            config,
            Vocabulary::default(),
            RegistryHandle::shared(Arc::clone(&registry)),
        )
        .expect("engine");
        AppState::new(
            Arc::new(engine),
            registry,
            AppSettings::default(),
            path,
            status_codes,
        )
    }

    fn temp_settings_path(tag: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("voxorder-{tag}-{}", std::process::id()))
            .join("settings.json")
    }

    fn state() -> AppState {
        state_at(temp_settings_path("commands"), None, EngineConfig::default())
    }

    /// Accept one HTTP request, answer 200 and return its body.
    fn capture_one_post() -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
        let base = format!("http://{}", listener.local_addr().expect("local addr"));
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("read header");
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().expect("content length");
                    }
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).expect("read body");
            stream
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .expect("write response");
            String::from_utf8(body).expect("utf-8 body")
        });
        (base, handle)
    }

    #[test]
    fn parses_host_commands() {
        assert_eq!(
            parse_line(":ingest  A-1017 "),
            Ok(ConsoleCommand::Ingest("A-1017".into()))
        );
        assert_eq!(parse_line(":list"), Ok(ConsoleCommand::List));
        assert_eq!(parse_line(":listen"), Ok(ConsoleCommand::ToggleListen));
        assert_eq!(parse_line(":quit"), Ok(ConsoleCommand::Quit));
        assert_eq!(parse_line("   "), Ok(ConsoleCommand::Empty));
        assert!(parse_line(":ingest").is_err());
        assert!(parse_line(":dance").is_err());
    }

    #[test]
    fn transcript_confidence_suffix_is_optional() {
        assert_eq!(
            parse_line("1001 hazır @0.42"),
            Ok(ConsoleCommand::Say {
                text: "1001 hazır".into(),
                confidence: 0.42,
            })
        );
        assert_eq!(
            parse_line("mail@kds teslim"),
            Ok(ConsoleCommand::Say {
                text: "mail@kds teslim".into(),
                confidence: 1.0,
            })
        );
    }

    #[test]
    fn transcript_needs_listening_session() {
        let state = state();
        state.registry.ingest("1001").expect("ingest order");

        let reply = execute(&state, parse_line("1001 hazır").expect("parse")).expect("execute");
        assert_eq!(
            reply,
            Reply::Continue(Some("not listening; type :listen to start".into()))
        );
        assert_eq!(state.registry.get("1001").map(|o| o.status), Some(Status::Preparing));
    }

    #[test]
    fn ingest_listen_and_speak() {
        let state = state();
        execute(&state, ConsoleCommand::Ingest("1001".into())).expect("ingest");
        execute(&state, ConsoleCommand::ToggleListen).expect("listen");

        let reply = execute(
            &state,
            ConsoleCommand::Say {
                text: "9999 teslim".into(),
                confidence: 0.9,
            },
        )
        .expect("say");

        assert_eq!(reply, Reply::Continue(Some("0 updated, 1 failed".into())));

        let reply = execute(
            &state,
            ConsoleCommand::Say {
                text: "1001 teslim".into(),
                confidence: 0.9,
            },
        )
        .expect("say");
        assert_eq!(reply, Reply::Continue(Some("1 updated, 0 failed".into())));
        assert_eq!(state.registry.get("1001").map(|o| o.status), Some(Status::Delivered));
        assert_eq!(state.diagnostics_snapshot().session_utterances, 2);
    }

    #[test]
    fn blank_ingest_is_an_error_and_counted() {
        let state = state();
        assert!(execute(&state, ConsoleCommand::Ingest("  ".into())).is_err());
        assert_eq!(handle_line(&state, ":nope"), Reply::Continue(None));
        assert_eq!(state.diagnostics_snapshot().console_errors, 1);
    }

    #[test]
    fn reload_changes_the_mirrored_status_code() {
        let (base, server) = capture_one_post();
        let path = temp_settings_path("reload-mirror");
        let settings = AppSettings {
            status_prepared: 31,
            ..AppSettings::default()
        };
        save_settings(&path, &settings).expect("save settings");
        let state = state_at(path.clone(), Some(&base), EngineConfig::default());
        state.registry.ingest("1001").expect("ingest order");

        execute(&state, ConsoleCommand::Reload).expect("reload");
        execute(&state, ConsoleCommand::ToggleListen).expect("listen");
        let reply = execute(
            &state,
            ConsoleCommand::Say {
                text: "1001 hazır".into(),
                confidence: 0.9,
            },
        )
        .expect("say");

        let body = server.join().expect("server thread");
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
        assert_eq!(reply, Reply::Continue(Some("1 updated, 0 failed".into())));
        let body: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(body, serde_json::json!({ "status": 31, "kdsOrderId": "1001" }));
    }

    #[test]
    fn malformed_reload_keeps_previous_tables() {
        let path = temp_settings_path("reload-malformed");
        let settings = AppSettings {
            status_prepared: 31,
            ..AppSettings::default()
        };
        save_settings(&path, &settings).expect("save settings");
        let state = state_at(path.clone(), None, EngineConfig::default());
        execute(&state, ConsoleCommand::Reload).expect("first reload");

        std::fs::write(&path, "{ \"statusPrepared\": ").expect("write malformed settings");
        let result = execute(&state, ConsoleCommand::Reload);
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }

        assert!(result.is_err());
        assert_eq!(
            state.engine.vocabulary().statuses.code_of(Status::Prepared),
            Some(31)
        );
        assert_eq!(state.status_codes.read().code_of(Status::Prepared), Some(31));
        assert_eq!(state.settings.lock().status_prepared, 31);
    }

    #[test]
    fn nan_confidence_is_held_to_the_floor() {
        let state = state_at(
            temp_settings_path("nan-floor"),
            None,
            EngineConfig {
                min_confidence: 0.9,
            },
        );
        state.registry.ingest("1001").expect("ingest order");
        execute(&state, ConsoleCommand::ToggleListen).expect("listen");

        let reply = execute(&state, parse_line("1001 hazır @nan").expect("parse")).expect("say");

        assert_eq!(reply, Reply::Continue(Some("0 updated, 0 failed".into())));
        assert_eq!(state.registry.get("1001").map(|o| o.status), Some(Status::Preparing));
    }

    #[test]
    fn quit_stops_the_loop() {
        let state = state();
        assert_eq!(handle_line(&state, ":quit"), Reply::Quit);
    }
}
