//! Persistent application settings (JSON file in app data directory).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;
use voxorder_core::{Status, Vocabulary};

const DEFAULT_PREPARING_CODE: u16 = 20;
const DEFAULT_PREPARED_CODE: u16 = 30;
const DEFAULT_DELIVERED_CODE: u16 = 40;
const MAX_EXTRA_VARIANTS: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct AppSettings {
    /// Base URL of the external update-status service. `None` disables mirroring.
    pub update_status_base_url: Option<String>,
    pub mirror_timeout_secs: u64,
    pub min_confidence: f32,
    pub status_preparing: u16,
    pub status_prepared: u16,
    pub status_delivered: u16,
    pub extra_prepared_variants: Vec<String>,
    pub extra_delivered_variants: Vec<String>,
    /// Additional place-code words, e.g. `"edirne": "E"`.
    pub extra_alpha_codes: BTreeMap<String, String>,
    /// Orders registered at startup.
    pub seed_orders: Vec<String>,
    pub start_listening: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            update_status_base_url: None,
            mirror_timeout_secs: 5,
            min_confidence: 0.0,
            status_preparing: DEFAULT_PREPARING_CODE,
            status_prepared: DEFAULT_PREPARED_CODE,
            status_delivered: DEFAULT_DELIVERED_CODE,
            extra_prepared_variants: Vec::new(),
            extra_delivered_variants: Vec::new(),
            extra_alpha_codes: BTreeMap::new(),
            seed_orders: Vec::new(),
            start_listening: false,
        }
    }
}

impl AppSettings {
    pub fn normalize(&mut self) {
        self.update_status_base_url = normalize_base_url(self.update_status_base_url.as_deref());
        self.mirror_timeout_secs = self.mirror_timeout_secs.clamp(1, 60);
        self.min_confidence = if self.min_confidence.is_finite() {
            self.min_confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let codes = [
            self.status_preparing,
            self.status_prepared,
            self.status_delivered,
        ];
        if codes[0] == codes[1] || codes[1] == codes[2] || codes[0] == codes[2] {
            self.status_preparing = DEFAULT_PREPARING_CODE;
            self.status_prepared = DEFAULT_PREPARED_CODE;
            self.status_delivered = DEFAULT_DELIVERED_CODE;
        }

        self.extra_prepared_variants = normalize_variants(&self.extra_prepared_variants);
        self.extra_delivered_variants = normalize_variants(&self.extra_delivered_variants);
        self.extra_alpha_codes = normalize_alpha_codes(&self.extra_alpha_codes);
        self.seed_orders = normalize_seed_orders(&self.seed_orders);
    }

    /// Fold `VOXORDER_*` environment variables over the file settings.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("VOXORDER_UPDATE_STATUS_BASE_URL") {
            self.update_status_base_url = Some(url);
        }
        if let Some(code) = env_code("VOXORDER_STATUS_PREPARING") {
            self.status_preparing = code;
        }
        if let Some(code) = env_code("VOXORDER_STATUS_PREPARED") {
            self.status_prepared = code;
        }
        if let Some(code) = env_code("VOXORDER_STATUS_DELIVERED") {
            self.status_delivered = code;
        }
        self.normalize();
    }

    /// Reference vocabulary with this file's codes and extra words applied.
    pub fn vocabulary(&self) -> Vocabulary {
        let mut vocab = Vocabulary::default();
        vocab.statuses.set_code(Status::Preparing, self.status_preparing);
        vocab.statuses.set_code(Status::Prepared, self.status_prepared);
        vocab.statuses.set_code(Status::Delivered, self.status_delivered);
        vocab
            .statuses
            .extend_variants(Status::Prepared, &self.extra_prepared_variants);
        vocab
            .statuses
            .extend_variants(Status::Delivered, &self.extra_delivered_variants);
        for (word, letter) in &self.extra_alpha_codes {
            vocab.alpha_codes.insert(word.clone(), letter.clone());
        }
        vocab
    }
}

fn env_code(key: &str) -> Option<u16> {
    std::env::var(key).ok()?.trim().parse().ok()
}

pub fn normalize_base_url(raw: Option<&str>) -> Option<String> {
    raw.map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
}

fn normalize_variants(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for variant in raw {
        let normalized = variant.trim().to_lowercase();
        if normalized.is_empty() || out.contains(&normalized) {
            continue;
        }
        out.push(normalized);
        if out.len() >= MAX_EXTRA_VARIANTS {
            break;
        }
    }
    out
}

fn normalize_alpha_codes(raw: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    raw.iter()
        .filter_map(|(word, letter)| {
            let word = word.trim().to_lowercase();
            let letter = letter.trim().to_uppercase();
            let single = letter.chars().count() == 1 && letter.chars().all(char::is_alphabetic);
            (!word.is_empty() && single).then_some((word, letter))
        })
        .collect()
}

fn normalize_seed_orders(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for id in raw {
        let id = id.trim();
        if id.is_empty() || out.iter().any(|o| o == id) {
            continue;
        }
        out.push(id.to_string());
    }
    out
}

pub fn default_settings_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Voxorder")
            .join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("voxorder")
            .join("settings.json")
    }
}

/// Startup load: a missing or unreadable file falls back to defaults.
pub fn load_settings(path: &Path) -> AppSettings {
    match read_settings(path) {
        Ok(settings) => settings,
        Err(e) => {
            if path.exists() {
                warn!(path = ?path, error = %format!("{e:#}"), "settings unreadable; using defaults");
            }
            let mut settings = AppSettings::default();
            settings.normalize();
            settings
        }
    }
}

/// Strict load used for reloads: any read or parse failure is an error.
pub fn read_settings(path: &Path) -> anyhow::Result<AppSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let mut settings: AppSettings = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;
    settings.normalize();
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(std::io::Error::other)?;
    fs::write(path, json)
}
