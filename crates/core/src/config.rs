use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub mail: MailConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `NOTICE_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("NOTICE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            store: StoreConfig::from_env_profiled(p),
            mail: MailConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  server:  {}:{}, timeout={}s",
            self.server.host,
            self.server.port,
            self.server.request_timeout_secs
        );
        if self.store.in_memory {
            tracing::info!("  store:   in-memory");
        } else {
            tracing::info!("  store:   data_dir={}", self.store.data_dir.display());
        }
        tracing::info!(
            "  mail:    smtp={}:{}, tls={}, auth={}, from={}, recipients={}",
            self.mail.smtp_host.as_deref().unwrap_or("(none)"),
            self.mail.smtp_port,
            self.mail.tls,
            self.mail.username.as_deref().unwrap_or("(none)"),
            self.mail.from,
            self.mail.to.len()
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 6786),
            request_timeout_secs: profiled_env_u64(p, "REQUEST_TIMEOUT_SECS", 30),
        }
    }
}

// ── Document store ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub in_memory: bool,
}

impl StoreConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            data_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", "data")),
            in_memory: profiled_env_bool(p, "STORE_IN_MEMORY", false),
        }
    }
}

// ── Mail (SMTP) ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub tls: bool,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub from: String,
    pub to: Vec<String>,
}

impl MailConfig {
    fn from_env_profiled(p: &str) -> Self {
        let to = profiled_env_opt(p, "MAIL_TO")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            smtp_host: profiled_env_opt(p, "SMTP_HOST"),
            smtp_port: profiled_env_u16(p, "SMTP_PORT", 587),
            tls: profiled_env_bool(p, "SMTP_TLS", true),
            username: profiled_env_opt(p, "SMTP_USERNAME"),
            password: profiled_env_opt(p, "SMTP_PASSWORD"),
            from: profiled_env_or(p, "MAIL_FROM", "notices@localhost"),
            to,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.smtp_host.is_some() && !self.to.is_empty()
    }

    /// SMTP AUTH pair; only present when both halves are set.
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        }
    }
}
