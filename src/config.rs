// src/config.rs

use std::{env, path::PathBuf, time::Duration};

use dotenvy::dotenv;

/// Exam length used when nothing else is communicated (one hour).
pub const DEFAULT_EXAM_DURATION_SECS: u64 = 3600;

/// Delay between session status polls while in the waiting room.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Both countdown clocks tick once per second.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub store_path: PathBuf,
    pub exam_duration_secs: u64,
    pub poll_interval_secs: u64,
    pub rust_log: String,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let api_base_url = env::var("QUIZ_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080/api".to_string());

        let store_path = env::var("QUIZ_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".quiz_session.json"));

        let exam_duration_secs =
            parse_or_default("QUIZ_EXAM_DURATION_SECS", DEFAULT_EXAM_DURATION_SECS);

        let poll_interval_secs =
            parse_or_default("QUIZ_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let log_dir = env::var("QUIZ_LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        Self {
            api_base_url,
            store_path,
            exam_duration_secs,
            poll_interval_secs,
            rust_log,
            log_dir,
        }
    }

    /// Never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            store_path: PathBuf::from(".quiz_session.json"),
            exam_duration_secs: DEFAULT_EXAM_DURATION_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}

fn parse_or_default(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Invalid {} value {:?} ({}), using {}", key, raw, e, default);
            default
        }),
        Err(_) => default,
    }
}
