use std::net::SocketAddr;
use std::time::Duration;

use crate::pipeline::extraction::OcrConfig;

/// Application-level constants
pub const APP_NAME: &str = "Health Profiler";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reasoning model used when `GEMINI_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

/// Gemini REST API root.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 60;

/// Upload ceiling for `POST /api/analyze` (multipart overhead included).
pub const MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Tesseract settings for report photos: English, LSTM engine, automatic page segmentation.
pub const OCR_CONFIG: OcrConfig = OcrConfig {
    lang: "eng",
    engine_mode: 1,
    page_seg_mode: 3,
};

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_BASE_URL: &str = "GEMINI_BASE_URL";
pub const ENV_BIND: &str = "HEALTH_PROFILER_BIND";
pub const ENV_REQUEST_TIMEOUT: &str = "HEALTH_PROFILER_REQUEST_TIMEOUT_SECS";
pub const ENV_OCR_TIMEOUT: &str = "HEALTH_PROFILER_OCR_TIMEOUT_SECS";

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "info,health_profiler=debug"
    } else {
        "info"
    }
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// `None` when no credential is configured; requests then fail with
    /// `ConfigurationMissing` before any I/O.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
    pub ocr_timeout: Duration,
}

impl AnalyzerConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to load .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = non_blank(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            key: ENV_BIND,
            value: bind_raw.clone(),
        })?;

        Ok(Self {
            api_key: non_blank(ENV_API_KEY).map(|k| k.trim().to_string()),
            model: non_blank(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_blank(ENV_BASE_URL)
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            bind_addr,
            request_timeout: Duration::from_secs(parse_secs(
                &non_blank,
                ENV_REQUEST_TIMEOUT,
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            ocr_timeout: Duration::from_secs(parse_secs(
                &non_blank,
                ENV_OCR_TIMEOUT,
                DEFAULT_OCR_TIMEOUT_SECS,
            )?),
        })
    }
}

fn parse_secs<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_empty() {
        let config = AnalyzerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.ocr_timeout, Duration::from_secs(60));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = AnalyzerConfig::from_lookup(lookup_from(&[(ENV_API_KEY, "   ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = AnalyzerConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "secret"),
            (ENV_MODEL, "gemini-2.5-pro"),
            (ENV_BIND, "0.0.0.0:9090"),
            (ENV_OCR_TIMEOUT, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.bind_addr.port(), 9090);
        assert_eq!(config.ocr_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_bind_address_rejected() {
        let err = AnalyzerConfig::from_lookup(lookup_from(&[(ENV_BIND, "not-an-addr")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_BIND));
    }

    #[test]
    fn zero_timeout_rejected() {
        let result = AnalyzerConfig::from_lookup(lookup_from(&[(ENV_REQUEST_TIMEOUT, "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn ocr_config_is_fixed() {
        assert_eq!(OCR_CONFIG.lang, "eng");
        assert_eq!(OCR_CONFIG.engine_mode, 1);
        assert_eq!(OCR_CONFIG.page_seg_mode, 3);
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
