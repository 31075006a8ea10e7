//! Application Configuration
//!
//! Configuration for the media application layer.

use crate::domain::value_objects::{DomainPolicy, PolicyMode};
use platform::rate_limit::RateLimitConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Media application configuration
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Staging area for uploads handed to the engines
    pub upload_dir: PathBuf,
    /// Artifacts served under `/outputs`
    pub output_dir: PathBuf,
    /// Base for artifact URLs; derived from the `Host` header when unset
    pub public_base_url: Option<String>,
    /// Cooldown + sliding window per client
    pub rate_limit: RateLimitConfig,
    /// Admission records idle for longer than this are pruned
    pub client_staleness: Duration,
    /// Artifacts older than this are deleted
    pub artifact_retention: Duration,
    /// Reaper tick
    pub reap_interval: Duration,
    /// Request body cap for the `/api` routes
    pub max_upload_bytes: usize,
    /// Largest video the downloader may fetch
    pub max_video_bytes: u64,
    /// Remove-bg input is pre-resized to this longest edge
    pub server_max_dimension: u32,
    /// Erase input is downscaled to this longest edge
    pub erase_max_dimension: u32,
    pub domain_policy: DomainPolicy,
    /// Honor `X-Forwarded-For` (only behind a trusted proxy)
    pub trust_forwarded_for: bool,
    pub rembg_bin: String,
    pub rembg_model: String,
    pub ytdlp_bin: String,
    /// Upper bound for any single external tool run
    pub engine_timeout: Duration,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
            public_base_url: None,
            rate_limit: RateLimitConfig::default(),
            client_staleness: Duration::from_secs(60),
            artifact_retention: Duration::from_secs(30 * 60),
            reap_interval: Duration::from_secs(60),
            max_upload_bytes: 20 * 1024 * 1024,
            max_video_bytes: 150 * 1024 * 1024,
            server_max_dimension: 2048,
            erase_max_dimension: 2000,
            domain_policy: DomainPolicy::default(),
            trust_forwarded_for: false,
            rembg_bin: "rembg".to_string(),
            rembg_model: "u2netp".to_string(),
            ytdlp_bin: "yt-dlp".to_string(),
            engine_timeout: Duration::from_secs(300),
        }
    }
}

impl MediaConfig {
    /// Defaults overridden by environment variables
    ///
    /// Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let get_secs = |key: &str, default: Duration| secs(parse_or(&get, key, default.as_secs()));

        let rate = &defaults.rate_limit;
        let cooldown_ms =
            parse_or(&get, "RATE_LIMIT_COOLDOWN_MS", rate.cooldown.as_millis() as u64);
        let max_requests = parse_or(&get, "RATE_LIMIT_MAX_REQUESTS", rate.max_requests);
        let window_secs = parse_or(&get, "RATE_LIMIT_WINDOW_SECS", rate.window.as_secs());

        let policy_mode = parse_or(&get, "DOMAIN_POLICY", PolicyMode::default());
        let max_video_mb = parse_or(&get, "MAX_VIDEO_SIZE_MB", defaults.max_video_mb());
        let server_max_dimension =
            parse_or(&get, "SERVER_MAX_DIMENSION", defaults.server_max_dimension).max(1);

        Self {
            upload_dir: get("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
            output_dir: get("OUTPUT_DIR").map(PathBuf::from).unwrap_or(defaults.output_dir),
            public_base_url: get("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            rate_limit: RateLimitConfig::new(cooldown_ms, max_requests, window_secs),
            client_staleness: get_secs("RATE_LIMIT_STALE_SECS", defaults.client_staleness),
            artifact_retention: get_secs("ARTIFACT_RETENTION_SECS", defaults.artifact_retention),
            reap_interval: get_secs("REAP_INTERVAL_SECS", defaults.reap_interval)
                .max(Duration::from_secs(1)),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            max_video_bytes: max_video_mb * 1024 * 1024,
            server_max_dimension,
            erase_max_dimension: defaults.erase_max_dimension,
            domain_policy: defaults.domain_policy.with_mode(policy_mode),
            trust_forwarded_for: parse_bool_or(
                &get,
                "TRUST_FORWARDED_FOR",
                defaults.trust_forwarded_for,
            ),
            rembg_bin: get("REMBG_BIN").unwrap_or(defaults.rembg_bin),
            rembg_model: get("REMBG_MODEL").unwrap_or(defaults.rembg_model),
            ytdlp_bin: get("YTDLP_BIN").unwrap_or(defaults.ytdlp_bin),
            engine_timeout: get_secs("ENGINE_TIMEOUT_SECS", defaults.engine_timeout)
                .max(Duration::from_secs(1)),
        }
    }

    /// Config rooted in the given directories (for tests and tooling)
    pub fn with_dirs(upload_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Megabytes shown in the download failure message
    pub fn max_video_mb(&self) -> u64 {
        self.max_video_bytes / (1024 * 1024)
    }
}

fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}

fn parse_or<G, T>(get: &G, key: &str, default: T) -> T
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        None => default,
        Some(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Invalid config value, using default");
                default
            }
        },
    }
}

fn parse_bool_or<G>(get: &G, key: &str, default: bool) -> bool
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.to_ascii_lowercase()) {
        None => default,
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        Some(v) => {
            tracing::warn!(key, value = %v, "Invalid boolean config value, using default");
            default
        }
    }
}
