use std::path::PathBuf;

/// Frame source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSpec {
    /// V4L2 device index (`/dev/video{n}`).
    Index(u32),
    /// Procedural frames, no hardware needed.
    Synthetic,
}

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Camera selection: a device index, or `synthetic`.
    pub camera: CameraSpec,
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Directory of per-identity sample-image subfolders.
    pub dataset_dir: PathBuf,
    /// Directory for saved region crops.
    pub evidence_dir: PathBuf,
    /// Whether to save a crop per decision.
    pub save_evidence: bool,
    /// Confidence must exceed this for access to be granted.
    pub threshold: f32,
    /// Process every Nth frame.
    pub process_interval: u64,
    /// Seconds between periodic stats displays.
    pub stats_interval_secs: u64,
    /// Frames discarded at startup so auto-exposure settles.
    pub warmup_frames: usize,
    /// Frame cap for the synthetic source; unbounded when unset.
    pub synthetic_frames: Option<u64>,
}

impl Config {
    /// Load configuration from `FACEGATE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            camera: parse_camera_spec(
                &std::env::var("FACEGATE_CAMERA").unwrap_or_else(|_| "0".to_string()),
            ),
            db_path: env_path("FACEGATE_DB_PATH", "access_records.db"),
            dataset_dir: env_path("FACEGATE_DATASET_DIR", "datasets"),
            evidence_dir: env_path("FACEGATE_EVIDENCE_DIR", "evidence"),
            save_evidence: std::env::var("FACEGATE_SAVE_EVIDENCE")
                .map(|v| v != "0")
                .unwrap_or(true),
            threshold: env_f32("FACEGATE_THRESHOLD", 0.70),
            process_interval: env_u64("FACEGATE_PROCESS_INTERVAL", 10).max(1),
            stats_interval_secs: env_u64("FACEGATE_STATS_INTERVAL_SECS", 30),
            warmup_frames: env_usize("FACEGATE_WARMUP_FRAMES", 4),
            synthetic_frames: std::env::var("FACEGATE_SYNTHETIC_FRAMES")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }
}

fn parse_camera_spec(raw: &str) -> CameraSpec {
    if raw.eq_ignore_ascii_case("synthetic") {
        return CameraSpec::Synthetic;
    }
    match raw.parse() {
        Ok(index) => CameraSpec::Index(index),
        Err(_) => {
            tracing::warn!(value = raw, "unrecognized FACEGATE_CAMERA, using index 0");
            CameraSpec::Index(0)
        }
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
