use thiserror::Error;

/// Unified error type for the entire signals-dashboard-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Transport ───────────────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── File I/O (native only) ──────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── Loading ─────────────────────────────────────────────────────
    #[error("Load failed: no candidate served {file}")]
    LoadFailed { file: String },

    // ── Configuration / validation ──────────────────────────────────
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl CoreError {
    /// `true` for failures the loaders treat as a soft miss
    /// (try the next candidate instead of giving up).
    #[must_use]
    pub fn is_soft_miss(&self) -> bool {
        matches!(
            self,
            CoreError::Network(_)
                | CoreError::Timeout { .. }
                | CoreError::HttpStatus { .. }
                | CoreError::Deserialization(_)
                | CoreError::FileIO(_)
        )
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Requests carry a cache-busting query; keep it out of messages.
        let msg = e.to_string();
        let sanitized = strip_query(&msg);
        if e.is_timeout() {
            let url = e
                .url()
                .map(|u| strip_query(u.as_str()))
                .unwrap_or_else(|| sanitized.clone());
            return CoreError::Timeout { url };
        }
        if let Some(status) = e.status() {
            return CoreError::HttpStatus {
                url: e
                    .url()
                    .map(|u| strip_query(u.as_str()))
                    .unwrap_or_default(),
                status: status.as_u16(),
            };
        }
        CoreError::Network(sanitized)
    }
}

/// Drop everything from the first `?` on, marking the cut.
pub(crate) fn strip_query(text: &str) -> String {
    match text.find('?') {
        Some(idx) => format!("{}?<query redacted>", &text[..idx]),
        None => text.to_string(),
    }
}
