use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MaskgateError {
    #[error("recognizer failed: {reason}")]
    Recognizer { reason: String },

    #[error("invalid span {start}..{end} ({label}): {reason}")]
    InvalidSpan {
        start: usize,
        end: usize,
        label: String,
        reason: String,
    },

    #[error("input already contains placeholder {placeholder}")]
    PlaceholderInInput { placeholder: String },

    #[error("invalid detector pattern {detector}: {reason}")]
    InvalidPattern { detector: String, reason: String },

    #[error("unknown detector: {name}")]
    UnknownDetector { name: String },

    #[error("config parse error in {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("llm error: {reason}")]
    Llm { reason: String },

    #[error("llm timeout after {timeout_secs}s")]
    LlmTimeout { timeout_secs: u64 },

    #[error("api error: status={status}, body={body}")]
    Api { status: u16, body: String },

    #[error("ipc error: {reason}")]
    Ipc { reason: String },

    #[error("socket not found at {path}")]
    SocketNotFound { path: PathBuf },

    #[error("proxy request timeout after {timeout_secs}s")]
    RequestTimeout { timeout_secs: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MaskgateError {
    /// Whether this error means detection could not complete, so no masked
    /// text may be produced for the request.
    pub fn is_detection_failure(&self) -> bool {
        matches!(
            self,
            MaskgateError::Recognizer { .. } | MaskgateError::InvalidSpan { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MaskgateError>;
