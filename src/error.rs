//! Error types for API access and report export.

use thiserror::Error;

/// Failure while fetching or decoding a document from the task API.
///
/// Outside of the top-level project task list these are never fatal: the
/// builder logs them and carries on with whatever data it has.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response shape from {path}: {source}")]
    DataShape {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Whether a repeated request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport { .. } => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::Decode { .. } | ApiError::DataShape { .. } => false,
        }
    }
}

/// Fatal failures of an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to fetch project task list: {0}")]
    TaskList(#[source] ApiError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}

pub type ApiResult<T> = Result<T, ApiError>;
