use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use super::form::{InputMode, UploadedFile};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5001";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    #[serde(default = "default_language")]
    pub default_language: String,
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_language() -> String {
    "a".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            download_dir: None,
            default_language: default_language(),
        }
    }
}

impl ClientConfig {
    /// Backend root with surrounding whitespace and trailing `/` removed.
    pub fn base_url(&self) -> Result<Url, StudioError> {
        let raw = self
            .base_url
            .clone()
            .and_then(|u| {
                let t = u.trim().trim_end_matches('/').to_string();
                if t.is_empty() { None } else { Some(t) }
            })
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let url = Url::parse(&raw).map_err(|e| StudioError::InvalidBaseUrl(format!("{raw}: {e}")))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(StudioError::InvalidBaseUrl(raw));
        }
        Ok(url)
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid backend URL: {0}")]
    InvalidBaseUrl(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid artifact filename: {0:?}")]
    InvalidFilename(String),
}

/// Payload actually sent for one submit. Exactly one of `text`/`file` is
/// populated, chosen by `input_type`; either may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub input_type: InputMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<UploadedFile>,
    pub lang_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    pub speed: f32,
}

/// Body of `POST /generate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
}

/// Body of `GET /output/{session_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionFilesResponse {
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RequestFailure {
    BackendRejection { message: String },
    TransportFailure { message: String },
}

impl RequestFailure {
    pub fn message(&self) -> &str {
        match self {
            RequestFailure::BackendRejection { message }
            | RequestFailure::TransportFailure { message } => message,
        }
    }

    /// Both kinds render the same way on the status line.
    pub fn status_text(&self) -> String {
        format!("Error: {}", self.message())
    }
}

/// One generated audio file, addressed by `(session_id, filename)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactAddress {
    pub session_id: String,
    pub filename: String,
}

impl ArtifactAddress {
    pub fn new(session_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            filename: filename.into(),
        }
    }

    /// `{base}/output/{session_id}/{filename}`, each segment percent-encoded.
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("output")
                .push(&self.session_id)
                .push(&self.filename);
        }
        url
    }
}
