use super::types::{
    ArtifactAddress, ClientConfig, GenerateResponse, GenerationRequest, SessionFilesResponse,
    StudioError,
};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// The TTS service the studio talks to.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// One generation round trip. `Err` means the exchange itself failed
    /// (transport, undecodable body); a rejection is an `Ok` with
    /// `success == false`.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerateResponse, StudioError>;

    /// Where an artifact can be played from and downloaded.
    fn artifact_url(&self, address: &ArtifactAddress) -> Url;
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, StudioError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url()?,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn generate_url(&self) -> Url {
        self.endpoint(&["generate"])
    }

    /// Files the backend currently holds for a session; empty when the
    /// session is unknown.
    #[instrument(skip(self))]
    pub async fn list_session_files(&self, session_id: &str) -> Result<Vec<String>, StudioError> {
        let url = self.endpoint(&["output", session_id]);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body: SessionFilesResponse = response.json().await?;
        debug!(count = body.files.len(), "listed session files");
        Ok(body.files)
    }
}

fn multipart_form(request: &GenerationRequest) -> Result<Form, StudioError> {
    let mut form = Form::new().text("inputType", request.input_type.as_str());

    if let Some(text) = &request.text {
        form = form.text("text", text.clone());
    }

    if let Some(file) = &request.file {
        let part = Part::bytes(file.contents.clone())
            .file_name(file.name.clone())
            .mime_str("text/plain")?;
        form = form.part("textFile", part);
    }

    form = form.text("langCode", request.lang_code.clone());

    if let Some(voice) = &request.voice {
        form = form.text("voice", voice.clone());
    }

    Ok(form.text("speed", request.speed.to_string()))
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    #[instrument(skip(self, request), fields(lang = %request.lang_code, mode = request.input_type.as_str()))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerateResponse, StudioError> {
        let form = multipart_form(request)?;

        let response = self
            .client
            .post(self.generate_url())
            .multipart(form)
            .send()
            .await?;

        // The backend reports failures in the body, so the status code only
        // matters when the body is not the expected JSON.
        let status = response.status();
        let raw = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&raw).map_err(|e| {
            StudioError::MalformedResponse(format!("HTTP {}: {}", status.as_u16(), e))
        })?;

        if let Some(command) = &parsed.command {
            debug!(%command, "backend command");
        }
        if let Some(output) = parsed.output.as_deref().filter(|o| !o.is_empty()) {
            debug!(output_len = output.len(), "backend produced output");
        }

        Ok(parsed)
    }

    fn artifact_url(&self, address: &ArtifactAddress) -> Url {
        address.url(&self.base_url)
    }
}
