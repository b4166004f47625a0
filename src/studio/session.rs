//! Submit-to-result lifecycle and the artifact set it produces.
//!
//! States move `Idle | Success | Failure -> Pending -> Success | Failure`.
//! Every submit takes a fresh [`Ticket`]; only the completion carrying the
//! latest ticket is applied, so an older request that resolves late can
//! never overwrite a newer one.

use super::backend::GenerationBackend;
use super::form::FormState;
use super::surface::{ArtifactEntry, PresentationSurface, StatusKind, SurfaceUpdate};
use super::types::{
    ArtifactAddress, GenerateResponse, GenerationRequest, RequestFailure, StudioError,
    UNKNOWN_ERROR_MESSAGE,
};

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SUCCESS_MESSAGE: &str = "Audio generated successfully!";
pub const NO_ARTIFACTS_MESSAGE: &str = "No audio files were generated.";

/// Output of one successful generation. Replaced wholesale, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSession {
    pub session_id: String,
    pub files: Vec<String>,
}

impl GenerationSession {
    pub fn addresses(&self) -> impl Iterator<Item = ArtifactAddress> + '_ {
        self.files
            .iter()
            .map(|f| ArtifactAddress::new(self.session_id.clone(), f.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RequestOutcome {
    Pending,
    Success { session: GenerationSession },
    Failure { failure: RequestFailure },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Pending,
    Success(GenerationSession),
    Failure(RequestFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub ticket: Ticket,
    pub request: GenerationRequest,
}

/// Turn a backend reply (or the lack of one) into the terminal outcome.
pub fn classify(result: Result<GenerateResponse, StudioError>) -> Result<GenerationSession, RequestFailure> {
    let response = result.map_err(|e| RequestFailure::TransportFailure {
        message: match e {
            StudioError::Http(inner) => inner.to_string(),
            other => other.to_string(),
        },
    })?;

    if !response.success {
        let message = response
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());
        return Err(RequestFailure::BackendRejection { message });
    }

    let session_id = response.session_id.ok_or_else(|| RequestFailure::TransportFailure {
        message: StudioError::MalformedResponse("missing session_id".to_string()).to_string(),
    })?;

    Ok(GenerationSession {
        session_id,
        files: response.files.unwrap_or_default(),
    })
}

pub struct GenerationSessionController<B, S> {
    backend: Arc<B>,
    surface: S,
    state: SessionState,
    tickets: Arc<AtomicU64>,
    latest: Option<u64>,
}

impl<B, S> GenerationSessionController<B, S>
where
    B: GenerationBackend,
    S: PresentationSurface,
{
    pub fn new(backend: Arc<B>, surface: S) -> Self {
        Self::with_tickets(backend, surface, Arc::new(AtomicU64::new(0)))
    }

    /// Draw tickets from a counter that outlives this controller, so a
    /// replacement controller never reissues a ticket still in flight.
    pub fn with_tickets(backend: Arc<B>, surface: S, tickets: Arc<AtomicU64>) -> Self {
        Self {
            backend,
            surface,
            state: SessionState::Idle,
            tickets,
            latest: None,
        }
    }

    pub fn backend(&self) -> Arc<B> {
        self.backend.clone()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&GenerationSession> {
        match &self.state {
            SessionState::Success(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SessionState::Pending)
    }

    /// Current outcome; `None` while idle.
    pub fn outcome(&self) -> Option<RequestOutcome> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Pending => Some(RequestOutcome::Pending),
            SessionState::Success(session) => Some(RequestOutcome::Success {
                session: session.clone(),
            }),
            SessionState::Failure(failure) => Some(RequestOutcome::Failure {
                failure: failure.clone(),
            }),
        }
    }

    /// Enter `Pending`: discard the previous session, clear the results
    /// area, and hand back the request to send.
    pub fn begin(&mut self, form: &FormState) -> PendingRequest {
        let ticket = Ticket(self.tickets.fetch_add(1, Ordering::Relaxed) + 1);
        self.latest = Some(ticket.0);

        self.state = SessionState::Pending;
        self.surface.apply(SurfaceUpdate::ResultsCleared);
        self.surface.apply(SurfaceUpdate::Loading { active: true });

        debug!(ticket = ticket.0, "generation pending");
        PendingRequest {
            ticket,
            request: form.to_request(),
        }
    }

    /// Apply a completion. Returns `None` and changes nothing when `ticket`
    /// has been superseded by a later [`begin`](Self::begin).
    pub fn finish(
        &mut self,
        ticket: Ticket,
        result: Result<GenerateResponse, StudioError>,
    ) -> Option<RequestOutcome> {
        if self.latest != Some(ticket.0) || !self.is_pending() {
            debug!(ticket = ticket.0, latest = ?self.latest, "dropping superseded response");
            return None;
        }

        self.surface.apply(SurfaceUpdate::Loading { active: false });

        match classify(result) {
            Ok(session) => {
                info!(session_id = %session.session_id, files = session.files.len(), "generation succeeded");
                self.render_session(&session);
                self.state = SessionState::Success(session);
            }
            Err(failure) => {
                warn!(?failure, "generation failed");
                self.surface.apply(SurfaceUpdate::Status {
                    kind: StatusKind::Error,
                    message: failure.status_text(),
                });
                self.state = SessionState::Failure(failure);
            }
        }

        self.outcome()
    }

    pub async fn submit(&mut self, form: &FormState) -> RequestOutcome {
        let pending = self.begin(form);
        let backend = self.backend.clone();
        let result = backend.generate(&pending.request).await;
        self.finish(pending.ticket, result)
            .unwrap_or(RequestOutcome::Pending)
    }

    fn render_session(&mut self, session: &GenerationSession) {
        self.surface.apply(SurfaceUpdate::Status {
            kind: StatusKind::Success,
            message: SUCCESS_MESSAGE.to_string(),
        });

        if session.files.is_empty() {
            self.surface.apply(SurfaceUpdate::NoArtifacts {
                message: NO_ARTIFACTS_MESSAGE.to_string(),
            });
        }

        for filename in &session.files {
            let entry = self.render_artifact(session, filename);
            self.surface.apply(SurfaceUpdate::Artifact { entry });
        }

        self.surface.apply(SurfaceUpdate::DownloadAll {
            visible: session.files.len() >= 2,
        });
    }

    pub fn render_artifact(&self, session: &GenerationSession, filename: &str) -> ArtifactEntry {
        let address = ArtifactAddress::new(session.session_id.clone(), filename);
        ArtifactEntry {
            label: filename.to_string(),
            session_id: session.session_id.clone(),
            filename: filename.to_string(),
            url: self.backend.artifact_url(&address).to_string(),
        }
    }

    /// Ask the surface to retrieve and save one artifact. No existence check.
    pub fn download_one(&mut self, session_id: &str, filename: &str) -> ArtifactAddress {
        let address = ArtifactAddress::new(session_id, filename);
        let url = self.backend.artifact_url(&address).to_string();
        self.surface.apply(SurfaceUpdate::Download {
            url,
            filename: filename.to_string(),
        });
        address
    }

    /// One download per artifact of the active session, in stored order.
    pub fn download_all(&mut self) -> Vec<ArtifactAddress> {
        let Some(session) = self.session().cloned() else {
            return Vec::new();
        };
        session
            .addresses()
            .map(|a| self.download_one(&a.session_id, &a.filename))
            .collect()
    }
}
