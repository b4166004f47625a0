//! Form + controller pair shared by every command of a studio window.
//!
//! The controller lock is never held across a backend call: `generate`
//! begins under the lock, awaits the backend unlocked, then finishes under
//! the lock again. A submit made meanwhile supersedes the earlier one.

use super::backend::GenerationBackend;
use super::catalog::{VoiceCatalog, VoiceGroup, VoiceSelection};
use super::form::{FormState, InputMode, UploadedFile};
use super::session::{GenerationSessionController, RequestOutcome};
use super::surface::{PresentationSurface, SurfaceUpdate};
use super::types::{ArtifactAddress, ClientConfig};

use serde::Serialize;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitView {
    pub groups: Vec<VoiceGroup>,
    pub form: FormState,
    pub selection: VoiceSelection,
}

pub struct StudioState<B, S> {
    catalog: VoiceCatalog,
    config: Mutex<ClientConfig>,
    form: Mutex<FormState>,
    controller: Mutex<GenerationSessionController<B, S>>,
    tickets: Arc<AtomicU64>,
}

impl<B, S> StudioState<B, S>
where
    B: GenerationBackend,
    S: PresentationSurface,
{
    pub fn new(config: ClientConfig, catalog: VoiceCatalog, backend: Arc<B>, surface: S) -> Self {
        let tickets = Arc::new(AtomicU64::new(0));
        let controller =
            GenerationSessionController::with_tickets(backend, surface, tickets.clone());
        Self {
            catalog,
            config: Mutex::new(config),
            form: Mutex::new(FormState::default()),
            controller: Mutex::new(controller),
            tickets,
        }
    }

    pub async fn form(&self) -> FormState {
        self.form.lock().await.clone()
    }

    /// Run `f` against the controller under its lock.
    pub async fn with_controller<T>(
        &self,
        f: impl FnOnce(&mut GenerationSessionController<B, S>) -> T,
    ) -> T {
        let mut controller = self.controller.lock().await;
        f(&mut controller)
    }

    async fn show(&self, updates: Vec<SurfaceUpdate>) {
        let mut controller = self.controller.lock().await;
        for update in updates {
            controller.surface_mut().apply(update);
        }
    }

    /// Apply the configured default language and push the initial view.
    pub async fn init(&self) -> InitView {
        let language = self.config.lock().await.default_language.clone();
        let (form, selection) = {
            let mut form = self.form.lock().await;
            let selection = form.select_language(&self.catalog, &language);
            (form.clone(), selection)
        };

        let mut updates = SurfaceUpdate::for_selection(&selection);
        updates.push(SurfaceUpdate::InputMode { mode: form.mode });
        updates.push(SurfaceUpdate::SpeedEcho {
            text: form.speed_echo(),
        });
        self.show(updates).await;

        InitView {
            groups: self.catalog.groups(),
            form,
            selection,
        }
    }

    /// Swap in a controller for a new backend. Tickets keep counting, so a
    /// response still in flight for the old backend is dropped on arrival.
    pub async fn configure(&self, config: ClientConfig, backend: Arc<B>, surface: S) {
        let replacement =
            GenerationSessionController::with_tickets(backend, surface, self.tickets.clone());

        let mut controller = self.controller.lock().await;
        let retired = std::mem::replace(&mut *controller, replacement);
        if retired.is_pending() {
            controller.surface_mut().apply(SurfaceUpdate::Loading { active: false });
            controller.surface_mut().apply(SurfaceUpdate::ResultsCleared);
        }
        drop(controller);

        info!(base_url = ?config.base_url, "backend reconfigured");
        *self.config.lock().await = config;
    }

    pub async fn set_input_mode(&self, mode: InputMode) {
        self.form.lock().await.set_input_mode(mode);
        self.show(vec![SurfaceUpdate::InputMode { mode }]).await;
    }

    pub async fn set_text(&self, text: String) {
        self.form.lock().await.set_text(text);
    }

    pub async fn set_file(&self, file: Option<UploadedFile>) {
        self.form.lock().await.set_file(file);
    }

    pub async fn select_language(&self, code: &str) -> VoiceSelection {
        let selection = self.form.lock().await.select_language(&self.catalog, code);
        self.show(SurfaceUpdate::for_selection(&selection)).await;
        selection
    }

    pub async fn select_voice(&self, voice: &str) -> Result<(), String> {
        let mut form = self.form.lock().await;
        if form.select_voice(&self.catalog, voice) {
            Ok(())
        } else {
            Err(format!(
                "Voice {voice} is not available for {}",
                form.language.label()
            ))
        }
    }

    pub async fn set_speed(&self, speed: f32) -> String {
        let text = self.form.lock().await.set_speed(speed);
        self.show(vec![SurfaceUpdate::SpeedEcho { text: text.clone() }]).await;
        text
    }

    /// `None` when a later submit or a reconfigure superseded this one.
    pub async fn generate(&self) -> Option<RequestOutcome> {
        let form = self.form.lock().await.clone();

        let (pending, backend) = {
            let mut controller = self.controller.lock().await;
            (controller.begin(&form), controller.backend())
        };

        let result = backend.generate(&pending.request).await;

        self.controller
            .lock()
            .await
            .finish(pending.ticket, result)
    }

    pub async fn download(&self, session_id: &str, filename: &str) -> ArtifactAddress {
        self.controller
            .lock()
            .await
            .download_one(session_id, filename)
    }

    pub async fn download_all(&self) -> Vec<ArtifactAddress> {
        self.controller.lock().await.download_all()
    }
}
