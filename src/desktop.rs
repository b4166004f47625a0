use crate::studio::backend::HttpBackend;
use crate::studio::catalog::{VoiceCatalog, VoiceSelection};
use crate::studio::downloads::ArtifactSaver;
use crate::studio::form::{InputMode, UploadedFile};
use crate::studio::session::RequestOutcome;
use crate::studio::state::{InitView, StudioState};
use crate::studio::surface::{PresentationSurface, SurfaceUpdate};
use crate::studio::types::{ArtifactAddress, ClientConfig, StudioError};

use serde::Serialize;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, Manager};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SURFACE_EVENT: &str = "studio:surface";
const DOWNLOAD_SAVED_EVENT: &str = "studio:download:saved";
const DOWNLOAD_ERROR_EVENT: &str = "studio:download:error";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct DownloadSavedEvent {
    filename: String,
    path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct DownloadErrorEvent {
    filename: String,
    message: String,
}

/// Forwards updates to the webview and performs downloads natively.
struct TauriSurface {
    app: AppHandle,
    saver: Arc<ArtifactSaver>,
}

impl PresentationSurface for TauriSurface {
    fn apply(&mut self, update: SurfaceUpdate) {
        if let SurfaceUpdate::Download { url, filename } = &update {
            let app = self.app.clone();
            let saver = self.saver.clone();
            let url = url.clone();
            let filename = filename.clone();

            tauri::async_runtime::spawn(async move {
                match saver.save(&url, &filename).await {
                    Ok(path) => {
                        let _ = app.emit(
                            DOWNLOAD_SAVED_EVENT,
                            DownloadSavedEvent {
                                filename,
                                path: path.display().to_string(),
                            },
                        );
                    }
                    Err(e) => {
                        error!(error = %e, %url, "download failed");
                        let _ = app.emit(
                            DOWNLOAD_ERROR_EVENT,
                            DownloadErrorEvent {
                                filename,
                                message: e.to_string(),
                            },
                        );
                    }
                }
            });
        }

        let _ = self.app.emit(SURFACE_EVENT, update);
    }
}

type Studio = StudioState<HttpBackend, TauriSurface>;

fn connect(
    app: AppHandle,
    config: &ClientConfig,
) -> Result<(Arc<HttpBackend>, TauriSurface), StudioError> {
    let backend = Arc::new(HttpBackend::new(config)?);
    let saver = Arc::new(ArtifactSaver::new(config)?);
    Ok((backend, TauriSurface { app, saver }))
}

#[tauri::command]
async fn studio_init(state: tauri::State<'_, Studio>) -> Result<InitView, String> {
    Ok(state.init().await)
}

#[tauri::command]
async fn studio_configure(
    app: AppHandle,
    state: tauri::State<'_, Studio>,
    config: ClientConfig,
) -> Result<(), String> {
    let (backend, surface) = connect(app, &config).map_err(|e| e.to_string())?;
    state.configure(config, backend, surface).await;
    Ok(())
}

#[tauri::command]
async fn studio_set_input_mode(state: tauri::State<'_, Studio>, mode: InputMode) -> Result<(), String> {
    state.set_input_mode(mode).await;
    Ok(())
}

#[tauri::command]
async fn studio_set_text(state: tauri::State<'_, Studio>, text: String) -> Result<(), String> {
    state.set_text(text).await;
    Ok(())
}

#[tauri::command]
async fn studio_set_file(
    state: tauri::State<'_, Studio>,
    file: Option<UploadedFile>,
) -> Result<(), String> {
    state.set_file(file).await;
    Ok(())
}

#[tauri::command]
async fn studio_select_language(
    state: tauri::State<'_, Studio>,
    code: String,
) -> Result<VoiceSelection, String> {
    Ok(state.select_language(&code).await)
}

#[tauri::command]
async fn studio_select_voice(state: tauri::State<'_, Studio>, voice: String) -> Result<(), String> {
    state.select_voice(&voice).await
}

#[tauri::command]
async fn studio_set_speed(state: tauri::State<'_, Studio>, speed: f32) -> Result<String, String> {
    Ok(state.set_speed(speed).await)
}

/// `null` when a later submit or a reconfigure superseded this request.
#[tauri::command]
async fn studio_generate(state: tauri::State<'_, Studio>) -> Result<Option<RequestOutcome>, String> {
    Ok(state.generate().await)
}

#[tauri::command]
async fn studio_download(
    state: tauri::State<'_, Studio>,
    session_id: String,
    filename: String,
) -> Result<ArtifactAddress, String> {
    Ok(state.download(&session_id, &filename).await)
}

#[tauri::command]
async fn studio_download_all(state: tauri::State<'_, Studio>) -> Result<Vec<ArtifactAddress>, String> {
    Ok(state.download_all().await)
}

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kokoro_studio=info"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init();
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_logging();

    tauri::Builder::default()
        .setup(|app| {
            let config = ClientConfig::default();
            let (backend, surface) = connect(app.handle().clone(), &config)?;
            app.manage(Studio::new(config, VoiceCatalog::kokoro(), backend, surface));
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            studio_init,
            studio_configure,
            studio_set_input_mode,
            studio_set_text,
            studio_set_file,
            studio_select_language,
            studio_select_voice,
            studio_set_speed,
            studio_generate,
            studio_download,
            studio_download_all,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
