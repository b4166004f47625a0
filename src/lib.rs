//! Kokoro Studio: keeps the voice picker consistent with the chosen
//! language and drives generation requests against a Kokoro TTS backend.
//!
//! The `desktop` feature adds a Tauri shell that renders the studio.

pub mod studio;

#[cfg(feature = "desktop")]
mod desktop;

#[cfg(feature = "desktop")]
pub use desktop::{init_logging, run};

pub use studio::backend::{GenerationBackend, HttpBackend};
pub use studio::catalog::{LanguageCode, VoiceCatalog, VoiceSelection};
pub use studio::form::{FormState, InputMode, UploadedFile};
pub use studio::session::{GenerationSession, GenerationSessionController, RequestOutcome};
pub use studio::surface::{PresentationSurface, SurfaceUpdate};
pub use studio::types::{ClientConfig, RequestFailure, StudioError};
pub use studio::state::StudioState;
