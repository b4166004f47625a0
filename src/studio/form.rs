use serde::{Deserialize, Serialize};

use super::catalog::{LanguageCode, VoiceCatalog, VoiceSelection};
use super::types::GenerationRequest;

pub const DEFAULT_SPEED: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Text,
    File,
}

impl InputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InputMode::Text => "text",
            InputMode::File => "file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

/// Snapshot of everything the generation form holds.
///
/// Both payload slots are kept while the user toggles the input mode; only
/// the one selected by `mode` is ever sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub mode: InputMode,
    pub text: String,
    pub file: Option<UploadedFile>,
    pub language: LanguageCode,
    pub voice: Option<String>,
    pub speed: f32,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            mode: InputMode::Text,
            text: String::new(),
            file: None,
            language: LanguageCode::DEFAULT,
            voice: None,
            speed: DEFAULT_SPEED,
        }
    }
}

impl FormState {
    /// Form as it looks right after load: `code` applied to an empty voice.
    pub fn initial(catalog: &VoiceCatalog, code: &str) -> (Self, VoiceSelection) {
        let mut form = Self::default();
        let selection = form.select_language(catalog, code);
        (form, selection)
    }

    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_file(&mut self, file: Option<UploadedFile>) {
        self.file = file;
    }

    /// Switch language and re-establish the voice invariant.
    pub fn select_language(&mut self, catalog: &VoiceCatalog, code: &str) -> VoiceSelection {
        let selection = catalog.select_language(code, self.voice.as_deref());
        self.language = selection.language;
        self.voice = selection.resolved_voice.clone();
        selection
    }

    /// Accepts only voices in the catalog that belong to the current language.
    pub fn select_voice(&mut self, catalog: &VoiceCatalog, voice: &str) -> bool {
        if !catalog.contains(voice) || !self.language.owns_voice(voice) {
            return false;
        }
        self.voice = Some(voice.to_string());
        true
    }

    /// Stores the speed and returns its live echo text.
    pub fn set_speed(&mut self, speed: f32) -> String {
        self.speed = speed;
        self.speed_echo()
    }

    pub fn speed_echo(&self) -> String {
        self.speed.to_string()
    }

    /// Build the wire request. Missing payloads are forwarded as-is; the
    /// backend decides what is valid.
    pub fn to_request(&self) -> GenerationRequest {
        let (text, file) = match self.mode {
            InputMode::Text => (Some(self.text.clone()).filter(|t| !t.is_empty()), None),
            InputMode::File => (None, self.file.clone()),
        };

        GenerationRequest {
            input_type: self.mode,
            text,
            file,
            lang_code: self.language.code().to_string(),
            voice: self.voice.clone(),
            speed: self.speed,
        }
    }
}
