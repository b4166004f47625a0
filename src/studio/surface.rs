use serde::{Deserialize, Serialize};

use super::catalog::VoiceSelection;
use super::form::InputMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Error,
}

/// One rendered result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactEntry {
    pub label: String,
    pub session_id: String,
    pub filename: String,
    /// Inline playback source; also the download location.
    pub url: String,
}

/// Instructions for the presentation layer. The controllers own the state;
/// the surface only mirrors what it is told.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SurfaceUpdate {
    #[serde(rename_all = "camelCase")]
    InputMode { mode: InputMode },
    #[serde(rename_all = "camelCase")]
    VoiceGroups { visible: String, hidden: Vec<String> },
    #[serde(rename_all = "camelCase")]
    VoiceSelected { voice: String },
    #[serde(rename_all = "camelCase")]
    SpeedEcho { text: String },
    /// Drop rendered artifacts, status text and the bulk-download control.
    ResultsCleared,
    /// `active` shows the loading indicator, hides results, disables submit.
    #[serde(rename_all = "camelCase")]
    Loading { active: bool },
    #[serde(rename_all = "camelCase")]
    Status { kind: StatusKind, message: String },
    #[serde(rename_all = "camelCase")]
    Artifact { entry: ArtifactEntry },
    #[serde(rename_all = "camelCase")]
    NoArtifacts { message: String },
    #[serde(rename_all = "camelCase")]
    DownloadAll { visible: bool },
    #[serde(rename_all = "camelCase")]
    Download { url: String, filename: String },
}

impl SurfaceUpdate {
    /// Group visibility always; the selected value only when it moved.
    pub fn for_selection(selection: &VoiceSelection) -> Vec<SurfaceUpdate> {
        let mut updates = vec![SurfaceUpdate::VoiceGroups {
            visible: selection.visible_group.clone(),
            hidden: selection.hidden_groups.clone(),
        }];
        if selection.voice_changed {
            if let Some(voice) = &selection.resolved_voice {
                updates.push(SurfaceUpdate::VoiceSelected { voice: voice.clone() });
            }
        }
        updates
    }
}

pub trait PresentationSurface {
    fn apply(&mut self, update: SurfaceUpdate);
}

/// Keeps every update in order. Useful as a headless surface.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    pub updates: Vec<SurfaceUpdate>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<SurfaceUpdate> {
        std::mem::take(&mut self.updates)
    }
}

impl PresentationSurface for RecordingSurface {
    fn apply(&mut self, update: SurfaceUpdate) {
        self.updates.push(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::catalog::VoiceCatalog;

    #[test]
    fn selection_only_moves_voice_when_changed() {
        let catalog = VoiceCatalog::kokoro();

        let kept = catalog.select_language("a", Some("af_sky"));
        let updates = SurfaceUpdate::for_selection(&kept);
        assert_eq!(updates.len(), 1);
        assert!(matches!(&updates[0], SurfaceUpdate::VoiceGroups { visible, .. } if visible == "American English"));

        let moved = catalog.select_language("h", Some("af_sky"));
        let updates = SurfaceUpdate::for_selection(&moved);
        assert_eq!(
            updates.last(),
            Some(&SurfaceUpdate::VoiceSelected {
                voice: "hf_alpha".to_string()
            })
        );
    }

    #[test]
    fn updates_serialize_with_type_tag() {
        let json = serde_json::to_value(SurfaceUpdate::DownloadAll { visible: true }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "downloadAll", "visible": true}));

        let json = serde_json::to_value(SurfaceUpdate::ResultsCleared).unwrap();
        assert_eq!(json, serde_json::json!({"type": "resultsCleared"}));
    }
}
