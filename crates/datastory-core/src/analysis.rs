//! Registry of supported analysis types
//!
//! Each [`AnalysisKind`] maps to an immutable [`AnalysisConfig`] describing the
//! remote model to run and the setup-request template to send for it. Keys
//! coming from users or config files are resolved with [`AnalysisKind::from_key`],
//! which is the only place an unknown analysis type can surface.

use crate::error::{DatastoryError, Result};
use crate::models::setup::{DataItem, DataItemDataset, SetupParameter, SetupRequest};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

const AUDIO_TRANSCRIPTION_MODEL: &str = "https://api.models.mint.tacc.utexas.edu/v1.8.0/modelconfigurations/7c2c8d5f-322b-4c1c-8a85-2c49580eadde?username=mint@isi.edu";
const AUDIO_TRANSCRIPTION_INPUT: &str =
    "https://w3id.org/okn/i/mint/7932809f-e71f-423c-ad33-60672ff173b4";
const AUDIO_TRANSCRIPTION_SPEAKERS_PARAM: &str =
    "https://w3id.org/okn/i/mint/2bf48012-8087-4ffe-b1db-774e80e7bc24";

/// Supported analysis types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AnalysisKind {
    AudioTranscription,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 1] = [AnalysisKind::AudioTranscription];

    /// Registry key used in configs and on the command line
    pub fn key(self) -> &'static str {
        match self {
            AnalysisKind::AudioTranscription => "audioTranscription",
        }
    }

    pub fn from_key(key: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == key)
            .ok_or_else(|| DatastoryError::UnknownAnalysisType { key: key.to_string() })
    }

    pub fn config(self) -> &'static AnalysisConfig {
        match self {
            AnalysisKind::AudioTranscription => &AUDIO_TRANSCRIPTION,
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AnalysisKind {
    type Err = DatastoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_key(s)
    }
}

/// Static description of one analysis type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    pub name: String,
    pub icon: String,
    pub description: String,
    pub model_id: String,
    pub response_variables: Vec<String>,
    pub driving_variables: Vec<String>,
    /// Id of the entry in `setup_request.data` that receives the resource
    pub input_data_id: String,
    pub setup_request: SetupRequest,
}

static AUDIO_TRANSCRIPTION: LazyLock<AnalysisConfig> = LazyLock::new(|| AnalysisConfig {
    name: "Audio/Video Transcription".to_string(),
    icon: "🎤".to_string(),
    description: "Transcribe audio and video files into text".to_string(),
    model_id: AUDIO_TRANSCRIPTION_MODEL.to_string(),
    response_variables: Vec::new(),
    driving_variables: Vec::new(),
    input_data_id: AUDIO_TRANSCRIPTION_INPUT.to_string(),
    setup_request: SetupRequest {
        model_id: AUDIO_TRANSCRIPTION_MODEL.to_string(),
        parameters: vec![SetupParameter {
            id: AUDIO_TRANSCRIPTION_SPEAKERS_PARAM.to_string(),
            value: "1".to_string(),
        }],
        data: vec![DataItem {
            id: AUDIO_TRANSCRIPTION_INPUT.to_string(),
            dataset: DataItemDataset::default(),
        }],
    },
});

/// Every registered analysis type with its configuration
pub fn analysis_types() -> impl Iterator<Item = (AnalysisKind, &'static AnalysisConfig)> {
    AnalysisKind::ALL.into_iter().map(|kind| (kind, kind.config()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        for kind in AnalysisKind::ALL {
            assert_eq!(AnalysisKind::from_key(kind.key()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_key_is_configuration_error() {
        let err = AnalysisKind::from_key("videoSummarization").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("videoSummarization"));
    }

    #[test]
    fn test_template_has_input_slot() {
        for (_, config) in analysis_types() {
            assert!(config.setup_request.data.iter().any(|item| item.id == config.input_data_id));
            assert_eq!(config.setup_request.model_id, config.model_id);
        }
    }

    #[test]
    fn test_parse_from_str() {
        let kind: AnalysisKind = "audioTranscription".parse().unwrap();
        assert_eq!(kind, AnalysisKind::AudioTranscription);
    }
}
