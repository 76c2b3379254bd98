use serde::{Deserialize, Serialize};

/// One caption line produced by the transcription service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionMessage {
    pub speaker: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub language: String,
}
