//! Captions
//!
//! Timed caption records produced by the transcription collaborator,
//! with per-item editing and SRT serialization.

pub mod srt;
pub mod transcribe;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use transcribe::TranscriptionClient;

/// One timed caption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caption {
    pub id: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub confidence: Option<f32>,
}

/// Ordered caption collection. Non-overlap is conventional, not enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionSet {
    captions: Vec<Caption>,
}

impl CaptionSet {
    pub fn new(captions: Vec<Caption>) -> Self {
        Self { captions }
    }

    pub fn push(&mut self, caption: Caption) {
        self.captions.push(caption);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Caption> {
        self.captions.iter()
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    /// Replace one caption's text. Returns false if the id is unknown.
    pub fn edit_text(&mut self, id: &str, text: impl Into<String>) -> bool {
        match self.captions.iter_mut().find(|c| c.id == id) {
            Some(caption) => {
                caption.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Serialize to SRT. Pure; exporting twice without edits yields
    /// byte-identical output.
    pub fn to_srt(&self) -> String {
        srt::to_srt(&self.captions)
    }
}

/// Errors from caption generation
#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("transcription failed with status {0}")]
    TranscriptionFailed(u16),

    #[error("transcription request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl CaptionError {
    pub fn code(&self) -> &'static str {
        "TRANSCRIPTION_FAILED"
    }
}
