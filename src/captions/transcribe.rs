//! Transcription collaborator
//!
//! Posts a raw audio payload to the transcription endpoint and maps the
//! returned timed segments into captions. Failures are surfaced to the
//! caller; the engine never retries automatically.

use serde::Deserialize;

use super::{Caption, CaptionError, CaptionSet};

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    segments: Vec<SegmentPayload>,
}

/// One timed segment as reported by the collaborator, in seconds
#[derive(Debug, Deserialize)]
struct SegmentPayload {
    start: f64,
    end: f64,
    text: String,
    confidence: Option<f32>,
}

/// HTTP client for the transcription collaborator
pub struct TranscriptionClient {
    endpoint: String,
    client: reqwest::Client,
}

impl TranscriptionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Transcribe an audio payload into a caption set
    pub async fn transcribe(&self, audio: Vec<u8>) -> Result<CaptionSet, CaptionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .body(audio)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptionError::TranscriptionFailed(status.as_u16()));
        }

        let payload: TranscriptionResponse = response.json().await?;
        let captions = payload
            .segments
            .into_iter()
            .enumerate()
            .map(|(index, segment)| Caption {
                id: format!("caption-{index}"),
                start_ms: (segment.start * 1000.0) as u64,
                end_ms: (segment.end * 1000.0) as u64,
                text: segment.text.trim().to_string(),
                confidence: segment.confidence,
            })
            .collect();

        Ok(CaptionSet::new(captions))
    }
}
