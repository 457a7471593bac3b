//! Live recording statistics
//!
//! Recomputed on every chunk arrival. Duration excludes paused time.

use serde::{Deserialize, Serialize};

/// Derived statistics for an in-progress recording
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStats {
    /// Elapsed capture time in milliseconds, paused intervals excluded
    pub duration_ms: f64,

    /// Sum of all captured chunk byte lengths
    pub file_size: u64,

    /// Inferred output frame rate, when any frames were captured
    pub frame_rate: Option<f64>,

    /// Recorder-reported video bitrate in bits per second
    pub bitrate: Option<u32>,

    /// Number of sources feeding the session
    pub sources: usize,

    /// Chunks captured so far
    pub chunk_count: usize,
}
