//! Session state and events
//!
//! Defines the session phase machine and the event stream side effects
//! (notifications) are driven from.

use serde::{Deserialize, Serialize};

/// Current phase of a recording session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No session in progress
    #[default]
    Idle,
    /// Sources acquired, countdown running
    Countdown,
    /// Chunks are being captured
    Recording,
    /// Capture suspended; no chunks append
    Paused,
    /// Terminal; the machine resets to idle immediately after
    Stopped,
}

/// What the session is capturing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingType {
    Screen,
    Camera,
    Multi,
}

impl std::fmt::Display for RecordingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingType::Screen => write!(f, "screen"),
            RecordingType::Camera => write!(f, "camera"),
            RecordingType::Multi => write!(f, "multi"),
        }
    }
}

/// Summary of a finalized artifact, carried on the event stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
    pub recording_type: RecordingType,
    pub len_bytes: usize,
    pub chunk_count: usize,
    pub duration_ms: f64,
}

/// Events emitted as the session transitions.
///
/// Repeat identical transitions (double stop, pause while paused) emit
/// nothing, so notification side effects stay idempotent.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Countdown started after speculative source acquisition
    CountdownStarted { seconds: u32 },
    /// Countdown cancelled; speculative sources rolled back
    CountdownCancelled,
    /// Recording started
    Started,
    /// One chunk was appended to the session buffer
    ChunkCaptured { sequence: u64, bytes: usize },
    /// Recording paused
    Paused,
    /// Recording resumed
    Resumed,
    /// Recording stopped and the artifact finalized
    Stopped(ArtifactSummary),
    /// Error occurred
    Error(String),
}
