//! Capture device abstraction
//!
//! Device negotiation is the one externally-latent operation in the
//! engine: `open` suspends until the platform grants or denies access.
//! Implementations must release any tracks they opened when the returned
//! future is dropped before completion.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::stream::MediaStream;

/// Kind of capture input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Operating-system display share
    Screen,
    /// Local camera device
    Camera,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Screen => write!(f, "screen"),
            SourceKind::Camera => write!(f, "camera"),
        }
    }
}

/// Sub-region of a shared display to capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Requested capture parameters. All fields are hints; the device reports
/// what it actually granted via `TrackSettings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOptions {
    /// Specific monitor to share (screen sources)
    pub monitor_id: Option<String>,

    /// Crop region within the shared display
    pub region: Option<CaptureRegion>,

    /// Ideal frame width
    pub width: Option<u32>,

    /// Ideal frame height
    pub height: Option<u32>,

    /// Ideal frame rate
    pub frame_rate: Option<u32>,
}

/// Settings the device actually granted for a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSettings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub sample_rate: u32,
}

/// Errors that can occur while acquiring or managing sources
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("maximum of {0} sources allowed")]
    CapacityExceeded(usize),
}

impl CaptureError {
    pub fn code(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied(_) => "PERMISSION_DENIED",
            CaptureError::DeviceUnavailable(_) => "DEVICE_UNAVAILABLE",
            CaptureError::CapacityExceeded(_) => "CAPACITY_EXCEEDED",
        }
    }
}

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Negotiates live capture streams with the platform
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Open a live stream of the requested kind.
    ///
    /// On success the stream's tracks are already producing; on failure
    /// no tracks are left running.
    async fn open(&self, kind: SourceKind, options: &CaptureOptions) -> CaptureResult<MediaStream>;
}
