//! Artifact export
//!
//! Saving finished artifacts (with optional SRT sidecars) and handing
//! them to the transcoding collaborator for post-processing.

pub mod artifact;
pub mod transcode;

use thiserror::Error;

pub use artifact::save_srt_sidecar;
pub use transcode::{FfmpegTranscoder, Resize, TranscodeOptions, Transcoder, TrimWindow};

use crate::recorder::Artifact;

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("transcode failed: {0}")]
    TranscodeFailed(String),

    #[error("native sharing is not available on this platform")]
    ShareUnsupported,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn code(&self) -> &'static str {
        match self {
            ExportError::TranscodeFailed(_) => "TRANSCODE_FAILED",
            ExportError::ShareUnsupported => "SHARE_UNSUPPORTED",
            ExportError::Io(_) => "IO_ERROR",
        }
    }
}

/// Hand an artifact to the platform share sheet.
///
/// No share integration ships yet; callers should fall back to
/// [`Artifact::save_to`] when this returns `ShareUnsupported`.
pub fn share_artifact(artifact: &Artifact) -> Result<(), ExportError> {
    tracing::debug!(
        bytes = artifact.len(),
        mime = %artifact.mime_type,
        "share requested, no native integration available"
    );
    Err(ExportError::ShareUnsupported)
}
