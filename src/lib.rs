//! Capture Studio - multi-source capture, compositing and recording.
//!
//! This is the core engine for a screen/camera recording application:
//! source acquisition and registry, a fixed-rate compositor, the chunked
//! session recorder with its lifecycle state machine, caption generation
//! and artifact export.

pub mod captions;
pub mod capture;
pub mod compositor;
pub mod export;
pub mod recorder;
pub mod utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use capture::{CaptureDevice, CaptureOptions, SourceKind, SourceRegistry};
pub use compositor::{Compositor, CompositorConfig, Surface, VideoEffect};
pub use recorder::{
    Artifact, RecorderConfig, RecordingType, SessionController, SessionEvent, SessionPhase,
};
pub use utils::{AppError, AppResult};

/// Initialize tracing/logging for the engine
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "capture_studio=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Capture Studio engine v{}", env!("CARGO_PKG_VERSION"));
}
