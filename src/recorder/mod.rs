//! Recording system module
//!
//! Implements the session recording pipeline:
//! - chunk packaging and artifact finalization
//! - the session recorder bridging compositor output and source audio
//! - the state machine governing the session lifecycle

pub mod chunk;
pub mod controller;
pub mod session;
pub mod state;
pub mod stats;

pub use chunk::{Artifact, Chunk};
pub use controller::{ControllerConfig, SessionController};
pub use session::{RecorderConfig, RecordingError, SessionRecorder};
pub use state::{ArtifactSummary, RecordingType, SessionEvent, SessionPhase};
pub use stats::RecordingStats;
