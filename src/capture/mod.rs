//! Capture layer
//!
//! Device-agnostic media model (frames, tracks, streams), the
//! `CaptureDevice` negotiation trait, and the source registry that owns
//! all live device resources.

pub mod device;
pub mod frame;
pub mod registry;
pub mod stream;
pub mod synthetic;
pub mod track;

pub use device::{
    CaptureDevice, CaptureError, CaptureOptions, CaptureRegion, CaptureResult, SourceKind,
    TrackSettings,
};
pub use frame::VideoFrame;
pub use registry::{
    Position, PositionUpdate, RegistryConfig, Size, SizeUpdate, SourceId, SourceRegistry,
    SourceSnapshot,
};
pub use stream::MediaStream;
pub use synthetic::{SyntheticConfig, SyntheticDevice};
pub use track::{AudioHub, AudioTrack, VideoTrack};
