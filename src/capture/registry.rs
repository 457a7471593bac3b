//! Source registry
//!
//! Owns the set of live capture sources and their device resources.
//! Asynchronous consumers (compositor, recorder) never hold a live
//! reference into the registry; they work from explicit snapshots.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::device::{CaptureDevice, CaptureError, CaptureOptions, CaptureResult, SourceKind};
use super::stream::MediaStream;
use super::track::{AudioTrack, VideoTrack};
use crate::compositor::VideoEffect;

/// Monotonically-assigned source identifier; never reused
pub type SourceId = u64;

/// 3-D layout position of a source
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Rendered size of a source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// Partial position update; unset fields keep their current value
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

/// Partial size update; unset fields keep their current value
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SizeUpdate {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Registry configuration
#[derive(Debug, Clone, Copy)]
pub struct RegistryConfig {
    /// Maximum number of concurrent sources
    pub max_sources: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { max_sources: 3 }
    }
}

/// One registered capture source
struct Source {
    id: SourceId,
    kind: SourceKind,
    stream: MediaStream,
    active: bool,
    position: Position,
    size: Size,
    effect: Option<VideoEffect>,
}

/// Read-only view of a source at a point in time.
///
/// Carries a video track handle (cheap clone, read access only) but no
/// audio handle; audio consumers clone a handle explicitly via
/// [`SourceRegistry::clone_audio`] so idle snapshots never buffer samples.
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    pub id: SourceId,
    pub kind: SourceKind,
    pub active: bool,
    pub position: Position,
    pub size: Size,
    pub effect: Option<VideoEffect>,
    pub video: VideoTrack,
}

struct Inner {
    sources: Vec<Source>,
    next_id: SourceId,
}

/// Sole owner of device track handles
pub struct SourceRegistry {
    device: Arc<dyn CaptureDevice>,
    config: RegistryConfig,
    inner: RwLock<Inner>,
}

impl SourceRegistry {
    pub fn new(device: Arc<dyn CaptureDevice>, config: RegistryConfig) -> Self {
        Self {
            device,
            config,
            inner: RwLock::new(Inner {
                sources: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Acquire a new capture source.
    ///
    /// Capacity is checked before negotiating with the device and
    /// re-checked after, so a failed or over-capacity acquisition leaves
    /// no partial source behind.
    pub async fn add_source(
        &self,
        kind: SourceKind,
        options: CaptureOptions,
    ) -> CaptureResult<SourceSnapshot> {
        {
            let inner = self.inner.read();
            if inner.sources.len() >= self.config.max_sources {
                return Err(CaptureError::CapacityExceeded(self.config.max_sources));
            }
        }

        // The device call suspends; no lock is held across it.
        let stream = self.device.open(kind, &options).await?;

        let mut inner = self.inner.write();
        if inner.sources.len() >= self.config.max_sources {
            stream.stop_tracks();
            return Err(CaptureError::CapacityExceeded(self.config.max_sources));
        }

        let id = inner.next_id;
        inner.next_id += 1;

        let settings = *stream.settings();
        let source = Source {
            id,
            kind,
            stream,
            active: true,
            position: Position::default(),
            size: Size {
                width: settings.width,
                height: settings.height,
            },
            effect: None,
        };
        let snapshot = snapshot_of(&source);
        inner.sources.push(source);

        tracing::info!(id, %kind, width = settings.width, height = settings.height, "source added");
        Ok(snapshot)
    }

    /// Stop and remove a source. Unknown ids are a no-op.
    pub fn remove_source(&self, id: SourceId) {
        let mut inner = self.inner.write();
        if let Some(pos) = inner.sources.iter().position(|s| s.id == id) {
            let source = inner.sources.remove(pos);
            source.stream.stop_tracks();
            tracing::info!(id, "source removed");
        } else {
            tracing::debug!(id, "remove for unknown source ignored");
        }
    }

    /// Stop and remove every source
    pub fn remove_all(&self) {
        let mut inner = self.inner.write();
        for source in inner.sources.drain(..) {
            source.stream.stop_tracks();
            tracing::info!(id = source.id, "source removed");
        }
    }

    /// Flip a source's `active` flag, disabling its audio in lockstep.
    /// Returns the new state, or None if the id is unknown.
    pub fn toggle_source(&self, id: SourceId) -> Option<bool> {
        let mut inner = self.inner.write();
        let source = inner.sources.iter_mut().find(|s| s.id == id)?;
        source.active = !source.active;
        source.stream.audio().hub().set_enabled(source.active);
        tracing::info!(id, active = source.active, "source toggled");
        Some(source.active)
    }

    /// Partial-merge update of a source's position. Clamping is the
    /// caller's responsibility.
    pub fn update_position(&self, id: SourceId, delta: PositionUpdate) {
        let mut inner = self.inner.write();
        if let Some(source) = inner.sources.iter_mut().find(|s| s.id == id) {
            if let Some(x) = delta.x {
                source.position.x = x;
            }
            if let Some(y) = delta.y {
                source.position.y = y;
            }
            if let Some(z) = delta.z {
                source.position.z = z;
            }
        }
    }

    /// Partial-merge update of a source's size
    pub fn update_size(&self, id: SourceId, delta: SizeUpdate) {
        let mut inner = self.inner.write();
        if let Some(source) = inner.sources.iter_mut().find(|s| s.id == id) {
            if let Some(width) = delta.width {
                source.size.width = width;
            }
            if let Some(height) = delta.height {
                source.size.height = height;
            }
        }
    }

    /// Tag a source with a per-source visual effect (None clears it)
    pub fn set_effect(&self, id: SourceId, effect: Option<VideoEffect>) {
        let mut inner = self.inner.write();
        if let Some(source) = inner.sources.iter_mut().find(|s| s.id == id) {
            source.effect = effect;
        }
    }

    /// Point-in-time view of every source, in registration order
    pub fn snapshot(&self) -> Vec<SourceSnapshot> {
        self.inner.read().sources.iter().map(snapshot_of).collect()
    }

    /// Clone an independent audio handle for a source.
    /// The handle receives live samples into its own buffer.
    pub fn clone_audio(&self, id: SourceId) -> Option<AudioTrack> {
        let inner = self.inner.read();
        inner
            .sources
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.stream.audio().clone_handle())
    }

    pub fn len(&self) -> usize {
        self.inner.read().sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().sources.is_empty()
    }
}

fn snapshot_of(source: &Source) -> SourceSnapshot {
    SourceSnapshot {
        id: source.id,
        kind: source.kind,
        active: source.active,
        position: source.position,
        size: source.size,
        effect: source.effect,
        video: source.stream.video().clone(),
    }
}
