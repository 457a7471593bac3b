//! Track handles for live media
//!
//! `VideoTrack` carries the latest frame plus a best-effort frame feed;
//! `AudioTrack` is a clonable consumer handle over a shared producer hub.
//! The hub owns the `enabled` flag so muting a source silences every
//! handle going forward without touching samples already drained.

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;

use super::frame::VideoFrame;

/// Capacity of the per-track frame feed. Receivers that fall behind drop
/// old frames rather than queueing them.
const FRAME_FEED_CAPACITY: usize = 64;

/// Maximum buffered samples per audio consumer (2 seconds at 48 kHz).
/// Older samples are discarded so an undrained handle cannot grow unbounded.
const MAX_BUFFERED_SAMPLES: usize = 96_000;

struct VideoShared {
    latest: RwLock<Option<Arc<VideoFrame>>>,
    feed: broadcast::Sender<Arc<VideoFrame>>,
    enabled: AtomicBool,
    stopped: AtomicBool,
}

/// Read/write handle to a live video track.
///
/// Clones share the same underlying track; producers call `push_frame`,
/// consumers read `latest()` or `subscribe()`.
#[derive(Clone)]
pub struct VideoTrack {
    shared: Arc<VideoShared>,
}

impl VideoTrack {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FRAME_FEED_CAPACITY);
        Self {
            shared: Arc::new(VideoShared {
                latest: RwLock::new(None),
                feed,
                enabled: AtomicBool::new(true),
                stopped: AtomicBool::new(false),
            }),
        }
    }

    /// Publish a new frame. Ignored once the track is stopped or disabled.
    pub fn push_frame(&self, frame: VideoFrame) {
        if self.shared.stopped.load(Ordering::SeqCst) || !self.shared.enabled.load(Ordering::SeqCst)
        {
            return;
        }
        let frame = Arc::new(frame);
        *self.shared.latest.write() = Some(Arc::clone(&frame));
        // No receivers is fine; the latest-frame cell still updates.
        let _ = self.shared.feed.send(frame);
    }

    /// The most recently published frame, if any
    pub fn latest(&self) -> Option<Arc<VideoFrame>> {
        self.shared.latest.read().clone()
    }

    /// Subscribe to the live frame feed
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<VideoFrame>> {
        self.shared.feed.subscribe()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.shared.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }

    /// Stop the track. Returns true if this call performed the stop,
    /// false if it was already stopped.
    pub fn stop(&self) -> bool {
        !self.shared.stopped.swap(true, Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }
}

impl Default for VideoTrack {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VideoTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoTrack")
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Producer side of an audio track shared by every consumer handle
pub struct AudioHub {
    enabled: AtomicBool,
    stopped: AtomicBool,
    sample_rate: u32,
    consumers: Mutex<Vec<Weak<Mutex<VecDeque<i16>>>>>,
}

impl AudioHub {
    pub fn new(sample_rate: u32) -> Arc<Self> {
        Arc::new(Self {
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            sample_rate,
            consumers: Mutex::new(Vec::new()),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Deliver captured samples to every live consumer handle.
    /// No-op while disabled or after stop.
    pub fn push_samples(&self, samples: &[i16]) {
        if self.stopped.load(Ordering::SeqCst) || !self.enabled.load(Ordering::SeqCst) {
            return;
        }
        let mut consumers = self.consumers.lock();
        consumers.retain(|weak| {
            let Some(buffer) = weak.upgrade() else {
                return false;
            };
            let mut buffer = buffer.lock();
            buffer.extend(samples.iter().copied());
            while buffer.len() > MAX_BUFFERED_SAMPLES {
                buffer.pop_front();
            }
            true
        });
    }

    /// Mute or unmute the track for all handles, in lockstep
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Release the underlying device capture. Returns true if this call
    /// performed the stop (the side effect happens exactly once).
    pub fn stop(&self) -> bool {
        !self.stopped.swap(true, Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Consumer handle to a live audio track
pub struct AudioTrack {
    hub: Arc<AudioHub>,
    buffer: Arc<Mutex<VecDeque<i16>>>,
}

impl AudioTrack {
    pub fn new(hub: Arc<AudioHub>) -> Self {
        let buffer = Arc::new(Mutex::new(VecDeque::new()));
        hub.consumers.lock().push(Arc::downgrade(&buffer));
        Self { hub, buffer }
    }

    /// Create an independent handle on the same hub. The clone receives
    /// the same live samples into its own buffer.
    pub fn clone_handle(&self) -> AudioTrack {
        AudioTrack::new(Arc::clone(&self.hub))
    }

    pub fn hub(&self) -> &Arc<AudioHub> {
        &self.hub
    }

    pub fn is_enabled(&self) -> bool {
        self.hub.is_enabled()
    }

    pub fn is_stopped(&self) -> bool {
        self.hub.is_stopped()
    }

    /// Take every sample buffered on this handle since the last drain
    pub fn drain(&self) -> Vec<i16> {
        self.buffer.lock().drain(..).collect()
    }

    /// Detach this handle from the hub and discard its buffer.
    /// Other handles keep receiving.
    pub fn stop(&self) {
        let mut buffer = self.buffer.lock();
        buffer.clear();
        buffer.shrink_to_fit();
        // Dropping the strong Arc is what unregisters us, but handles can
        // outlive their usefulness; prune the weak entry eagerly.
        self.hub
            .consumers
            .lock()
            .retain(|weak| !weak.ptr_eq(&Arc::downgrade(&self.buffer)) && weak.strong_count() > 0);
    }
}
