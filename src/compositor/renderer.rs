//! Frame compositor
//!
//! Draws every active source into one shared surface each tick and
//! exposes the result as a continuously-updating output track. The tick
//! loop runs independently of recording state (it is the live preview)
//! and never blocks on the recorder; missed ticks are skipped, no frame
//! queue is kept.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use super::effects::{self, VideoEffect};
use super::layout::{self, MAX_DRAWN_SOURCES};
use super::surface::Surface;
use crate::capture::{SourceRegistry, SourceSnapshot, VideoFrame, VideoTrack};

/// Compositor configuration. Replaced whole, never mutated in place.
#[derive(Debug, Clone, Copy)]
pub struct CompositorConfig {
    /// Output frame cadence
    pub frame_rate: u32,
    /// Session-wide visual effect; a per-source effect tag overrides it
    pub effect: VideoEffect,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            effect: VideoEffect::None,
        }
    }
}

struct CompositorShared {
    surface: Mutex<Surface>,
    config: RwLock<CompositorConfig>,
    output: VideoTrack,
    registry: Arc<SourceRegistry>,
    running: AtomicBool,
}

/// Produces one composed video stream from the active source set
pub struct Compositor {
    shared: Arc<CompositorShared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Compositor {
    /// Create a compositor rendering into an explicitly provided surface
    pub fn new(surface: Surface, config: CompositorConfig, registry: Arc<SourceRegistry>) -> Self {
        Self {
            shared: Arc::new(CompositorShared {
                surface: Mutex::new(surface),
                config: RwLock::new(config),
                output: VideoTrack::new(),
                registry,
                running: AtomicBool::new(false),
            }),
            task: Mutex::new(None),
        }
    }

    /// Handle to the composed output stream
    pub fn output(&self) -> VideoTrack {
        self.shared.output.clone()
    }

    pub fn config(&self) -> CompositorConfig {
        *self.shared.config.read()
    }

    /// Replace the configuration wholesale; takes effect next frame
    pub fn set_config(&self, config: CompositorConfig) {
        *self.shared.config.write() = config;
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Start the per-frame render loop. Idempotent.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let frame_rate = shared.config.read().frame_rate.max(1);
            let period = Duration::from_secs_f64(1.0 / frame_rate as f64);
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let started = Instant::now();

            tracing::info!(frame_rate, "compositor started");

            while shared.running.load(Ordering::SeqCst) {
                interval.tick().await;
                let snapshot = shared.registry.snapshot();
                let timestamp_ms = started.elapsed().as_secs_f64() * 1000.0;
                render_into(&shared, &snapshot, timestamp_ms);
            }

            tracing::info!("compositor stopped");
        });

        *self.task.lock() = Some(handle);
    }

    /// Stop the render loop. Idempotent; the output track stays usable
    /// for whatever was last composed.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }

    /// Compose one frame from an explicit snapshot and publish it.
    /// The render loop and tests both go through here.
    pub fn render_once(&self, snapshot: &[SourceSnapshot], timestamp_ms: f64) -> VideoFrame {
        render_into(&self.shared, snapshot, timestamp_ms)
    }
}

impl Drop for Compositor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn render_into(
    shared: &CompositorShared,
    snapshot: &[SourceSnapshot],
    timestamp_ms: f64,
) -> VideoFrame {
    let config = *shared.config.read();
    let mut surface = shared.surface.lock();
    let (width, height) = (surface.width(), surface.height());

    surface.clear();

    let active: Vec<&SourceSnapshot> = snapshot.iter().filter(|s| s.active).collect();
    for (index, source) in active.iter().enumerate().take(MAX_DRAWN_SOURCES) {
        let Some(rect) = layout::dest_rect(index, active.len(), width, height) else {
            break;
        };
        let Some(frame) = source.video.latest() else {
            continue;
        };
        surface.draw_scaled(&frame, rect);

        let effect = source.effect.unwrap_or(config.effect);
        if effect != VideoEffect::None {
            effects::apply_in_place(surface.data_mut(), width, rect, effect);
        }
    }

    let frame = surface.to_frame(timestamp_ms);
    shared.output.push_frame(frame.clone());
    frame
}
