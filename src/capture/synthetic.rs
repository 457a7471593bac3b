//! Synthetic capture device
//!
//! Generates solid-color frames and a sine tone without touching any
//! hardware. Used for previewing pipelines headlessly and throughout the
//! test suite.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::device::{CaptureDevice, CaptureOptions, CaptureResult, SourceKind, TrackSettings};
use super::frame::VideoFrame;
use super::stream::MediaStream;
use super::track::{AudioHub, AudioTrack, VideoTrack};

/// Colors cycled across successive opens so multiple synthetic sources
/// are distinguishable in a composition.
const PALETTE: [[u8; 4]; 6] = [
    [200, 40, 40, 255],
    [40, 200, 40, 255],
    [40, 40, 200, 255],
    [200, 200, 40, 255],
    [200, 40, 200, 255],
    [40, 200, 200, 255],
];

/// Configuration for the synthetic device
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub sample_rate: u32,
    /// Frequency of the generated tone in Hz
    pub tone_hz: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frame_rate: 30,
            sample_rate: 48_000,
            tone_hz: 440.0,
        }
    }
}

/// Hardware-free capture device
pub struct SyntheticDevice {
    config: SyntheticConfig,
    opened: AtomicUsize,
}

impl SyntheticDevice {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            opened: AtomicUsize::new(0),
        }
    }
}

impl Default for SyntheticDevice {
    fn default() -> Self {
        Self::new(SyntheticConfig::default())
    }
}

#[async_trait]
impl CaptureDevice for SyntheticDevice {
    async fn open(&self, kind: SourceKind, options: &CaptureOptions) -> CaptureResult<MediaStream> {
        let settings = TrackSettings {
            width: options.width.unwrap_or(self.config.width),
            height: options.height.unwrap_or(self.config.height),
            frame_rate: options.frame_rate.unwrap_or(self.config.frame_rate),
            sample_rate: self.config.sample_rate,
        };

        let index = self.opened.fetch_add(1, Ordering::SeqCst);
        let color = match kind {
            // Screens render a neutral gray so camera tiles stand out
            SourceKind::Screen => [80, 80, 90, 255],
            SourceKind::Camera => PALETTE[index % PALETTE.len()],
        };

        let video = VideoTrack::new();
        let hub = AudioHub::new(settings.sample_rate);
        let audio = AudioTrack::new(hub.clone());

        let feeder_video = video.clone();
        let feeder_hub = hub.clone();
        let tone_hz = self.config.tone_hz;
        let samples_per_frame = (settings.sample_rate / settings.frame_rate.max(1)) as usize;
        let period = Duration::from_millis((1000 / settings.frame_rate.max(1)).max(1) as u64);

        tokio::spawn(async move {
            let started = Instant::now();
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut phase: f64 = 0.0;
            let step = 2.0 * std::f64::consts::PI * tone_hz / feeder_hub.sample_rate() as f64;

            loop {
                interval.tick().await;
                if feeder_video.is_stopped() && feeder_hub.is_stopped() {
                    break;
                }

                let timestamp_ms = started.elapsed().as_secs_f64() * 1000.0;
                feeder_video.push_frame(VideoFrame::filled(
                    settings.width,
                    settings.height,
                    color,
                    timestamp_ms,
                ));

                let mut samples = Vec::with_capacity(samples_per_frame);
                for _ in 0..samples_per_frame {
                    samples.push((phase.sin() * (i16::MAX / 2) as f64) as i16);
                    phase += step;
                }
                feeder_hub.push_samples(&samples);
            }

            tracing::debug!("synthetic feeder stopped");
        });

        tracing::debug!(%kind, ?settings, "opened synthetic stream");
        Ok(MediaStream::new(video, audio, settings))
    }
}
