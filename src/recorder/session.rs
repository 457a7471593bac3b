//! Session recorder
//!
//! Bridges the compositor's output and the sources' audio into one
//! chunked capture. The combined stream holds an independent clone of
//! each source's audio track, so the live-preview chain and the recorder
//! never contend for samples.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;

use super::chunk::{Artifact, Chunk, ChunkEncoder};
use super::state::{RecordingType, SessionEvent};
use super::stats::RecordingStats;
use crate::capture::{AudioTrack, VideoFrame, VideoTrack};

/// Recorder configuration. Replaced whole, never mutated in place.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Interval between chunk emissions
    pub chunk_interval: Duration,

    /// Target video bitrate in bits per second
    pub video_bits_per_second: u32,

    /// Container type of the finalized artifact
    pub mime_type: String,

    /// Optional hard cap on capture time; the session self-finalizes
    /// once exceeded
    pub time_limit: Option<Duration>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            chunk_interval: Duration::from_millis(1000),
            video_bits_per_second: 2_500_000,
            mime_type: "video/webm".to_string(),
            time_limit: None,
        }
    }
}

/// Errors that can occur during recording
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("no active sources to record")]
    NoActiveSources,

    #[error("already recording")]
    AlreadyRecording,

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl RecordingError {
    pub fn code(&self) -> &'static str {
        match self {
            RecordingError::NoActiveSources => "NO_ACTIVE_SOURCES",
            RecordingError::AlreadyRecording => "ALREADY_RECORDING",
            RecordingError::Encoding(_) => "ENCODING_ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecorderPhase {
    Inactive,
    Recording,
    Paused,
}

struct RecorderShared {
    config: RecorderConfig,
    phase: RwLock<RecorderPhase>,
    chunks: Mutex<Vec<Chunk>>,
    stats: RwLock<Option<RecordingStats>>,
    events: broadcast::Sender<SessionEvent>,
    started_at: Mutex<Option<Instant>>,
    paused_total: Mutex<Duration>,
    paused_since: Mutex<Option<Instant>>,
    source_count: AtomicUsize,
    frames_total: AtomicU64,
    stop_notify: Notify,
}

struct ActiveRecording {
    task: JoinHandle<()>,
    recording_type: RecordingType,
    audio: Arc<Vec<AudioTrack>>,
}

/// Chunked capture over one combined stream
pub struct SessionRecorder {
    shared: Arc<RecorderShared>,
    active: Mutex<Option<ActiveRecording>>,
}

impl SessionRecorder {
    pub fn new(config: RecorderConfig, events: broadcast::Sender<SessionEvent>) -> Self {
        Self {
            shared: Arc::new(RecorderShared {
                config,
                phase: RwLock::new(RecorderPhase::Inactive),
                chunks: Mutex::new(Vec::new()),
                stats: RwLock::new(None),
                events,
                started_at: Mutex::new(None),
                paused_total: Mutex::new(Duration::ZERO),
                paused_since: Mutex::new(None),
                source_count: AtomicUsize::new(0),
                frames_total: AtomicU64::new(0),
                stop_notify: Notify::new(),
            }),
            active: Mutex::new(None),
        }
    }

    pub fn is_recording(&self) -> bool {
        *self.shared.phase.read() == RecorderPhase::Recording
    }

    pub fn is_paused(&self) -> bool {
        *self.shared.phase.read() == RecorderPhase::Paused
    }

    /// Latest derived statistics, if a session is in progress
    pub fn stats(&self) -> Option<RecordingStats> {
        self.shared.stats.read().clone()
    }

    /// Open a chunked capture over the combined stream.
    ///
    /// `video` is the compositor's output track; `audio` holds an
    /// independent clone per active source. Fails with `NoActiveSources`
    /// when no combined stream can be formed.
    pub fn start(
        &self,
        recording_type: RecordingType,
        video: Option<VideoTrack>,
        audio: Vec<AudioTrack>,
        timestamp_scale: f64,
    ) -> Result<(), RecordingError> {
        let mut active = self.active.lock();
        if active.is_some() || *self.shared.phase.read() != RecorderPhase::Inactive {
            return Err(RecordingError::AlreadyRecording);
        }

        let video = video
            .filter(|track| !track.is_stopped())
            .ok_or(RecordingError::NoActiveSources)?;

        let source_count = audio.len();
        let audio = Arc::new(audio);

        self.shared.chunks.lock().clear();
        *self.shared.started_at.lock() = Some(Instant::now());
        *self.shared.paused_total.lock() = Duration::ZERO;
        *self.shared.paused_since.lock() = None;
        self.shared.source_count.store(source_count, Ordering::SeqCst);
        self.shared.frames_total.store(0, Ordering::SeqCst);
        *self.shared.stats.write() = Some(RecordingStats {
            duration_ms: 0.0,
            file_size: 0,
            frame_rate: None,
            bitrate: Some(self.shared.config.video_bits_per_second),
            sources: source_count,
            chunk_count: 0,
        });
        *self.shared.phase.write() = RecorderPhase::Recording;

        let task = tokio::spawn(run_chunk_task(
            Arc::clone(&self.shared),
            video.clone(),
            video.subscribe(),
            Arc::clone(&audio),
            timestamp_scale,
        ));

        *active = Some(ActiveRecording {
            task,
            recording_type,
            audio,
        });

        tracing::info!(%recording_type, sources = source_count, "recording started");
        Ok(())
    }

    /// Suspend chunk capture. No-op unless currently recording.
    pub fn pause(&self) {
        let mut phase = self.shared.phase.write();
        if *phase != RecorderPhase::Recording {
            return;
        }
        *phase = RecorderPhase::Paused;
        *self.shared.paused_since.lock() = Some(Instant::now());
        tracing::info!("recording paused");
        let _ = self.shared.events.send(SessionEvent::Paused);
    }

    /// Resume chunk capture. No-op unless currently paused.
    pub fn resume(&self) {
        let mut phase = self.shared.phase.write();
        if *phase != RecorderPhase::Paused {
            return;
        }
        if let Some(since) = self.shared.paused_since.lock().take() {
            *self.shared.paused_total.lock() += since.elapsed();
        }
        *phase = RecorderPhase::Recording;
        tracing::info!("recording resumed");
        let _ = self.shared.events.send(SessionEvent::Resumed);
    }

    /// Finalize the session into one artifact.
    ///
    /// Flushes the in-flight chunk before concatenating, releases the
    /// recorder's cloned tracks (never the registry's originals) and
    /// clears internal buffers. A stop with no session in progress is a
    /// safe no-op returning `None`.
    pub async fn stop(&self) -> Result<Option<Artifact>, RecordingError> {
        let Some(active) = self.active.lock().take() else {
            return Ok(None);
        };

        self.shared.stop_notify.notify_one();
        if let Err(e) = active.task.await {
            tracing::error!("chunk task failed: {e}");
        }

        let duration_ms = elapsed_ms(&self.shared);
        *self.shared.phase.write() = RecorderPhase::Inactive;
        *self.shared.started_at.lock() = None;
        *self.shared.stats.write() = None;

        for track in active.audio.iter() {
            track.stop();
        }

        let chunks: Vec<Chunk> = self.shared.chunks.lock().drain(..).collect();
        let artifact = Artifact::from_chunks(
            chunks,
            self.shared.config.mime_type.clone(),
            active.recording_type,
            duration_ms,
        );

        tracing::info!(
            bytes = artifact.len(),
            chunks = artifact.chunk_count,
            duration_ms,
            "recording stopped"
        );
        Ok(Some(artifact))
    }
}

/// Capture time elapsed so far, with paused intervals excluded
fn elapsed_ms(shared: &RecorderShared) -> f64 {
    let Some(started) = *shared.started_at.lock() else {
        return 0.0;
    };
    let mut elapsed = started.elapsed();
    if let Some(since) = *shared.paused_since.lock() {
        elapsed = elapsed.saturating_sub(since.elapsed());
    }
    elapsed = elapsed.saturating_sub(*shared.paused_total.lock());
    elapsed.as_secs_f64() * 1000.0
}

async fn run_chunk_task(
    shared: Arc<RecorderShared>,
    video: VideoTrack,
    mut frames: broadcast::Receiver<Arc<VideoFrame>>,
    audio: Arc<Vec<AudioTrack>>,
    timestamp_scale: f64,
) {
    let mut encoder = ChunkEncoder::new(timestamp_scale);
    let period = shared.config.chunk_interval;
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let phase = *shared.phase.read();
                match phase {
                    RecorderPhase::Recording => {
                        emit_chunk(&shared, &mut encoder, &audio);

                        if let Some(limit) = shared.config.time_limit {
                            if elapsed_ms(&shared) >= limit.as_secs_f64() * 1000.0 {
                                tracing::info!("time limit reached; ending chunk capture");
                                break;
                            }
                        }
                        if video.is_stopped() {
                            // The feed died mid-recording; keep what we have
                            tracing::warn!("video feed lost; ending chunk capture");
                            break;
                        }
                    }
                    RecorderPhase::Paused => {
                        // Audio arriving while paused is never recorded.
                        // Frames captured before the pause stay pending and
                        // flush with the first post-resume chunk.
                        for track in audio.iter() {
                            let _ = track.drain();
                        }
                    }
                    RecorderPhase::Inactive => break,
                }
            }
            frame = frames.recv() => {
                match frame {
                    Ok(frame) => {
                        if *shared.phase.read() == RecorderPhase::Recording {
                            encoder.push_frame(frame);
                            shared.frames_total.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Best effort; late frames are simply dropped
                        tracing::debug!(skipped, "frame feed lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::warn!("frame feed closed; ending chunk capture");
                        break;
                    }
                }
            }
            _ = shared.stop_notify.notified() => break,
        }
    }

    // Flush the in-flight chunk so the last partial segment is not lost
    if *shared.phase.read() == RecorderPhase::Recording {
        emit_chunk(&shared, &mut encoder, &audio);
    }
}

fn emit_chunk(shared: &RecorderShared, encoder: &mut ChunkEncoder, audio: &[AudioTrack]) {
    let drained: Vec<(usize, Vec<i16>)> = audio
        .iter()
        .enumerate()
        .map(|(index, track)| (index, track.drain()))
        .collect();

    let timestamp_ms = elapsed_ms(shared);
    match encoder.take_chunk(&drained, timestamp_ms) {
        Ok(Some(chunk)) => {
            let sequence = chunk.sequence;
            let bytes = chunk.len();
            let (chunk_count, file_size) = {
                let mut chunks = shared.chunks.lock();
                chunks.push(chunk);
                (chunks.len(), chunks.iter().map(Chunk::len).sum::<usize>())
            };

            let duration_ms = elapsed_ms(shared);
            let frames_total = shared.frames_total.load(Ordering::Relaxed);
            let frame_rate = if duration_ms > 0.0 && frames_total > 0 {
                Some(frames_total as f64 / (duration_ms / 1000.0))
            } else {
                None
            };
            *shared.stats.write() = Some(RecordingStats {
                duration_ms,
                file_size: file_size as u64,
                frame_rate,
                bitrate: Some(shared.config.video_bits_per_second),
                sources: shared.source_count.load(Ordering::SeqCst),
                chunk_count,
            });

            let _ = shared
                .events
                .send(SessionEvent::ChunkCaptured { sequence, bytes });
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!("chunk encoding failed: {e}");
            let _ = shared.events.send(SessionEvent::Error(e.to_string()));
        }
    }
}
