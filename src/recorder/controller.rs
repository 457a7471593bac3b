//! Session state machine
//!
//! Governs the legal sequence of session operations
//! (idle -> countdown -> recording <-> paused -> stopped) and dispatches
//! side effects at each transition. Sources are acquired speculatively
//! when the countdown starts, so permission prompts land before capture
//! begins; cancellation rolls the acquisition back exactly.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::chunk::Artifact;
use super::session::{RecorderConfig, SessionRecorder};
use super::state::{ArtifactSummary, RecordingType, SessionEvent, SessionPhase};
use crate::capture::{CaptureOptions, SourceId, SourceKind, SourceRegistry};
use crate::compositor::Compositor;
use crate::utils::AppError;

/// Controller configuration
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// Delay between source acquisition and the start of capture
    pub countdown: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(5),
        }
    }
}

struct CountdownState {
    task: JoinHandle<()>,
    speculative: Vec<SourceId>,
    recording_type: RecordingType,
}

/// Coordinates the registry, compositor and recorder through one
/// session lifecycle. A new session is a fresh `request_start`; the
/// previous session's state is fully discarded on stop.
pub struct SessionController {
    registry: Arc<SourceRegistry>,
    compositor: Arc<Compositor>,
    recorder: SessionRecorder,
    config: ControllerConfig,
    phase: RwLock<SessionPhase>,
    /// Identity of the session being started or recorded. Cleared on
    /// cancel/stop, which is how an in-flight `request_start` learns it
    /// was cancelled.
    session_id: RwLock<Option<Uuid>>,
    countdown: Mutex<Option<CountdownState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(
        registry: Arc<SourceRegistry>,
        compositor: Arc<Compositor>,
        recorder_config: RecorderConfig,
        config: ControllerConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(128);
        let recorder = SessionRecorder::new(recorder_config, events.clone());
        Arc::new(Self {
            registry,
            compositor,
            recorder,
            config,
            phase: RwLock::new(SessionPhase::Idle),
            session_id: RwLock::new(None),
            countdown: Mutex::new(None),
            events,
        })
    }

    /// Subscribe to session transition events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.read()
    }

    pub fn stats(&self) -> Option<super::stats::RecordingStats> {
        self.recorder.stats()
    }

    /// Begin a session: speculatively acquire the requested sources,
    /// then count down to recording.
    ///
    /// Only legal from idle. Acquisition failure rolls back any sources
    /// already acquired and routes the machine straight back to idle.
    ///
    /// Device negotiation suspends at each `add_source`, and a
    /// cancellation can land while it is pending. The session id doubles
    /// as the cancellation token: `cancel_countdown` clears it under the
    /// phase lock, and this flow re-checks it after every suspension so
    /// a just-granted source is released instead of being applied to a
    /// session that never starts.
    pub async fn request_start(
        self: &Arc<Self>,
        recording_type: RecordingType,
        requests: Vec<(SourceKind, CaptureOptions)>,
    ) -> Result<(), AppError> {
        let session = Uuid::new_v4();
        {
            let mut phase = self.phase.write();
            if *phase != SessionPhase::Idle {
                return Err(AppError::Recording(
                    super::session::RecordingError::AlreadyRecording,
                ));
            }
            *phase = SessionPhase::Countdown;
            *self.session_id.write() = Some(session);
        }

        let mut speculative = Vec::new();
        for (kind, options) in requests {
            match self.registry.add_source(kind, options).await {
                Ok(snapshot) => speculative.push(snapshot.id),
                Err(e) => {
                    for id in speculative {
                        self.registry.remove_source(id);
                    }
                    {
                        let mut phase = self.phase.write();
                        if *self.session_id.read() == Some(session) {
                            *phase = SessionPhase::Idle;
                            *self.session_id.write() = None;
                        }
                    }
                    let app_error = AppError::Capture(e);
                    let _ = self
                        .events
                        .send(SessionEvent::Error(app_error.to_string()));
                    return Err(app_error);
                }
            }

            if *self.session_id.read() != Some(session) {
                // Cancelled while the device call was in flight
                for id in speculative {
                    self.registry.remove_source(id);
                }
                tracing::info!("start cancelled during device negotiation");
                return Ok(());
            }
        }

        let seconds = self.config.countdown.as_secs() as u32;
        let controller = Arc::clone(self);
        let countdown = self.config.countdown;
        let task = tokio::spawn(async move {
            tokio::time::sleep(countdown).await;
            controller.begin_recording().await;
        });

        {
            let phase = self.phase.read();
            if *phase != SessionPhase::Countdown || *self.session_id.read() != Some(session) {
                drop(phase);
                task.abort();
                for id in speculative {
                    self.registry.remove_source(id);
                }
                tracing::info!("start cancelled during device negotiation");
                return Ok(());
            }
            *self.countdown.lock() = Some(CountdownState {
                task,
                speculative,
                recording_type,
            });
            let _ = self.events.send(SessionEvent::CountdownStarted { seconds });
        }

        tracing::info!(%recording_type, seconds, "countdown started");
        Ok(())
    }

    /// Abort a running countdown, rolling back every speculatively
    /// acquired source. Idempotent; a no-op outside the countdown phase.
    ///
    /// Legal at any point of the countdown, including while device
    /// negotiation is still pending; in that window the rollback is
    /// carried out by `request_start` when the pending call resolves.
    pub fn cancel_countdown(&self) {
        let state = {
            let mut phase = self.phase.write();
            if *phase != SessionPhase::Countdown {
                return;
            }
            *phase = SessionPhase::Idle;
            *self.session_id.write() = None;
            self.countdown.lock().take()
        };

        if let Some(state) = state {
            state.task.abort();
            for id in state.speculative {
                self.registry.remove_source(id);
            }
        }
        tracing::info!("countdown cancelled");
        let _ = self.events.send(SessionEvent::CountdownCancelled);
    }

    /// Countdown completion: build the combined stream and start capture.
    ///
    /// Runs entirely under the phase lock so a concurrent cancellation
    /// either happens before (nothing to start) or waits until the
    /// transition out of countdown is complete.
    async fn begin_recording(self: Arc<Self>) {
        let mut phase = self.phase.write();
        if *phase != SessionPhase::Countdown {
            return;
        }
        let Some(state) = self.countdown.lock().take() else {
            return;
        };

        let snapshot = self.registry.snapshot();
        let audio = snapshot
            .iter()
            .filter(|s| s.active)
            .filter_map(|s| self.registry.clone_audio(s.id))
            .collect();

        // The rendering surface is unavailable unless the compositor runs
        let video = self.compositor.is_running().then(|| self.compositor.output());
        let timestamp_scale = self.compositor.config().effect.timestamp_scale();

        match self
            .recorder
            .start(state.recording_type, video, audio, timestamp_scale)
        {
            Ok(()) => {
                *phase = SessionPhase::Recording;
                let _ = self.events.send(SessionEvent::Started);
            }
            Err(e) => {
                // Entry failure routes to idle; no partial artifact exists
                for id in state.speculative {
                    self.registry.remove_source(id);
                }
                *phase = SessionPhase::Idle;
                *self.session_id.write() = None;
                tracing::error!("failed to start recording: {e}");
                let _ = self.events.send(SessionEvent::Error(e.to_string()));
            }
        }
    }

    /// Pause capture. No-op unless recording.
    pub fn pause(&self) {
        let mut phase = self.phase.write();
        if *phase != SessionPhase::Recording {
            return;
        }
        self.recorder.pause();
        *phase = SessionPhase::Paused;
    }

    /// Resume capture. No-op unless paused.
    pub fn resume(&self) {
        let mut phase = self.phase.write();
        if *phase != SessionPhase::Paused {
            return;
        }
        self.recorder.resume();
        *phase = SessionPhase::Recording;
    }

    /// Stop the session, finalize the artifact and release every source.
    ///
    /// Calling stop when no session is active is a safe no-op that
    /// returns `None`.
    pub async fn stop(&self) -> Result<Option<Artifact>, AppError> {
        {
            let mut phase = self.phase.write();
            match *phase {
                SessionPhase::Recording | SessionPhase::Paused => {
                    *phase = SessionPhase::Stopped;
                }
                _ => return Ok(None),
            }
        }

        let artifact = self.recorder.stop().await?;
        self.registry.remove_all();
        *self.phase.write() = SessionPhase::Idle;
        *self.session_id.write() = None;

        if let Some(artifact) = &artifact {
            let _ = self.events.send(SessionEvent::Stopped(ArtifactSummary {
                recording_type: artifact.recording_type,
                len_bytes: artifact.len(),
                chunk_count: artifact.chunk_count,
                duration_ms: artifact.duration_ms,
            }));
        }
        Ok(artifact)
    }
}
