// Integration tests for the session state machine
//
// Drives the full lifecycle (idle -> countdown -> recording <-> paused ->
// stopped) over the synthetic device with a short countdown.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use capture_studio::capture::{
    CaptureDevice, CaptureOptions, CaptureResult, MediaStream, RegistryConfig, SourceKind,
    SourceRegistry, SyntheticDevice,
};
use capture_studio::compositor::{Compositor, CompositorConfig, Surface};
use capture_studio::recorder::{
    ControllerConfig, RecorderConfig, RecordingType, SessionController, SessionPhase,
};

const COUNTDOWN: Duration = Duration::from_millis(40);

/// Device that takes a while to grant access, like a permission prompt
struct SlowDevice {
    inner: SyntheticDevice,
    delay: Duration,
}

#[async_trait]
impl CaptureDevice for SlowDevice {
    async fn open(&self, kind: SourceKind, options: &CaptureOptions) -> CaptureResult<MediaStream> {
        tokio::time::sleep(self.delay).await;
        self.inner.open(kind, options).await
    }
}

fn controller_with_device(
    device: Arc<dyn CaptureDevice>,
) -> (Arc<SessionController>, Arc<Compositor>, Arc<SourceRegistry>) {
    let registry = Arc::new(SourceRegistry::new(device, RegistryConfig::default()));
    let compositor = Arc::new(Compositor::new(
        Surface::new(32, 18),
        CompositorConfig::default(),
        Arc::clone(&registry),
    ));
    let controller = SessionController::new(
        Arc::clone(&registry),
        Arc::clone(&compositor),
        RecorderConfig {
            chunk_interval: Duration::from_millis(30),
            ..Default::default()
        },
        ControllerConfig {
            countdown: COUNTDOWN,
        },
    );
    (controller, compositor, registry)
}

fn controller() -> (Arc<SessionController>, Arc<Compositor>) {
    let registry = Arc::new(SourceRegistry::new(
        Arc::new(SyntheticDevice::default()),
        RegistryConfig::default(),
    ));
    let compositor = Arc::new(Compositor::new(
        Surface::new(32, 18),
        CompositorConfig::default(),
        Arc::clone(&registry),
    ));
    let controller = SessionController::new(
        registry,
        Arc::clone(&compositor),
        RecorderConfig {
            chunk_interval: Duration::from_millis(30),
            ..Default::default()
        },
        ControllerConfig {
            countdown: COUNTDOWN,
        },
    );
    (controller, compositor)
}

fn screen_request() -> Vec<(SourceKind, CaptureOptions)> {
    vec![(SourceKind::Screen, CaptureOptions::default())]
}

#[tokio::test]
async fn test_cancel_during_countdown_restores_idle_and_releases_sources() {
    let (controller, compositor) = controller();
    compositor.start();

    controller
        .request_start(RecordingType::Screen, screen_request())
        .await
        .unwrap();
    assert_eq!(controller.phase(), SessionPhase::Countdown);

    controller.cancel_countdown();
    assert_eq!(controller.phase(), SessionPhase::Idle);

    // The speculative source is gone; a fresh start succeeds
    controller
        .request_start(RecordingType::Screen, screen_request())
        .await
        .unwrap();
    controller.cancel_countdown();

    // Cancelling outside the countdown is a no-op
    controller.cancel_countdown();
    assert_eq!(controller.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn test_countdown_completion_enters_recording_and_stop_finalizes() {
    let (controller, compositor) = controller();
    compositor.start();

    controller
        .request_start(RecordingType::Screen, screen_request())
        .await
        .unwrap();

    tokio::time::sleep(COUNTDOWN + Duration::from_millis(60)).await;
    assert_eq!(controller.phase(), SessionPhase::Recording);
    assert!(controller.stats().is_some());

    tokio::time::sleep(Duration::from_millis(80)).await;

    let artifact = controller.stop().await.unwrap().unwrap();
    assert!(artifact.len() > 0);
    assert_eq!(controller.phase(), SessionPhase::Idle);
    assert!(controller.stats().is_none());
}

#[tokio::test]
async fn test_pause_and_resume_gate_on_phase() {
    let (controller, compositor) = controller();
    compositor.start();

    // Outside a session both are no-ops
    controller.pause();
    controller.resume();
    assert_eq!(controller.phase(), SessionPhase::Idle);

    controller
        .request_start(RecordingType::Screen, screen_request())
        .await
        .unwrap();
    tokio::time::sleep(COUNTDOWN + Duration::from_millis(60)).await;

    controller.pause();
    assert_eq!(controller.phase(), SessionPhase::Paused);
    controller.pause();
    assert_eq!(controller.phase(), SessionPhase::Paused);

    controller.resume();
    assert_eq!(controller.phase(), SessionPhase::Recording);

    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let (controller, compositor) = controller();
    compositor.start();

    assert!(controller.stop().await.unwrap().is_none());

    controller
        .request_start(RecordingType::Screen, screen_request())
        .await
        .unwrap();
    tokio::time::sleep(COUNTDOWN + Duration::from_millis(60)).await;

    assert!(controller.stop().await.unwrap().is_some());
    assert!(controller.stop().await.unwrap().is_none());
}

#[tokio::test]
async fn test_start_is_rejected_outside_idle() {
    let (controller, compositor) = controller();
    compositor.start();

    controller
        .request_start(RecordingType::Screen, screen_request())
        .await
        .unwrap();

    let err = controller
        .request_start(RecordingType::Screen, screen_request())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ALREADY_RECORDING");

    controller.cancel_countdown();
}

#[tokio::test]
async fn test_stopped_compositor_routes_start_failure_back_to_idle() {
    let (controller, _compositor) = controller();
    // Compositor never started: no combined stream can be formed

    let mut events = controller.subscribe();
    controller
        .request_start(RecordingType::Screen, screen_request())
        .await
        .unwrap();
    tokio::time::sleep(COUNTDOWN + Duration::from_millis(60)).await;

    assert_eq!(controller.phase(), SessionPhase::Idle);

    let mut saw_error = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, capture_studio::recorder::SessionEvent::Error(_)) {
            saw_error = true;
        }
    }
    assert!(saw_error, "entry failure must surface on the event stream");
}

#[tokio::test]
async fn test_cancel_during_device_negotiation_releases_the_granted_source() {
    let (controller, compositor, registry) = controller_with_device(Arc::new(SlowDevice {
        inner: SyntheticDevice::default(),
        delay: Duration::from_millis(200),
    }));
    compositor.start();

    let starter = Arc::clone(&controller);
    let start_task =
        tokio::spawn(
            async move { starter.request_start(RecordingType::Screen, screen_request()).await },
        );

    // Cancel while the device is still deciding whether to grant access
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(controller.phase(), SessionPhase::Countdown);
    controller.cancel_countdown();
    assert_eq!(controller.phase(), SessionPhase::Idle);

    // The pending grant resolves, gets rolled back, and no session starts
    assert!(start_task.await.unwrap().is_ok());
    tokio::time::sleep(Duration::from_millis(250) + COUNTDOWN).await;
    assert_eq!(controller.phase(), SessionPhase::Idle);
    assert!(registry.is_empty());
    assert!(controller.stats().is_none());

    // The machine is reusable after the aborted start
    controller
        .request_start(RecordingType::Screen, screen_request())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(250) + COUNTDOWN).await;
    assert_eq!(controller.phase(), SessionPhase::Recording);
    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_paused_session_can_stop_directly() {
    let (controller, compositor) = controller();
    compositor.start();

    controller
        .request_start(RecordingType::Multi, screen_request())
        .await
        .unwrap();
    tokio::time::sleep(COUNTDOWN + Duration::from_millis(60)).await;

    controller.pause();
    assert_eq!(controller.phase(), SessionPhase::Paused);

    let artifact = controller.stop().await.unwrap().unwrap();
    assert_eq!(artifact.recording_type, RecordingType::Multi);
    assert_eq!(controller.phase(), SessionPhase::Idle);
}
