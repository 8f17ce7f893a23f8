//! Capture-and-overlay component
//!
//! Owns the camera session, the ROI tracker and the detection loop. It is the
//! only piece that touches the camera or the decoder; everything it finds is
//! reported upward as `ScannerEvent`s.

use crossbeam_channel::Sender;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::audio::Notifier;
use crate::capture::{Camera, CaptureSession};
use crate::config::AppConfig;
use crate::overlay::{OverlayView, RoiLayout, RoiTracker, Size};
use crate::scanner::{publish, DetectionLoop, LoopContext, ScanState};
use crate::shared::ScannerEvent;
use crate::vision::DecoderSupport;

/// Camera, ROI and detection loop for one mounted scanner
pub struct ScannerComponent {
    // Declared before `session` so the loop is cancelled before tracks stop
    detection: Option<DetectionLoop>,
    session: CaptureSession,
    tracker: RoiTracker,
    support: DecoderSupport,
    state: ScanState,
    notifier: Arc<dyn Notifier>,
    events: Sender<ScannerEvent>,
    interval: Duration,
}

impl ScannerComponent {
    /// Acquire the camera, compute the initial ROI and start detecting
    pub async fn mount(
        camera: &dyn Camera,
        support: DecoderSupport,
        config: &AppConfig,
        container: Size,
        notifier: Arc<dyn Notifier>,
        events: Sender<ScannerEvent>,
    ) -> Self {
        if let Some(notice) = support.notice() {
            warn!("{}", notice);
        }

        let session = CaptureSession::start(camera, &config.camera).await;
        if let Some(message) = session.error() {
            publish(&events, ScannerEvent::Error(message.to_string()));
        }

        let mut tracker = RoiTracker::new(config.roi);
        tracker.on_resize(container);
        if let Some(video) = session.video_size() {
            tracker.on_metadata(video);
        }

        let mut component = Self {
            detection: None,
            session,
            tracker,
            support,
            state: ScanState::default(),
            notifier,
            events,
            interval: config.scanner.poll_interval(),
        };

        component.emit_state();
        component.restart_detection().await;
        component
    }

    /// Container was resized; restarts detection when the ROI moved
    pub async fn resize(&mut self, container: Size) {
        if self.tracker.on_resize(container) {
            self.restart_detection().await;
        }
    }

    /// Stream metadata changed; restarts detection when the ROI moved
    pub async fn metadata_changed(&mut self, video: Size) {
        if self.tracker.on_metadata(video) {
            self.restart_detection().await;
        }
    }

    /// Pause or resume capture. Returns the new active state.
    pub async fn toggle(&mut self) -> bool {
        let active = self.session.toggle();
        self.emit_state();
        self.restart_detection().await;
        active
    }

    /// Tear down: cancel detection, then stop every track
    pub async fn unmount(mut self) {
        if let Some(detection) = self.detection.take() {
            detection.stop().await;
        }
        self.session.stop();
        info!("Scanner unmounted");
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// A detection loop is running
    pub fn is_detecting(&self) -> bool {
        self.detection
            .as_ref()
            .map(|d| !d.is_finished())
            .unwrap_or(false)
    }

    pub fn error(&self) -> Option<&str> {
        self.session.error()
    }

    pub fn supports_detection(&self) -> bool {
        self.support.is_supported()
    }

    /// Degraded-mode notice when no decoder is available
    pub fn notice(&self) -> Option<&'static str> {
        self.support.notice()
    }

    pub fn layout(&self) -> Option<&RoiLayout> {
        self.tracker.layout()
    }

    pub fn overlay(&self) -> Option<OverlayView> {
        self.tracker.overlay(self.is_active())
    }

    pub fn toggle_label(&self) -> &'static str {
        self.session.toggle_label()
    }

    /// Delay between detection cycles
    pub fn poll_interval(&self) -> Duration {
        self.interval
    }

    /// Stop the running loop (keeping its state) and start a fresh one if
    /// capture is active and a decoder is available
    async fn restart_detection(&mut self) {
        if let Some(detection) = self.detection.take() {
            self.state = detection.stop().await;
        }

        if !self.session.is_active() {
            return;
        }
        let Some(detector) = self.support.detector() else {
            return;
        };
        let Some(frames) = self.session.frame_source() else {
            return;
        };

        let ctx = LoopContext {
            roi: self.tracker.video_roi(),
            frames,
            detector,
            notifier: self.notifier.clone(),
            events: self.events.clone(),
            interval: self.interval,
        };
        debug!("Starting detection with ROI {:?}", ctx.roi);
        self.detection = Some(DetectionLoop::spawn(ctx, self.state.clone()));
    }

    fn emit_state(&self) {
        publish(
            &self.events,
            ScannerEvent::StateChanged {
                active: self.session.is_active(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::mock::MockCamera;
    use crate::error::ScannerError;
    use crate::scanner::testing::{CountingNotifier, ScriptedDetector};
    use crate::vision::{BarcodeFormat, DetectedBarcode};
    use crossbeam_channel::{unbounded, Receiver};
    use std::sync::atomic::Ordering;

    const INTERVAL: Duration = Duration::from_millis(700);

    fn code(value: &str) -> Vec<DetectedBarcode> {
        vec![DetectedBarcode::new(value, BarcodeFormat::Ean8)]
    }

    async fn mount(
        camera: &MockCamera,
        detector: Option<Arc<ScriptedDetector>>,
    ) -> (ScannerComponent, Receiver<ScannerEvent>, Arc<CountingNotifier>) {
        let (tx, rx) = unbounded();
        let notifier = Arc::new(CountingNotifier::default());
        let support = match detector {
            Some(d) => DecoderSupport::Supported(d),
            None => DecoderSupport::Unsupported,
        };
        let component = ScannerComponent::mount(
            camera,
            support,
            &AppConfig::default(),
            Size::new(800.0, 600.0),
            notifier.clone(),
            tx,
        )
        .await;
        (component, rx, notifier)
    }

    fn detections(rx: &Receiver<ScannerEvent>) -> Vec<String> {
        rx.try_iter()
            .filter_map(|e| match e {
                ScannerEvent::Detected(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_computes_roi_and_detects() {
        let camera = MockCamera::new((1920, 1080));
        let detector = Arc::new(ScriptedDetector::new(vec![Ok(code("12345670"))]));
        let (component, rx, notifier) = mount(&camera, Some(detector.clone())).await;

        assert!(component.is_active());
        assert!(component.is_detecting());
        let layout = component.layout().unwrap();
        assert!((layout.transform.scale - 1.8).abs() < 1e-9);

        tokio::time::sleep(INTERVAL + INTERVAL / 2).await;

        assert_eq!(detector.last_size(), Some((1296, 378)));
        assert_eq!(detections(&rx), vec!["12345670".to_string()]);
        assert_eq!(notifier.count(), 1);
        component.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_without_listener_are_dropped() {
        let camera = MockCamera::new((640, 480));
        let (tx, rx) = unbounded();
        drop(rx);
        let component = ScannerComponent::mount(
            &camera,
            DecoderSupport::Supported(Arc::new(ScriptedDetector::new(vec![Ok(code("12345670"))]))),
            &AppConfig::default(),
            Size::new(800.0, 600.0),
            Arc::new(CountingNotifier::default()),
            tx,
        )
        .await;

        tokio::time::sleep(INTERVAL * 2).await;
        assert!(component.is_detecting());
        component.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_decoder_degrades() {
        let camera = MockCamera::new((1280, 720));
        let (component, _rx, _) = mount(&camera, None).await;

        assert!(component.is_active());
        assert!(!component.is_detecting());
        assert!(!component.supports_detection());
        assert!(component.notice().is_some());
        assert!(component.overlay().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_camera_failure_reports_error() {
        let mut camera = MockCamera::new((1280, 720));
        camera.error = Some(|| ScannerError::NoCamera("Requested device not found".to_string()));
        let detector = Arc::new(ScriptedDetector::new(vec![]));
        let (component, rx, _) = mount(&camera, Some(detector.clone())).await;

        assert!(!component.is_active());
        assert!(!component.is_detecting());
        assert!(component.overlay().is_none());
        assert_eq!(component.error(), Some("Requested device not found"));

        let events: Vec<_> = rx.try_iter().collect();
        assert!(events.contains(&ScannerEvent::Error("Requested device not found".to_string())));
        assert!(events.contains(&ScannerEvent::StateChanged { active: false }));

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(detector.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_detection_and_resume_restarts() {
        let camera = MockCamera::new((640, 480));
        let detector = Arc::new(ScriptedDetector::new(vec![]));
        let (mut component, _rx, _) = mount(&camera, Some(detector.clone())).await;

        assert!(!component.toggle().await);
        assert!(!component.is_detecting());
        assert_eq!(component.toggle_label(), "Resume");
        assert!(!camera.video_probe.stopped.load(Ordering::SeqCst));

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(detector.calls(), 0);

        assert!(component.toggle().await);
        assert!(component.is_detecting());
        tokio::time::sleep(INTERVAL + INTERVAL / 2).await;
        assert_eq!(detector.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_restarts_with_new_roi() {
        let camera = MockCamera::new((1920, 1080));
        let detector = Arc::new(ScriptedDetector::new(vec![]));
        let (mut component, _rx, _) = mount(&camera, Some(detector.clone())).await;

        component.resize(Size::new(400.0, 300.0)).await;
        tokio::time::sleep(INTERVAL + INTERVAL / 2).await;

        // Same aspect at half size: identical video ROI
        assert_eq!(detector.last_size(), Some((1296, 378)));

        component.resize(Size::new(1000.0, 300.0)).await;
        tokio::time::sleep(INTERVAL + INTERVAL / 2).await;
        let (w, h) = detector.last_size().unwrap();
        assert!(w <= 1920 && h <= 1080);
        assert_ne!((w, h), (1296, 378));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_stops_tracks_and_loop() {
        let camera = MockCamera::new((640, 480));
        let detector = Arc::new(ScriptedDetector::new(vec![]));
        let (component, _rx, _) = mount(&camera, Some(detector.clone())).await;

        component.unmount().await;
        assert!(camera.video_probe.stopped.load(Ordering::SeqCst));
        assert!(camera.audio_probe.stopped.load(Ordering::SeqCst));

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(detector.calls(), 0);
    }
}
