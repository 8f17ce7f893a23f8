//! Camera Capture Layer
//!
//! The camera is an external capability behind the `Camera` trait. A
//! `CaptureSession` owns the acquired stream: it applies the initial zoom,
//! toggles pause/resume by enabling or disabling tracks, and stops every
//! track when it goes away.

pub mod frame;
pub mod still;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::CameraSettings;
use crate::error::{Result, ScannerError};
use crate::overlay::Size;

pub use frame::CapturedFrame;
pub use still::StillImageCamera;

/// Which physical camera to prefer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Front camera
    User,
    /// Rear camera
    #[default]
    Environment,
}

/// Hints passed to the camera when acquiring a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl From<&CameraSettings> for CaptureConstraints {
    fn from(settings: &CameraSettings) -> Self {
        Self {
            facing_mode: settings.facing_mode,
            ideal_width: settings.ideal_width,
            ideal_height: settings.ideal_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Zoom range advertised by a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl ZoomRange {
    /// Point `fraction` of the way from `min` to `max`
    pub fn at_fraction(&self, fraction: f64) -> f64 {
        self.min + (self.max - self.min) * fraction
    }
}

/// A single media track of an acquired stream
#[async_trait]
pub trait MediaTrack: Send + Sync {
    fn kind(&self) -> TrackKind;

    fn enabled(&self) -> bool;

    /// Disabled tracks keep the hardware acquired but produce no frames
    fn set_enabled(&mut self, enabled: bool);

    /// Release the hardware. Idempotent.
    fn stop(&mut self);

    fn is_stopped(&self) -> bool;

    /// Zoom capability, if the hardware exposes one
    fn zoom_range(&self) -> Option<ZoomRange> {
        None
    }

    async fn apply_zoom(&mut self, _zoom: f64) -> Result<()> {
        Err(ScannerError::Constraint("zoom not supported".to_string()))
    }
}

/// Latest frame of a live stream, shared with the detection loop
pub trait FrameSource: Send + Sync {
    /// `None` when no frame is currently available (e.g. paused)
    fn latest_frame(&self) -> Option<CapturedFrame>;
}

/// An acquired camera stream
pub trait MediaStream: Send + Sync {
    /// Intrinsic frame size, once stream metadata is known
    fn video_size(&self) -> Option<(u32, u32)>;

    fn tracks_mut(&mut self) -> &mut [Box<dyn MediaTrack>];

    fn frame_source(&self) -> Arc<dyn FrameSource>;
}

/// Camera capability
#[async_trait]
pub trait Camera: Send + Sync {
    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<Box<dyn MediaStream>>;
}

/// Owner of an acquired stream
pub struct CaptureSession {
    stream: Option<Box<dyn MediaStream>>,
    active: bool,
    error: Option<String>,
}

impl CaptureSession {
    /// Acquire a stream and apply the initial zoom.
    ///
    /// Never fails: an acquisition error is recorded as a user-facing message
    /// and the session is left inactive. No retry is attempted.
    pub async fn start(camera: &dyn Camera, settings: &CameraSettings) -> Self {
        match Self::acquire(camera, settings).await {
            Ok(stream) => {
                info!("Camera stream acquired ({:?})", stream.video_size());
                Self {
                    stream: Some(stream),
                    active: true,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Camera acquisition failed: {}", e);
                Self::failed(e.user_message())
            }
        }
    }

    /// A session that never acquired anything
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stream: None,
            active: false,
            error: Some(message.into()),
        }
    }

    async fn acquire(camera: &dyn Camera, settings: &CameraSettings) -> Result<Box<dyn MediaStream>> {
        let constraints = CaptureConstraints::from(settings);
        let mut stream = camera.acquire(&constraints).await?;

        let setup = match stream
            .tracks_mut()
            .iter_mut()
            .find(|t| t.kind() == TrackKind::Video)
        {
            Some(track) => match track.zoom_range() {
                Some(range) => {
                    let target = range.at_fraction(settings.zoom_fraction);
                    debug!("Applying zoom {:.2} (range {:?})", target, range);
                    track.apply_zoom(target).await
                }
                None => Ok(()),
            },
            None => Err(ScannerError::Camera(
                "Camera stream has no video track".to_string(),
            )),
        };

        if let Err(e) = setup {
            // The stream is abandoned, so release it before reporting
            stop_all(stream.as_mut());
            return Err(e);
        }

        Ok(stream)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// User-facing error from acquisition, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn video_size(&self) -> Option<Size> {
        self.stream
            .as_ref()
            .and_then(|s| s.video_size())
            .map(Size::from)
    }

    pub fn frame_source(&self) -> Option<Arc<dyn FrameSource>> {
        self.stream.as_ref().map(|s| s.frame_source())
    }

    /// Pause or resume by flipping every track's enabled flag.
    ///
    /// Returns the new active state. Without a stream this does nothing.
    pub fn toggle(&mut self) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return self.active;
        };

        for track in stream.tracks_mut() {
            let enabled = track.enabled();
            track.set_enabled(!enabled);
        }
        self.active = !self.active;
        info!("Capture {}", if self.active { "resumed" } else { "paused" });
        self.active
    }

    /// Label of the pause/resume control
    pub fn toggle_label(&self) -> &'static str {
        if self.active {
            "Pause"
        } else {
            "Resume"
        }
    }

    /// Stop every acquired track and release the stream
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stop_all(stream.as_mut());
            info!("Camera stream released");
        }
        self.active = false;
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn stop_all(stream: &mut dyn MediaStream) {
    let mut stopped = 0;
    for track in stream.tracks_mut() {
        if !track.is_stopped() {
            track.stop();
            stopped += 1;
        }
    }
    debug!("Stopped {} track(s)", stopped);
}
