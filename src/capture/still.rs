//! Camera backed by still images
//!
//! Each call for the latest frame advances to the next image, so a detection
//! loop sees one image per poll. All images are scaled to the size of the
//! first one, which plays the role of the negotiated stream resolution.

use async_trait::async_trait;
use image::imageops::FilterType;
use image::RgbaImage;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::capture::{
    Camera, CaptureConstraints, CapturedFrame, FrameSource, MediaStream, MediaTrack, TrackKind,
};
use crate::error::{Result, ScannerError};

/// Camera that replays a fixed list of images
pub struct StillImageCamera {
    frames: Arc<Vec<RgbaImage>>,
}

impl StillImageCamera {
    /// Use already decoded images
    pub fn from_images(images: Vec<RgbaImage>) -> Self {
        let mut images = images.into_iter();
        let Some(first) = images.next() else {
            return Self {
                frames: Arc::new(Vec::new()),
            };
        };

        let (width, height) = first.dimensions();
        let mut frames = vec![first];
        for image in images {
            if image.dimensions() == (width, height) {
                frames.push(image);
            } else {
                debug!(
                    "Scaling {:?} image to stream size {}x{}",
                    image.dimensions(),
                    width,
                    height
                );
                frames.push(image::imageops::resize(&image, width, height, FilterType::Triangle));
            }
        }

        Self {
            frames: Arc::new(frames),
        }
    }

    /// Load images from files
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut images = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = std::fs::read(path.as_ref())?;
            let image = image::load_from_memory(&bytes)?.to_rgba8();
            info!(
                "Loaded {:?} ({}x{})",
                path.as_ref(),
                image.width(),
                image.height()
            );
            images.push(image);
        }
        Ok(Self::from_images(images))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[async_trait]
impl Camera for StillImageCamera {
    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<Box<dyn MediaStream>> {
        let Some(first) = self.frames.first() else {
            return Err(ScannerError::NoCamera("No images to scan".to_string()));
        };
        debug!("Still camera ignores constraints {:?}", constraints);

        let state = Arc::new(TrackState {
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        });

        Ok(Box::new(StillStream {
            size: first.dimensions(),
            tracks: vec![Box::new(StillTrack {
                state: state.clone(),
            })],
            frames: Arc::new(StillFrames {
                images: self.frames.clone(),
                next: AtomicUsize::new(0),
                state,
            }),
        }))
    }
}

struct TrackState {
    enabled: AtomicBool,
    stopped: AtomicBool,
}

struct StillTrack {
    state: Arc<TrackState>,
}

#[async_trait]
impl MediaTrack for StillTrack {
    fn kind(&self) -> TrackKind {
        TrackKind::Video
    }

    fn enabled(&self) -> bool {
        self.state.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.state.enabled.store(enabled, Ordering::SeqCst);
    }

    fn stop(&mut self) {
        self.state.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.state.stopped.load(Ordering::SeqCst)
    }
}

struct StillFrames {
    images: Arc<Vec<RgbaImage>>,
    next: AtomicUsize,
    state: Arc<TrackState>,
}

impl FrameSource for StillFrames {
    fn latest_frame(&self) -> Option<CapturedFrame> {
        if self.state.stopped.load(Ordering::SeqCst) || !self.state.enabled.load(Ordering::SeqCst) {
            return None;
        }

        let index = self.next.fetch_add(1, Ordering::SeqCst) % self.images.len();
        Some(CapturedFrame::from_image(self.images[index].clone()))
    }
}

struct StillStream {
    size: (u32, u32),
    tracks: Vec<Box<dyn MediaTrack>>,
    frames: Arc<StillFrames>,
}

impl MediaStream for StillStream {
    fn video_size(&self) -> Option<(u32, u32)> {
        Some(self.size)
    }

    fn tracks_mut(&mut self) -> &mut [Box<dyn MediaTrack>] {
        &mut self.tracks
    }

    fn frame_source(&self) -> Arc<dyn FrameSource> {
        self.frames.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureSession, FacingMode};
    use crate::config::CameraSettings;
    use crate::overlay::Size;
    use image::Rgba;

    fn solid(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    fn constraints() -> CaptureConstraints {
        CaptureConstraints {
            facing_mode: FacingMode::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
        }
    }

    #[tokio::test]
    async fn test_empty_camera_reports_no_camera() {
        let camera = StillImageCamera::from_images(vec![]);
        assert!(camera.is_empty());
        let result = camera.acquire(&constraints()).await;
        assert!(matches!(result, Err(ScannerError::NoCamera(_))));
    }

    #[tokio::test]
    async fn test_frames_cycle_and_share_first_size() {
        let camera = StillImageCamera::from_images(vec![solid(32, 16, 10), solid(8, 8, 200)]);
        assert_eq!(camera.len(), 2);

        let stream = camera.acquire(&constraints()).await.unwrap();
        assert_eq!(stream.video_size(), Some((32, 16)));

        let source = stream.frame_source();
        let first = source.latest_frame().unwrap();
        let second = source.latest_frame().unwrap();
        let third = source.latest_frame().unwrap();

        assert_eq!(first.dimensions(), (32, 16));
        assert_eq!(second.dimensions(), (32, 16));
        assert_eq!(first.data[0], 10);
        assert_eq!(second.data[0], 200);
        assert_eq!(third.data[0], 10);
    }

    #[tokio::test]
    async fn test_session_pause_and_teardown() {
        let camera = StillImageCamera::from_images(vec![solid(4, 4, 0)]);
        let mut session = CaptureSession::start(&camera, &CameraSettings::default()).await;
        assert_eq!(session.video_size(), Some(Size::new(4.0, 4.0)));

        let source = session.frame_source().unwrap();
        assert!(source.latest_frame().is_some());

        session.toggle();
        assert!(source.latest_frame().is_none());
        session.toggle();
        assert!(source.latest_frame().is_some());

        drop(session);
        assert!(source.latest_frame().is_none());
    }

    #[test]
    fn test_open_missing_file_fails() {
        let result = StillImageCamera::open(&["/nonexistent/barcode.png"]);
        assert!(matches!(result, Err(ScannerError::Io(_))));
    }

    #[test]
    fn test_open_undecodable_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"not an image").unwrap();

        let result = StillImageCamera::open(&[file.path()]);
        assert!(matches!(result, Err(ScannerError::Image(_))));
    }
}
