//! Overlay Presentation Layer
//!
//! Tracks the geometry of the video container and the incoming stream, keeps
//! the ROI layout current, and describes the overlay drawn over the video.

pub mod roi;

use tracing::debug;

use crate::config::RoiSettings;

pub use roi::{compute_layout, CoverTransform, DisplayRoi, PixelRect, RoiLayout, Size, VideoRoi};

/// Instruction shown under the ROI box
pub const INSTRUCTION_TEXT: &str = "Position barcode in ROI";

/// Keeps the ROI layout in sync with stream and container geometry
#[derive(Debug, Clone)]
pub struct RoiTracker {
    settings: RoiSettings,
    video: Size,
    container: Size,
    layout: Option<RoiLayout>,
}

impl RoiTracker {
    pub fn new(settings: RoiSettings) -> Self {
        Self {
            settings,
            video: Size::default(),
            container: Size::default(),
            layout: None,
        }
    }

    /// Stream metadata became available
    ///
    /// Returns true when the layout changed.
    pub fn on_metadata(&mut self, video: Size) -> bool {
        self.video = video;
        self.recompute()
    }

    /// The video container was resized
    ///
    /// Returns true when the layout changed.
    pub fn on_resize(&mut self, container: Size) -> bool {
        self.container = container;
        self.recompute()
    }

    /// Current layout, if geometry has been available at least once
    pub fn layout(&self) -> Option<&RoiLayout> {
        self.layout.as_ref()
    }

    /// Current video ROI, empty until the first successful computation
    pub fn video_roi(&self) -> VideoRoi {
        self.layout.map(|l| l.video).unwrap_or_default()
    }

    /// Overlay for the current state
    pub fn overlay(&self, active: bool) -> Option<OverlayView> {
        OverlayView::build(active, self.container, self.layout.as_ref())
    }

    fn recompute(&mut self) -> bool {
        // Unavailable geometry leaves the previous layout in place
        let Some(layout) = compute_layout(self.video, self.container, &self.settings) else {
            debug!(
                "Skipping ROI computation: video {:?}, container {:?}",
                self.video, self.container
            );
            return false;
        };

        if self.layout == Some(layout) {
            return false;
        }

        debug!(
            "ROI updated: display {:?}, video {:?}",
            layout.display, layout.video
        );
        self.layout = Some(layout);
        true
    }
}

/// What the overlay draws on top of the video
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    /// Clear box drawn over the dimmed video
    pub roi: DisplayRoi,
    /// Centre crosshair position in container coordinates
    pub crosshair: (f64, f64),
    /// Instruction text under the box
    pub instruction: &'static str,
}

impl OverlayView {
    /// The overlay is shown only while capture is active and geometry is known
    pub fn build(active: bool, container: Size, layout: Option<&RoiLayout>) -> Option<Self> {
        if !active {
            return None;
        }
        let layout = layout?;

        Some(Self {
            roi: layout.display,
            crosshair: (container.width / 2.0, container.height / 2.0),
            instruction: INSTRUCTION_TEXT,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_needs_both_geometries() {
        let mut tracker = RoiTracker::new(RoiSettings::default());
        assert!(!tracker.on_resize(Size::new(800.0, 600.0)));
        assert!(tracker.layout().is_none());
        assert!(tracker.video_roi().is_empty());

        assert!(tracker.on_metadata(Size::new(1920.0, 1080.0)));
        assert!(tracker.layout().is_some());
        assert!(!tracker.video_roi().is_empty());
    }

    #[test]
    fn test_zero_container_keeps_previous_layout() {
        let mut tracker = RoiTracker::new(RoiSettings::default());
        tracker.on_metadata(Size::new(1920.0, 1080.0));
        tracker.on_resize(Size::new(800.0, 600.0));
        let before = *tracker.layout().unwrap();

        assert!(!tracker.on_resize(Size::new(0.0, 0.0)));
        assert_eq!(*tracker.layout().unwrap(), before);
    }

    #[test]
    fn test_resize_recomputes() {
        let mut tracker = RoiTracker::new(RoiSettings::default());
        tracker.on_metadata(Size::new(1920.0, 1080.0));
        tracker.on_resize(Size::new(800.0, 600.0));
        let before = *tracker.layout().unwrap();

        assert!(tracker.on_resize(Size::new(400.0, 700.0)));
        assert_ne!(*tracker.layout().unwrap(), before);

        // Same geometry again is not a change
        assert!(!tracker.on_resize(Size::new(400.0, 700.0)));
    }

    #[test]
    fn test_overlay_hidden_while_inactive() {
        let mut tracker = RoiTracker::new(RoiSettings::default());
        tracker.on_metadata(Size::new(1920.0, 1080.0));
        tracker.on_resize(Size::new(800.0, 600.0));

        assert!(tracker.overlay(false).is_none());

        let view = tracker.overlay(true).unwrap();
        assert_eq!(view.crosshair, (400.0, 300.0));
        assert_eq!(view.instruction, INSTRUCTION_TEXT);
        assert_eq!(view.roi, tracker.layout().unwrap().display);
    }
}
