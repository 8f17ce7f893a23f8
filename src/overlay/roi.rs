//! ROI coordinate transform
//!
//! The video is rendered cover-fit: it fills its container and the longer axis
//! is cropped symmetrically. The ROI is defined in container coordinates for
//! the overlay, then mapped back into native frame pixels for cropping.

use serde::Serialize;

use crate::config::RoiSettings;

/// Width/height pair in either container or frame units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are known and positive
    pub fn is_available(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f64, height as f64)
    }
}

/// ROI in container (display) coordinates, used to draw the overlay box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DisplayRoi {
    pub width: f64,
    pub height: f64,
    pub top: f64,
    pub left: f64,
}

impl DisplayRoi {
    /// Centered box: `width_fraction` of the container width, height capped by
    /// both the container height and the box width
    pub fn centered(container: Size, settings: &RoiSettings) -> Self {
        let width = container.width * settings.width_fraction;
        let height = (container.height * settings.height_fraction)
            .min(width * settings.max_height_to_width);

        Self {
            width,
            height,
            top: (container.height - height) / 2.0,
            left: (container.width - width) / 2.0,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// ROI in native video frame pixels, used to crop frames before decoding
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct VideoRoi {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl VideoRoi {
    /// A non-positive extent means there is nothing to decode
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Integer pixel rectangle inside a `frame_width` x `frame_height` frame.
    ///
    /// Returns `None` when nothing of the ROI lands inside the frame.
    pub fn pixel_rect(&self, frame_width: u32, frame_height: u32) -> Option<PixelRect> {
        if self.is_empty() {
            return None;
        }

        let x = snap_floor(self.x.max(0.0)).min(frame_width);
        let y = snap_floor(self.y.max(0.0)).min(frame_height);
        let width = snap_floor(self.width).min(frame_width - x);
        let height = snap_floor(self.height).min(frame_height - y);

        if width == 0 || height == 0 {
            return None;
        }

        Some(PixelRect { x, y, width, height })
    }
}

/// Truncate to whole pixels, ignoring floating-point noise just below an integer
fn snap_floor(value: f64) -> u32 {
    (value + 1e-9).floor() as u32
}

/// Integer crop rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Uniform scale plus centering offset that cover-fit applies to the frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverTransform {
    /// Frame pixels per container unit, identical on both axes
    pub scale: f64,
    /// Frame pixels cropped from the left edge
    pub offset_x: f64,
    /// Frame pixels cropped from the top edge
    pub offset_y: f64,
}

impl CoverTransform {
    pub fn new(video: Size, container: Size) -> Self {
        if video.aspect() > container.aspect() {
            // Video is wider: height fits, width is cropped
            let scale = video.height / container.height;
            Self {
                scale,
                offset_x: (video.width - container.width * scale) / 2.0,
                offset_y: 0.0,
            }
        } else {
            // Video is taller (or equal): width fits, height is cropped
            let scale = video.width / container.width;
            Self {
                scale,
                offset_x: 0.0,
                offset_y: (video.height - container.height * scale) / 2.0,
            }
        }
    }

    /// Map a display ROI into frame pixels, clamped to the frame
    pub fn to_video(&self, display: &DisplayRoi, video: Size) -> VideoRoi {
        VideoRoi {
            x: (display.left * self.scale + self.offset_x).max(0.0),
            y: (display.top * self.scale + self.offset_y).max(0.0),
            width: (display.width * self.scale).min(video.width),
            height: (display.height * self.scale).min(video.height),
        }
    }
}

/// Display ROI, video ROI and the transform that links them
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoiLayout {
    pub display: DisplayRoi,
    pub video: VideoRoi,
    pub transform: CoverTransform,
}

/// Compute the ROI layout, or `None` when either geometry is not known yet
pub fn compute_layout(video: Size, container: Size, settings: &RoiSettings) -> Option<RoiLayout> {
    if !video.is_available() || !container.is_available() {
        return None;
    }

    let display = DisplayRoi::centered(container, settings);
    let transform = CoverTransform::new(video, container);
    let video_roi = transform.to_video(&display, video);

    Some(RoiLayout {
        display,
        video: video_roi,
        transform,
    })
}
