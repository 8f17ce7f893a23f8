//! Frame data structures for captured video content

use image::{ImageBuffer, Rgba, RgbaImage};
use std::time::Instant;

use crate::error::{Result, ScannerError};
use crate::overlay::PixelRect;

/// A captured frame from the video stream
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl CapturedFrame {
    /// Create a new captured frame
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// Wrap an already decoded image
    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height)
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Copy the `rect` sub-rectangle into a bitmap sized exactly to it
    pub fn crop(&self, rect: &PixelRect) -> Result<RgbaImage> {
        let view: ImageBuffer<Rgba<u8>, &[u8]> =
            ImageBuffer::from_raw(self.width, self.height, self.data.as_slice()).ok_or_else(|| {
                ScannerError::InvalidImage(format!(
                    "{} bytes do not hold a {}x{} RGBA frame",
                    self.data.len(),
                    self.width,
                    self.height
                ))
            })?;

        if rect.x + rect.width > self.width || rect.y + rect.height > self.height {
            return Err(ScannerError::InvalidImage(format!(
                "crop {:?} outside {}x{} frame",
                rect, self.width, self.height
            )));
        }

        Ok(RgbaImage::from_fn(rect.width, rect.height, |x, y| {
            *view.get_pixel(rect.x + x, rect.y + y)
        }))
    }
}
