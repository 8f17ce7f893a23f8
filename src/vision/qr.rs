//! QR decoding backend
//!
//! Pure-Rust decoder built on `rqrr`. Only QR symbols are recognised; other
//! configured formats are accepted but never reported.

use async_trait::async_trait;
use image::RgbaImage;
use tracing::{debug, warn};

use crate::error::{Result, ScannerError};
use crate::vision::{BarcodeDetector, BarcodeFormat, DetectedBarcode};

/// QR code detector
pub struct QrDetector {
    formats: Vec<BarcodeFormat>,
}

impl QrDetector {
    /// Create a detector for the requested formats
    pub fn new(formats: &[BarcodeFormat]) -> Self {
        let unsupported: Vec<_> = formats
            .iter()
            .filter(|f| **f != BarcodeFormat::QrCode)
            .map(|f| f.name())
            .collect();
        if !unsupported.is_empty() {
            warn!("QR backend ignores formats: {}", unsupported.join(", "));
        }

        Self {
            formats: formats.to_vec(),
        }
    }

    fn wants_qr(&self) -> bool {
        self.formats.contains(&BarcodeFormat::QrCode)
    }
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new(&[BarcodeFormat::QrCode])
    }
}

#[async_trait]
impl BarcodeDetector for QrDetector {
    fn formats(&self) -> &[BarcodeFormat] {
        &self.formats
    }

    async fn detect(&self, image: &RgbaImage) -> Result<Vec<DetectedBarcode>> {
        if !self.wants_qr() {
            return Ok(vec![]);
        }

        let gray = image::imageops::grayscale(image);
        tokio::task::spawn_blocking(move || decode_gray(&gray))
            .await
            .map_err(|e| ScannerError::Decode(format!("QR worker failed: {}", e)))
    }
}

/// Detect and decode every readable QR grid in a grey-scale image
fn decode_gray(gray: &image::GrayImage) -> Vec<DetectedBarcode> {
    let (width, height) = gray.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        width as usize,
        height as usize,
        |x, y| gray.get_pixel(x as u32, y as u32).0[0],
    );

    let grids = prepared.detect_grids();
    let mut found = Vec::with_capacity(grids.len());

    for grid in grids {
        match grid.decode() {
            Ok((_, content)) => found.push(DetectedBarcode {
                raw_value: content,
                format: BarcodeFormat::QrCode,
                bounds: grid_bounds(&grid.bounds),
            }),
            Err(e) => debug!("QR grid found but not decodable: {:?}", e),
        }
    }

    found
}

/// Axis-aligned box around the grid corners
fn grid_bounds(corners: &[rqrr::Point; 4]) -> (u32, u32, u32, u32) {
    let min_x = corners.iter().map(|p| p.x).min().unwrap_or(0).max(0);
    let min_y = corners.iter().map(|p| p.y).min().unwrap_or(0).max(0);
    let max_x = corners.iter().map(|p| p.x).max().unwrap_or(0).max(min_x);
    let max_y = corners.iter().map(|p| p.y).max().unwrap_or(0).max(min_y);

    (
        min_x as u32,
        min_y as u32,
        (max_x - min_x) as u32,
        (max_y - min_y) as u32,
    )
}
