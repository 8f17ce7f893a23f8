//! Vision/Decoding Layer
//!
//! The barcode decoder is an external capability. The host decides at startup
//! whether one is available and injects it; the rest of the scanner only sees
//! the `BarcodeDetector` trait or the `Unsupported` marker.
//! Backends:
//! - `qr::QrDetector` (pure Rust, QR only)

pub mod qr;

use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

pub use qr::QrDetector;

/// Shown instead of the scanner controls when no decoder is available
pub const UNSUPPORTED_NOTICE: &str =
    "Barcode detection is not available on this platform. Please use a build with a decoder backend enabled.";

/// Symbol formats the decoder can be asked to recognise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    #[serde(rename = "ean_13")]
    Ean13,
    #[serde(rename = "ean_8")]
    Ean8,
    UpcA,
    UpcE,
    #[serde(rename = "code_39")]
    Code39,
    #[serde(rename = "code_128")]
    Code128,
    QrCode,
}

impl BarcodeFormat {
    /// Formats requested when nothing else is configured
    pub const DEFAULT_SET: [BarcodeFormat; 7] = [
        BarcodeFormat::Ean13,
        BarcodeFormat::Ean8,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
        BarcodeFormat::Code39,
        BarcodeFormat::Code128,
        BarcodeFormat::QrCode,
    ];

    /// Wire name, e.g. `ean_13`
    pub fn name(&self) -> &'static str {
        match self {
            BarcodeFormat::Ean13 => "ean_13",
            BarcodeFormat::Ean8 => "ean_8",
            BarcodeFormat::UpcA => "upc_a",
            BarcodeFormat::UpcE => "upc_e",
            BarcodeFormat::Code39 => "code_39",
            BarcodeFormat::Code128 => "code_128",
            BarcodeFormat::QrCode => "qr_code",
        }
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A symbol found by the decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedBarcode {
    /// Decoded payload
    pub raw_value: String,
    /// Symbology of the payload
    pub format: BarcodeFormat,
    /// Bounding box inside the submitted image (x, y, width, height)
    pub bounds: (u32, u32, u32, u32),
}

impl DetectedBarcode {
    pub fn new(raw_value: impl Into<String>, format: BarcodeFormat) -> Self {
        Self {
            raw_value: raw_value.into(),
            format,
            bounds: (0, 0, 0, 0),
        }
    }
}

/// Black-box barcode decoder
#[async_trait]
pub trait BarcodeDetector: Send + Sync {
    /// Formats this detector was configured with
    fn formats(&self) -> &[BarcodeFormat];

    /// Detect symbols in an image. An empty vector means nothing was found.
    async fn detect(&self, image: &RgbaImage) -> Result<Vec<DetectedBarcode>>;
}

/// Whether a decoder was injected at startup
#[derive(Clone, Default)]
pub enum DecoderSupport {
    Supported(Arc<dyn BarcodeDetector>),
    #[default]
    Unsupported,
}

impl DecoderSupport {
    pub fn supported(detector: impl BarcodeDetector + 'static) -> Self {
        DecoderSupport::Supported(Arc::new(detector))
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, DecoderSupport::Supported(_))
    }

    pub fn detector(&self) -> Option<Arc<dyn BarcodeDetector>> {
        match self {
            DecoderSupport::Supported(detector) => Some(detector.clone()),
            DecoderSupport::Unsupported => None,
        }
    }

    /// Degraded-mode notice, if any
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            DecoderSupport::Supported(_) => None,
            DecoderSupport::Unsupported => Some(UNSUPPORTED_NOTICE),
        }
    }
}

impl fmt::Debug for DecoderSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoderSupport::Supported(detector) => f
                .debug_tuple("Supported")
                .field(&detector.formats())
                .finish(),
            DecoderSupport::Unsupported => f.write_str("Unsupported"),
        }
    }
}
