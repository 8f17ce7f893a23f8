//! Error types for the scanner library
//!
//! Camera and decoder failures are typed so the capture component can decide
//! which ones reach the user and which ones the polling loop swallows.

use thiserror::Error;

/// Errors produced by the capture, vision and configuration layers
#[derive(Debug, Error)]
pub enum ScannerError {
    /// The user (or platform policy) refused camera access
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// No camera matching the requested constraints exists
    #[error("No camera available: {0}")]
    NoCamera(String),

    /// Any other failure while acquiring the camera stream
    #[error("Camera error: {0}")]
    Camera(String),

    /// A track rejected a constraint such as zoom
    #[error("Failed to apply constraint: {0}")]
    Constraint(String),

    /// The decoding capability failed on a single frame
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Frame data did not match its declared dimensions
    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScannerError {
    /// Message surfaced to the user when capture cannot start
    pub fn user_message(&self) -> String {
        match self {
            ScannerError::PermissionDenied(msg)
            | ScannerError::NoCamera(msg)
            | ScannerError::Camera(msg)
                if !msg.is_empty() =>
            {
                msg.clone()
            }
            ScannerError::PermissionDenied(_)
            | ScannerError::NoCamera(_)
            | ScannerError::Camera(_) => "Failed to access camera".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, ScannerError>;
