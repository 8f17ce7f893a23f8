//! ROI Scanner - camera barcode scanning through a region of interest
//!
//! Captures a video stream, keeps a centred ROI box mapped from container
//! coordinates into native frame pixels (accounting for cover-fit cropping),
//! periodically crops frames to that ROI and hands them to an injected
//! barcode decoder. New codes are debounced and reported to a bounded,
//! most-recent-first history.

pub mod app;
pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod overlay;
pub mod results;
pub mod scanner;
pub mod shared;
pub mod storage;
pub mod vision;

pub use error::{Result, ScannerError};
