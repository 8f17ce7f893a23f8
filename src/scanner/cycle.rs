//! A single detection attempt
//!
//! Crops the latest frame to the video ROI, hands the bitmap to the decoder
//! and debounces the result against the value seen on the previous cycle.
//! State goes in by value and comes back out, so nothing is shared between
//! cycles except what the caller passes along.

use tracing::debug;

use crate::capture::FrameSource;
use crate::overlay::VideoRoi;
use crate::vision::{BarcodeDetector, DetectedBarcode};

/// State carried from one cycle to the next
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    /// Raw value reported most recently and still in view
    pub last_value: Option<String>,
}

/// Why a cycle did not call the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Video ROI has no positive area
    EmptyRoi,
    /// The stream had no frame to offer
    NoFrame,
}

/// What a cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    /// Decoder found nothing; suppression was reset
    Nothing,
    /// Same value as the previous cycle
    Duplicate,
    /// New value to report upward
    Detected(String),
    /// Crop or decode failed; state untouched
    Failed,
}

/// Debounce a decoder result against the carried state
pub fn apply_result(state: ScanState, candidates: &[DetectedBarcode]) -> (ScanState, CycleOutcome) {
    let Some(first) = candidates.first() else {
        return (ScanState { last_value: None }, CycleOutcome::Nothing);
    };

    if state.last_value.as_deref() == Some(first.raw_value.as_str()) {
        return (state, CycleOutcome::Duplicate);
    }

    let value = first.raw_value.clone();
    (
        ScanState {
            last_value: Some(value.clone()),
        },
        CycleOutcome::Detected(value),
    )
}

/// Run one detection attempt
pub async fn run_cycle(
    state: ScanState,
    roi: VideoRoi,
    frames: &dyn FrameSource,
    detector: &dyn BarcodeDetector,
) -> (ScanState, CycleOutcome) {
    if roi.is_empty() {
        return (state, CycleOutcome::Skipped(SkipReason::EmptyRoi));
    }

    let Some(frame) = frames.latest_frame() else {
        return (state, CycleOutcome::Skipped(SkipReason::NoFrame));
    };

    let Some(rect) = roi.pixel_rect(frame.width, frame.height) else {
        return (state, CycleOutcome::Skipped(SkipReason::EmptyRoi));
    };

    let bitmap = match frame.crop(&rect) {
        Ok(bitmap) => bitmap,
        Err(e) => {
            debug!("ROI crop failed: {}", e);
            return (state, CycleOutcome::Failed);
        }
    };

    match detector.detect(&bitmap).await {
        Ok(candidates) => apply_result(state, &candidates),
        Err(e) => {
            // Transient decoder failures never stop the loop
            debug!("Detection failed: {}", e);
            (state, CycleOutcome::Failed)
        }
    }
}
