//! Detection polling loop
//!
//! A cooperative task that waits a fixed delay, runs one detection cycle,
//! and repeats. The delay is measured from the end of one attempt to the
//! start of the next, so at most one decode is ever in flight. Dropping or
//! stopping the `DetectionLoop` handle cancels any pending cycle.

pub mod component;
pub mod cycle;

use crossbeam_channel::Sender;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::audio::Notifier;
use crate::capture::FrameSource;
use crate::overlay::VideoRoi;
use crate::shared::ScannerEvent;
use crate::vision::BarcodeDetector;

pub use component::ScannerComponent;
pub use cycle::{apply_result, run_cycle, CycleOutcome, ScanState, SkipReason};

/// Everything one run of the loop needs, fixed for its lifetime
#[derive(Clone)]
pub struct LoopContext {
    /// ROI used for every cycle of this run
    pub roi: VideoRoi,
    pub frames: Arc<dyn FrameSource>,
    pub detector: Arc<dyn BarcodeDetector>,
    pub notifier: Arc<dyn Notifier>,
    pub events: Sender<ScannerEvent>,
    /// Delay between the end of one cycle and the start of the next
    pub interval: Duration,
}

/// Handle to a running detection loop
pub struct DetectionLoop {
    token: CancellationToken,
    handle: Option<JoinHandle<ScanState>>,
}

impl DetectionLoop {
    /// Spawn the loop on the current tokio runtime, continuing from `state`
    pub fn spawn(ctx: LoopContext, state: ScanState) -> Self {
        let token = CancellationToken::new();
        let handle = tokio::spawn(run_loop(ctx, state, token.clone()));
        Self {
            token,
            handle: Some(handle),
        }
    }

    /// Cancel the loop and return the state it had reached.
    ///
    /// If the task died instead of stopping, its state is lost and a fresh
    /// one is returned.
    pub async fn stop(mut self) -> ScanState {
        self.token.cancel();
        let Some(handle) = self.handle.take() else {
            return ScanState::default();
        };
        match handle.await {
            Ok(state) => state,
            Err(e) => {
                warn!("Detection loop ended abnormally, resetting scan state: {}", e);
                ScanState::default()
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }
}

impl Drop for DetectionLoop {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_loop(ctx: LoopContext, mut state: ScanState, token: CancellationToken) -> ScanState {
    debug!("Detection loop started (roi {:?}, every {:?})", ctx.roi, ctx.interval);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(ctx.interval) => {}
        }

        // Cancelling mid-decode drops the attempt and keeps the prior state
        let (next, outcome) = tokio::select! {
            _ = token.cancelled() => break,
            result = run_cycle(state.clone(), ctx.roi, ctx.frames.as_ref(), ctx.detector.as_ref()) => result,
        };
        state = next;

        match outcome {
            CycleOutcome::Detected(value) => {
                info!("Barcode detected: {}", value);
                ctx.notifier.notify();
                publish(&ctx.events, ScannerEvent::Detected(value));
            }
            other => debug!("Detection cycle: {:?}", other),
        }
        publish(&ctx.events, ScannerEvent::CycleCompleted);
    }

    debug!("Detection loop stopped");
    state
}

/// Send an event upward; a missing listener is not an error
pub(crate) fn publish(events: &Sender<ScannerEvent>, event: ScannerEvent) {
    if let Err(e) = events.send(event) {
        debug!("No listener for scan events, dropped {:?}", e.into_inner());
    }
}
