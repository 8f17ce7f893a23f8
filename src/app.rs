//! Page Coordinator
//!
//! Holds the scan history, wires the scanner component's events into it, and
//! exposes the results list. Control flows one way: the component detects,
//! the page prepends to history, the results view re-renders.

use crossbeam_channel::{unbounded, Receiver};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::audio::Notifier;
use crate::capture::Camera;
use crate::config::AppConfig;
use crate::overlay::Size;
use crate::results::{scan_summary, Clipboard, ResultRow, ResultsView, ScanHistory};
use crate::scanner::ScannerComponent;
use crate::shared::{RuntimeState, ScannerEvent};
use crate::vision::DecoderSupport;

/// Page title
pub const TITLE: &str = "Barcode Scanner";

/// Hint shown under the title
pub const HINT: &str =
    "Point your camera at a barcode to scan it. The ROI box in the center helps with positioning.";

/// How often `run_cycles` drains events while it waits
const EVENT_POLL: Duration = Duration::from_millis(20);

/// Scanner page: history owner and event pump
pub struct ScannerPage {
    /// Runtime state shared with observers
    pub state: Arc<RwLock<RuntimeState>>,
    scanner: ScannerComponent,
    events: Receiver<ScannerEvent>,
    history: ScanHistory,
    results: ResultsView,
}

impl ScannerPage {
    /// Mount the scanner component and start listening for its events
    pub async fn mount(
        camera: &dyn Camera,
        support: DecoderSupport,
        config: &AppConfig,
        container: Size,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (tx, events) = unbounded();
        let scanner =
            ScannerComponent::mount(camera, support, config, container, notifier, tx).await;

        let state = RuntimeState {
            supports_detection: scanner.supports_detection(),
            layout: scanner.layout().copied(),
            ..Default::default()
        };

        let mut page = Self {
            state: Arc::new(RwLock::new(state)),
            scanner,
            events,
            history: ScanHistory::new(config.history.capacity),
            results: ResultsView::new(),
        };
        page.pump_events();
        page
    }

    /// Drain pending scanner events into history and runtime state.
    ///
    /// Returns the number of new codes added to history.
    pub fn pump_events(&mut self) -> usize {
        let mut added = 0;
        let mut state = self.state.write();

        for event in self.events.try_iter() {
            state.apply(&event);
            if let ScannerEvent::Detected(code) = event {
                info!("Scanned: {}", code);
                self.history.report(code);
                added += 1;
            }
        }

        state.layout = self.scanner.layout().copied();
        added
    }

    /// Wait until `cycles` more detection cycles have finished, draining
    /// events as they arrive.
    ///
    /// Counts finished cycles rather than elapsed time, so a slow decoder
    /// only makes this take longer. Returns at once when detection is not
    /// running. Returns the number of new codes added to history.
    pub async fn run_cycles(&mut self, cycles: u64) -> usize {
        let mut added = self.pump_events();
        let target = self.state.read().cycles_completed + cycles;

        while self.scanner.is_detecting() && self.state.read().cycles_completed < target {
            tokio::time::sleep(EVENT_POLL).await;
            added += self.pump_events();
        }
        added
    }

    pub fn history(&self) -> &ScanHistory {
        &self.history
    }

    pub fn scanner(&self) -> &ScannerComponent {
        &self.scanner
    }

    pub fn scanner_mut(&mut self) -> &mut ScannerComponent {
        &mut self.scanner
    }

    /// Clear action of the results list
    pub fn clear_results(&mut self) {
        self.history.clear();
        self.results.reset();
        info!("Scan history cleared");
    }

    /// Copy action of the results list
    pub fn copy_result(&mut self, index: usize, clipboard: &dyn Clipboard) -> bool {
        self.results
            .copy(&self.history, index, clipboard, Instant::now())
    }

    /// Summary line, or `None` when the list is hidden
    pub fn results_summary(&self) -> Option<String> {
        ResultsView::is_visible(&self.history).then(|| scan_summary(self.history.len()))
    }

    pub fn result_rows(&self) -> Vec<ResultRow<'_>> {
        self.results.rows(&self.history, Instant::now())
    }

    /// Tear down the scanner: cancels detection and releases the camera
    pub async fn unmount(self) {
        self.scanner.unmount().await;
    }
}
