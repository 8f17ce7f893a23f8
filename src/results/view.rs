//! Results list: summary line, numbered rows, copy feedback

use std::time::{Duration, Instant};
use tracing::debug;

use crate::results::ScanHistory;

/// How long a row shows "Copied!" after a copy
pub const COPIED_FEEDBACK: Duration = Duration::from_secs(2);

/// Write-only clipboard capability
pub trait Clipboard {
    /// Fire-and-forget text copy
    fn write_text(&self, text: &str);
}

/// "1 barcode scanned" / "3 barcodes scanned"
pub fn scan_summary(count: usize) -> String {
    format!("{} barcode{} scanned", count, if count == 1 { "" } else { "s" })
}

/// One rendered row of the results list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow<'a> {
    pub code: &'a str,
    /// "Scan #n", where the oldest visible entry is #1
    pub label: String,
    /// Copy button reads "Copied!" instead of "Copy"
    pub copied: bool,
}

impl ResultRow<'_> {
    pub fn copy_label(&self) -> &'static str {
        if self.copied {
            "Copied!"
        } else {
            "Copy"
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CopiedMarker {
    index: usize,
    expires_at: Instant,
}

/// Results list state (only the copy feedback lives here)
#[derive(Debug, Clone, Default)]
pub struct ResultsView {
    copied: Option<CopiedMarker>,
}

impl ResultsView {
    pub fn new() -> Self {
        Self::default()
    }

    /// The list is rendered only when there is something in it
    pub fn is_visible(history: &ScanHistory) -> bool {
        !history.is_empty()
    }

    pub fn rows<'a>(&self, history: &'a ScanHistory, now: Instant) -> Vec<ResultRow<'a>> {
        let total = history.len();
        let copied_index = self
            .copied
            .filter(|m| now < m.expires_at)
            .map(|m| m.index);

        history
            .entries()
            .iter()
            .enumerate()
            .map(|(index, code)| ResultRow {
                code,
                label: format!("Scan #{}", total - index),
                copied: copied_index == Some(index),
            })
            .collect()
    }

    /// Copy the code at `index` and mark its row for two seconds
    pub fn copy(
        &mut self,
        history: &ScanHistory,
        index: usize,
        clipboard: &dyn Clipboard,
        now: Instant,
    ) -> bool {
        let Some(code) = history.entries().get(index) else {
            return false;
        };

        clipboard.write_text(code);
        debug!("Copied scan #{} to clipboard", history.len() - index);
        self.copied = Some(CopiedMarker {
            index,
            expires_at: now + COPIED_FEEDBACK,
        });
        true
    }

    /// Forget copy feedback, e.g. after the list is cleared
    pub fn reset(&mut self) {
        self.copied = None;
    }
}
