//! Bounded, most-recent-first scan history

use serde::Serialize;

/// Recent scans, newest first
///
/// No deduplication happens here; repeated codes are suppressed by the
/// detection loop before they are reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanHistory {
    entries: Vec<String>,
    #[serde(skip)]
    capacity: usize,
}

impl ScanHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend a code and keep only the newest `capacity` entries
    pub fn report(&mut self, code: impl Into<String>) {
        self.entries.insert(0, code.into());
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ScanHistory {
    fn default() -> Self {
        Self::new(10)
    }
}
