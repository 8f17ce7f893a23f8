//! Message types sent from the scanner component to the page

/// Messages sent from the scanner component upward
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerEvent {
    /// A new (non-duplicate) code was confirmed
    Detected(String),
    /// Camera acquisition failed; user-facing message
    Error(String),
    /// Capture became active or inactive
    StateChanged { active: bool },
    /// One detection cycle finished, whatever its outcome
    CycleCompleted,
}
