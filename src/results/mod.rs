//! Scan results: bounded history and its list view

pub mod history;
pub mod view;

pub use history::ScanHistory;
pub use view::{scan_summary, Clipboard, ResultRow, ResultsView};
