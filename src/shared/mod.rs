//! Shared state and messaging between the scanner and the page
//!
//! The scanner component reports upward through `ScannerEvent`s; the page
//! folds them into its `RuntimeState`.

pub mod messages;
pub mod state;

pub use messages::ScannerEvent;
pub use state::RuntimeState;
