//! Runtime state shared between the scanner and the page

use crate::overlay::RoiLayout;
use crate::shared::ScannerEvent;

/// Runtime state that is not persisted
#[derive(Debug, Clone, Default)]
pub struct RuntimeState {
    /// Whether capture is currently active
    pub is_active: bool,
    /// Whether a decoder was injected at startup
    pub supports_detection: bool,
    /// Last error message (if any)
    pub last_error: Option<String>,
    /// Current ROI layout
    pub layout: Option<RoiLayout>,
    /// Number of codes confirmed since startup
    pub scans_reported: u64,
    /// Number of detection cycles finished since startup
    pub cycles_completed: u64,
}

impl RuntimeState {
    /// Clear any error state
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Set an error message
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    /// Fold a scanner event into the state
    pub fn apply(&mut self, event: &ScannerEvent) {
        match event {
            ScannerEvent::Detected(_) => self.scans_reported += 1,
            ScannerEvent::Error(message) => {
                self.set_error(message.clone());
                self.is_active = false;
            }
            ScannerEvent::StateChanged { active } => {
                self.is_active = *active;
                if *active {
                    self.clear_error();
                }
            }
            ScannerEvent::CycleCompleted => self.cycles_completed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_marks_inactive() {
        let mut state = RuntimeState {
            is_active: true,
            ..Default::default()
        };
        state.apply(&ScannerEvent::Error("Permission denied".to_string()));

        assert!(!state.is_active);
        assert_eq!(state.last_error.as_deref(), Some("Permission denied"));

        state.apply(&ScannerEvent::StateChanged { active: true });
        assert!(state.is_active);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_detections_counted() {
        let mut state = RuntimeState::default();
        state.apply(&ScannerEvent::StateChanged { active: true });
        state.apply(&ScannerEvent::Detected("A".to_string()));
        state.apply(&ScannerEvent::Detected("A".to_string()));

        state.apply(&ScannerEvent::CycleCompleted);

        assert!(state.is_active);
        assert_eq!(state.scans_reported, 2);
        assert_eq!(state.cycles_completed, 1);
    }
}
