//! Application Configuration
//!
//! Scanner settings and preferences stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::capture::FacingMode;
use crate::error::ScannerError;
use crate::vision::BarcodeFormat;

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Detection loop settings
    pub scanner: ScannerSettings,
    /// Region of interest proportions
    pub roi: RoiSettings,
    /// Camera acquisition hints
    pub camera: CameraSettings,
    /// Audible cue on successful scan
    pub sound: SoundSettings,
    /// Scan history settings
    pub history: HistorySettings,
}

impl AppConfig {
    /// Reject values the scanner cannot run with
    pub fn validate(&self) -> std::result::Result<(), ScannerError> {
        if self.scanner.poll_interval_ms == 0 {
            return Err(ScannerError::Config(
                "scanner.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.history.capacity == 0 {
            return Err(ScannerError::Config(
                "history.capacity must be greater than 0".to_string(),
            ));
        }

        let fractions = [
            ("roi.width_fraction", self.roi.width_fraction),
            ("roi.height_fraction", self.roi.height_fraction),
            ("roi.max_height_to_width", self.roi.max_height_to_width),
        ];
        for (name, value) in fractions {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ScannerError::Config(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.camera.zoom_fraction) {
            return Err(ScannerError::Config(format!(
                "camera.zoom_fraction must be in [0, 1], got {}",
                self.camera.zoom_fraction
            )));
        }

        Ok(())
    }
}

/// Detection loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    /// Delay between the end of one detection attempt and the start of the next
    pub poll_interval_ms: u64,
    /// Symbol formats handed to the decoder
    pub formats: Vec<BarcodeFormat>,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 700,
            formats: BarcodeFormat::DEFAULT_SET.to_vec(),
        }
    }
}

impl ScannerSettings {
    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Region of interest proportions, relative to the video container
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiSettings {
    /// ROI width as a fraction of container width
    pub width_fraction: f64,
    /// ROI height cap as a fraction of container height
    pub height_fraction: f64,
    /// ROI height cap as a fraction of ROI width
    pub max_height_to_width: f64,
}

impl Default for RoiSettings {
    fn default() -> Self {
        Self {
            width_fraction: 0.9,
            height_fraction: 0.35,
            max_height_to_width: 0.5,
        }
    }
}

/// Camera acquisition hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Which camera to prefer
    pub facing_mode: FacingMode,
    /// Ideal stream width in pixels
    pub ideal_width: u32,
    /// Ideal stream height in pixels
    pub ideal_height: u32,
    /// Fraction of the zoom range applied when the track supports zoom
    pub zoom_fraction: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
            zoom_fraction: 0.15,
        }
    }
}

/// Audible cue settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundSettings {
    /// Play a beep on each new scan
    pub enabled: bool,
    /// Tone frequency in Hz
    pub frequency_hz: f32,
    /// Tone duration in milliseconds
    pub duration_ms: u64,
    /// Volume (0.0 - 1.0)
    pub volume: f32,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency_hz: 1200.0,
            duration_ms: 150,
            volume: 0.3,
        }
    }
}

/// Scan history settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Maximum number of scans kept, most recent first
    pub capacity: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { capacity: 10 }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert_eq!(config.scanner.poll_interval_ms, 700);
        assert_eq!(config.scanner.poll_interval(), Duration::from_millis(700));
        assert_eq!(config.scanner.formats.len(), 7);
        assert!(config.scanner.formats.contains(&BarcodeFormat::QrCode));

        assert!((config.roi.width_fraction - 0.9).abs() < 1e-9);
        assert!((config.roi.height_fraction - 0.35).abs() < 1e-9);
        assert!((config.roi.max_height_to_width - 0.5).abs() < 1e-9);

        assert_eq!(config.camera.facing_mode, FacingMode::Environment);
        assert_eq!(config.camera.ideal_width, 1920);
        assert_eq!(config.camera.ideal_height, 1080);

        assert!(config.sound.enabled);
        assert!((config.sound.frequency_hz - 1200.0).abs() < 0.01);
        assert_eq!(config.sound.duration_ms, 150);

        assert_eq!(config.history.capacity, 10);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [scanner]
            poll_interval_ms = 250

            [sound]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(parsed.scanner.poll_interval_ms, 250);
        assert_eq!(parsed.scanner.formats, BarcodeFormat::DEFAULT_SET.to_vec());
        assert!(!parsed.sound.enabled);
        assert_eq!(parsed.sound.duration_ms, 150);
        assert_eq!(parsed.history.capacity, 10);
    }

    #[test]
    fn test_formats_use_snake_case_names() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [scanner]
            formats = ["ean_13", "qr_code"]
            "#,
        )
        .unwrap();

        assert_eq!(
            parsed.scanner.formats,
            vec![BarcodeFormat::Ean13, BarcodeFormat::QrCode]
        );
    }

    #[test]
    fn test_save_and_load_config() {
        let mut config = AppConfig::default();
        config.camera.zoom_fraction = 0.25;

        let temp_file = NamedTempFile::new().unwrap();
        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_and_capacity_rejected() {
        let mut config = AppConfig::default();
        config.scanner.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ScannerError::Config(_))));

        let mut config = AppConfig::default();
        config.history.capacity = 0;
        assert!(matches!(config.validate(), Err(ScannerError::Config(_))));

        let mut config = AppConfig::default();
        config.roi.width_fraction = 1.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.camera.zoom_fraction = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_rejects_zero_interval() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[scanner]\npoll_interval_ms = 0").unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("poll_interval_ms"));
    }
}
