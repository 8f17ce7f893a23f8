//! Audible cue on successful scan

use anyhow::Result;
use rodio::{OutputStream, Sink, Source};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::SoundSettings;

/// Signals a newly confirmed scan to the user
pub trait Notifier: Send + Sync {
    /// Fire-and-forget; must not block the caller
    fn notify(&self);
}

/// Short sine beep through the default audio output
#[derive(Debug, Clone, Copy)]
pub struct Beeper {
    settings: SoundSettings,
}

impl Beeper {
    pub fn new(settings: SoundSettings) -> Self {
        Self { settings }
    }
}

impl Notifier for Beeper {
    fn notify(&self) {
        let settings = self.settings;
        // OutputStream is not Send, so the whole playback lives on its own thread
        std::thread::spawn(move || {
            if let Err(e) = play_tone(&settings) {
                // Audio not available: the scan is still reported
                debug!("Beep failed: {}", e);
            }
        });
    }
}

fn play_tone(settings: &SoundSettings) -> Result<()> {
    let (_stream, handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&handle)?;

    let tone = rodio::source::SineWave::new(settings.frequency_hz)
        .take_duration(Duration::from_millis(settings.duration_ms))
        .amplify(settings.volume.clamp(0.0, 1.0));

    sink.append(tone);
    sink.sleep_until_end();
    Ok(())
}

/// Used when sound is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self) {}
}

/// Notifier matching the sound settings
pub fn notifier_for(settings: &SoundSettings) -> Arc<dyn Notifier> {
    if settings.enabled {
        Arc::new(Beeper::new(*settings))
    } else {
        Arc::new(SilentNotifier)
    }
}
