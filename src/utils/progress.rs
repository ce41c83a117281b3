//! Build progress reporting; a no-op when the `progress` feature is disabled

#[cfg(feature = "progress")]
use std::time::Duration;

/// Spinner counting docnos added to a builder
pub struct BuildProgress {
    #[cfg(feature = "progress")]
    bar: indicatif::ProgressBar,
}

impl BuildProgress {
    #[cfg(feature = "progress")]
    pub fn new(message: &'static str) -> Self {
        let bar = indicatif::ProgressBar::new_spinner();
        if let Ok(style) = indicatif::ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {pos} docnos ({per_sec})")
        {
            bar.set_style(style);
        }
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    #[cfg(not(feature = "progress"))]
    pub fn new(_message: &'static str) -> Self {
        Self {}
    }

    #[inline]
    pub fn inc(&self, _delta: u64) {
        #[cfg(feature = "progress")]
        self.bar.inc(_delta);
    }

    pub fn finish(&self, _message: String) {
        #[cfg(feature = "progress")]
        self.bar.finish_with_message(_message);
    }
}
