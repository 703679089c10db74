//! Debounced visibility threshold detection.
//!
//! A view should not be counted off a quick scroll-past: the content-end
//! region has to stay sufficiently visible for a debounce window before the
//! visibility trigger fires. Samples arrive from whatever is measuring
//! visibility (the terminal front end reports 1.0 once the post is fully
//! printed); this type only decides when the threshold has been met.

use std::time::{Duration, Instant};

/// One visibility measurement: how much of the observed region is visible,
/// and when it was taken.
#[derive(Debug, Clone, Copy)]
pub struct VisibilitySample {
    pub ratio: f64,
    pub at: Instant,
}

impl VisibilitySample {
    pub fn new(ratio: f64, at: Instant) -> Self {
        Self { ratio, at }
    }
}

/// Tracks consecutive above-threshold samples and fires once the debounce
/// window has elapsed. Fires at most once; a sample below the threshold
/// resets the window.
#[derive(Debug)]
pub struct VisibilityTracker {
    threshold: f64,
    debounce: Duration,
    above_since: Option<Instant>,
    fired: bool,
}

impl VisibilityTracker {
    pub fn new(threshold: f64, debounce: Duration) -> Self {
        Self {
            threshold,
            debounce,
            above_since: None,
            fired: false,
        }
    }

    /// Feed one sample; returns true exactly once, when the region has been
    /// at or above the threshold continuously for the debounce window.
    pub fn observe(&mut self, sample: VisibilitySample) -> bool {
        if self.fired {
            return false;
        }

        if sample.ratio < self.threshold {
            self.above_since = None;
            return false;
        }

        let since = *self.above_since.get_or_insert(sample.at);
        if sample.at.duration_since(since) >= self.debounce {
            self.fired = true;
            return true;
        }
        false
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
