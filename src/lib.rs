//! This crate provides a realtime heartbeat detector for pulse-type signals
//! such as a photoplethysmogram.
//!
//! Samples are pushed in one at a time together with their millisecond
//! timestamp, as they arrive from a sampling timer or interrupt. The raw
//! signal is smoothed with a moving average, reduced to a slope signal, and
//! scanned for the steep downslope and turning point of each pulse. Timing of
//! consecutive beats is then averaged into a heart rate in beats per minute,
//! published only when enough plausible inter-beat intervals agree.
//!
//! No allocation happens after construction; every buffer is either part of
//! the detector value, caller-provided, or boxed up front with the `alloc`
//! feature.
#![cfg_attr(not(test), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[macro_use]
mod macros;

mod algorithms;
mod sliding;
mod smoothing;

use algorithms::{Baseline, BeatDetector, RateEstimator};
use smoothing::MovingAverage;

/// Tuning options for beat detection and rate validation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Lowest plausible heart rate in beats per minute, exclusive.
    pub min_rate: f32,
    /// Highest plausible heart rate in beats per minute, exclusive.
    pub max_rate: f32,
    /// Slope value at or below which the detector starts watching for the
    /// turning point. Negative, matching the steep downslope that precedes
    /// a pulse peak.
    pub slope_threshold: i32,
    /// Number of plausible inter-beat intervals that must corroborate each
    /// other before a rate is reported. At least 1, and less than the beat
    /// history size.
    pub precision: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_rate: 40.0,
            max_rate: 180.0,
            slope_threshold: -3,
            precision: 3,
        }
    }
}

/// An accepted heart rate measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeartRate {
    /// Timestamp of the beat that completed this measurement, in
    /// milliseconds.
    pub timestamp: u32,
    /// Averaged heart rate in beats per minute.
    pub rate: f32,
}

/// Callback invoked with every newly accepted measurement.
pub type NewValueCallback = fn(&HeartRate);

/// Detects heartbeats in a realtime sampled pulse signal.
///
/// # Type parameters:
///
/// - `W` - a buffer type backing the smoothing window of raw samples
/// - `B` - a buffer type backing the beat timestamp history
pub struct PulseDetector<W, B> {
    average: MovingAverage<W>,
    baseline: Baseline,
    beat: BeatDetector,
    rate: RateEstimator<B>,
    latest: Option<HeartRate>,
    callback: Option<NewValueCallback>,
}

impl PulseDetector<(), ()> {
    /// Creates a new detector. The internal buffers will be allocated on the
    /// stack as part of the `PulseDetector` structure.
    ///
    /// # Type parameters
    /// * `WINDOW` - length of the smoothing window, in samples.
    /// * `HIST` - number of beat timestamps kept for rate estimation. Must be
    /// at least 2, and more than [`Config::precision`].
    ///
    /// # Example
    /// ```rust
    /// use pulse_detector::{Config, PulseDetector};
    ///
    /// // 8-sample smoothing window, rate corroborated over 5 recent beats
    /// let mut detector = PulseDetector::new::<8, 5>(Config::default());
    /// assert!(detector.push_sample(512, 0).is_none());
    /// ```
    pub fn new<const WINDOW: usize, const HIST: usize>(
        config: Config,
    ) -> PulseDetector<[u16; WINDOW], [u32; HIST]> {
        PulseDetector::new_from(config, [0; WINDOW], [0; HIST])
    }

    /// Creates a new detector using the provided backing buffers.
    ///
    /// # Arguments
    /// * `config` - detection and validation tuning, see [`Config`].
    /// * `window` - a buffer backing the smoothing window of raw samples.
    /// * `beats` - a buffer backing the beat timestamp history. Must hold at
    /// least 2 timestamps, and more than [`Config::precision`].
    ///
    /// # Example
    ///
    /// The backing buffers may be arrays or slices:
    ///
    /// ```rust
    /// use pulse_detector::{Config, PulseDetector};
    ///
    /// let mut window = [0u16; 8];
    /// let mut beats = [0u32; 5];
    /// let detector = PulseDetector::new_from(Config::default(), &mut window, &mut beats);
    /// ```
    pub fn new_from<W, B>(config: Config, window: W, beats: B) -> PulseDetector<W, B>
    where
        W: AsRef<[u16]> + AsMut<[u16]>,
        B: AsRef<[u32]> + AsMut<[u32]>,
    {
        PulseDetector {
            average: MovingAverage::new(window),
            baseline: Baseline::new(),
            beat: BeatDetector::new(config.slope_threshold),
            rate: RateEstimator::new(config, beats),
            latest: None,
            callback: None,
        }
    }

    /// Creates a new detector with heap-allocated buffers of the given sizes.
    #[cfg(feature = "alloc")]
    pub fn new_alloc(
        config: Config,
        window_size: usize,
        hist_size: usize,
    ) -> PulseDetector<alloc::boxed::Box<[u16]>, alloc::boxed::Box<[u32]>> {
        use alloc::vec;

        PulseDetector::new_from(
            config,
            vec![0; window_size].into_boxed_slice(),
            vec![0; hist_size].into_boxed_slice(),
        )
    }
}

impl<W, B> PulseDetector<W, B>
where
    W: AsRef<[u16]> + AsMut<[u16]>,
    B: AsRef<[u32]> + AsMut<[u32]>,
{
    /// Registers the callback invoked on every accepted measurement,
    /// replacing any previous registration.
    ///
    /// The callback runs synchronously on the caller's stack, inside the
    /// [`push_sample`](Self::push_sample) call that produced the
    /// measurement, and must not block.
    pub fn set_callback(&mut self, callback: NewValueCallback) {
        self.callback = Some(callback);
    }

    /// Resets the internal state of the detector.
    ///
    /// The callback registration is kept.
    pub fn clear(&mut self) {
        self.average.clear();
        self.baseline.clear();
        self.beat.clear();
        self.rate.clear();
        self.latest = None;
    }

    /// Processes one raw sample.
    ///
    /// `timestamp` is in milliseconds and must not decrease between calls.
    /// Returns the new measurement whenever one is accepted, after handing
    /// it to the registered callback.
    pub fn push_sample(&mut self, sample: u16, timestamp: u32) -> Option<HeartRate> {
        let smoothed = self.average.update(sample);
        let slope = self.baseline.update(smoothed)?;
        let beat = self.beat.update(slope, timestamp)?;
        let heart_rate = self.rate.update(beat)?;

        self.latest = Some(heart_rate);
        if let Some(callback) = self.callback {
            callback(&heart_rate);
        }

        Some(heart_rate)
    }

    /// Returns the latest accepted measurement, or `None` if no rate has
    /// been accepted since construction (or the last [`clear`](Self::clear)).
    pub fn heart_rate(&self) -> Option<HeartRate> {
        self.latest
    }
}
