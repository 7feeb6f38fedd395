use crate::{sliding::SlidingWindow, Config, HeartRate};

/// Converts beat timing into a corroborated, averaged heart rate.
///
/// Keeps the most recent beat timestamps in a circular ring and averages the
/// instantaneous rates of adjacent pairs that fall inside the plausible
/// range. A result is only produced once more than `precision` intervals
/// corroborate it.
pub struct RateEstimator<C> {
    beats: SlidingWindow<u32, C>,
    config: Config,
}

impl<C> RateEstimator<C>
where
    C: AsRef<[u32]> + AsMut<[u32]>,
{
    pub fn new(config: Config, buffer: C) -> Self {
        let beats = SlidingWindow::new(buffer);

        debug_assert!(
            beats.capacity() >= 2,
            "beat history must hold at least 2 timestamps"
        );
        debug_assert!(
            (1..beats.capacity()).contains(&config.precision),
            "precision must be between 1 and {}",
            beats.capacity() - 1
        );

        Self { beats, config }
    }

    pub fn clear(&mut self) {
        self.beats.clear();
    }

    /// Records a detected beat. Returns the new measurement if enough
    /// plausible inter-beat intervals agree.
    pub fn update(&mut self, timestamp: u32) -> Option<HeartRate> {
        self.beats.push(timestamp);

        let mut sum = 0.0;
        let mut valid = 0;

        let mut prev = None;
        for beat in self.beats.iter() {
            if let Some(earlier) = prev.replace(beat) {
                // A zero-length interval, or one going backwards under a
                // misbehaving clock, has no defined rate and is excluded.
                let interval = beat.saturating_sub(earlier);
                if interval == 0 {
                    continue;
                }

                let rate = 60_000.0 / interval as f32;
                if rate > self.config.min_rate && rate < self.config.max_rate {
                    sum += rate;
                    valid += 1;
                } else {
                    trace!("discarding implausible {} ms interval", interval);
                }
            }
        }

        if valid > self.config.precision {
            let rate = sum / valid as f32;
            debug!("heart rate {} bpm at {} ms", rate, timestamp);
            Some(HeartRate { timestamp, rate })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn estimator() -> RateEstimator<[u32; 5]> {
        RateEstimator::new(Config::default(), [0; 5])
    }

    #[test]
    fn steady_intervals_average_to_their_rate() {
        let mut rate = estimator();

        assert_eq!(rate.update(0), None);
        assert_eq!(rate.update(600), None);
        assert_eq!(rate.update(1200), None);
        assert_eq!(rate.update(1800), None);

        let hr = rate.update(2400).unwrap();
        assert_eq!(hr.timestamp, 2400);
        assert!((hr.rate - 100.0).abs() < 1e-3);
    }

    #[test]
    fn implausible_interval_does_not_count_toward_acceptance() {
        let mut rate = estimator();

        // 2000 ms is 30 BPM, outside the plausible range; the three 600 ms
        // intervals alone are not enough corroboration
        for &ts in &[0, 2000, 2600, 3200, 3800] {
            assert_eq!(rate.update(ts), None);
        }
    }

    #[test]
    fn evicted_interval_stops_counting() {
        let mut rate = estimator();

        for &ts in &[0, 2000, 2600, 3200, 3800] {
            assert_eq!(rate.update(ts), None);
        }

        // one more beat pushes the implausible interval out of the ring
        let hr = rate.update(4400).unwrap();
        assert_eq!(hr.timestamp, 4400);
        assert!((hr.rate - 100.0).abs() < 1e-3);
    }

    #[test]
    fn mean_covers_only_plausible_intervals() {
        let mut rate = RateEstimator::new(
            Config {
                precision: 2,
                ..Config::default()
            },
            [0; 5],
        );

        for &ts in &[0, 30_000, 30_500, 31_100] {
            assert_eq!(rate.update(ts), None);
        }

        // 30 s dropout is excluded; 120 BPM and two 100 BPM intervals remain
        let hr = rate.update(31_700).unwrap();
        assert!((hr.rate - 320.0 / 3.0).abs() < 1e-3);
    }

    #[test]
    fn zero_length_interval_is_excluded() {
        let mut rate = estimator();

        for &ts in &[600, 600, 1200, 1800, 2400] {
            assert_eq!(rate.update(ts), None);
        }
    }

    #[test]
    fn plausibility_bounds_are_exclusive() {
        let mut rate = estimator();

        // 1500 ms intervals are exactly 40 BPM, not strictly above the minimum
        for &ts in &[0, 1500, 3000, 4500, 6000] {
            assert_eq!(rate.update(ts), None);
        }
    }

    #[test]
    fn looser_precision_needs_fewer_corroborating_intervals() {
        let mut rate = RateEstimator::new(
            Config {
                precision: 2,
                ..Config::default()
            },
            [0; 5],
        );

        assert_eq!(rate.update(0), None);
        assert_eq!(rate.update(600), None);
        assert_eq!(rate.update(1200), None);

        let hr = rate.update(1800).unwrap();
        assert!((hr.rate - 100.0).abs() < 1e-3);
    }

    #[test]
    fn clear_discards_beat_history() {
        let mut rate = estimator();

        for &ts in &[0, 600, 1200, 1800, 2400] {
            rate.update(ts);
        }
        rate.clear();

        assert_eq!(rate.update(3000), None);
        assert_eq!(rate.update(3600), None);
    }
}
