#[derive(Clone, Copy, Debug)]
enum State {
    /// Waiting for the steep downslope that precedes a pulse peak.
    WaitingForThreshold,
    /// Armed; waiting for the slope to turn non-negative.
    ListeningForZeroCrossing,
}

/// Locates the turning point of each pulse in the slope signal.
///
/// A slope at or below the (negative) threshold arms the detector; the next
/// negative-to-nonnegative slope transition marks a local maximum of the
/// original signal and is reported as a beat.
pub struct BeatDetector {
    state: State,
    threshold: i32,
    prev_slope: i32,
}

impl BeatDetector {
    pub fn new(threshold: i32) -> Self {
        Self {
            state: State::WaitingForThreshold,
            threshold,
            prev_slope: 0,
        }
    }

    pub fn clear(&mut self) {
        self.state = State::WaitingForThreshold;
        self.prev_slope = 0;
    }

    /// Processes one slope sample. Returns the timestamp when it marks a beat.
    pub fn update(&mut self, slope: i32, timestamp: u32) -> Option<u32> {
        let mut beat = None;

        match self.state {
            State::WaitingForThreshold if slope <= self.threshold => {
                self.state = State::ListeningForZeroCrossing;
                // The arming slope is not retained; the crossing check below
                // keeps comparing against the slope seen before the gate.
                return None;
            }
            State::ListeningForZeroCrossing if self.prev_slope < 0 && slope >= 0 => {
                debug!("beat at {} ms", timestamp);
                self.state = State::WaitingForThreshold;
                beat = Some(timestamp);
            }
            _ => {}
        }

        self.prev_slope = slope;
        beat
    }
}
