mod baseline;
mod beat;
mod rate;

pub use baseline::Baseline;
pub use beat::BeatDetector;
pub use rate::RateEstimator;
