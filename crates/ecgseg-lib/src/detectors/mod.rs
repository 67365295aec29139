pub mod ecg;

use crate::signal::{Events, TimeSeries};

/// Backend that locates beats in a raw signal.
///
/// Implementations may return indices outside the signal; consumers ignore them.
pub trait PeakDetector {
    fn detect(&self, ts: &TimeSeries) -> Events;
}

impl<F> PeakDetector for F
where
    F: Fn(&TimeSeries) -> Events,
{
    fn detect(&self, ts: &TimeSeries) -> Events {
        self(ts)
    }
}
