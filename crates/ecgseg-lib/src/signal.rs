use crate::error::{SegmentError, SegmentResult};
use serde::{Deserialize, Serialize};

/// Basic typed time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }

    /// Reject series the segmentation core cannot reason about.
    pub fn validate(&self) -> SegmentResult<()> {
        if self.data.is_empty() {
            return Err(SegmentError::InvalidSignal("signal has no samples".into()));
        }
        if !self.fs.is_finite() || self.fs <= 0.0 {
            return Err(SegmentError::InvalidSignal(format!(
                "sampling frequency must be positive, got {}",
                self.fs
            )));
        }
        Ok(())
    }
}

/// Point events on a timeline (e.g., R-peaks indices)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    /// Number of events that fall inside a signal of `len` samples.
    pub fn count_within(&self, len: usize) -> usize {
        self.indices.iter().filter(|&&idx| idx < len).count()
    }
}

/// One annotated beat: sample index plus its single-character MIT symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatAnnotation {
    pub sample: usize,
    pub symbol: char,
}

impl BeatAnnotation {
    pub fn new(sample: usize, symbol: char) -> Self {
        Self { sample, symbol }
    }
}

/// Annotated rhythm segment; `start` and `end` are both inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RhythmInterval {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl RhythmInterval {
    pub fn new(label: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }

    pub fn len_samples(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn has_label(&self) -> bool {
        !self.label.trim().is_empty()
    }
}

/// Turn rhythm-change markers into intervals: each marker holds until the sample
/// before the next one, the last one until the end of the signal.
pub fn rhythm_intervals_from_markers(
    markers: &[(usize, String)],
    signal_len: usize,
) -> Vec<RhythmInterval> {
    if signal_len == 0 {
        return Vec::new();
    }
    let mut sorted: Vec<&(usize, String)> =
        markers.iter().filter(|(s, _)| *s < signal_len).collect();
    sorted.sort_by_key(|(s, _)| *s);
    let mut out = Vec::with_capacity(sorted.len());
    for (i, (start, label)) in sorted.iter().enumerate() {
        let end = match sorted.get(i + 1) {
            Some((next, _)) if *next > *start => next - 1,
            Some(_) => continue,
            None => signal_len - 1,
        };
        out.push(RhythmInterval::new(label.trim(), *start, end));
    }
    out
}
