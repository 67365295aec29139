use crate::signal::RhythmInterval;
use serde::{Deserialize, Serialize};

/// Half-open sample range `[start, end)` that windows may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSpan {
    pub start: usize,
    pub end: usize,
}

impl SampleSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where windows are allowed to fall within a record.
#[derive(Debug, Clone, PartialEq)]
pub enum SpanSource {
    /// No rhythm annotations: the whole signal is one span.
    WholeSignal { len: usize },
    /// Rhythm annotations present: only the selected intervals are scanned.
    Intervals(Vec<SampleSpan>),
}

impl SpanSource {
    /// Pick the scanning mode for a record.
    ///
    /// Any interval with a non-empty label switches to interval mode. Intervals
    /// shorter than `min_samples`, or whose label is not in `allowed_labels`
    /// (when that list is non-empty), are not scanned. Spans come back ordered
    /// by start sample whatever the annotation order.
    pub fn for_record(
        signal_len: usize,
        intervals: &[RhythmInterval],
        min_samples: usize,
        allowed_labels: &[String],
    ) -> Self {
        if !intervals.iter().any(RhythmInterval::has_label) {
            return SpanSource::WholeSignal { len: signal_len };
        }
        let mut spans: Vec<SampleSpan> = intervals
            .iter()
            .filter(|interval| interval.has_label())
            .filter(|interval| {
                allowed_labels.is_empty()
                    || allowed_labels
                        .iter()
                        .any(|label| label.trim() == interval.label.trim())
            })
            .filter(|interval| interval.len_samples() >= min_samples)
            .map(|interval| SampleSpan::new(interval.start, (interval.end + 1).min(signal_len)))
            .filter(|span| !span.is_empty())
            .collect();
        spans.sort_by_key(|span| span.start);
        SpanSource::Intervals(spans)
    }

    pub fn spans(&self) -> Vec<SampleSpan> {
        match self {
            SpanSource::WholeSignal { len } => vec![SampleSpan::new(0, *len)],
            SpanSource::Intervals(spans) => spans.clone(),
        }
    }

    pub fn is_interval_bounded(&self) -> bool {
        matches!(self, SpanSource::Intervals(_))
    }
}
