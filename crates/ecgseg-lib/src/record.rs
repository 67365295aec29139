use crate::error::{SegmentError, SegmentResult};
use crate::signal::{BeatAnnotation, RhythmInterval, TimeSeries};
use serde::{Deserialize, Serialize};

/// Diagnostic label used for records without atrial fibrillation.
pub const NON_AF_LABEL: &str = "non atrial fibrillation";
/// Diagnostic label used for records containing atrial fibrillation.
pub const AF_LABEL: &str = "atrial fibrillation";

/// Read-only view over an ECG recording.
///
/// The segmentation core only ever sees records through this trait, so readers
/// are free to store signals and annotations however they like.
pub trait RecordView {
    /// Identifier of the parent recording (e.g. the WFDB record name).
    fn record_id(&self) -> &str;
    fn signal(&self) -> &TimeSeries;
    fn sampling_frequency(&self) -> f64 {
        self.signal().fs
    }
    /// Beat annotations in the order the reader produced them.
    fn beat_annotations(&self) -> &[BeatAnnotation];
    fn rhythm_intervals(&self) -> &[RhythmInterval];
    fn diagnostic_label(&self) -> &str;
}

/// Check the invariants every record must satisfy before it is segmented.
pub fn validate_record<R: RecordView + ?Sized>(record: &R) -> SegmentResult<()> {
    let signal = record.signal();
    signal.validate()?;
    let len = signal.len();
    for (index, ann) in record.beat_annotations().iter().enumerate() {
        if ann.sample >= len {
            return Err(SegmentError::AnnotationIndex {
                index,
                sample: ann.sample,
                len,
            });
        }
    }
    for interval in record.rhythm_intervals() {
        if interval.start > interval.end || interval.end >= len {
            return Err(SegmentError::InvalidSignal(format!(
                "rhythm interval '{}' [{}, {}] is outside a signal of {} samples",
                interval.label, interval.start, interval.end, len
            )));
        }
    }
    Ok(())
}

/// Owned, immutable ECG recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    id: String,
    signal: TimeSeries,
    beats: Vec<BeatAnnotation>,
    rhythms: Vec<RhythmInterval>,
    label: String,
}

impl Record {
    pub fn new(
        id: impl Into<String>,
        signal: TimeSeries,
        beats: Vec<BeatAnnotation>,
        rhythms: Vec<RhythmInterval>,
        label: impl Into<String>,
    ) -> SegmentResult<Self> {
        let record = Self {
            id: id.into(),
            signal,
            beats,
            rhythms,
            label: label.into(),
        };
        validate_record(&record)?;
        Ok(record)
    }
}

impl RecordView for Record {
    fn record_id(&self) -> &str {
        &self.id
    }
    fn signal(&self) -> &TimeSeries {
        &self.signal
    }
    fn beat_annotations(&self) -> &[BeatAnnotation] {
        &self.beats
    }
    fn rhythm_intervals(&self) -> &[RhythmInterval] {
        &self.rhythms
    }
    fn diagnostic_label(&self) -> &str {
        &self.label
    }
}

/// Derive a record-level diagnosis from its rhythm intervals.
pub fn infer_diagnostic_label(intervals: &[RhythmInterval]) -> &'static str {
    let has_af = intervals
        .iter()
        .any(|interval| interval.label.trim_start_matches('(').trim() == "AFIB");
    if has_af {
        AF_LABEL
    } else {
        NON_AF_LABEL
    }
}

/// Whether a free-text diagnosis means "non atrial fibrillation".
///
/// Case, surrounding whitespace and `-`/`_` separators are ignored.
pub fn indicates_non_af(label: &str) -> bool {
    let normalized: Vec<String> = label
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect();
    normalized.join(" ") == NON_AF_LABEL
}
