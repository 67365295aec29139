pub mod csv;
pub mod text;
pub mod wfdb;

use crate::signal::{rhythm_intervals_from_markers, BeatAnnotation, RhythmInterval};

/// Beat and rhythm annotations read from an annotation file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSet {
    pub beats: Vec<BeatAnnotation>,
    /// Rhythm-change markers: sample index and label such as `(AFIB`.
    pub rhythm_markers: Vec<(usize, String)>,
}

impl AnnotationSet {
    pub fn rhythm_intervals(&self, signal_len: usize) -> Vec<RhythmInterval> {
        rhythm_intervals_from_markers(&self.rhythm_markers, signal_len)
    }
}
