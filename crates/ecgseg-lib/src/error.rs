use thiserror::Error;

/// Failures raised by the segmentation core.
///
/// Each variant aborts the record currently being processed; callers driving
/// many records decide whether to skip or stop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentError {
    #[error("invalid signal: {0}")]
    InvalidSignal(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("window step resolves to {samples} samples; at least 1 is required")]
    DegenerateStep { samples: i64 },
    #[error("annotation {index} at sample {sample} lies outside a signal of {len} samples")]
    AnnotationIndex {
        index: usize,
        sample: usize,
        len: usize,
    },
}

pub type SegmentResult<T> = std::result::Result<T, SegmentError>;
