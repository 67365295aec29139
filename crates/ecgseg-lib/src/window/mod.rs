//! Sliding-window segmentation: step resolution, valid spans, window bounds and
//! per-window annotation tallies.

pub mod aggregate;
pub mod iter;
pub mod span;
pub mod step;

pub use aggregate::BeatTally;
pub use iter::{SegmentPlan, Window, WindowIter};
pub use span::{SampleSpan, SpanSource};
pub use step::{resolve_step, StepConfig, StepUnit};
