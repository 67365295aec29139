use super::span::SampleSpan;
use serde::{Deserialize, Serialize};

/// Half-open window `[left, right)` in signal samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub left: usize,
    pub right: usize,
}

impl Window {
    pub fn len(&self) -> usize {
        self.right - self.left
    }

    pub fn is_empty(&self) -> bool {
        self.right == self.left
    }
}

/// Fixed-width, fixed-stride walk over one or more spans.
///
/// The plan holds no iteration state; every call to [`SegmentPlan::windows`]
/// starts over from the first span.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    window_samples: usize,
    step_samples: usize,
    spans: Vec<SampleSpan>,
}

impl SegmentPlan {
    /// Both `window_samples` and `step_samples` must be at least 1; callers get
    /// these from validated configuration.
    pub fn new(window_samples: usize, step_samples: usize, spans: Vec<SampleSpan>) -> Self {
        debug_assert!(window_samples >= 1 && step_samples >= 1);
        Self {
            window_samples: window_samples.max(1),
            step_samples: step_samples.max(1),
            spans,
        }
    }

    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    pub fn step_samples(&self) -> usize {
        self.step_samples
    }

    pub fn spans(&self) -> &[SampleSpan] {
        &self.spans
    }

    pub fn windows(&self) -> WindowIter<'_> {
        WindowIter {
            plan: self,
            span_idx: 0,
            left: self.spans.first().map_or(0, |span| span.start),
        }
    }
}

/// Lazy iterator over the windows of a [`SegmentPlan`].
#[derive(Debug, Clone)]
pub struct WindowIter<'a> {
    plan: &'a SegmentPlan,
    span_idx: usize,
    left: usize,
}

impl Iterator for WindowIter<'_> {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        while let Some(span) = self.plan.spans.get(self.span_idx) {
            let right = self.left.saturating_add(self.plan.window_samples);
            if right <= span.end {
                let window = Window {
                    left: self.left,
                    right,
                };
                self.left += self.plan.step_samples;
                return Some(window);
            }
            self.span_idx += 1;
            if let Some(next) = self.plan.spans.get(self.span_idx) {
                self.left = next.start;
            }
        }
        None
    }
}
