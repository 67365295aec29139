use crate::classify::RhythmClass;
use crate::window::{BeatTally, Window};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything derived for a single window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowResult {
    pub parent_record: String,
    pub label: String,
    pub avg_heart_rate: u32,
    pub window: Window,
    /// Raw signal slice, exactly one window wide.
    pub signal: Vec<f64>,
    pub beats: BeatTally,
    pub pac_percent: f64,
    pub pvc_percent: f64,
    pub rhythm_class: RhythmClass,
}

/// Per-window metadata without the signal payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub parent_record: String,
    pub label: String,
    pub avg_heart_rate: u32,
    pub left: usize,
    pub right: usize,
    pub beat_annotation_symbols: String,
    pub annotated_samples: Vec<usize>,
    pub beat_occurrence: BTreeMap<char, usize>,
    pub pac_percent: f64,
    pub pvc_percent: f64,
    pub true_class: RhythmClass,
}

/// Borrowed view of one row of a [`SegmentationTable`].
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    pub parent_record: &'a str,
    pub label: &'a str,
    pub avg_heart_rate: u32,
    pub window: Window,
    pub signal: &'a [f64],
    pub beats: &'a BeatTally,
    pub pac_percent: f64,
    pub pvc_percent: f64,
    pub rhythm_class: RhythmClass,
}

impl RowRef<'_> {
    pub fn summary(&self) -> WindowSummary {
        WindowSummary {
            parent_record: self.parent_record.to_string(),
            label: self.label.to_string(),
            avg_heart_rate: self.avg_heart_rate,
            left: self.window.left,
            right: self.window.right,
            beat_annotation_symbols: self.beats.symbol_string(),
            annotated_samples: self.beats.offsets.clone(),
            beat_occurrence: self.beats.counts.clone(),
            pac_percent: self.pac_percent,
            pvc_percent: self.pvc_percent,
            true_class: self.rhythm_class,
        }
    }

    pub fn to_result(&self) -> WindowResult {
        WindowResult {
            parent_record: self.parent_record.to_string(),
            label: self.label.to_string(),
            avg_heart_rate: self.avg_heart_rate,
            window: self.window,
            signal: self.signal.to_vec(),
            beats: self.beats.clone(),
            pac_percent: self.pac_percent,
            pvc_percent: self.pvc_percent,
            rhythm_class: self.rhythm_class,
        }
    }
}

/// Column-oriented table with one row per window, in window order.
///
/// Scalar columns are stored as flat vectors so rows can be filtered by class
/// without touching signal data; signals live in their own ragged column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentationTable {
    parent_record: Vec<String>,
    label: Vec<String>,
    avg_heart_rate: Vec<u32>,
    windows: Vec<Window>,
    pac_percent: Vec<f64>,
    pvc_percent: Vec<f64>,
    rhythm_class: Vec<RhythmClass>,
    beats: Vec<BeatTally>,
    signals: Vec<Vec<f64>>,
}

impl SegmentationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn push(&mut self, row: WindowResult) {
        self.parent_record.push(row.parent_record);
        self.label.push(row.label);
        self.avg_heart_rate.push(row.avg_heart_rate);
        self.windows.push(row.window);
        self.pac_percent.push(row.pac_percent);
        self.pvc_percent.push(row.pvc_percent);
        self.rhythm_class.push(row.rhythm_class);
        self.beats.push(row.beats);
        self.signals.push(row.signal);
    }

    /// Append every row of `other`, keeping its order.
    pub fn extend(&mut self, other: SegmentationTable) {
        self.parent_record.extend(other.parent_record);
        self.label.extend(other.label);
        self.avg_heart_rate.extend(other.avg_heart_rate);
        self.windows.extend(other.windows);
        self.pac_percent.extend(other.pac_percent);
        self.pvc_percent.extend(other.pvc_percent);
        self.rhythm_class.extend(other.rhythm_class);
        self.beats.extend(other.beats);
        self.signals.extend(other.signals);
    }

    pub fn row(&self, idx: usize) -> Option<RowRef<'_>> {
        if idx >= self.len() {
            return None;
        }
        Some(RowRef {
            parent_record: &self.parent_record[idx],
            label: &self.label[idx],
            avg_heart_rate: self.avg_heart_rate[idx],
            window: self.windows[idx],
            signal: &self.signals[idx],
            beats: &self.beats[idx],
            pac_percent: self.pac_percent[idx],
            pvc_percent: self.pvc_percent[idx],
            rhythm_class: self.rhythm_class[idx],
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> + '_ {
        (0..self.len()).filter_map(move |idx| self.row(idx))
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn classes(&self) -> &[RhythmClass] {
        &self.rhythm_class
    }

    pub fn signals(&self) -> &[Vec<f64>] {
        &self.signals
    }

    /// Rows with the given class, as a new table.
    pub fn filter_class(&self, class: RhythmClass) -> SegmentationTable {
        let mut out = SegmentationTable::new();
        for (idx, _) in self
            .rhythm_class
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == class)
        {
            if let Some(row) = self.row(idx) {
                out.push(row.to_result());
            }
        }
        out
    }

    /// Number of rows per class.
    pub fn class_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for class in &self.rhythm_class {
            *counts.entry(class.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(feature = "polars")]
mod polars_frame {
    use super::SegmentationTable;
    use polars::prelude::*;

    impl SegmentationTable {
        /// Convert to a polars frame; `signals` becomes a list column.
        pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
            let signals: Vec<Series> = self
                .signals
                .iter()
                .map(|signal| Series::new("".into(), signal.as_slice()))
                .collect();
            let symbols: Vec<String> = self.beats.iter().map(|b| b.symbol_string()).collect();
            DataFrame::new(vec![
                Series::new("parent_record".into(), self.parent_record.as_slice()),
                Series::new("label".into(), self.label.as_slice()),
                Series::new("avg_heart_rate".into(), self.avg_heart_rate.as_slice()),
                Series::new(
                    "left".into(),
                    self.windows.iter().map(|w| w.left as u64).collect::<Vec<_>>(),
                ),
                Series::new(
                    "right".into(),
                    self.windows.iter().map(|w| w.right as u64).collect::<Vec<_>>(),
                ),
                Series::new("beat_annotation_symbols".into(), symbols),
                Series::new("pac_percent".into(), self.pac_percent.as_slice()),
                Series::new("pvc_percent".into(), self.pvc_percent.as_slice()),
                Series::new(
                    "true_class".into(),
                    self.rhythm_class
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>(),
                ),
                Series::new("signals".into(), signals),
            ])
        }
    }
}
