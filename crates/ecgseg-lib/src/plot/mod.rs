//! Backend-neutral figure description for window previews.

use crate::detectors::ecg::{clean_ecg, EcgPipelineConfig};
use crate::signal::TimeSeries;
use crate::table::RowRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Labelled point markers, e.g. annotated beats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub labels: Vec<String>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Markers(MarkerSeries),
}

impl Series {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(line) => &line.points,
            Series::Markers(markers) => &markers.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    /// Fixed vertical extent; the data extent is used when unset.
    pub y_range: Option<(f64, f64)>,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            y_range: None,
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over every series, `None` when empty.
    /// A pinned `y_range` replaces the vertical extent.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self.series.iter().flat_map(|s| s.points().iter());
        let first = points.next()?;
        let init = (first[0], first[0], first[1], first[1]);
        let (x0, x1, y0, y1) = points.fold(init, |(x0, x1, y0, y1), p| {
            (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1]))
        });
        match self.y_range {
            Some((lo, hi)) => Some((x0, x1, lo, hi)),
            None => Some((x0, x1, y0, y1)),
        }
    }
}

pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure) -> anyhow::Result<()>;
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points || max_points == 0 {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    (0..max_points)
        .map(|i| (i as f64 * bucket_size).floor() as usize)
        .take_while(|&start| start < points.len())
        .map(|start| points[start])
        .collect()
}

/// How a window slice is turned into a preview trace.
#[derive(Debug, Clone, Copy)]
pub struct WindowPlotOptions {
    /// Gain applied to the raw slice before cleaning.
    pub scale: f64,
    /// Band-pass cleaning of the scaled slice; `None` draws it as is.
    pub clean: Option<EcgPipelineConfig>,
    /// Pinned voltage range of the y axis; `None` auto-scales.
    pub y_range: Option<(f64, f64)>,
    pub max_points: usize,
}

impl Default for WindowPlotOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            clean: Some(EcgPipelineConfig::default()),
            y_range: Some((-3.0, 3.0)),
            max_points: 4096,
        }
    }
}

/// Scaled and, when configured, band-passed copy of a window slice.
pub fn prepare_trace(signal: &[f64], fs: f64, opts: &WindowPlotOptions) -> Vec<f64> {
    let scaled: Vec<f64> = signal.iter().map(|v| v * opts.scale).collect();
    match &opts.clean {
        Some(cfg) if !scaled.is_empty() => clean_ecg(&TimeSeries { fs, data: scaled }, cfg),
        _ => scaled,
    }
}

/// Signal trace of one window (seconds from the window start) with its beats marked.
pub fn figure_from_window(row: &RowRef<'_>, fs: f64, opts: &WindowPlotOptions) -> Figure {
    let dt = 1.0 / fs.max(1.0);
    let values = prepare_trace(row.signal, fs, opts);
    let trace: Vec<[f64; 2]> = values
        .iter()
        .enumerate()
        .map(|(i, value)| [i as f64 * dt, *value])
        .collect();
    let mut fig = Figure::new(Some(format!(
        "{} [{}, {}) {} ({} bpm)",
        row.parent_record, row.window.left, row.window.right, row.rhythm_class, row.avg_heart_rate
    )));
    fig.x.label = Some("time (s)".into());
    fig.y.label = Some("amplitude".into());
    fig.y_range = opts.y_range;
    fig.add_series(Series::Line(LineSeries {
        name: "ECG".into(),
        points: decimate_points(&trace, opts.max_points),
        style: Style {
            width: 1.4,
            color: Color(0x1F77B4),
        },
    }));

    let (points, labels): (Vec<[f64; 2]>, Vec<String>) = row
        .beats
        .offsets
        .iter()
        .zip(&row.beats.symbols)
        .map(|(&offset, symbol)| {
            let y = values
                .get(offset)
                .or_else(|| values.last())
                .copied()
                .unwrap_or(0.0);
            ([offset as f64 * dt, y], symbol.to_string())
        })
        .unzip();
    if !points.is_empty() {
        fig.add_series(Series::Markers(MarkerSeries {
            name: "beats".into(),
            points,
            labels,
            style: Style {
                width: 3.0,
                color: Color(0xFF0077),
            },
        }));
    }
    fig
}
