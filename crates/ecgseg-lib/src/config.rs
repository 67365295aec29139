use crate::classify::ClassifierThresholds;
use crate::error::{SegmentError, SegmentResult};
use crate::window::StepConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything the segmentation core needs besides the record itself.
///
/// ```toml
/// window_width_s = 30.0
/// min_interval_s = 30.0
/// interval_labels = ["(N", "(AFIB"]
///
/// [step]
/// unit = "beats"
/// magnitude = 10
///
/// [thresholds]
/// pac_percent = 20.0
/// pvc_percent = 20.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Window width in seconds.
    pub window_width_s: f64,
    pub step: StepConfig,
    /// Shortest rhythm interval (seconds) worth scanning. Defaults to the window width.
    pub min_interval_s: Option<f64>,
    /// Rhythm interval labels to scan; empty scans every labelled interval.
    pub interval_labels: Vec<String>,
    pub thresholds: ClassifierThresholds,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            window_width_s: 30.0,
            step: StepConfig::default(),
            min_interval_s: None,
            interval_labels: Vec::new(),
            thresholds: ClassifierThresholds::default(),
        }
    }
}

impl ScanConfig {
    pub fn with_window(window_width_s: f64, step: StepConfig) -> Self {
        Self {
            window_width_s,
            step,
            ..Self::default()
        }
    }

    /// Window width in samples for a given sampling frequency.
    pub fn window_samples(&self, fs: f64) -> SegmentResult<usize> {
        if !self.window_width_s.is_finite() || self.window_width_s <= 0.0 {
            return Err(SegmentError::InvalidConfig(format!(
                "window width must be positive, got {}",
                self.window_width_s
            )));
        }
        let samples = (self.window_width_s * fs).round();
        if samples < 1.0 {
            return Err(SegmentError::InvalidConfig(format!(
                "window of {}s is shorter than one sample at {} Hz",
                self.window_width_s, fs
            )));
        }
        Ok(samples as usize)
    }

    /// Minimum rhythm interval length in samples.
    pub fn min_interval_samples(&self, fs: f64) -> SegmentResult<usize> {
        match self.min_interval_s {
            Some(seconds) if !seconds.is_finite() || seconds < 0.0 => {
                Err(SegmentError::InvalidConfig(format!(
                    "minimum interval duration must be non-negative, got {}",
                    seconds
                )))
            }
            Some(seconds) => Ok((seconds * fs).round() as usize),
            None => self.window_samples(fs),
        }
    }
}

/// Read a [`ScanConfig`] from a TOML file; missing keys take their defaults.
pub fn load_scan_config(path: &Path) -> Result<ScanConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: ScanConfig =
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}
