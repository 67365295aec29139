use crate::error::{SegmentError, SegmentResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit the window step is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepUnit {
    #[serde(alias = "bpm", alias = "beat")]
    Beats,
    #[serde(alias = "second", alias = "s")]
    Seconds,
}

impl FromStr for StepUnit {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beats" | "beat" | "bpm" => Ok(StepUnit::Beats),
            "seconds" | "second" | "s" => Ok(StepUnit::Seconds),
            other => Err(SegmentError::InvalidConfig(format!(
                "unknown step unit '{}' (expected 'beats' or 'seconds')",
                other
            ))),
        }
    }
}

impl fmt::Display for StepUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepUnit::Beats => f.write_str("beats"),
            StepUnit::Seconds => f.write_str("seconds"),
        }
    }
}

/// How far consecutive windows advance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    pub unit: StepUnit,
    pub magnitude: f64,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            unit: StepUnit::Seconds,
            magnitude: 30.0,
        }
    }
}

impl StepConfig {
    pub fn seconds(magnitude: f64) -> Self {
        Self {
            unit: StepUnit::Seconds,
            magnitude,
        }
    }

    pub fn beats(magnitude: f64) -> Self {
        Self {
            unit: StepUnit::Beats,
            magnitude,
        }
    }
}

/// Convert a step into an absolute stride in samples.
///
/// Beat steps use `magnitude * (heart_rate / 60) * fs`; second steps use
/// `magnitude * fs`. Both are rounded to the nearest sample and must come out
/// at one sample or more.
pub fn resolve_step(step: &StepConfig, heart_rate: u32, fs: f64) -> SegmentResult<usize> {
    if !step.magnitude.is_finite() || step.magnitude <= 0.0 {
        return Err(SegmentError::InvalidConfig(format!(
            "step magnitude must be positive, got {}",
            step.magnitude
        )));
    }
    if !fs.is_finite() || fs <= 0.0 {
        return Err(SegmentError::InvalidSignal(format!(
            "sampling frequency must be positive, got {}",
            fs
        )));
    }
    let raw = match step.unit {
        StepUnit::Beats => step.magnitude * (heart_rate as f64 / 60.0) * fs,
        StepUnit::Seconds => step.magnitude * fs,
    };
    let samples = raw.round();
    if samples < 1.0 {
        return Err(SegmentError::DegenerateStep {
            samples: samples as i64,
        });
    }
    Ok(samples as usize)
}
