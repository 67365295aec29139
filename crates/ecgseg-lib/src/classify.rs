use crate::error::SegmentError;
use crate::record::indicates_non_af;
use crate::window::BeatTally;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rhythm class assigned to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhythmClass {
    #[serde(rename = "NSR")]
    Nsr,
    #[serde(rename = "PAC")]
    Pac,
    #[serde(rename = "PVC")]
    Pvc,
    #[serde(rename = "AF")]
    Af,
    Other,
}

impl RhythmClass {
    pub const ALL: [RhythmClass; 5] = [
        RhythmClass::Nsr,
        RhythmClass::Pac,
        RhythmClass::Pvc,
        RhythmClass::Af,
        RhythmClass::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RhythmClass::Nsr => "NSR",
            RhythmClass::Pac => "PAC",
            RhythmClass::Pvc => "PVC",
            RhythmClass::Af => "AF",
            RhythmClass::Other => "Other",
        }
    }
}

impl fmt::Display for RhythmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RhythmClass {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RhythmClass::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                SegmentError::InvalidConfig(format!(
                    "unknown rhythm class '{}' (expected NSR, PAC, PVC, AF or Other)",
                    wanted
                ))
            })
    }
}

/// Tunable inputs of the rule-based classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// Minimum PAC share (percent) for a PAC window.
    pub pac_percent: f64,
    /// Minimum PVC share (percent) for a PVC window.
    pub pvc_percent: f64,
    /// Annotation symbols counted as premature atrial beats.
    pub pac_symbols: Vec<char>,
    /// Annotation symbols counted as premature ventricular beats.
    pub pvc_symbols: Vec<char>,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            pac_percent: 20.0,
            pvc_percent: 20.0,
            pac_symbols: vec!['A'],
            pvc_symbols: vec!['V'],
        }
    }
}

/// Classify from the record diagnosis and the window's ectopic-beat shares.
///
/// Rules are tried in order and the first match wins:
/// NSR (non-AF, no ectopics), PAC (non-AF, PAC over threshold, no PVC),
/// PVC (non-AF, PVC over threshold, no PAC), AF (AF record, no ectopics),
/// otherwise Other.
pub fn classify(
    label: &str,
    pac_percent: f64,
    pvc_percent: f64,
    thresholds: &ClassifierThresholds,
) -> RhythmClass {
    let non_af = indicates_non_af(label);
    let no_pac = pac_percent == 0.0;
    let no_pvc = pvc_percent == 0.0;
    if non_af && no_pac && no_pvc {
        RhythmClass::Nsr
    } else if non_af && pac_percent >= thresholds.pac_percent && no_pvc {
        RhythmClass::Pac
    } else if non_af && no_pac && pvc_percent >= thresholds.pvc_percent {
        RhythmClass::Pvc
    } else if !non_af && no_pac && no_pvc {
        RhythmClass::Af
    } else {
        RhythmClass::Other
    }
}

/// PAC and PVC percentages of a tally, followed by its class.
pub fn classify_tally(
    label: &str,
    tally: &BeatTally,
    thresholds: &ClassifierThresholds,
) -> (f64, f64, RhythmClass) {
    let pac = tally.percentage_of(&thresholds.pac_symbols);
    let pvc = tally.percentage_of(&thresholds.pvc_symbols);
    (pac, pvc, classify(label, pac, pvc, thresholds))
}
