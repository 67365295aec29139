use super::AnnotationSet;
use crate::record::{infer_diagnostic_label, Record};
use crate::signal::{BeatAnnotation, TimeSeries};
use anyhow::{anyhow, Context, Result};
use log::debug;
use std::fs;
use std::path::Path;
use wfdb_rust::header::StorageFormat;

const SKIP: u8 = 59;
const AUX: u8 = 63;
const RHYTHM: u8 = 28;

/// MIT annotation code to mnemonic, indexed by code.
const MIT_SYMBOLS: [Option<char>; 42] = [
    None,
    Some('N'),
    Some('L'),
    Some('R'),
    Some('a'),
    Some('V'),
    Some('F'),
    Some('J'),
    Some('A'),
    Some('S'),
    Some('E'),
    Some('j'),
    Some('/'),
    Some('Q'),
    Some('~'),
    None,
    Some('|'),
    None,
    Some('s'),
    Some('T'),
    Some('*'),
    Some('D'),
    Some('"'),
    Some('='),
    Some('p'),
    Some('B'),
    Some('^'),
    Some('t'),
    Some('+'),
    Some('u'),
    Some('?'),
    Some('!'),
    Some('['),
    Some(']'),
    Some('e'),
    Some('n'),
    Some('@'),
    Some('x'),
    Some('f'),
    Some('('),
    Some(')'),
    Some('r'),
];

/// Symbols WFDB treats as QRS complexes.
const BEAT_SYMBOLS: &str = "NLRBAaJSVrFejnE/fQ?";

pub fn mit_symbol(code: u8) -> Option<char> {
    MIT_SYMBOLS.get(code as usize).copied().flatten()
}

/// One decoded entry of a MIT annotation stream.
#[derive(Debug, Clone, PartialEq)]
pub struct WfdbAnnotation {
    pub sample: usize,
    pub code: u8,
    pub aux: Option<String>,
}

impl WfdbAnnotation {
    pub fn symbol(&self) -> Option<char> {
        mit_symbol(self.code)
    }

    pub fn is_beat(&self) -> bool {
        self.symbol().is_some_and(|s| BEAT_SYMBOLS.contains(s))
    }

    /// Label of a rhythm-change annotation, e.g. `(AFIB`.
    pub fn rhythm_label(&self) -> Option<&str> {
        if self.code != RHYTHM {
            return None;
        }
        self.aux
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }
}

/// Load the specified signal (lead) from a WFDB header/data pair into a TimeSeries.
pub fn load_wfdb_lead(header_path: &Path, lead: usize) -> Result<TimeSeries> {
    if !header_path.is_file() {
        anyhow::bail!("WFDB header {} does not exist", header_path.display());
    }
    // parse_wfdb has no error channel; malformed records surface as panics
    let (header, signals) = std::panic::catch_unwind(|| wfdb_rust::parse_wfdb(header_path))
        .map_err(|_| anyhow!("failed to parse WFDB record {}", header_path.display()))?;
    if lead >= signals.len() {
        anyhow::bail!(
            "WFDB record {} contains {} signals, but lead {} was requested",
            header_path.display(),
            signals.len(),
            lead
        );
    }
    let spec = &header.signal_specs[lead];
    // wfdb-rust decodes every data file as 212
    if spec.format != StorageFormat::_12bit_twos_complement {
        anyhow::bail!(
            "WFDB record {} stores lead {} as {:?}, only format 212 is readable",
            header_path.display(),
            lead,
            spec.format
        );
    }
    let gain = spec.adc_gain.unwrap_or(1.0) as f64;
    let baseline = spec.baseline.or(spec.adc_zero).unwrap_or(0) as f64;
    let fs = header
        .record
        .sampling_frequency
        .map(|f| f as f64)
        .unwrap_or(250.0);
    let data = signals[lead]
        .iter()
        .map(|&sample| (sample as f64 - baseline) / gain)
        .collect();
    Ok(TimeSeries { fs, data })
}

/// Decode a MIT annotation stream, attaching AUX payloads to the annotation
/// they follow.
pub fn parse_wfdb_annotations(buf: &[u8]) -> Vec<WfdbAnnotation> {
    let mut out: Vec<WfdbAnnotation> = Vec::new();
    let mut idx = 0;
    let mut sample: usize = 0;
    while idx + 2 <= buf.len() {
        let word = u16::from_le_bytes([buf[idx], buf[idx + 1]]);
        idx += 2;
        let code = (word >> 10) as u8;
        let diff = (word & 0x03FF) as usize;
        if code == 0 && diff == 0 {
            break;
        }
        match code {
            SKIP => {
                if idx + 4 > buf.len() {
                    break;
                }
                let high = u16::from_le_bytes([buf[idx], buf[idx + 1]]) as u32;
                let low = u16::from_le_bytes([buf[idx + 2], buf[idx + 3]]) as u32;
                idx += 4;
                sample = sample.wrapping_add(((high << 16) | low) as usize);
            }
            60..=62 => {
                // NUM/SUB/CHN modifiers carry nothing we keep
                sample = sample.wrapping_add(diff);
            }
            AUX => {
                let end = (idx + diff).min(buf.len());
                let text = String::from_utf8_lossy(&buf[idx..end])
                    .trim_end_matches('\0')
                    .to_string();
                if let Some(last) = out.last_mut() {
                    last.aux = Some(text);
                }
                idx = end + diff % 2;
            }
            _ => {
                sample = sample.wrapping_add(diff);
                out.push(WfdbAnnotation {
                    sample,
                    code,
                    aux: None,
                });
            }
        }
    }
    out
}

/// Split decoded annotations into beats and rhythm-change markers.
pub fn annotation_set(annotations: &[WfdbAnnotation]) -> AnnotationSet {
    let mut set = AnnotationSet::default();
    for ann in annotations {
        if let Some(label) = ann.rhythm_label() {
            set.rhythm_markers.push((ann.sample, label.to_string()));
        } else if ann.is_beat() {
            if let Some(symbol) = ann.symbol() {
                set.beats.push(BeatAnnotation::new(ann.sample, symbol));
            }
        }
    }
    set
}

/// Read a WFDB annotation file (e.g. `.atr`).
pub fn load_wfdb_annotations(path: &Path) -> Result<AnnotationSet> {
    let buf = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(annotation_set(&parse_wfdb_annotations(&buf)))
}

/// Assemble a [`Record`] from a WFDB header, one lead and its annotations.
///
/// Without an explicit `label` the diagnosis is inferred from the rhythm
/// annotations. Annotations past the end of the signal are dropped.
pub fn load_wfdb_record(
    header_path: &Path,
    lead: usize,
    annotations: &AnnotationSet,
    label: Option<&str>,
) -> Result<Record> {
    let signal = load_wfdb_lead(header_path, lead)?;
    let id = header_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("record")
        .to_string();
    record_from_parts(id, signal, annotations, label)
}

/// Build a record from a loaded signal plus annotations from any reader.
pub fn record_from_parts(
    id: String,
    signal: TimeSeries,
    annotations: &AnnotationSet,
    label: Option<&str>,
) -> Result<Record> {
    let len = signal.len();
    let beats: Vec<BeatAnnotation> = annotations
        .beats
        .iter()
        .copied()
        .filter(|beat| beat.sample < len)
        .collect();
    let dropped = annotations.beats.len() - beats.len();
    if dropped > 0 {
        debug!("{}: dropped {} annotations past the signal end", id, dropped);
    }
    let rhythms = annotations.rhythm_intervals(len);
    let label = label
        .map(str::to_string)
        .unwrap_or_else(|| infer_diagnostic_label(&rhythms).to_string());
    Record::new(id.clone(), signal, beats, rhythms, label)
        .with_context(|| format!("record {} is inconsistent", id))
}
