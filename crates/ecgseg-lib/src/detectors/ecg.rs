use super::PeakDetector;
use crate::signal::{Events, TimeSeries};
use log::debug;

/// Parameters of the Pan–Tompkins style R-peak detector.
#[derive(Debug, Clone, Copy)]
pub struct EcgPipelineConfig {
    /// Lower cutoff for the single-pole high-pass filter (Hz).
    pub lowcut_hz: f64,
    /// Upper cutoff for the single-pole low-pass filter (Hz).
    pub highcut_hz: f64,
    /// Moving window integration length (seconds).
    pub integration_window_s: f64,
    /// Refractory period between two accepted peaks (seconds). Shorter values
    /// let the detector fire twice on one QRS complex.
    pub min_rr_s: f64,
    /// Where the threshold sits between the noise and signal envelopes.
    pub threshold_scale: f64,
    /// Look-back span (seconds) for locating the exact R-peak.
    pub search_back_s: f64,
}

impl Default for EcgPipelineConfig {
    fn default() -> Self {
        Self {
            lowcut_hz: 5.0,
            highcut_hz: 15.0,
            integration_window_s: 0.150,
            min_rr_s: 0.250,
            threshold_scale: 0.6,
            search_back_s: 0.150,
        }
    }
}

impl PeakDetector for EcgPipelineConfig {
    fn detect(&self, ts: &TimeSeries) -> Events {
        detect_r_peaks_with_config(ts, self)
    }
}

pub fn detect_r_peaks_with_config(ts: &TimeSeries, cfg: &EcgPipelineConfig) -> Events {
    if ts.is_empty() || !(ts.fs > 0.0) {
        return Events::default();
    }
    let fs = ts.fs.max(1.0);
    let filtered = clean_ecg(ts, cfg);
    let envelope = integrate_energy(&filtered, fs, cfg.integration_window_s);
    let peaks = adaptive_peaks(&filtered, &envelope, fs, cfg);
    if peaks.len() >= 2 {
        return Events::from_indices(peaks);
    }
    debug!(
        "adaptive detector found {} peaks, using local-maximum fallback",
        peaks.len()
    );
    Events::from_indices(local_maximum_peaks(&ts.data, fs, cfg.min_rr_s))
}

/// Band-pass the raw signal with the detector's cutoffs (Pan–Tompkins cleaning).
pub fn clean_ecg(ts: &TimeSeries, cfg: &EcgPipelineConfig) -> Vec<f64> {
    bandpass(&ts.data, ts.fs.max(1.0), cfg.lowcut_hz, cfg.highcut_hz)
}

fn bandpass(data: &[f64], fs: f64, low: f64, high: f64) -> Vec<f64> {
    let hp = if low > 0.0 {
        highpass(data, fs, low)
    } else {
        data.to_vec()
    };
    if high <= 0.0 || high >= fs * 0.5 {
        hp
    } else {
        lowpass(&hp, fs, high)
    }
}

fn rc_constant(cutoff: f64) -> f64 {
    1.0 / (2.0 * std::f64::consts::PI * cutoff.max(0.01))
}

fn highpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let rc = rc_constant(cutoff);
    let alpha = rc / (rc + 1.0 / fs);
    let (mut prev_in, mut prev_out) = (first, first);
    data.iter()
        .map(|&x| {
            prev_out = alpha * (prev_out + x - prev_in);
            prev_in = x;
            prev_out
        })
        .collect()
}

fn lowpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let dt = 1.0 / fs;
    let alpha = dt / (rc_constant(cutoff) + dt);
    let mut state = first;
    data.iter()
        .map(|&x| {
            state += alpha * (x - state);
            state
        })
        .collect()
}

/// Derivative, squaring and moving-window integration in one pass.
fn integrate_energy(filtered: &[f64], fs: f64, window_s: f64) -> Vec<f64> {
    let energy: Vec<f64> = std::iter::once(0.0)
        .chain(filtered.windows(2).map(|w| (w[1] - w[0]).powi(2)))
        .take(filtered.len())
        .collect();
    let win = ((window_s * fs).round() as usize).max(1);
    moving_average(&energy, win)
}

fn moving_average(data: &[f64], win: usize) -> Vec<f64> {
    if win <= 1 {
        return data.to_vec();
    }
    let mut acc = 0.0;
    let mut out = Vec::with_capacity(data.len());
    for (i, &sample) in data.iter().enumerate() {
        acc += sample;
        if i >= win {
            acc -= data[i - win];
        }
        out.push(acc / win as f64);
    }
    out
}

/// Running signal/noise levels driving the detection threshold.
struct Envelope {
    signal: f64,
    noise: f64,
    scale: f64,
}

impl Envelope {
    fn seeded(initial: &[f64], scale: f64) -> Self {
        let mean = if initial.is_empty() {
            0.0
        } else {
            initial.iter().sum::<f64>() / initial.len() as f64
        };
        Self {
            signal: mean,
            noise: mean * 0.5,
            scale,
        }
    }

    fn threshold(&self) -> f64 {
        self.noise + self.scale * (self.signal - self.noise).max(0.0)
    }

    fn update_signal(&mut self, sample: f64) {
        self.signal = 0.125 * sample + 0.875 * self.signal;
    }

    fn update_noise(&mut self, sample: f64) {
        self.noise = 0.125 * sample + 0.875 * self.noise;
    }
}

fn adaptive_peaks(
    filtered: &[f64],
    envelope: &[f64],
    fs: f64,
    cfg: &EcgPipelineConfig,
) -> Vec<usize> {
    if filtered.is_empty() || envelope.is_empty() {
        return Vec::new();
    }
    let refractory = ((cfg.min_rr_s * fs).round() as usize).max(1);
    let search = ((cfg.search_back_s * fs).round() as usize).max(1);
    let seed_len = envelope.len().min((fs as usize).max(1));
    let mut levels = Envelope::seeded(&envelope[..seed_len], cfg.threshold_scale);
    let mut last_trigger: Option<usize> = None;
    let mut peaks = Vec::new();

    for (i, &sample) in envelope.iter().enumerate() {
        let clear_of_refractory = last_trigger.map_or(true, |last| i - last >= refractory);
        if sample >= levels.threshold() && clear_of_refractory {
            let start = i.saturating_sub(search);
            let end = i.min(filtered.len() - 1);
            let peak = (start..=end)
                .max_by(|&a, &b| filtered[a].total_cmp(&filtered[b]))
                .unwrap_or(i);
            peaks.push(peak);
            last_trigger = Some(i);
            levels.update_signal(sample);
        } else {
            levels.update_noise(sample);
        }
    }

    peaks.sort_unstable();
    peaks.dedup();
    peaks
}

fn local_maximum_peaks(data: &[f64], fs: f64, min_rr_s: f64) -> Vec<usize> {
    if data.len() < 3 {
        return Vec::new();
    }
    let min_gap = ((min_rr_s * fs) as usize).max(1);
    let baseline = moving_average(data, ((0.150 * fs) as usize).max(1));
    let detrended: Vec<f64> = data.iter().zip(&baseline).map(|(x, m)| x - m).collect();
    let mut peaks: Vec<usize> = Vec::new();
    for i in 1..detrended.len() - 1 {
        let y = detrended[i];
        let is_peak = y > 0.0 && y > detrended[i - 1] && y > detrended[i + 1];
        let spaced = peaks.last().map_or(true, |&last| i - last >= min_gap);
        if is_peak && spaced {
            peaks.push(i);
        }
    }
    peaks
}
