use crate::detectors::PeakDetector;
use crate::error::SegmentResult;
use crate::signal::TimeSeries;
use log::debug;

/// Average heart rate over the whole series, in whole beats per minute.
///
/// `beats * 60 / duration_s`, truncated. Fails on an empty series or a
/// non-positive sampling frequency.
pub fn estimate_heart_rate<D: PeakDetector + ?Sized>(
    ts: &TimeSeries,
    detector: &D,
) -> SegmentResult<u32> {
    ts.validate()?;
    let beats = detector.detect(ts).count_within(ts.len());
    let bpm = heart_rate_from_count(beats, ts.len(), ts.fs);
    debug!(
        "{} beats over {:.1}s -> {} bpm",
        beats,
        ts.duration(),
        bpm
    );
    Ok(bpm)
}

fn heart_rate_from_count(beats: usize, samples: usize, fs: f64) -> u32 {
    let duration_s = samples as f64 / fs;
    ((beats as f64 * 60.0) / duration_s).floor() as u32
}
