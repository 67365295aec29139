use crate::classify::classify_tally;
use crate::config::ScanConfig;
use crate::detectors::PeakDetector;
use crate::error::SegmentResult;
use crate::metrics::heart_rate::estimate_heart_rate;
use crate::record::{validate_record, RecordView};
use crate::table::{SegmentationTable, WindowResult};
use crate::window::{resolve_step, BeatTally, SegmentPlan, SpanSource};
use log::{debug, info};

/// Build the window plan for a record at a known heart rate.
pub fn plan_windows<R: RecordView + ?Sized>(
    record: &R,
    config: &ScanConfig,
    heart_rate: u32,
) -> SegmentResult<SegmentPlan> {
    validate_record(record)?;
    build_plan(record, config, heart_rate)
}

/// Plan for a record that has already passed `validate_record`.
fn build_plan<R: RecordView + ?Sized>(
    record: &R,
    config: &ScanConfig,
    heart_rate: u32,
) -> SegmentResult<SegmentPlan> {
    let fs = record.sampling_frequency();
    let window_samples = config.window_samples(fs)?;
    let step_samples = resolve_step(&config.step, heart_rate, fs)?;
    let source = SpanSource::for_record(
        record.signal().len(),
        record.rhythm_intervals(),
        config.min_interval_samples(fs)?,
        &config.interval_labels,
    );
    debug!(
        "record {}: window {} samples, step {} samples, {} span(s), interval mode: {}",
        record.record_id(),
        window_samples,
        step_samples,
        source.spans().len(),
        source.is_interval_bounded()
    );
    Ok(SegmentPlan::new(window_samples, step_samples, source.spans()))
}

/// Segment and classify a record, estimating its heart rate with `detector`.
pub fn scan_record<R, D>(
    record: &R,
    config: &ScanConfig,
    detector: &D,
) -> SegmentResult<SegmentationTable>
where
    R: RecordView + ?Sized,
    D: PeakDetector + ?Sized,
{
    validate_record(record)?;
    let heart_rate = estimate_heart_rate(record.signal(), detector)?;
    segment_validated(record, config, heart_rate)
}

/// Segment and classify a record whose average heart rate is already known.
pub fn scan_record_with_heart_rate<R: RecordView + ?Sized>(
    record: &R,
    config: &ScanConfig,
    heart_rate: u32,
) -> SegmentResult<SegmentationTable> {
    validate_record(record)?;
    segment_validated(record, config, heart_rate)
}

fn segment_validated<R: RecordView + ?Sized>(
    record: &R,
    config: &ScanConfig,
    heart_rate: u32,
) -> SegmentResult<SegmentationTable> {
    let plan = build_plan(record, config, heart_rate)?;
    let samples = &record.signal().data;
    let beats = record.beat_annotations();
    let label = record.diagnostic_label();
    let mut table = SegmentationTable::new();
    for window in plan.windows() {
        let tally = BeatTally::collect(&window, beats);
        let (pac_percent, pvc_percent, rhythm_class) =
            classify_tally(label, &tally, &config.thresholds);
        table.push(WindowResult {
            parent_record: record.record_id().to_string(),
            label: label.to_string(),
            avg_heart_rate: heart_rate,
            window,
            signal: samples[window.left..window.right].to_vec(),
            beats: tally,
            pac_percent,
            pvc_percent,
            rhythm_class,
        });
    }
    info!(
        "There are {} segments in the record {}.",
        table.len(),
        record.record_id()
    );
    Ok(table)
}
