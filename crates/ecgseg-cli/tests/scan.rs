use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{collections::BTreeMap, error::Error, fs, path::PathBuf};
use tempfile::tempdir;

#[derive(Debug, Deserialize)]
struct SummaryLine {
    parent_record: String,
    label: String,
    avg_heart_rate: u32,
    left: usize,
    right: usize,
    beat_annotation_symbols: String,
    annotated_samples: Vec<usize>,
    beat_occurrence: BTreeMap<char, usize>,
    pac_percent: f64,
    pvc_percent: f64,
    true_class: String,
}

fn sample_path(relative: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join(relative)
        .to_string_lossy()
        .to_string()
}

fn parse_lines(stdout: &[u8]) -> Result<Vec<SummaryLine>, Box<dyn Error>> {
    let text = String::from_utf8(stdout.to_vec())?;
    let mut rows = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        rows.push(serde_json::from_str(line)?);
    }
    Ok(rows)
}

#[test]
fn scan_emits_one_line_per_window() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args([
        "scan",
        "--input",
        &sample_path("test_data/scenario_a.txt"),
        "--fs",
        "10",
        "--annotations",
        &sample_path("test_data/scenario_a_ann.txt"),
        "--window-width-s",
        "10",
        "--step-unit",
        "seconds",
        "--step",
        "5",
        "--heart-rate",
        "72",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let rows = parse_lines(&output)?;

    let bounds: Vec<(usize, usize)> = rows.iter().map(|r| (r.left, r.right)).collect();
    assert_eq!(
        bounds,
        vec![(0, 100), (50, 150), (100, 200), (150, 250), (200, 300)]
    );
    let classes: Vec<&str> = rows.iter().map(|r| r.true_class.as_str()).collect();
    assert_eq!(classes, vec!["PAC", "PAC", "NSR", "NSR", "NSR"]);

    let first = &rows[0];
    assert_eq!(first.parent_record, "scenario_a");
    assert_eq!(first.label, "non atrial fibrillation");
    assert_eq!(first.avg_heart_rate, 72);
    assert_eq!(first.beat_annotation_symbols, "NNAA");
    assert_eq!(first.annotated_samples, vec![10, 30, 60, 80]);
    assert_eq!(first.beat_occurrence.get(&'A'), Some(&2));
    assert_eq!(first.pac_percent, 50.0);
    assert_eq!(first.pvc_percent, 0.0);
    assert_eq!(rows[1].annotated_samples, vec![10, 30]);
    Ok(())
}

#[test]
fn scan_uses_rhythm_intervals_and_filters_class() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args([
        "scan",
        "--input",
        &sample_path("test_data/scenario_a.txt"),
        "--fs",
        "10",
        "--annotations",
        &sample_path("test_data/scenario_af_ann.txt"),
        "--window-width-s",
        "5",
        "--step",
        "5",
        "--heart-rate",
        "80",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let rows = parse_lines(&output)?;
    let classes: Vec<&str> = rows.iter().map(|r| r.true_class.as_str()).collect();
    assert_eq!(classes, vec!["AF", "AF", "AF", "AF", "Other", "AF"]);
    assert!(rows.iter().all(|r| r.label == "atrial fibrillation"));

    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args([
        "scan",
        "--input",
        &sample_path("test_data/scenario_a.txt"),
        "--fs",
        "10",
        "--annotations",
        &sample_path("test_data/scenario_af_ann.txt"),
        "--window-width-s",
        "5",
        "--step",
        "5",
        "--heart-rate",
        "80",
        "--class",
        "other",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let rows = parse_lines(&output)?;
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].left, rows[0].right), (200, 250));
    assert_eq!(rows[0].pvc_percent, 100.0);
    Ok(())
}

#[test]
fn scan_reads_config_file_and_writes_csv() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let out = dir.path().join("scenario_a.csv");
    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args([
        "scan",
        "--input",
        &sample_path("test_data/scenario_a.txt"),
        "--fs",
        "10",
        "--config",
        &sample_path("test_data/scan_10s.toml"),
        "--heart-rate",
        "60",
        "--out",
        out.to_str().expect("utf8 path"),
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    assert_eq!(parse_lines(&output)?.len(), 5);

    let contents = fs::read_to_string(&out)?;
    let mut lines = contents.lines();
    let header = lines.next().expect("header row");
    assert!(header.starts_with("parent_record,label,avg_heart_rate"));
    assert!(header.ends_with("true_class,signals"));
    assert_eq!(lines.count(), 5);
    Ok(())
}

#[test]
fn degenerate_step_fails() {
    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args([
        "scan",
        "--input",
        &sample_path("test_data/scenario_a.txt"),
        "--fs",
        "10",
        "--window-width-s",
        "10",
        "--step",
        "0.01",
        "--heart-rate",
        "60",
    ]);
    cmd.assert().failure();
}

#[test]
fn unknown_step_unit_fails() {
    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args([
        "scan",
        "--input",
        &sample_path("test_data/scenario_a.txt"),
        "--fs",
        "10",
        "--step-unit",
        "minutes",
    ]);
    cmd.assert().failure();
}
