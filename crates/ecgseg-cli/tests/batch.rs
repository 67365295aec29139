use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn wfdb_fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test_data/wfdb")
}

fn batch_over_fixtures(class: &str, out: &Path, plot_dir: Option<&Path>) -> Value {
    let folder = wfdb_fixtures();
    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args([
        "batch",
        "--folder",
        folder.to_str().unwrap(),
        "--class",
        class,
        "--out-dir",
        out.to_str().unwrap(),
        "--heart-rate",
        "60",
        "--window-width-s",
        "10",
        "--step",
        "10",
    ]);
    if let Some(dir) = plot_dir {
        cmd.args(["--plot-dir", dir.to_str().unwrap()]);
    }
    let stdout = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&stdout).unwrap()
}

fn csv_rows(path: &Path) -> Vec<csv::StringRecord> {
    csv::Reader::from_path(path)
        .unwrap()
        .records()
        .map(|r| r.unwrap())
        .collect()
}

#[test]
fn batch_skips_records_with_existing_output() {
    let temp = tempdir().unwrap();
    let records = temp.path().join("records");
    let out = temp.path().join("out");
    fs::create_dir_all(&records).unwrap();
    fs::create_dir_all(&out).unwrap();
    fs::write(records.join("100.hea"), "100 1 360 650000\n").unwrap();
    fs::write(out.join("100_NSR.csv"), "already done\n").unwrap();

    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args([
        "batch",
        "--folder",
        records.to_str().unwrap(),
        "--class",
        "NSR",
        "--out-dir",
        out.to_str().unwrap(),
    ]);
    let stdout = cmd.assert().success().get_output().stdout.clone();
    let summary: Value = serde_json::from_slice(&stdout).unwrap();
    assert_eq!(summary["skipped"], 1);
    assert_eq!(summary["processed"], 0);
    assert_eq!(summary["failed"], 0);
    assert_eq!(
        fs::read_to_string(out.join("100_NSR.csv")).unwrap(),
        "already done\n"
    );
}

#[test]
fn batch_rejects_unknown_class() {
    let temp = tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args([
        "batch",
        "--folder",
        temp.path().to_str().unwrap(),
        "--class",
        "Pure_NSR",
        "--out-dir",
        temp.path().join("out").to_str().unwrap(),
    ]);
    cmd.assert().failure();
}

#[test]
fn batch_on_empty_folder_reports_nothing_processed() {
    let temp = tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args([
        "batch",
        "--folder",
        temp.path().to_str().unwrap(),
        "--class",
        "AF",
        "--out-dir",
        temp.path().join("out").to_str().unwrap(),
    ]);
    let stdout = cmd.assert().success().get_output().stdout.clone();
    let summary: Value = serde_json::from_slice(&stdout).unwrap();
    assert_eq!(summary["processed"], 0);
    assert_eq!(summary["windows"], 0);
    assert!(temp.path().join("out").is_dir());
}

#[test]
fn batch_writes_one_csv_per_record_with_kept_class() {
    let temp = tempdir().unwrap();
    let out = temp.path().join("out");
    let summary = batch_over_fixtures("NSR", &out, None);
    assert_eq!(summary["processed"], 2);
    assert_eq!(summary["failed"], 0);
    assert_eq!(summary["windows"], 5);

    let p1 = csv_rows(&out.join("p1_NSR.csv"));
    assert_eq!(p1.len(), 3);
    assert!(p1.iter().all(|row| &row[0] == "p1"));
    let p2 = csv_rows(&out.join("p2_NSR.csv"));
    assert_eq!(p2.len(), 2);

    let pac = batch_over_fixtures("PAC", &out, None);
    assert_eq!(pac["processed"], 2);
    assert_eq!(pac["empty"], 1);
    assert_eq!(pac["windows"], 1);
    assert!(!out.join("p1_PAC.csv").exists());
    assert_eq!(csv_rows(&out.join("p2_PAC.csv")).len(), 1);
}

#[test]
fn batch_renders_a_png_per_kept_window() {
    let temp = tempdir().unwrap();
    let out = temp.path().join("out");
    let plots = temp.path().join("plots");
    let summary = batch_over_fixtures("NSR", &out, Some(&plots));
    assert_eq!(summary["failed"], 0);
    for name in ["p1_NSR_0", "p1_NSR_1", "p1_NSR_2", "p2_NSR_0", "p2_NSR_1"] {
        let png = plots.join(format!("{name}.png"));
        assert!(fs::metadata(&png).unwrap().len() > 0, "{}", png.display());
    }
    assert!(!plots.join("p2_NSR_2.png").exists());
}

#[test]
fn batch_keeps_going_after_a_record_fails_to_render() {
    let temp = tempdir().unwrap();
    let out = temp.path().join("out");
    let plots = temp.path().join("plots");
    // a directory where the first PNG of p1 should go makes its render fail
    fs::create_dir_all(plots.join("p1_NSR_0.png")).unwrap();

    let summary = batch_over_fixtures("NSR", &out, Some(&plots));
    assert_eq!(summary["failed"], 1);
    assert_eq!(summary["processed"], 1);
    assert!(!out.join("p1_NSR.csv").exists());
    assert_eq!(csv_rows(&out.join("p2_NSR.csv")).len(), 2);
    assert!(plots.join("p2_NSR_0.png").is_file());

    // once the obstruction is gone a rerun picks p1 up and skips p2
    fs::remove_dir(plots.join("p1_NSR_0.png")).unwrap();
    let rerun = batch_over_fixtures("NSR", &out, Some(&plots));
    assert_eq!(rerun["processed"], 1);
    assert_eq!(rerun["skipped"], 1);
    assert_eq!(csv_rows(&out.join("p1_NSR.csv")).len(), 3);
}

#[test]
fn batch_rejects_an_empty_voltage_range() {
    let temp = tempdir().unwrap();
    let folder = wfdb_fixtures();
    let mut cmd = cargo_bin_cmd!("ecgseg");
    cmd.args([
        "batch",
        "--folder",
        folder.to_str().unwrap(),
        "--class",
        "NSR",
        "--out-dir",
        temp.path().join("out").to_str().unwrap(),
        "--voltage-min",
        "2",
        "--voltage-max",
        "-2",
    ]);
    cmd.assert().failure();
}
