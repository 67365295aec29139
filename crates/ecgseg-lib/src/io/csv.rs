use crate::table::SegmentationTable;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs;
use std::io::Write;
use std::path::Path;

pub const SEGMENT_COLUMNS: [&str; 12] = [
    "parent_record",
    "label",
    "avg_heart_rate",
    "left",
    "right",
    "beat_annotation_symbols",
    "annotated_samples",
    "beat_occurrence",
    "pac_percent",
    "pvc_percent",
    "true_class",
    "signals",
];

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Write one CSV row per window. List-valued cells are space separated and the
/// beat occurrence map is JSON.
pub fn write_segments<W: Write>(writer: W, table: &SegmentationTable) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(SEGMENT_COLUMNS)?;
    for row in table.rows() {
        writer.write_record(&[
            row.parent_record.to_string(),
            row.label.to_string(),
            row.avg_heart_rate.to_string(),
            row.window.left.to_string(),
            row.window.right.to_string(),
            join(&row.beats.symbols),
            join(&row.beats.offsets),
            serde_json::to_string(&row.beats.counts)?,
            row.pac_percent.to_string(),
            row.pvc_percent.to_string(),
            row.rhythm_class.to_string(),
            join(row.signal),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_segments_csv(path: &Path, table: &SegmentationTable) -> Result<()> {
    let file =
        fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_segments(file, table).with_context(|| format!("writing segments to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RhythmClass;
    use crate::signal::BeatAnnotation;
    use crate::table::WindowResult;
    use crate::window::{BeatTally, Window};
    use csv::ReaderBuilder;
    use tempfile::tempdir;

    fn table() -> SegmentationTable {
        let window = Window { left: 4, right: 8 };
        let beats = [BeatAnnotation::new(5, 'N'), BeatAnnotation::new(8, 'A')];
        let mut table = SegmentationTable::new();
        table.push(WindowResult {
            parent_record: "100".into(),
            label: "non atrial fibrillation".into(),
            avg_heart_rate: 75,
            window,
            signal: vec![0.5, 1.0, -0.25, 0.0],
            beats: BeatTally::collect(&window, &beats),
            pac_percent: 50.0,
            pvc_percent: 0.0,
            rhythm_class: RhythmClass::Pac,
        });
        table
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("100_PAC.csv");
        write_segments_csv(&path, &table()).unwrap();

        let mut reader = ReaderBuilder::new().from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), SEGMENT_COLUMNS.to_vec());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][5], "N A");
        assert_eq!(&rows[0][6], "1 4");
        assert_eq!(&rows[0][7], r#"{"A":1,"N":1}"#);
        assert_eq!(&rows[0][10], "PAC");
        assert_eq!(&rows[0][11], "0.5 1 -0.25 0");
    }

    #[test]
    fn empty_table_writes_only_header() {
        let mut buf = Vec::new();
        write_segments(&mut buf, &SegmentationTable::new()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("parent_record,label"));
    }
}
