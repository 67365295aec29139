use super::AnnotationSet;
use crate::signal::BeatAnnotation;
use anyhow::{anyhow, Context, Result};
use std::path::Path;

fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Parse newline-delimited floating point series, ignoring blank/comment lines.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (line_no, line) in content_lines(text) {
        let val: f64 = line
            .parse()
            .with_context(|| format!("line {} is not f64: {}", line_no, line))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Read a newline-delimited floating point series from disk.
pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text)
}

/// Parse annotation lines of the form `<sample> <symbol> [aux]`.
///
/// Fields may be separated by whitespace or commas. A `+` symbol with an aux
/// label (e.g. `1200 + (AFIB`) marks a rhythm change; any other symbol is a beat.
pub fn parse_annotations(text: &str) -> Result<AnnotationSet> {
    let mut set = AnnotationSet::default();
    for (line_no, line) in content_lines(text) {
        let mut fields = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|field| !field.is_empty());
        let sample: usize = fields
            .next()
            .ok_or_else(|| anyhow!("line {} is empty", line_no))?
            .parse()
            .with_context(|| format!("line {} has no integer sample index: {}", line_no, line))?;
        let symbol_field = fields
            .next()
            .ok_or_else(|| anyhow!("line {} is missing an annotation symbol", line_no))?;
        let mut chars = symbol_field.chars();
        let symbol = match (chars.next(), chars.next()) {
            (Some(symbol), None) => symbol,
            _ => anyhow::bail!(
                "line {}: annotation symbol must be one character, got '{}'",
                line_no,
                symbol_field
            ),
        };
        let aux: Vec<&str> = fields.collect();
        if symbol == '+' && !aux.is_empty() {
            set.rhythm_markers.push((sample, aux.join(" ")));
        } else {
            set.beats.push(BeatAnnotation::new(sample, symbol));
        }
    }
    Ok(set)
}

/// Read `<sample> <symbol>` annotations from a file.
pub fn read_annotations(path: &Path) -> Result<AnnotationSet> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_annotations(&text).with_context(|| format!("parsing annotations {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_series_with_comments() {
        let values = parse_f64_series("# lead I\n0.5\n\n-1.25\n").unwrap();
        assert_eq!(values, vec![0.5, -1.25]);
        assert!(parse_f64_series("# nothing\n").is_err());
        assert!(parse_f64_series("1.0\nabc\n").is_err());
    }

    #[test]
    fn parses_beats_and_rhythm_markers() {
        let set = parse_annotations("0 + (N\n18 N\n77,A\n# skip\n120 V\n300 + (AFIB\n").unwrap();
        assert_eq!(
            set.beats,
            vec![
                BeatAnnotation::new(18, 'N'),
                BeatAnnotation::new(77, 'A'),
                BeatAnnotation::new(120, 'V'),
            ]
        );
        assert_eq!(
            set.rhythm_markers,
            vec![(0, "(N".to_string()), (300, "(AFIB".to_string())]
        );
        let intervals = set.rhythm_intervals(400);
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].end, 299);
    }

    #[test]
    fn rejects_malformed_annotation_lines() {
        assert!(parse_annotations("12\n").is_err());
        assert!(parse_annotations("x N\n").is_err());
        assert!(parse_annotations("12 NN\n").is_err());
    }
}
