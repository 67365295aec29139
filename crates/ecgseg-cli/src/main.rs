use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ecgseg_lib::{
    detectors::ecg::EcgPipelineConfig,
    io::{csv as csv_io, text as text_io, wfdb as wfdb_io, AnnotationSet},
    load_scan_config,
    plot::{figure_from_window, Figure, PlotBackend, Series, WindowPlotOptions},
    scan_record, scan_record_with_heart_rate,
    window::{StepConfig, StepUnit},
    Record, RecordView, RhythmClass, ScanConfig, SegmentationTable, TimeSeries,
};
use log::{info, warn};
use plotters::prelude::*;
use serde::Serialize;
use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "ecgseg",
    version,
    about = "ECGSeg: fixed-width ECG window segmentation and rhythm labelling"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Segmentation settings shared by every command; flags override `--config`.
#[derive(Args, Clone, Debug)]
struct ScanArgs {
    /// TOML file with window, step and threshold settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Window width in seconds
    #[arg(long)]
    window_width_s: Option<f64>,
    /// Step unit: beats or seconds
    #[arg(long)]
    step_unit: Option<String>,
    /// Step magnitude in the chosen unit
    #[arg(long)]
    step: Option<f64>,
    /// Minimum rhythm interval duration (seconds) to scan
    #[arg(long)]
    min_interval_s: Option<f64>,
    /// Use this average heart rate (bpm) instead of running R-peak detection
    #[arg(long)]
    heart_rate: Option<u32>,
    /// Refractory period for the R-peak detector (seconds)
    #[arg(long, default_value_t = 0.250)]
    min_rr_s: f64,
}

impl ScanArgs {
    fn resolve(&self) -> Result<ScanConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_scan_config(path)?,
            None => ScanConfig::default(),
        };
        if let Some(width) = self.window_width_s {
            cfg.window_width_s = width;
        }
        if let Some(unit) = &self.step_unit {
            cfg.step.unit = unit.parse::<StepUnit>()?;
        }
        if let Some(magnitude) = self.step {
            cfg.step = StepConfig {
                magnitude,
                ..cfg.step
            };
        }
        if let Some(min_interval) = self.min_interval_s {
            cfg.min_interval_s = Some(min_interval);
        }
        Ok(cfg)
    }

    fn detector(&self) -> EcgPipelineConfig {
        EcgPipelineConfig {
            min_rr_s: self.min_rr_s,
            ..EcgPipelineConfig::default()
        }
    }

    fn scan(&self, record: &Record, cfg: &ScanConfig) -> Result<SegmentationTable> {
        let table = match self.heart_rate {
            Some(bpm) => scan_record_with_heart_rate(record, cfg, bpm)?,
            None => scan_record(record, cfg, &self.detector())?,
        };
        Ok(table)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Segment one record and print a JSON summary line per window
    Scan {
        /// Newline-delimited samples (stdin when neither this nor --wfdb-header is given)
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        #[arg(long)]
        wfdb_header: Option<PathBuf>,
        #[arg(long, default_value_t = 0)]
        wfdb_lead: usize,
        /// Beat/rhythm annotations: WFDB `.atr` or `<sample> <symbol>` text
        #[arg(long)]
        annotations: Option<PathBuf>,
        /// Record-level diagnosis; inferred from rhythm annotations when omitted
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        record_id: Option<String>,
        /// Only keep windows of this class (NSR, PAC, PVC, AF, Other)
        #[arg(long)]
        class: Option<String>,
        /// Write the full table, signals included, to this CSV file
        #[arg(long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Segment every WFDB record in a folder and keep one rhythm class
    Batch {
        #[arg(long)]
        folder: PathBuf,
        #[arg(long)]
        class: String,
        #[arg(long)]
        out_dir: PathBuf,
        /// Render one PNG per kept window into this folder
        #[arg(long)]
        plot_dir: Option<PathBuf>,
        #[command(flatten)]
        plot: PlotArgs,
        #[arg(long, default_value_t = 0)]
        wfdb_lead: usize,
        #[arg(long, default_value = "atr")]
        annotation_ext: String,
        #[command(flatten)]
        scan: ScanArgs,
    },
}

/// How window previews are drawn.
#[derive(Args, Clone, Debug)]
struct PlotArgs {
    /// Gain applied to each window before cleaning
    #[arg(long, default_value_t = 2.0)]
    plot_scale: f64,
    /// Lower end of the pinned voltage axis
    #[arg(long, default_value_t = -3.0, allow_hyphen_values = true)]
    voltage_min: f64,
    /// Upper end of the pinned voltage axis
    #[arg(long, default_value_t = 3.0, allow_hyphen_values = true)]
    voltage_max: f64,
    /// Draw the raw slice, skipping band-pass cleaning
    #[arg(long)]
    raw_plot: bool,
}

impl PlotArgs {
    fn options(&self) -> Result<WindowPlotOptions> {
        if self.voltage_min.partial_cmp(&self.voltage_max) != Some(std::cmp::Ordering::Less) {
            anyhow::bail!(
                "voltage range [{}, {}] is empty",
                self.voltage_min,
                self.voltage_max
            );
        }
        let defaults = WindowPlotOptions::default();
        Ok(WindowPlotOptions {
            scale: self.plot_scale,
            clean: if self.raw_plot { None } else { defaults.clean },
            y_range: Some((self.voltage_min, self.voltage_max)),
            ..defaults
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Scan {
            input,
            fs,
            wfdb_header,
            wfdb_lead,
            annotations,
            label,
            record_id,
            class,
            out,
            scan,
        } => cmd_scan(
            input.as_deref(),
            fs,
            wfdb_header.as_deref(),
            wfdb_lead,
            annotations.as_deref(),
            label.as_deref(),
            record_id,
            class.as_deref(),
            out.as_deref(),
            &scan,
        )?,
        Commands::Batch {
            folder,
            class,
            out_dir,
            plot_dir,
            plot,
            wfdb_lead,
            annotation_ext,
            scan,
        } => cmd_batch(
            &folder,
            &class,
            &out_dir,
            plot_dir.as_deref(),
            &plot,
            wfdb_lead,
            &annotation_ext,
            &scan,
        )?,
    }
    Ok(())
}

fn read_samples(input: Option<&Path>) -> Result<Vec<f64>> {
    match input {
        Some(path) => text_io::read_f64_series(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_f64_series(&buf)
        }
    }
}

fn load_annotations(path: Option<&Path>) -> Result<AnnotationSet> {
    let Some(path) = path else {
        return Ok(AnnotationSet::default());
    };
    let is_wfdb = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("atr"));
    if is_wfdb {
        wfdb_io::load_wfdb_annotations(path)
    } else {
        text_io::read_annotations(path)
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_scan(
    input: Option<&Path>,
    fs: f64,
    wfdb_header: Option<&Path>,
    wfdb_lead: usize,
    annotations: Option<&Path>,
    label: Option<&str>,
    record_id: Option<String>,
    class: Option<&str>,
    out: Option<&Path>,
    scan: &ScanArgs,
) -> Result<()> {
    let cfg = scan.resolve()?;
    let annotations = load_annotations(annotations)?;
    let record = match wfdb_header {
        Some(header) => wfdb_io::load_wfdb_record(header, wfdb_lead, &annotations, label)?,
        None => {
            let signal = TimeSeries {
                fs,
                data: read_samples(input)?,
            };
            let id = record_id.unwrap_or_else(|| {
                input
                    .and_then(|p| p.file_stem())
                    .and_then(|s| s.to_str())
                    .unwrap_or("stdin")
                    .to_string()
            });
            wfdb_io::record_from_parts(id, signal, &annotations, label)?
        }
    };
    let mut table = scan.scan(&record, &cfg)?;
    if let Some(class) = class {
        table = table.filter_class(class.parse::<RhythmClass>()?);
    }
    if let Some(path) = out {
        csv_io::write_segments_csv(path, &table)?;
    }
    for row in table.rows() {
        println!("{}", serde_json::to_string(&row.summary())?);
    }
    Ok(())
}

#[derive(Debug, Default, Serialize)]
struct BatchSummary {
    processed: usize,
    skipped: usize,
    failed: usize,
    empty: usize,
    windows: usize,
}

#[allow(clippy::too_many_arguments)]
fn cmd_batch(
    folder: &Path,
    class: &str,
    out_dir: &Path,
    plot_dir: Option<&Path>,
    plot: &PlotArgs,
    wfdb_lead: usize,
    annotation_ext: &str,
    scan: &ScanArgs,
) -> Result<()> {
    if !folder.is_dir() {
        anyhow::bail!("folder '{}' does not exist", folder.display());
    }
    let class: RhythmClass = class.parse()?;
    let cfg = scan.resolve()?;
    let plot_opts = plot.options()?;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output folder {}", out_dir.display()))?;
    if let Some(dir) = plot_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut headers: Vec<PathBuf> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("hea"))
        .collect();
    headers.sort();

    let mut summary = BatchSummary::default();
    for header in headers {
        let Some(name) = header.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let csv_path = out_dir.join(format!("{}_{}.csv", name, class));
        if csv_path.exists() {
            info!("{} already exists, skipping {}", csv_path.display(), name);
            summary.skipped += 1;
            continue;
        }
        let kept = process_record(&header, wfdb_lead, annotation_ext, class, &cfg, scan)
            .and_then(|(record, kept)| {
                if kept.is_empty() {
                    return Ok(kept);
                }
                // PNGs first: a record only counts as done once its CSV exists
                if let Some(dir) = plot_dir {
                    render_windows(dir, name, class, &record, &kept, &plot_opts)?;
                }
                csv_io::write_segments_csv(&csv_path, &kept)?;
                Ok(kept)
            });
        match kept {
            Ok(kept) => {
                summary.processed += 1;
                info!("'{}' {} in this record {}", class, kept.len(), name);
                if kept.is_empty() {
                    summary.empty += 1;
                }
                summary.windows += kept.len();
            }
            Err(err) => {
                warn!("skipping record {}: {:#}", name, err);
                summary.failed += 1;
            }
        }
    }
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn process_record(
    header: &Path,
    wfdb_lead: usize,
    annotation_ext: &str,
    class: RhythmClass,
    cfg: &ScanConfig,
    scan: &ScanArgs,
) -> Result<(Record, SegmentationTable)> {
    let ann_path = header.with_extension(annotation_ext);
    let annotations = if ann_path.is_file() {
        wfdb_io::load_wfdb_annotations(&ann_path)?
    } else {
        AnnotationSet::default()
    };
    let record = wfdb_io::load_wfdb_record(header, wfdb_lead, &annotations, None)?;
    let table = scan.scan(&record, cfg)?;
    let kept = table.filter_class(class);
    Ok((record, kept))
}

fn render_windows(
    dir: &Path,
    name: &str,
    class: RhythmClass,
    record: &Record,
    table: &SegmentationTable,
    opts: &WindowPlotOptions,
) -> Result<()> {
    for (i, row) in table.rows().enumerate() {
        let fig = figure_from_window(&row, record.sampling_frequency(), opts);
        let mut backend = PngBackend {
            path: dir.join(format!("{}_{}_{}.png", name, class, i)),
        };
        backend
            .draw(&fig)
            .with_context(|| format!("rendering {}", backend.path.display()))?;
    }
    Ok(())
}

struct PngBackend {
    path: PathBuf,
}

impl PlotBackend for PngBackend {
    fn draw(&mut self, fig: &Figure) -> Result<()> {
        let root = BitMapBackend::new(&self.path, (1000, 400)).into_drawing_area();
        root.fill(&WHITE)?;
        let (x_min, x_max, y_min, y_max) = fig.bounds().unwrap_or((0.0, 1.0, 0.0, 1.0));
        let pad = match fig.y_range {
            Some(_) => 0.0,
            None => ((y_max - y_min) * 0.1).max(1e-3),
        };
        let label_offset = ((y_max - y_min) * 0.05).max(1e-3);
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                fig.title.clone().unwrap_or_else(|| "Window".into()),
                ("sans-serif", 20),
            )
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(x_min..x_max.max(x_min + 1e-3), (y_min - pad)..(y_max + pad))?;
        let mut mesh = chart.configure_mesh();
        if let Some(label) = &fig.x.label {
            mesh.x_desc(label.as_str());
        }
        if let Some(label) = &fig.y.label {
            mesh.y_desc(label.as_str());
        }
        mesh.draw()?;
        for series in &fig.series {
            match series {
                Series::Line(line) => {
                    let (r, g, b) = line.style.color.rgb();
                    chart.draw_series(LineSeries::new(
                        line.points.iter().map(|p| (p[0], p[1])),
                        &RGBColor(r, g, b),
                    ))?;
                }
                Series::Markers(markers) => {
                    let (r, g, b) = markers.style.color.rgb();
                    let color = RGBColor(r, g, b);
                    chart.draw_series(markers.points.iter().map(|p| {
                        Circle::new((p[0], p[1]), markers.style.width as i32, color.filled())
                    }))?;
                    chart.draw_series(markers.points.iter().zip(&markers.labels).map(
                        |(p, label)| {
                            Text::new(label.clone(), (p[0], p[1] + label_offset), ("sans-serif", 14))
                        },
                    ))?;
                }
            }
        }
        root.present()?;
        Ok(())
    }
}
