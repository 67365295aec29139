pub mod classify;
pub mod config;
pub mod detectors;
pub mod error;
pub mod io;
pub mod metrics;
pub mod plot;
pub mod record;
pub mod scan;
pub mod signal;
pub mod table;
pub mod window;

pub use classify::{classify, ClassifierThresholds, RhythmClass};
pub use config::{load_scan_config, ScanConfig};
pub use detectors::PeakDetector;
pub use error::{SegmentError, SegmentResult};
pub use record::{Record, RecordView};
pub use scan::{plan_windows, scan_record, scan_record_with_heart_rate};
pub use signal::*;
pub use table::{SegmentationTable, WindowResult};
