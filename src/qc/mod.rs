//! MRIQC metric records and their loader.
//!
//! Each modality has a fixed record schema. Absent or non-numeric metrics are
//! stored as NaN, never as zero, so threshold checks on them are always false.

pub mod exclusion;
pub mod summary;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::input::discover_qc_files;
use crate::io::mriqc_json::{MriqcDocument, read_mriqc_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Bold,
    T1w,
}

impl Modality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bold => "BOLD",
            Self::T1w => "T1w",
        }
    }

    /// Glob below the MRIQC root.
    pub fn file_pattern(self) -> &'static str {
        match self {
            Self::Bold => "sub-*/**/func/*_bold.json",
            Self::T1w => "sub-*/**/anat/*_T1w.json",
        }
    }
}

/// Common view over per-modality records used by the summarizer and CSV writer.
pub trait QcRecord: Sized {
    const MODALITY: Modality;
    /// Identifier columns, in output order.
    const ID_COLUMNS: &'static [&'static str];
    /// Metric columns, in output order.
    const METRICS: &'static [&'static str];

    fn from_document(doc: &MriqcDocument) -> Self;
    fn subject_id(&self) -> &str;
    fn session_id(&self) -> &str;
    fn id_values(&self) -> Vec<&str>;
    /// Values aligned with `METRICS`.
    fn metric_values(&self) -> Vec<f64>;

    fn metric(&self, name: &str) -> Option<f64> {
        Self::METRICS
            .iter()
            .position(|m| *m == name)
            .map(|i| self.metric_values()[i])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoldMetrics {
    pub subject_id: String,
    pub session_id: String,
    pub task: String,
    pub fd_mean: f64,
    pub fd_num: f64,
    pub fd_perc: f64,
    pub snr: f64,
    pub tsnr: f64,
    pub gcor: f64,
    pub dvars_std: f64,
    pub dvars_nstd: f64,
    pub aor: f64,
    pub aqi: f64,
}

impl QcRecord for BoldMetrics {
    const MODALITY: Modality = Modality::Bold;
    const ID_COLUMNS: &'static [&'static str] = &["subject_id", "session_id", "task"];
    const METRICS: &'static [&'static str] = &[
        "fd_mean",
        "fd_num",
        "fd_perc",
        "snr",
        "tsnr",
        "gcor",
        "dvars_std",
        "dvars_nstd",
        "aor",
        "aqi",
    ];

    fn from_document(doc: &MriqcDocument) -> Self {
        Self {
            subject_id: doc.subject_id(),
            session_id: doc.session_id(),
            task: doc.task_id(),
            fd_mean: doc.metric("fd_mean"),
            fd_num: doc.metric("fd_num"),
            fd_perc: doc.metric("fd_perc"),
            snr: doc.metric("snr"),
            tsnr: doc.metric("tsnr"),
            gcor: doc.metric("gcor"),
            dvars_std: doc.metric("dvars_std"),
            dvars_nstd: doc.metric("dvars_nstd"),
            aor: doc.metric("aor"),
            aqi: doc.metric("aqi"),
        }
    }

    fn subject_id(&self) -> &str {
        &self.subject_id
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn id_values(&self) -> Vec<&str> {
        vec![
            self.subject_id.as_str(),
            self.session_id.as_str(),
            self.task.as_str(),
        ]
    }

    fn metric_values(&self) -> Vec<f64> {
        vec![
            self.fd_mean,
            self.fd_num,
            self.fd_perc,
            self.snr,
            self.tsnr,
            self.gcor,
            self.dvars_std,
            self.dvars_nstd,
            self.aor,
            self.aqi,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct T1wMetrics {
    pub subject_id: String,
    pub session_id: String,
    /// MRIQC `snr_total`.
    pub snr: f64,
    pub cnr: f64,
    pub fber: f64,
    pub efc: f64,
    pub qi_1: f64,
    pub qi_2: f64,
    pub cjv: f64,
    pub wm2max: f64,
}

impl QcRecord for T1wMetrics {
    const MODALITY: Modality = Modality::T1w;
    const ID_COLUMNS: &'static [&'static str] = &["subject_id", "session_id"];
    const METRICS: &'static [&'static str] =
        &["snr", "cnr", "fber", "efc", "qi_1", "qi_2", "cjv", "wm2max"];

    fn from_document(doc: &MriqcDocument) -> Self {
        Self {
            subject_id: doc.subject_id(),
            session_id: doc.session_id(),
            snr: doc.metric("snr_total"),
            cnr: doc.metric("cnr"),
            fber: doc.metric("fber"),
            efc: doc.metric("efc"),
            qi_1: doc.metric("qi_1"),
            qi_2: doc.metric("qi_2"),
            cjv: doc.metric("cjv"),
            wm2max: doc.metric("wm2max"),
        }
    }

    fn subject_id(&self) -> &str {
        &self.subject_id
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn id_values(&self) -> Vec<&str> {
        vec![self.subject_id.as_str(), self.session_id.as_str()]
    }

    fn metric_values(&self) -> Vec<f64> {
        vec![
            self.snr,
            self.cnr,
            self.fber,
            self.efc,
            self.qi_1,
            self.qi_2,
            self.cjv,
            self.wm2max,
        ]
    }
}

#[derive(Debug, Clone)]
pub struct QcTable<R> {
    pub records: Vec<R>,
    pub sources: Vec<PathBuf>,
}

impl<R> QcTable<R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads every metric file for `R::MODALITY`. `None` means no usable file
/// exists, i.e. QC was not run for this modality.
pub fn load_table<R: QcRecord>(mriqc_dir: &Path) -> Result<(Option<QcTable<R>>, Vec<String>)> {
    let files = discover_qc_files(mriqc_dir, R::MODALITY)?;
    let mut warnings = Vec::new();
    if files.is_empty() {
        warn!(modality = R::MODALITY.as_str(), dir = %mriqc_dir.display(), "no quality metrics found");
        warnings.push(format!(
            "No {} quality metrics found",
            R::MODALITY.as_str()
        ));
        return Ok((None, warnings));
    }

    let mut records = Vec::with_capacity(files.len());
    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        match read_mriqc_json(&path) {
            Ok(doc) => {
                records.push(R::from_document(&doc));
                sources.push(path);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{:#}", err), "skipping metric file");
                warnings.push(format!("skipped {}: {:#}", path.display(), err));
            }
        }
    }
    info!(
        modality = R::MODALITY.as_str(),
        records = records.len(),
        "quality_metrics_loaded"
    );

    if records.is_empty() {
        return Ok((None, warnings));
    }
    Ok((Some(QcTable { records, sources }), warnings))
}
