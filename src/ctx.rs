use std::path::PathBuf;

use crate::atlas::RoiOutcome;
use crate::config::{
    self, BOLD_SUMMARY_FILE, EXCLUSIONS_FILE, ExclusionThresholds, FilterParams, MaskParams,
    SummaryThresholds, T1W_SUMMARY_FILE,
};
use crate::confounds::{ConfoundSelection, ConfoundTable};
use crate::connectivity::{ConnectivityKind, ConnectivityMatrix};
use crate::input::SubjectDerivativeSet;
use crate::io::artifacts::ArtifactReport;
use crate::qc::exclusion::ExclusionEntry;
use crate::qc::summary::ModalitySummary;
use crate::qc::{BoldMetrics, QcTable, T1wMetrics};
use crate::signal::{BoldImage, ConditionedScan, MaskSource};

/// State for one subject/session run of the analysis pipeline.
#[derive(Debug)]
pub struct AnalysisCtx {
    pub derivatives_dir: PathBuf,
    pub subject_id: String,
    pub session_id: String,
    pub atlas: String,
    pub atlas_dir: PathBuf,
    pub kind: ConnectivityKind,
    pub confound_names: Vec<String>,
    pub filter: FilterParams,
    pub mask_params: MaskParams,
    pub threads: usize,
    pub out_dir: PathBuf,
    pub inputs: Option<SubjectDerivativeSet>,
    pub bold: Option<BoldImage>,
    pub confound_table: Option<ConfoundTable>,
    pub confounds: Option<ConfoundSelection>,
    pub mask_source: Option<MaskSource>,
    pub conditioned: Option<ConditionedScan>,
    pub roi: Option<RoiOutcome>,
    pub connectivity: Option<ConnectivityMatrix>,
    pub artifacts: Option<ArtifactReport>,
    pub warnings: Vec<String>,
}

impl AnalysisCtx {
    pub fn new(
        derivatives_dir: PathBuf,
        subject_id: impl Into<String>,
        session_id: impl Into<String>,
        out_dir: PathBuf,
    ) -> Self {
        Self {
            derivatives_dir,
            subject_id: subject_id.into(),
            session_id: session_id.into(),
            atlas: "aal".to_string(),
            atlas_dir: PathBuf::from("atlases"),
            kind: ConnectivityKind::Correlation,
            confound_names: config::default_confounds(),
            filter: FilterParams::default(),
            mask_params: MaskParams::default(),
            threads: 0,
            out_dir,
            inputs: None,
            bold: None,
            confound_table: None,
            confounds: None,
            mask_source: None,
            conditioned: None,
            roi: None,
            connectivity: None,
            artifacts: None,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QcOutputPaths {
    pub out_dir: PathBuf,
    pub bold_summary: PathBuf,
    pub t1w_summary: PathBuf,
    pub exclusions: PathBuf,
}

impl QcOutputPaths {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            bold_summary: out_dir.join(BOLD_SUMMARY_FILE),
            t1w_summary: out_dir.join(T1W_SUMMARY_FILE),
            exclusions: out_dir.join(EXCLUSIONS_FILE),
            out_dir,
        }
    }
}

/// State for one run of the QC pipeline over a derivatives tree.
#[derive(Debug)]
pub struct QcCtx {
    pub derivatives_dir: PathBuf,
    pub mriqc_dir: PathBuf,
    pub output: QcOutputPaths,
    pub summary_thresholds: SummaryThresholds,
    pub exclusion_thresholds: ExclusionThresholds,
    pub bold: Option<QcTable<BoldMetrics>>,
    pub t1w: Option<QcTable<T1wMetrics>>,
    pub bold_summary: Option<ModalitySummary>,
    pub t1w_summary: Option<ModalitySummary>,
    /// `None` until evaluated; stays `None` when no metrics were found at all.
    pub exclusions: Option<Vec<ExclusionEntry>>,
    pub written: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl QcCtx {
    pub fn new(derivatives_dir: PathBuf, out_dir: PathBuf) -> Self {
        Self {
            mriqc_dir: derivatives_dir.join("mriqc"),
            derivatives_dir,
            output: QcOutputPaths::new(out_dir),
            summary_thresholds: SummaryThresholds::default(),
            exclusion_thresholds: ExclusionThresholds::default(),
            bold: None,
            t1w: None,
            bold_summary: None,
            t1w_summary: None,
            exclusions: None,
            written: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_metrics(&self) -> bool {
        self.bold.is_some() || self.t1w.is_some()
    }
}
