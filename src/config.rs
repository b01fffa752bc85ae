//! Named configuration values.
//!
//! Nothing here is read as ambient state: each component receives the struct it
//! needs, so callers (and tests) can override any value per run.

/// Nuisance regressors used when the caller does not supply a list:
/// six motion parameters, framewise displacement, CSF, white matter, global signal.
pub const DEFAULT_CONFOUNDS: [&str; 10] = [
    "trans_x",
    "trans_y",
    "trans_z",
    "rot_x",
    "rot_y",
    "rot_z",
    "framewise_displacement",
    "csf",
    "white_matter",
    "global_signal",
];

pub const BOLD_SUMMARY_FILE: &str = "bold_qc_summary.csv";
pub const T1W_SUMMARY_FILE: &str = "t1w_qc_summary.csv";
pub const EXCLUSIONS_FILE: &str = "suggested_exclusions.csv";

pub fn default_confounds() -> Vec<String> {
    DEFAULT_CONFOUNDS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterParams {
    pub low_pass_hz: f64,
    pub high_pass_hz: f64,
    pub detrend: bool,
    pub standardize: bool,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            low_pass_hz: 0.1,
            high_pass_hz: 0.01,
            detrend: true,
            standardize: true,
        }
    }
}

/// Histogram cutoffs for the EPI mask fallback, as fractions of sorted voxels.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskParams {
    pub lower_cutoff: f64,
    pub upper_cutoff: f64,
    pub largest_component: bool,
    /// Erosion/dilation passes around the component step; 0 disables.
    pub opening: usize,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            lower_cutoff: 0.2,
            upper_cutoff: 0.85,
            largest_component: true,
            opening: 2,
        }
    }
}

/// Thresholds for the warning lists printed by the QC summarizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryThresholds {
    pub bold_fd_mean_above: f64,
    pub bold_tsnr_below: f64,
    pub t1w_snr_below: f64,
    pub t1w_efc_above: f64,
}

impl Default for SummaryThresholds {
    fn default() -> Self {
        Self {
            bold_fd_mean_above: 0.5,
            bold_tsnr_below: 50.0,
            t1w_snr_below: 10.0,
            t1w_efc_above: 0.5,
        }
    }
}

/// Thresholds for the exclusion engine. Motion bands: `(moderate, high]` is
/// moderate, `> high` is high.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionThresholds {
    pub fd_high_above: f64,
    pub fd_moderate_above: f64,
    pub tsnr_below: f64,
    pub t1w_snr_below: f64,
}

impl Default for ExclusionThresholds {
    fn default() -> Self {
        Self {
            fd_high_above: 0.9,
            fd_moderate_above: 0.5,
            tsnr_below: 40.0,
            t1w_snr_below: 8.0,
        }
    }
}
