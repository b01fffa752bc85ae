//! Derivative file discovery by BIDS naming convention.
//!
//! When several files match a pattern the lexicographically first path wins;
//! this is deliberate and never reported as ambiguity.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, warn};

use crate::error::NeuroQcError;
use crate::qc::Modality;

pub const BOLD_PATTERN: &str = "*_space-MNI*_desc-preproc_bold.nii*";
pub const CONFOUNDS_PATTERN: &str = "*_desc-confounds_timeseries.tsv*";
pub const MASK_PATTERN: &str = "*_space-MNI*_desc-brain_mask.nii*";

#[derive(Debug, Clone)]
pub struct SubjectDerivativeSet {
    pub subject_id: String,
    pub session_id: String,
    pub func_dir: PathBuf,
    pub bold: PathBuf,
    pub confounds: PathBuf,
    pub mask: Option<PathBuf>,
}

pub fn func_dir(derivatives_dir: &Path, subject_id: &str, session_id: &str) -> PathBuf {
    derivatives_dir.join(subject_id).join(session_id).join("func")
}

pub fn locate_subject(
    derivatives_dir: &Path,
    subject_id: &str,
    session_id: &str,
) -> Result<SubjectDerivativeSet, NeuroQcError> {
    let dir = func_dir(derivatives_dir, subject_id, session_id);

    let bold = first_match(&dir, BOLD_PATTERN)?.ok_or_else(|| NeuroQcError::MissingInput {
        role: "preprocessed BOLD file",
        searched: dir.clone(),
    })?;
    let confounds =
        first_match(&dir, CONFOUNDS_PATTERN)?.ok_or_else(|| NeuroQcError::MissingInput {
            role: "confounds file",
            searched: dir.clone(),
        })?;
    let mask = first_match(&dir, MASK_PATTERN)?;

    Ok(SubjectDerivativeSet {
        subject_id: subject_id.to_string(),
        session_id: session_id.to_string(),
        func_dir: dir,
        bold,
        confounds,
        mask,
    })
}

/// Sorted matches of `pattern` directly inside `dir`.
pub fn matching_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, NeuroQcError> {
    let full = format!("{}/{}", escaped(dir)?, pattern);
    collect_sorted(&full)
}

fn first_match(dir: &Path, pattern: &str) -> Result<Option<PathBuf>, NeuroQcError> {
    let matches = matching_files(dir, pattern)?;
    if matches.len() > 1 {
        debug!(
            dir = %dir.display(),
            pattern,
            candidates = matches.len(),
            "multiple candidates; taking first"
        );
    }
    Ok(matches.into_iter().next())
}

/// MRIQC metric files for one modality under `<mriqc_dir>/sub-*/**/<kind>/`.
pub fn discover_qc_files(mriqc_dir: &Path, modality: Modality) -> Result<Vec<PathBuf>> {
    let full = format!("{}/{}", escaped(mriqc_dir)?, modality.file_pattern());
    Ok(collect_sorted(&full)?)
}

fn escaped(dir: &Path) -> Result<String, NeuroQcError> {
    let s = dir
        .to_str()
        .ok_or_else(|| NeuroQcError::upstream("path encoding", dir.display()))?;
    Ok(glob::Pattern::escape(s))
}

fn collect_sorted(pattern: &str) -> Result<Vec<PathBuf>, NeuroQcError> {
    let entries = glob::glob(pattern).map_err(|e| NeuroQcError::upstream("glob", e))?;
    let mut out = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => out.push(path),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "unreadable path skipped during discovery"),
        }
    }
    out.sort();
    Ok(out)
}
