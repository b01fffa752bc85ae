//! BOLD signal conditioning: mask resolution, then per-voxel cleaning.

pub mod clean;
pub mod mask;

use std::path::PathBuf;

use anyhow::{Result, bail};
use ndarray::{Array2, Array3, Array4};
use tracing::{info, warn};

use crate::config::{FilterParams, MaskParams};
use crate::confounds::ConfoundSelection;
use crate::error::NeuroQcError;
use crate::io::nifti::Volume;
use crate::math::affine::{Affine, resample_nearest};
use crate::signal::clean::Cleaner;

/// Affines closer than this (mm, or unitless for the linear block) are one grid.
pub const AFFINE_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone)]
pub struct BoldImage {
    pub path: PathBuf,
    /// x, y, z, time
    pub data: Array4<f32>,
    /// Repetition time in seconds, from the image header.
    pub tr: f64,
    pub affine: Affine,
}

impl BoldImage {
    pub fn spatial_shape(&self) -> [usize; 3] {
        let s = self.data.shape();
        [s[0], s[1], s[2]]
    }

    pub fn n_volumes(&self) -> usize {
        self.data.shape()[3]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaskSource {
    Provided(PathBuf),
    Derived,
}

/// Cleaned in-mask voxel signals. `signals` is voxel x time; row `i` belongs
/// to `voxels[i]`.
#[derive(Debug, Clone)]
pub struct ConditionedScan {
    pub shape: [usize; 3],
    pub affine: Affine,
    pub tr: f64,
    pub voxels: Vec<[usize; 3]>,
    pub signals: Array2<f64>,
}

impl ConditionedScan {
    pub fn n_volumes(&self) -> usize {
        self.signals.ncols()
    }

    pub fn n_voxels(&self) -> usize {
        self.voxels.len()
    }
}

/// Uses the provided mask, resampled by nearest neighbour onto the scan's grid
/// when its shape or affine differs. A mask that misses the scan entirely, or
/// no mask at all, falls back to one derived from the mean EPI image.
pub fn resolve_mask(
    bold: &BoldImage,
    provided: Option<(PathBuf, Volume<bool>)>,
    params: &MaskParams,
) -> Result<(Array3<bool>, MaskSource, Vec<String>)> {
    let mut warnings = Vec::new();
    let shape = bold.spatial_shape();

    if let Some((path, mask)) = provided {
        if mask.data.shape() == shape.as_slice()
            && mask.affine.approx_eq(&bold.affine, AFFINE_TOLERANCE)
        {
            return Ok((mask.data, MaskSource::Provided(path), warnings));
        }
        let resampled = resample_nearest(&mask.data, &mask.affine, shape, &bold.affine, false)?;
        let inside = resampled.iter().filter(|&&v| v).count();
        if inside > 0 {
            info!(
                mask = %path.display(),
                mask_shape = ?mask.data.shape(),
                bold_shape = ?shape,
                voxels = inside,
                "mask_resampled"
            );
            return Ok((resampled, MaskSource::Provided(path), warnings));
        }
        warn!(
            mask = %path.display(),
            mask_shape = ?mask.data.shape(),
            bold_shape = ?shape,
            "mask does not overlap BOLD; deriving mask instead"
        );
        warnings.push(format!(
            "mask {} does not overlap the BOLD field of view; derived a mask from the data",
            path.display()
        ));
    }

    let mask = mask::derive_epi_mask(&bold.data, params)?;
    info!(voxels = mask.iter().filter(|&&v| v).count(), "mask_derived");
    Ok((mask, MaskSource::Derived, warnings))
}

/// Detrend, confound regression, band-pass and z-scoring, in that order, with
/// the band edges applied against the scan's own repetition time.
pub fn condition(
    bold: &BoldImage,
    mask: &Array3<bool>,
    confounds: &ConfoundSelection,
    params: &FilterParams,
    threads: usize,
) -> Result<(ConditionedScan, Vec<String>)> {
    let shape = bold.spatial_shape();
    let n_t = bold.n_volumes();
    if mask.shape() != shape.as_slice() {
        bail!(NeuroQcError::upstream(
            "signal cleaning",
            format!("mask shape {:?} != BOLD shape {:?}", mask.shape(), shape)
        ));
    }
    if let Some(m) = confounds.matrix() {
        if m.nrows() != n_t {
            bail!(NeuroQcError::upstream(
                "signal cleaning",
                format!("confounds have {} rows, BOLD has {} volumes", m.nrows(), n_t)
            ));
        }
    }

    let mut voxels = Vec::new();
    for k in 0..shape[2] {
        for j in 0..shape[1] {
            for i in 0..shape[0] {
                if mask[[i, j, k]] {
                    voxels.push([i, j, k]);
                }
            }
        }
    }
    if voxels.is_empty() {
        bail!(NeuroQcError::upstream("signal cleaning", "mask is empty"));
    }

    let mut signals = Array2::<f64>::zeros((voxels.len(), n_t));
    for (row, &[i, j, k]) in voxels.iter().enumerate() {
        for t in 0..n_t {
            signals[[row, t]] = bold.data[[i, j, k, t]] as f64;
        }
    }

    let (cleaner, warnings) = Cleaner::new(n_t, bold.tr, confounds.matrix(), params)?;
    cleaner.clean_all(&mut signals, threads)?;
    info!(
        voxels = voxels.len(),
        volumes = n_t,
        confounds = confounds.names().len(),
        low_pass_hz = params.low_pass_hz,
        high_pass_hz = params.high_pass_hz,
        tr_s = bold.tr,
        "signal_cleaned"
    );

    Ok((
        ConditionedScan {
            shape,
            affine: bold.affine,
            tr: bold.tr,
            voxels,
            signals,
        },
        warnings,
    ))
}
