//! NIfTI-1 volume loading (.nii and .nii.gz).

use std::path::Path;

use anyhow::{Context, Result, bail};
use ndarray::{Array3, Array4, ArrayD, Axis, Ix3, Ix4};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use tracing::info;

use crate::error::NeuroQcError;
use crate::math::affine::Affine;
use crate::signal::BoldImage;

const UNITS_TIME_MASK: u8 = 0x38;
const UNITS_MSEC: u8 = 16;
const UNITS_USEC: u8 = 24;

/// Loads a 4D BOLD series. The repetition time comes from `pixdim[4]`; a
/// header without one is rejected rather than defaulted.
pub fn read_bold(path: &Path) -> Result<BoldImage> {
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("failed to read NIfTI {}", path.display()))?;
    let header = obj.header().clone();
    let data = obj
        .into_volume()
        .into_ndarray::<f32>()
        .with_context(|| format!("failed to decode volume {}", path.display()))?;

    if data.ndim() != 4 {
        bail!(
            "{} is {}D; a 4D BOLD series is required",
            path.display(),
            data.ndim()
        );
    }
    let data: Array4<f32> = data
        .into_dimensionality::<Ix4>()
        .context("BOLD volume reshape failed")?;

    let tr = match header.xyzt_units & UNITS_TIME_MASK {
        UNITS_MSEC => header.pixdim[4] as f64 / 1_000.0,
        UNITS_USEC => header.pixdim[4] as f64 / 1_000_000.0,
        _ => header.pixdim[4] as f64,
    };
    if !tr.is_finite() || tr <= 0.0 {
        bail!(NeuroQcError::upstream(
            "repetition time",
            format!(
                "{} has no usable value in its header (pixdim[4]={})",
                path.display(),
                header.pixdim[4]
            )
        ));
    }

    let affine = Affine::from_header(&header);
    let shape = data.shape().to_vec();
    info!(
        path = %path.display(),
        shape = ?shape,
        tr_s = tr,
        "bold_loaded"
    );

    Ok(BoldImage {
        path: path.to_path_buf(),
        data,
        tr,
        affine,
    })
}

/// A 3D volume together with its voxel-to-world transform.
#[derive(Debug, Clone)]
pub struct Volume<T> {
    pub data: Array3<T>,
    pub affine: Affine,
}

/// Loads a binary mask; any non-zero voxel is inside.
pub fn read_mask(path: &Path) -> Result<Volume<bool>> {
    let vol = read_volume_3d(path)?;
    Ok(Volume {
        data: vol.data.mapv(|v| v != 0.0 && !v.is_nan()),
        affine: vol.affine,
    })
}

/// Loads an integer label volume (atlas parcellation).
pub fn read_label_volume(path: &Path) -> Result<Volume<i32>> {
    let vol = read_volume_3d(path)?;
    Ok(Volume {
        data: vol
            .data
            .mapv(|v| if v.is_finite() { v.round() as i32 } else { 0 }),
        affine: vol.affine,
    })
}

fn read_volume_3d(path: &Path) -> Result<Volume<f32>> {
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("failed to read NIfTI {}", path.display()))?;
    let affine = Affine::from_header(obj.header());
    let data = obj
        .into_volume()
        .into_ndarray::<f32>()
        .with_context(|| format!("failed to decode volume {}", path.display()))?;
    let data = into_3d(data).with_context(|| format!("{} is not a 3D volume", path.display()))?;
    Ok(Volume { data, affine })
}

fn into_3d(data: ArrayD<f32>) -> Result<Array3<f32>> {
    match data.ndim() {
        3 => Ok(data.into_dimensionality::<Ix3>()?),
        4 if data.shape()[3] == 1 => Ok(data
            .index_axis_move(Axis(3), 0)
            .into_dimensionality::<Ix3>()?),
        n => bail!("expected 3 dimensions, found {}", n),
    }
}
