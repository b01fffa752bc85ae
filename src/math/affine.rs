//! Voxel-to-world transforms and nearest-neighbour resampling between grids.

use anyhow::{Result, bail};
use ndarray::Array3;
use nifti::NiftiHeader;

use crate::error::NeuroQcError;

/// Row-major 4x4 voxel-to-world matrix; the last row is always `0 0 0 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine(pub [[f64; 4]; 4]);

impl Affine {
    pub fn identity() -> Self {
        Self::scaled([1.0, 1.0, 1.0], [0.0, 0.0, 0.0])
    }

    /// Axis-aligned grid with the given voxel size and world origin of voxel 0.
    pub fn scaled(voxel: [f64; 3], origin: [f64; 3]) -> Self {
        Self([
            [voxel[0], 0.0, 0.0, origin[0]],
            [0.0, voxel[1], 0.0, origin[1]],
            [0.0, 0.0, voxel[2], origin[2]],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// sform when set, then qform, then a pixdim diagonal.
    pub fn from_header(header: &NiftiHeader) -> Self {
        if header.sform_code > 0 {
            let rows = [header.srow_x, header.srow_y, header.srow_z];
            let mut m = [[0.0; 4]; 4];
            for (dst, src) in m.iter_mut().zip(rows) {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = s as f64;
                }
            }
            m[3][3] = 1.0;
            return Self(m);
        }

        let voxel = [
            pixdim_or_one(header.pixdim[1]),
            pixdim_or_one(header.pixdim[2]),
            pixdim_or_one(header.pixdim[3]),
        ];
        if header.qform_code > 0 {
            return Self::from_quaternion(
                [header.quatern_b, header.quatern_c, header.quatern_d].map(f64::from),
                [header.quatern_x, header.quatern_y, header.quatern_z].map(f64::from),
                voxel,
                if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 },
            );
        }
        Self::scaled(voxel, [0.0, 0.0, 0.0])
    }

    fn from_quaternion(bcd: [f64; 3], offset: [f64; 3], voxel: [f64; 3], qfac: f64) -> Self {
        let [b, c, d] = bcd;
        let a = (1.0 - b * b - c * c - d * d).max(0.0).sqrt();
        let r = [
            [a * a + b * b - c * c - d * d, 2.0 * (b * c - a * d), 2.0 * (b * d + a * c)],
            [2.0 * (b * c + a * d), a * a + c * c - b * b - d * d, 2.0 * (c * d - a * b)],
            [2.0 * (b * d - a * c), 2.0 * (c * d + a * b), a * a + d * d - b * b - c * c],
        ];
        let scale = [voxel[0], voxel[1], voxel[2] * qfac];
        let mut m = [[0.0; 4]; 4];
        for row in 0..3 {
            for col in 0..3 {
                m[row][col] = r[row][col] * scale[col];
            }
            m[row][3] = offset[row];
        }
        m[3][3] = 1.0;
        Self(m)
    }

    pub fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        let m = &self.0;
        std::array::from_fn(|r| m[r][0] * p[0] + m[r][1] * p[1] + m[r][2] * p[2] + m[r][3])
    }

    /// `self * other`: apply `other` first.
    pub fn then_from(&self, other: &Affine) -> Self {
        let (a, b) = (&self.0, &other.0);
        Self(std::array::from_fn(|r| {
            std::array::from_fn(|c| (0..4).map(|k| a[r][k] * b[k][c]).sum())
        }))
    }

    /// Inverse via the 3x3 linear block; `None` when it is singular.
    pub fn inverse(&self) -> Option<Self> {
        let m = &self.0;
        let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
        if !det.is_finite() || det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;
        let mut lin = [[0.0; 3]; 3];
        lin[0][0] = (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det;
        lin[0][1] = (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det;
        lin[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det;
        lin[1][0] = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det;
        lin[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det;
        lin[1][2] = (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det;
        lin[2][0] = (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det;
        lin[2][1] = (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det;
        lin[2][2] = (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det;

        let mut out = [[0.0; 4]; 4];
        for r in 0..3 {
            out[r][..3].copy_from_slice(&lin[r]);
            out[r][3] = -(0..3).map(|k| lin[r][k] * m[k][3]).sum::<f64>();
        }
        out[3][3] = 1.0;
        Some(Self(out))
    }

    pub fn approx_eq(&self, other: &Affine, tol: f64) -> bool {
        self.0
            .iter()
            .flatten()
            .zip(other.0.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= tol)
    }
}

fn pixdim_or_one(v: f32) -> f64 {
    if v.is_finite() && v > 0.0 { v as f64 } else { 1.0 }
}

/// Samples `src` at the world position of every voxel of the target grid,
/// rounding to the nearest source voxel. Positions outside `src` get `fill`.
pub fn resample_nearest<T: Copy>(
    src: &Array3<T>,
    src_affine: &Affine,
    target_shape: [usize; 3],
    target_affine: &Affine,
    fill: T,
) -> Result<Array3<T>> {
    let Some(world_to_src) = src_affine.inverse() else {
        bail!(NeuroQcError::upstream(
            "resampling",
            "source affine is singular"
        ));
    };
    let target_to_src = world_to_src.then_from(target_affine);
    let (nx, ny, nz) = src.dim();
    let bounds = [nx, ny, nz];

    Ok(Array3::from_shape_fn(
        (target_shape[0], target_shape[1], target_shape[2]),
        |(i, j, k)| {
            let p = target_to_src.apply([i as f64, j as f64, k as f64]);
            let mut idx = [0usize; 3];
            for axis in 0..3 {
                let v = p[axis].round();
                if !(v >= 0.0 && v < bounds[axis] as f64) {
                    return fill;
                }
                idx[axis] = v as usize;
            }
            src[idx]
        },
    ))
}
