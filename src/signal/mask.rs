//! Brain mask derived from the mean EPI image.
//!
//! The threshold sits at the largest intensity gap between the lower and upper
//! cutoff quantiles of the sorted mean image. The thresholded mask is eroded
//! `opening` times, reduced to its largest 6-connected component, dilated
//! `2 * opening` times and eroded `opening` times again.

use std::collections::VecDeque;

use anyhow::{Result, bail};
use ndarray::{Array3, Array4, Axis};

use crate::config::MaskParams;
use crate::error::NeuroQcError;

pub fn derive_epi_mask(data: &Array4<f32>, params: &MaskParams) -> Result<Array3<bool>> {
    let mean = data
        .mean_axis(Axis(3))
        .ok_or_else(|| NeuroQcError::upstream("mask derivation", "BOLD has no volumes"))?;

    let mut sorted: Vec<f32> = mean.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.len() < 2 {
        bail!(NeuroQcError::upstream(
            "mask derivation",
            "fewer than two finite voxels"
        ));
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let threshold = gap_threshold(&sorted, params.lower_cutoff, params.upper_cutoff);
    let mut mask = mean.mapv(|v| v.is_finite() && v >= threshold);
    if params.opening > 0 {
        mask = erode(&mask, params.opening);
    }
    if params.largest_component && mask.iter().any(|&v| v) {
        mask = largest_component(&mask);
    }
    if params.opening > 0 {
        mask = dilate(&mask, 2 * params.opening);
        mask = erode(&mask, params.opening);
    }
    if !mask.iter().any(|&v| v) {
        bail!(NeuroQcError::upstream("mask derivation", "derived mask is empty"));
    }
    Ok(mask)
}

/// Midpoint of the widest gap between consecutive sorted values inside the
/// `[lower, upper]` quantile band.
pub fn gap_threshold(sorted: &[f32], lower: f64, upper: f64) -> f32 {
    let n = sorted.len();
    let lo = ((lower * n as f64).floor() as usize).min(n - 2);
    let hi = ((upper * n as f64).floor() as usize).clamp(lo + 1, n - 1);

    let mut best = lo;
    let mut best_delta = f32::NEG_INFINITY;
    for i in lo..hi {
        let delta = sorted[i + 1] - sorted[i];
        if delta > best_delta {
            best_delta = delta;
            best = i;
        }
    }
    0.5 * (sorted[best] + sorted[best + 1])
}

/// Binary erosion with the 6-neighbourhood; voxels outside the volume count
/// as background.
pub fn erode(mask: &Array3<bool>, iterations: usize) -> Array3<bool> {
    let mut current = mask.clone();
    for _ in 0..iterations {
        let prev = current.clone();
        for ((i, j, k), v) in current.indexed_iter_mut() {
            if *v {
                *v = NEIGHBOURS
                    .iter()
                    .all(|&d| neighbour(&prev, (i, j, k), d).unwrap_or(false));
            }
        }
    }
    current
}

/// Binary dilation with the 6-neighbourhood.
pub fn dilate(mask: &Array3<bool>, iterations: usize) -> Array3<bool> {
    let mut current = mask.clone();
    for _ in 0..iterations {
        let prev = current.clone();
        for ((i, j, k), v) in current.indexed_iter_mut() {
            if !*v {
                *v = NEIGHBOURS
                    .iter()
                    .any(|&d| neighbour(&prev, (i, j, k), d).unwrap_or(false));
            }
        }
    }
    current
}

fn neighbour(
    mask: &Array3<bool>,
    (x, y, z): (usize, usize, usize),
    (dx, dy, dz): (isize, isize, isize),
) -> Option<bool> {
    let a = x.checked_add_signed(dx)?;
    let b = y.checked_add_signed(dy)?;
    let c = z.checked_add_signed(dz)?;
    mask.get([a, b, c]).copied()
}

pub fn largest_component(mask: &Array3<bool>) -> Array3<bool> {
    let (nx, ny, nz) = mask.dim();
    let mut labels = Array3::<u32>::zeros((nx, ny, nz));
    let mut best_label = 0u32;
    let mut best_size = 0usize;
    let mut next = 0u32;
    let mut queue = VecDeque::new();

    for ((i, j, k), &inside) in mask.indexed_iter() {
        if !inside || labels[[i, j, k]] != 0 {
            continue;
        }
        next += 1;
        labels[[i, j, k]] = next;
        queue.push_back((i, j, k));
        let mut size = 0usize;
        while let Some((x, y, z)) = queue.pop_front() {
            size += 1;
            for (dx, dy, dz) in NEIGHBOURS {
                let (Some(a), Some(b), Some(c)) = (
                    x.checked_add_signed(dx),
                    y.checked_add_signed(dy),
                    z.checked_add_signed(dz),
                ) else {
                    continue;
                };
                if a < nx && b < ny && c < nz && mask[[a, b, c]] && labels[[a, b, c]] == 0 {
                    labels[[a, b, c]] = next;
                    queue.push_back((a, b, c));
                }
            }
        }
        if size > best_size {
            best_size = size;
            best_label = next;
        }
    }

    labels.mapv(|l| l != 0 && l == best_label)
}

const NEIGHBOURS: [(isize, isize, isize); 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];
