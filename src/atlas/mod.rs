//! Atlas-based reduction of voxel signals to one time series per region.
//!
//! Atlases are read from `<atlas_dir>/<name>/atlas.nii[.gz]` with a sibling
//! `labels.txt`. Every failure in here is reported as an outcome value so the
//! caller can skip downstream steps without aborting.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ndarray::{Array2, Array3};
use tracing::{info, warn};

use crate::error::NeuroQcError;
use crate::io::nifti::read_label_volume;
use crate::math::affine::{Affine, resample_nearest};
use crate::signal::{AFFINE_TOLERANCE, ConditionedScan};
use crate::signal::clean::zscore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasKind {
    Aal,
    HarvardOxford,
}

impl AtlasKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "aal" => Some(Self::Aal),
            "harvard_oxford" | "harvard-oxford" => Some(Self::HarvardOxford),
            _ => None,
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Aal => "aal",
            Self::HarvardOxford => "harvard_oxford",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Atlas {
    pub kind: AtlasKind,
    /// Label values in region order (ascending).
    pub values: Vec<i32>,
    pub labels: Vec<String>,
    pub grid: Array3<i32>,
    pub affine: Affine,
}

/// Time x region signals with labels in column order.
#[derive(Debug, Clone)]
pub struct RoiTimeSeries {
    data: Array2<f64>,
    labels: Vec<String>,
}

impl RoiTimeSeries {
    pub fn new(data: Array2<f64>, labels: Vec<String>) -> Result<Self> {
        if data.ncols() != labels.len() {
            bail!(
                "{} region columns but {} labels",
                data.ncols(),
                labels.len()
            );
        }
        Ok(Self { data, labels })
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn n_regions(&self) -> usize {
        self.labels.len()
    }

    pub fn n_timepoints(&self) -> usize {
        self.data.nrows()
    }
}

#[derive(Debug, Clone)]
pub enum RoiOutcome {
    Extracted(RoiTimeSeries),
    Unsupported { atlas: String },
    Failed { atlas: String, reason: String },
}

impl RoiOutcome {
    pub fn timeseries(&self) -> Option<&RoiTimeSeries> {
        match self {
            Self::Extracted(ts) => Some(ts),
            _ => None,
        }
    }
}

/// Resolves `atlas_name`, loads it and reduces the scan. Never errors.
pub fn extract_roi_timeseries(
    scan: &ConditionedScan,
    atlas_name: &str,
    atlas_dir: &Path,
) -> (RoiOutcome, Vec<String>) {
    let Some(kind) = AtlasKind::parse(atlas_name) else {
        let err = NeuroQcError::UnsupportedOption {
            option: "atlas",
            value: atlas_name.to_string(),
        };
        warn!(atlas = atlas_name, "atlas not implemented");
        return (
            RoiOutcome::Unsupported {
                atlas: atlas_name.to_string(),
            },
            vec![err.to_string()],
        );
    };

    let result = load_atlas(kind, atlas_dir).and_then(|atlas| reduce(scan, &atlas));
    match result {
        Ok((ts, warnings)) => {
            info!(
                atlas = kind.dir_name(),
                regions = ts.n_regions(),
                timepoints = ts.n_timepoints(),
                "roi_timeseries_extracted"
            );
            (RoiOutcome::Extracted(ts), warnings)
        }
        Err(err) => {
            let reason = format!("{:#}", err);
            warn!(atlas = kind.dir_name(), error = %reason, "roi extraction failed");
            (
                RoiOutcome::Failed {
                    atlas: atlas_name.to_string(),
                    reason: reason.clone(),
                },
                vec![format!("error extracting ROI time series: {}", reason)],
            )
        }
    }
}

pub fn atlas_paths(kind: AtlasKind, atlas_dir: &Path) -> (Vec<PathBuf>, PathBuf) {
    let dir = atlas_dir.join(kind.dir_name());
    (
        vec![dir.join("atlas.nii.gz"), dir.join("atlas.nii")],
        dir.join("labels.txt"),
    )
}

pub fn load_atlas(kind: AtlasKind, atlas_dir: &Path) -> Result<Atlas> {
    let (images, labels_path) = atlas_paths(kind, atlas_dir);
    let image = images
        .iter()
        .find(|p| p.is_file())
        .ok_or_else(|| {
            NeuroQcError::upstream(
                "atlas fetch",
                format!("no atlas image under {}", atlas_dir.join(kind.dir_name()).display()),
            )
        })?;
    let content = std::fs::read_to_string(&labels_path)
        .with_context(|| format!("failed to read atlas labels {}", labels_path.display()))?;
    let (values, labels) = parse_labels(&content, &labels_path.display().to_string())?;
    let volume = read_label_volume(image)?;
    Ok(Atlas {
        kind,
        values,
        labels,
        grid: volume.data,
        affine: volume.affine,
    })
}

/// Either `value<TAB>name` per line or bare names (value = line number).
/// Regions come back sorted by value.
pub fn parse_labels(content: &str, source: &str) -> Result<(Vec<i32>, Vec<String>)> {
    let mut pairs: Vec<(i32, String)> = Vec::new();
    let mut implicit = 0i32;
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let pair = match trimmed.split_once('\t') {
            Some((value, name)) => {
                let value: i32 = value
                    .trim()
                    .parse()
                    .with_context(|| format!("{}:{} invalid label value", source, idx + 1))?;
                (value, name.trim().to_string())
            }
            None => {
                implicit += 1;
                (implicit, trimmed.to_string())
            }
        };
        if pair.0 == 0 {
            continue;
        }
        if pairs.iter().any(|(v, _)| *v == pair.0) {
            bail!("{}:{} duplicate label value {}", source, idx + 1, pair.0);
        }
        pairs.push(pair);
    }
    if pairs.is_empty() {
        bail!("{}: no region labels", source);
    }
    pairs.sort_by_key(|(v, _)| *v);
    Ok(pairs.into_iter().unzip())
}

/// Mean in-mask signal per region, z-scored. Regions without voxels stay zero.
/// An atlas on another grid is resampled by nearest neighbour onto the scan;
/// it is an error only when no labelled atlas voxel lands inside the mask.
pub fn reduce(scan: &ConditionedScan, atlas: &Atlas) -> Result<(RoiTimeSeries, Vec<String>)> {
    let grid = if atlas.grid.shape() == scan.shape.as_slice()
        && atlas.affine.approx_eq(&scan.affine, AFFINE_TOLERANCE)
    {
        Cow::Borrowed(&atlas.grid)
    } else {
        info!(
            atlas = atlas.kind.dir_name(),
            atlas_shape = ?atlas.grid.shape(),
            scan_shape = ?scan.shape,
            "resampling atlas onto scan grid"
        );
        Cow::Owned(resample_nearest(
            &atlas.grid,
            &atlas.affine,
            scan.shape,
            &scan.affine,
            0,
        )?)
    };

    let n_t = scan.n_volumes();
    let n_r = atlas.values.len();
    let mut sums = Array2::<f64>::zeros((n_t, n_r));
    let mut counts = vec![0usize; n_r];

    for (row, &[i, j, k]) in scan.voxels.iter().enumerate() {
        let value = grid[[i, j, k]];
        if value == 0 {
            continue;
        }
        let Ok(region) = atlas.values.binary_search(&value) else {
            continue;
        };
        counts[region] += 1;
        let signal = scan.signals.row(row);
        let mut col = sums.column_mut(region);
        col += &signal;
    }

    if counts.iter().all(|&c| c == 0) {
        bail!(NeuroQcError::upstream(
            "roi reduction",
            format!(
                "{} atlas does not overlap the scan (atlas grid {:?}, scan grid {:?})",
                atlas.kind.dir_name(),
                atlas.grid.shape(),
                scan.shape
            )
        ));
    }

    info!(
        atlas = atlas.kind.dir_name(),
        regions = n_r,
        covered = counts.iter().filter(|&&c| c > 0).count(),
        tr_s = scan.tr,
        "roi_reduced"
    );

    let mut warnings = Vec::new();
    for (region, mut col) in sums.columns_mut().into_iter().enumerate() {
        if counts[region] == 0 {
            warnings.push(format!(
                "region '{}' has no voxels inside the mask",
                atlas.labels[region]
            ));
            continue;
        }
        col /= counts[region] as f64;
        let mut buf = col.to_vec();
        zscore(&mut buf);
        for (dst, src) in col.iter_mut().zip(buf) {
            *dst = src;
        }
    }

    Ok((RoiTimeSeries::new(sums, atlas.labels.clone())?, warnings))
}
