//! Per-subject analysis artifacts.
//!
//! Each artifact is written independently: a failure is recorded and the
//! remaining writes still run, so earlier files stay on disk.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::atlas::RoiTimeSeries;
use crate::connectivity::ConnectivityMatrix;

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub timeseries: PathBuf,
    pub connectivity: PathBuf,
    pub labels: PathBuf,
    pub connectivity_csv: PathBuf,
}

impl ArtifactPaths {
    pub fn for_subject(out_dir: &Path, subject_id: &str) -> Self {
        Self {
            timeseries: out_dir.join(format!("{}_timeseries.npy", subject_id)),
            connectivity: out_dir.join(format!("{}_connectivity.npy", subject_id)),
            labels: out_dir.join(format!("{}_labels.txt", subject_id)),
            connectivity_csv: out_dir.join(format!("{}_connectivity.csv", subject_id)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactFailure {
    pub artifact: &'static str,
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactReport {
    pub written: Vec<(&'static str, PathBuf)>,
    pub failures: Vec<ArtifactFailure>,
}

impl ArtifactReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, artifact: &'static str, path: &Path, result: Result<()>) {
        match result {
            Ok(()) => {
                info!(artifact, path = %path.display(), "artifact_written");
                self.written.push((artifact, path.to_path_buf()));
            }
            Err(err) => {
                let reason = format!("{:#}", err);
                warn!(artifact, path = %path.display(), error = %reason, "artifact write failed");
                self.failures.push(ArtifactFailure {
                    artifact,
                    path: path.to_path_buf(),
                    reason,
                });
            }
        }
    }
}

pub fn write_artifacts(
    out_dir: &Path,
    subject_id: &str,
    timeseries: &RoiTimeSeries,
    connectivity: &ConnectivityMatrix,
) -> ArtifactReport {
    let paths = ArtifactPaths::for_subject(out_dir, subject_id);
    let mut report = ArtifactReport::default();

    if let Err(err) = fs::create_dir_all(out_dir) {
        warn!(out_dir = %out_dir.display(), error = %err, "output directory not created");
    }

    report.record(
        "time series",
        &paths.timeseries,
        write_npy(&paths.timeseries, timeseries.data()),
    );
    report.record(
        "connectivity",
        &paths.connectivity,
        write_npy(&paths.connectivity, &connectivity.values),
    );
    report.record(
        "labels",
        &paths.labels,
        write_labels(&paths.labels, timeseries.labels()),
    );
    report.record(
        "connectivity CSV",
        &paths.connectivity_csv,
        write_connectivity_csv(&paths.connectivity_csv, connectivity),
    );

    report
}

fn write_npy(path: &Path, array: &ndarray::Array2<f64>) -> Result<()> {
    ndarray_npy::write_npy(path, array)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// `index<TAB>label` per line.
pub fn write_labels(path: &Path, labels: &[String]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    for (i, label) in labels.iter().enumerate() {
        writeln!(w, "{}\t{}", i, label)?;
    }
    w.flush()?;
    Ok(())
}

/// Labelled square matrix; the top-left header cell is empty.
pub fn write_connectivity_csv(path: &Path, matrix: &ConnectivityMatrix) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut header = Vec::with_capacity(matrix.labels.len() + 1);
    header.push(String::new());
    header.extend(matrix.labels.iter().cloned());
    w.write_record(&header)?;
    for (label, row) in matrix.labels.iter().zip(matrix.values.rows()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(label.clone());
        record.extend(row.iter().map(|v| v.to_string()));
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}
