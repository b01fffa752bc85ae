//! Region x region connectivity from ROI time series.

use anyhow::{Result, bail};
use ndarray::Array2;

use crate::atlas::RoiTimeSeries;
use crate::error::NeuroQcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityKind {
    Correlation,
    Covariance,
    PartialCorrelation,
}

impl ConnectivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correlation => "correlation",
            Self::Covariance => "covariance",
            Self::PartialCorrelation => "partial correlation",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectivityMatrix {
    pub kind: ConnectivityKind,
    pub values: Array2<f64>,
    pub labels: Vec<String>,
}

impl ConnectivityMatrix {
    pub fn dim(&self) -> usize {
        self.values.nrows()
    }

    /// Mean over all cells, diagonal included. Diagnostic only.
    pub fn mean(&self) -> f64 {
        self.values.mean().unwrap_or(f64::NAN)
    }
}

pub fn compute_connectivity(ts: &RoiTimeSeries, kind: ConnectivityKind) -> Result<ConnectivityMatrix> {
    let n_t = ts.n_timepoints();
    if n_t < 2 {
        bail!(NeuroQcError::upstream(
            "connectivity",
            format!("need at least 2 timepoints, got {}", n_t)
        ));
    }
    let cov = covariance(ts.data());
    let values = match kind {
        ConnectivityKind::Covariance => cov,
        ConnectivityKind::Correlation => correlation_from_cov(&cov),
        ConnectivityKind::PartialCorrelation => {
            let precision = invert(&cov).ok_or_else(|| {
                NeuroQcError::upstream("connectivity", "covariance matrix is singular")
            })?;
            partial_from_precision(&precision)
        }
    };
    Ok(ConnectivityMatrix {
        kind,
        values,
        labels: ts.labels().to_vec(),
    })
}

/// Population covariance of the columns of a time x region matrix.
fn covariance(data: &Array2<f64>) -> Array2<f64> {
    let n = data.nrows() as f64;
    let means = data.sum_axis(ndarray::Axis(0)) / n;
    let centered = data - &means;
    let cov = centered.t().dot(&centered) / n;
    (&cov + &cov.t()) / 2.0
}

fn correlation_from_cov(cov: &Array2<f64>) -> Array2<f64> {
    let d = cov.nrows();
    let std: Vec<f64> = (0..d).map(|i| cov[[i, i]].max(0.0).sqrt()).collect();
    let mut out = Array2::<f64>::zeros((d, d));
    for i in 0..d {
        out[[i, i]] = 1.0;
        for j in (i + 1)..d {
            let denom = std[i] * std[j];
            let r = if denom > f64::EPSILON {
                (cov[[i, j]] / denom).clamp(-1.0, 1.0)
            } else {
                0.0
            };
            out[[i, j]] = r;
            out[[j, i]] = r;
        }
    }
    out
}

fn partial_from_precision(precision: &Array2<f64>) -> Array2<f64> {
    let d = precision.nrows();
    let mut out = Array2::<f64>::zeros((d, d));
    for i in 0..d {
        out[[i, i]] = 1.0;
        for j in (i + 1)..d {
            let denom = (precision[[i, i]] * precision[[j, j]]).sqrt();
            let r = if denom > f64::EPSILON {
                -precision[[i, j]] / denom
            } else {
                0.0
            };
            out[[i, j]] = r;
            out[[j, i]] = r;
        }
    }
    out
}

/// Gauss-Jordan with partial pivoting.
fn invert(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    let mut a = m.clone();
    let mut inv = Array2::<f64>::eye(n);
    let scale = m.iter().fold(0.0f64, |acc, v| acc.max(v.abs())).max(1.0);

    for col in 0..n {
        let pivot = (col..n).max_by(|&x, &y| a[[x, col]].abs().total_cmp(&a[[y, col]].abs()))?;
        if a[[pivot, col]].abs() <= 1e-12 * scale {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([pivot, k], [col, k]);
                inv.swap([pivot, k], [col, k]);
            }
        }
        let p = a[[col, col]];
        for k in 0..n {
            a[[col, k]] /= p;
            inv[[col, k]] /= p;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let f = a[[row, col]];
            if f == 0.0 {
                continue;
            }
            for k in 0..n {
                a[[row, k]] -= f * a[[col, k]];
                inv[[row, k]] -= f * inv[[col, k]];
            }
        }
    }
    Some(inv)
}
