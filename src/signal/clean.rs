//! Per-series cleaning primitives.

use std::sync::Arc;

use anyhow::{Result, bail};
use ndarray::{Array2, ArrayViewMut1, Axis};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use tracing::warn;

#[cfg(feature = "mt")]
use ndarray::parallel::prelude::*;

use crate::config::FilterParams;
use crate::error::NeuroQcError;

const BASIS_TOL: f64 = 1e-10;

pub struct Cleaner {
    detrend: bool,
    standardize: bool,
    basis: Vec<Vec<f64>>,
    band: Option<BandPass>,
}

impl Cleaner {
    pub fn new(
        n_volumes: usize,
        tr: f64,
        confounds: Option<&Array2<f64>>,
        params: &FilterParams,
    ) -> Result<(Self, Vec<String>)> {
        let mut warnings = Vec::new();
        if !tr.is_finite() || tr <= 0.0 {
            bail!(NeuroQcError::upstream(
                "signal cleaning",
                format!("invalid repetition time {}", tr)
            ));
        }

        let basis = match confounds {
            Some(m) => {
                let mut cols: Vec<Vec<f64>> = m.axis_iter(Axis(1)).map(|c| c.to_vec()).collect();
                for col in cols.iter_mut() {
                    if params.detrend {
                        detrend(col);
                    } else {
                        center(col);
                    }
                }
                let requested = cols.len();
                let basis = orthonormal_basis(cols);
                if basis.len() < requested {
                    warnings.push(format!(
                        "{} of {} confounds were collinear or constant and were dropped",
                        requested - basis.len(),
                        requested
                    ));
                }
                basis
            }
            None => Vec::new(),
        };

        let nyquist = 0.5 / tr;
        let mut low = Some(params.low_pass_hz).filter(|v| *v > 0.0);
        let high = Some(params.high_pass_hz).filter(|v| *v > 0.0);
        if let Some(l) = low {
            if l >= nyquist {
                warn!(low_pass_hz = l, nyquist_hz = nyquist, "low-pass at or above Nyquist; skipped");
                warnings.push(format!(
                    "low-pass {} Hz is not below Nyquist {:.4} Hz; low-pass skipped",
                    l, nyquist
                ));
                low = None;
            }
        }
        if let Some(h) = high {
            if h >= nyquist {
                bail!(NeuroQcError::upstream(
                    "signal cleaning",
                    format!("high-pass {} Hz is not below Nyquist {:.4} Hz", h, nyquist)
                ));
            }
            if let Some(l) = low {
                if h >= l {
                    bail!(NeuroQcError::upstream(
                        "signal cleaning",
                        format!("high-pass {} Hz must be below low-pass {} Hz", h, l)
                    ));
                }
            }
        }
        let band = if low.is_some() || high.is_some() {
            Some(BandPass::new(n_volumes, tr, low, high))
        } else {
            None
        };

        Ok((
            Self {
                detrend: params.detrend,
                standardize: params.standardize,
                basis,
                band,
            },
            warnings,
        ))
    }

    pub fn clean_series(&self, y: &mut [f64]) {
        if self.detrend {
            detrend(y);
        }
        for b in &self.basis {
            let dot: f64 = y.iter().zip(b).map(|(a, b)| a * b).sum();
            for (v, bv) in y.iter_mut().zip(b) {
                *v -= dot * bv;
            }
        }
        if let Some(band) = &self.band {
            band.apply(y);
        }
        if self.standardize {
            zscore(y);
        }
    }

    /// Cleans every row of a voxel x time matrix.
    pub fn clean_all(&self, signals: &mut Array2<f64>, threads: usize) -> Result<()> {
        #[cfg(feature = "mt")]
        {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build thread pool: {}", e))?;
            pool.install(|| {
                signals
                    .axis_iter_mut(Axis(0))
                    .into_par_iter()
                    .for_each(|lane| self.clean_lane(lane));
            });
            Ok(())
        }
        #[cfg(not(feature = "mt"))]
        {
            let _ = threads;
            for lane in signals.axis_iter_mut(Axis(0)) {
                self.clean_lane(lane);
            }
            Ok(())
        }
    }

    fn clean_lane(&self, mut lane: ArrayViewMut1<'_, f64>) {
        let mut buf = lane.to_vec();
        self.clean_series(&mut buf);
        for (dst, src) in lane.iter_mut().zip(buf) {
            *dst = src;
        }
    }
}

/// Removes mean and least-squares linear trend.
pub fn detrend(y: &mut [f64]) {
    let n = y.len();
    if n == 0 {
        return;
    }
    let t_mean = (n as f64 - 1.0) / 2.0;
    let y_mean = y.iter().sum::<f64>() / n as f64;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &v) in y.iter().enumerate() {
        let tc = i as f64 - t_mean;
        num += tc * (v - y_mean);
        den += tc * tc;
    }
    let slope = if den > 0.0 { num / den } else { 0.0 };
    for (i, v) in y.iter_mut().enumerate() {
        *v -= y_mean + slope * (i as f64 - t_mean);
    }
}

pub fn center(y: &mut [f64]) {
    if y.is_empty() {
        return;
    }
    let mean = y.iter().sum::<f64>() / y.len() as f64;
    for v in y.iter_mut() {
        *v -= mean;
    }
}

/// Zero mean, unit population variance. Constant series become all zero.
pub fn zscore(y: &mut [f64]) {
    center(y);
    if y.is_empty() {
        return;
    }
    let var = y.iter().map(|v| v * v).sum::<f64>() / y.len() as f64;
    let std = var.sqrt();
    if std > f64::EPSILON {
        for v in y.iter_mut() {
            *v /= std;
        }
    } else {
        y.iter_mut().for_each(|v| *v = 0.0);
    }
}

/// Modified Gram-Schmidt; near-dependent columns are dropped.
fn orthonormal_basis(cols: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(cols.len());
    for mut col in cols {
        let scale = col.iter().map(|v| v * v).sum::<f64>().sqrt();
        for b in &basis {
            let dot: f64 = col.iter().zip(b).map(|(a, b)| a * b).sum();
            for (v, bv) in col.iter_mut().zip(b) {
                *v -= dot * bv;
            }
        }
        let norm = col.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm <= BASIS_TOL * scale.max(1.0) {
            continue;
        }
        col.iter_mut().for_each(|v| *v /= norm);
        basis.push(col);
    }
    basis
}

/// Ideal frequency-domain band-pass; bins outside `[high, low]` Hz are zeroed.
pub struct BandPass {
    fft: Arc<dyn Fft<f64>>,
    ifft: Arc<dyn Fft<f64>>,
    keep: Vec<bool>,
}

impl BandPass {
    pub fn new(n: usize, tr: f64, low_pass: Option<f64>, high_pass: Option<f64>) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        let ifft = planner.plan_fft_inverse(n);
        let span = n as f64 * tr;
        let keep = (0..n)
            .map(|k| {
                let f = k.min(n - k) as f64 / span;
                high_pass.is_none_or(|h| f >= h) && low_pass.is_none_or(|l| f <= l)
            })
            .collect();
        Self { fft, ifft, keep }
    }

    pub fn apply(&self, y: &mut [f64]) {
        let n = y.len();
        if n == 0 || n != self.keep.len() {
            return;
        }
        let mut buf: Vec<Complex64> = y.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        self.fft.process(&mut buf);
        for (c, &keep) in buf.iter_mut().zip(&self.keep) {
            if !keep {
                *c = Complex64::new(0.0, 0.0);
            }
        }
        self.ifft.process(&mut buf);
        let scale = 1.0 / n as f64;
        for (dst, c) in y.iter_mut().zip(&buf) {
            *dst = c.re * scale;
        }
    }
}
