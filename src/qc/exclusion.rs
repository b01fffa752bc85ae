//! Rule-based exclusion suggestions.
//!
//! Rules run in a fixed order (high motion, moderate motion, low tSNR, low
//! anatomical SNR) and each one walks every record, so entries are grouped by
//! rule. The two motion bands are disjoint; all other rules are independent and
//! a subject may collect several entries.

use std::fmt;

use serde::Serialize;

use crate::config::ExclusionThresholds;
use crate::qc::{BoldMetrics, QcTable, T1wMetrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Moderate,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Moderate => f.write_str("moderate"),
            Self::High => f.write_str("high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExclusionEntry {
    pub subject_id: String,
    pub session_id: String,
    pub reason: String,
    pub severity: Severity,
}

pub fn evaluate_exclusions(
    bold: Option<&QcTable<BoldMetrics>>,
    t1w: Option<&QcTable<T1wMetrics>>,
    th: &ExclusionThresholds,
) -> Vec<ExclusionEntry> {
    let mut out = Vec::new();

    if let Some(bold) = bold {
        for r in &bold.records {
            if r.fd_mean > th.fd_high_above {
                out.push(entry(
                    &r.subject_id,
                    &r.session_id,
                    format!("High motion (FD={:.3}mm)", r.fd_mean),
                    Severity::High,
                ));
            }
        }
        for r in &bold.records {
            if r.fd_mean > th.fd_moderate_above && r.fd_mean <= th.fd_high_above {
                out.push(entry(
                    &r.subject_id,
                    &r.session_id,
                    format!("Moderate motion (FD={:.3}mm)", r.fd_mean),
                    Severity::Moderate,
                ));
            }
        }
        for r in &bold.records {
            if r.tsnr < th.tsnr_below {
                out.push(entry(
                    &r.subject_id,
                    &r.session_id,
                    format!("Low tSNR ({:.2})", r.tsnr),
                    Severity::Moderate,
                ));
            }
        }
    }

    if let Some(t1w) = t1w {
        for r in &t1w.records {
            if r.snr < th.t1w_snr_below {
                out.push(entry(
                    &r.subject_id,
                    &r.session_id,
                    format!("Very low SNR ({:.2})", r.snr),
                    Severity::High,
                ));
            }
        }
    }

    out
}

fn entry(subject_id: &str, session_id: &str, reason: String, severity: Severity) -> ExclusionEntry {
    ExclusionEntry {
        subject_id: subject_id.to_string(),
        session_id: session_id.to_string(),
        reason,
        severity,
    }
}
