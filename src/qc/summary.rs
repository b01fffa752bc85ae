use crate::config::SummaryThresholds;
use crate::math::stats::{Describe, describe};
use crate::qc::{Modality, QcRecord, QcTable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Above(f64),
    Below(f64),
}

impl Bound {
    /// Strict comparison; NaN never trips.
    pub fn hit(self, value: f64) -> bool {
        match self {
            Self::Above(t) => value > t,
            Self::Below(t) => value < t,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlagRule {
    pub name: &'static str,
    pub label: &'static str,
    pub metric: &'static str,
    pub bound: Bound,
}

pub fn bold_rules(th: &SummaryThresholds) -> Vec<FlagRule> {
    vec![
        FlagRule {
            name: "high_motion",
            label: "High motion",
            metric: "fd_mean",
            bound: Bound::Above(th.bold_fd_mean_above),
        },
        FlagRule {
            name: "low_tsnr",
            label: "Low temporal SNR",
            metric: "tsnr",
            bound: Bound::Below(th.bold_tsnr_below),
        },
    ]
}

pub fn t1w_rules(th: &SummaryThresholds) -> Vec<FlagRule> {
    vec![
        FlagRule {
            name: "low_snr",
            label: "Low SNR",
            metric: "snr",
            bound: Bound::Below(th.t1w_snr_below),
        },
        FlagRule {
            name: "high_efc",
            label: "High entropy (non-uniformity)",
            metric: "efc",
            bound: Bound::Above(th.t1w_efc_above),
        },
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricStats {
    pub metric: &'static str,
    pub stats: Describe,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedRow {
    pub subject_id: String,
    pub session_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityFlag {
    pub rule: FlagRule,
    pub rows: Vec<FlaggedRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalitySummary {
    pub modality: Modality,
    pub n_records: usize,
    pub stats: Vec<MetricStats>,
    pub flags: Vec<QualityFlag>,
}

impl ModalitySummary {
    pub fn flag(&self, name: &str) -> Option<&QualityFlag> {
        self.flags.iter().find(|f| f.rule.name == name)
    }
}

/// Per-metric descriptive statistics plus one warning list per rule. Every
/// rule is reported, including those that flagged nobody.
pub fn summarize<R: QcRecord>(table: &QcTable<R>, rules: &[FlagRule]) -> ModalitySummary {
    let values: Vec<Vec<f64>> = table.records.iter().map(|r| r.metric_values()).collect();

    let stats = R::METRICS
        .iter()
        .enumerate()
        .map(|(col, &metric)| {
            let column: Vec<f64> = values.iter().map(|row| row[col]).collect();
            MetricStats {
                metric,
                stats: describe(&column),
            }
        })
        .collect();

    let flags = rules
        .iter()
        .map(|rule| {
            let rows = table
                .records
                .iter()
                .filter_map(|r| {
                    let value = r.metric(rule.metric)?;
                    rule.bound.hit(value).then(|| FlaggedRow {
                        subject_id: r.subject_id().to_string(),
                        session_id: r.session_id().to_string(),
                        value,
                    })
                })
                .collect();
            QualityFlag {
                rule: rule.clone(),
                rows,
            }
        })
        .collect();

    ModalitySummary {
        modality: R::MODALITY,
        n_records: table.len(),
        stats,
        flags,
    }
}
