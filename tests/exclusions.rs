use std::path::PathBuf;

use kira_neuroqc::config::ExclusionThresholds;
use kira_neuroqc::qc::exclusion::{Severity, evaluate_exclusions};
use kira_neuroqc::qc::{BoldMetrics, QcTable, T1wMetrics};

fn bold(subject: &str, fd_mean: f64, tsnr: f64) -> BoldMetrics {
    BoldMetrics {
        subject_id: subject.to_string(),
        session_id: "01".to_string(),
        task: "rest".to_string(),
        fd_mean,
        fd_num: f64::NAN,
        fd_perc: f64::NAN,
        snr: f64::NAN,
        tsnr,
        gcor: f64::NAN,
        dvars_std: f64::NAN,
        dvars_nstd: f64::NAN,
        aor: f64::NAN,
        aqi: f64::NAN,
    }
}

fn t1w(subject: &str, snr: f64) -> T1wMetrics {
    T1wMetrics {
        subject_id: subject.to_string(),
        session_id: "01".to_string(),
        snr,
        cnr: f64::NAN,
        fber: f64::NAN,
        efc: f64::NAN,
        qi_1: f64::NAN,
        qi_2: f64::NAN,
        cjv: f64::NAN,
        wm2max: f64::NAN,
    }
}

fn table<R>(records: Vec<R>) -> QcTable<R> {
    QcTable {
        sources: vec![PathBuf::new(); records.len()],
        records,
    }
}

#[test]
fn high_motion_and_low_tsnr_yield_two_entries() {
    let b = table(vec![bold("01", 0.95, 35.0)]);
    let out = evaluate_exclusions(Some(&b), None, &ExclusionThresholds::default());
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].severity, Severity::High);
    assert_eq!(out[0].reason, "High motion (FD=0.950mm)");
    assert_eq!(out[1].severity, Severity::Moderate);
    assert_eq!(out[1].reason, "Low tSNR (35.00)");
}

#[test]
fn clean_scan_yields_nothing() {
    let b = table(vec![bold("01", 0.3, 60.0)]);
    let out = evaluate_exclusions(Some(&b), None, &ExclusionThresholds::default());
    assert!(out.is_empty());
}

#[test]
fn motion_bands_are_disjoint() {
    let b = table(vec![
        bold("01", 0.9, 60.0),
        bold("02", 0.91, 60.0),
        bold("03", 0.5, 60.0),
    ]);
    let out = evaluate_exclusions(Some(&b), None, &ExclusionThresholds::default());
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].subject_id, "02");
    assert_eq!(out[0].severity, Severity::High);
    assert_eq!(out[1].subject_id, "01");
    assert_eq!(out[1].reason, "Moderate motion (FD=0.900mm)");
}

#[test]
fn entries_are_grouped_by_rule() {
    let b = table(vec![bold("01", 0.6, 30.0), bold("02", 1.2, 80.0)]);
    let a = table(vec![t1w("01", 7.0), t1w("03", 9.0)]);
    let out = evaluate_exclusions(Some(&b), Some(&a), &ExclusionThresholds::default());
    let summary: Vec<(&str, Severity)> = out
        .iter()
        .map(|e| (e.subject_id.as_str(), e.severity))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("02", Severity::High),
            ("01", Severity::Moderate),
            ("01", Severity::Moderate),
            ("01", Severity::High),
        ]
    );
    assert_eq!(out[3].reason, "Very low SNR (7.00)");
}

#[test]
fn missing_metrics_never_trigger() {
    let b = table(vec![bold("01", f64::NAN, f64::NAN)]);
    let a = table(vec![t1w("01", f64::NAN)]);
    let out = evaluate_exclusions(Some(&b), Some(&a), &ExclusionThresholds::default());
    assert!(out.is_empty());
    assert!(evaluate_exclusions(None, None, &ExclusionThresholds::default()).is_empty());
}

#[test]
fn severity_renders_lowercase() {
    assert_eq!(Severity::High.to_string(), "high");
    assert_eq!(Severity::Moderate.to_string(), "moderate");
}
