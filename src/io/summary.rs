//! Console reports for both pipelines.

use crate::atlas::RoiOutcome;
use crate::ctx::{AnalysisCtx, QcCtx};
use crate::qc::summary::ModalitySummary;
use crate::signal::MaskSource;

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

pub fn format_qc_summary(ctx: &QcCtx) -> String {
    let mut out = String::new();
    out.push_str(&format!("kira-neuroqc v{}\n", env!("CARGO_PKG_VERSION")));
    out.push_str(&format!("MRIQC directory: {}\n", ctx.mriqc_dir.display()));
    out.push_str(&format!("Output directory: {}\n", ctx.output.out_dir.display()));

    if !ctx.has_metrics() {
        out.push_str("\n❌ No quality metrics found!\n");
        out.push_str("Please run MRIQC first\n");
        return out;
    }

    for summary in [&ctx.bold_summary, &ctx.t1w_summary].into_iter().flatten() {
        out.push_str(&format_modality(summary));
    }

    match &ctx.exclusions {
        Some(entries) if !entries.is_empty() => {
            out.push_str(&format!("\n{}\nSUGGESTED EXCLUSIONS\n{}\n", RULE, RULE));
            out.push_str(&format!("Found {} potential quality issues:\n", entries.len()));
            out.push_str(&format!(
                "{:<12} {:<12} {:<10} {}\n",
                "subject_id", "session_id", "severity", "reason"
            ));
            for e in entries {
                out.push_str(&format!(
                    "{:<12} {:<12} {:<10} {}\n",
                    e.subject_id, e.session_id, e.severity, e.reason
                ));
            }
        }
        Some(_) => out.push_str("\n✓ No subjects flagged for exclusion based on QC metrics\n"),
        None => {}
    }

    if !ctx.written.is_empty() {
        out.push('\n');
        for path in &ctx.written {
            out.push_str(&format!("✓ Saved: {}\n", path.display()));
        }
    }
    out.push_str(&format!("\nReview the HTML reports in {}/*.html\n", ctx.mriqc_dir.display()));
    out
}

fn format_modality(summary: &ModalitySummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n{}\n{} QUALITY METRICS SUMMARY ({} scans)\n{}\n",
        RULE,
        summary.modality.as_str().to_uppercase(),
        summary.n_records,
        RULE
    ));

    out.push_str(&format!("{:<8}", ""));
    for m in &summary.stats {
        out.push_str(&format!(" {:>11}", m.metric));
    }
    out.push('\n');
    let rows: [(&str, fn(&crate::math::stats::Describe) -> f64); 7] = [
        ("mean", |d| d.mean),
        ("std", |d| d.std),
        ("min", |d| d.min),
        ("25%", |d| d.q25),
        ("50%", |d| d.median),
        ("75%", |d| d.q75),
        ("max", |d| d.max),
    ];
    out.push_str(&format!("{:<8}", "count"));
    for m in &summary.stats {
        out.push_str(&format!(" {:>11}", m.stats.count));
    }
    out.push('\n');
    for (name, get) in rows {
        out.push_str(&format!("{:<8}", name));
        for m in &summary.stats {
            out.push_str(&format!(" {:>11.4}", get(&m.stats)));
        }
        out.push('\n');
    }

    out.push_str(&format!("\n{}\nQUALITY FLAGS\n{}\n", THIN_RULE, THIN_RULE));
    for flag in summary.flags.iter().filter(|f| !f.rows.is_empty()) {
        out.push_str(&format!(
            "⚠️  {} detected ({} scans):\n",
            flag.rule.label,
            flag.rows.len()
        ));
        for row in &flag.rows {
            out.push_str(&format!(
                "    {:<12} {:<12} {}={:.3}\n",
                row.subject_id, row.session_id, flag.rule.metric, row.value
            ));
        }
    }
    out
}

pub fn format_analysis_summary(ctx: &AnalysisCtx) -> String {
    let mut out = String::new();
    out.push_str(&format!("kira-neuroqc v{}\n", env!("CARGO_PKG_VERSION")));
    out.push_str(&format!(
        "Analysis for {} / {}\n",
        ctx.subject_id, ctx.session_id
    ));

    if let Some(inputs) = &ctx.inputs {
        out.push_str(&format!("  BOLD: {}\n", file_name(&inputs.bold)));
        out.push_str(&format!("  Confounds: {}\n", file_name(&inputs.confounds)));
    }
    if let Some(bold) = &ctx.bold {
        out.push_str(&format!(
            "Shape: {:?}, TR: {:.2}s\n",
            bold.data.shape(),
            bold.tr
        ));
    }
    if let Some(sel) = &ctx.confounds {
        if sel.names().is_empty() {
            out.push_str("Confounds: none selected (regression skipped)\n");
        } else {
            out.push_str(&format!("Selected {} confounds:\n", sel.names().len()));
            for name in sel.names() {
                out.push_str(&format!("    - {}\n", name));
            }
        }
    }
    let located_mask = ctx.inputs.as_ref().and_then(|i| i.mask.as_deref());
    match (&ctx.mask_source, located_mask) {
        (Some(MaskSource::Provided(p)), _) => out.push_str(&format!("Mask: {}\n", file_name(p))),
        (Some(MaskSource::Derived), _) => out.push_str("Mask: derived from data\n"),
        (None, Some(p)) => out.push_str(&format!("Mask: {}\n", file_name(p))),
        (None, None) => {}
    }
    if ctx.conditioned.is_some() {
        out.push_str("✓ Signal cleaned\n");
    }

    match &ctx.roi {
        Some(RoiOutcome::Extracted(ts)) => {
            out.push_str(&format!("✓ Extracted {} ROIs ({})\n", ts.n_regions(), ctx.atlas));
            out.push_str(&format!(
                "✓ Timeseries shape: ({}, {})\n",
                ts.n_timepoints(),
                ts.n_regions()
            ));
        }
        Some(RoiOutcome::Unsupported { atlas }) => {
            out.push_str(&format!("⚠️  Atlas {} not implemented\n", atlas));
        }
        Some(RoiOutcome::Failed { reason, .. }) => {
            out.push_str(&format!("⚠️  Error extracting ROI timeseries: {}\n", reason));
        }
        None => {}
    }

    if let Some(m) = &ctx.connectivity {
        out.push_str(&format!(
            "✓ {} matrix shape: ({}, {})\n",
            m.kind.as_str(),
            m.dim(),
            m.dim()
        ));
        out.push_str(&format!("✓ Mean connectivity: {:.3}\n", m.mean()));
    }

    match &ctx.artifacts {
        Some(report) => {
            for (artifact, path) in &report.written {
                out.push_str(&format!("✓ {}: {}\n", artifact, path.display()));
            }
            for f in &report.failures {
                out.push_str(&format!("⚠️  {} not written: {}\n", f.artifact, f.reason));
            }
            out.push_str(&format!("\nResults saved to: {}\n", ctx.out_dir.display()));
            out.push_str("\nNext steps:\n");
            out.push_str("  1. Visualize connectivity matrix\n");
            out.push_str("  2. Perform group-level statistics\n");
            out.push_str("  3. Compare with behavioral data\n");
        }
        None => out.push_str("\n⚠️  Analysis incomplete - could not extract time series\n"),
    }
    out
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
