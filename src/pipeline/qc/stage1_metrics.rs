use anyhow::Result;

use crate::ctx::QcCtx;
use crate::pipeline::Stage;
use crate::qc::{BoldMetrics, T1wMetrics, load_table};

pub struct Stage1Metrics;

impl Stage1Metrics {
    pub fn new() -> Self {
        Self
    }
}

impl Stage<QcCtx> for Stage1Metrics {
    fn name(&self) -> &'static str {
        "stage1_metrics"
    }

    fn run(&self, ctx: &mut QcCtx) -> Result<()> {
        // Modalities load independently; one missing never blocks the other.
        let (bold, bold_warnings) = load_table::<BoldMetrics>(&ctx.mriqc_dir)?;
        let (t1w, t1w_warnings) = load_table::<T1wMetrics>(&ctx.mriqc_dir)?;
        ctx.warnings.extend(bold_warnings);
        ctx.warnings.extend(t1w_warnings);
        ctx.bold = bold;
        ctx.t1w = t1w;
        Ok(())
    }
}
