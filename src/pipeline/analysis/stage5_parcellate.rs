use anyhow::{Context, Result};

use crate::atlas::extract_roi_timeseries;
use crate::ctx::AnalysisCtx;
use crate::pipeline::Stage;

pub struct Stage5Parcellate;

impl Stage5Parcellate {
    pub fn new() -> Self {
        Self
    }
}

impl Stage<AnalysisCtx> for Stage5Parcellate {
    fn name(&self) -> &'static str {
        "stage5_parcellate"
    }

    fn run(&self, ctx: &mut AnalysisCtx) -> Result<()> {
        let scan = ctx.conditioned.as_ref().context("signal not conditioned")?;
        let (outcome, warnings) = extract_roi_timeseries(scan, &ctx.atlas, &ctx.atlas_dir);
        ctx.warnings.extend(warnings);
        ctx.roi = Some(outcome);
        Ok(())
    }
}
