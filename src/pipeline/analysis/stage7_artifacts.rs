use anyhow::Result;
use tracing::info;

use crate::ctx::AnalysisCtx;
use crate::io::artifacts::write_artifacts;
use crate::pipeline::Stage;

pub struct Stage7Artifacts;

impl Stage7Artifacts {
    pub fn new() -> Self {
        Self
    }
}

impl Stage<AnalysisCtx> for Stage7Artifacts {
    fn name(&self) -> &'static str {
        "stage7_artifacts"
    }

    fn run(&self, ctx: &mut AnalysisCtx) -> Result<()> {
        let (Some(ts), Some(matrix)) = (
            ctx.roi.as_ref().and_then(|o| o.timeseries()),
            ctx.connectivity.as_ref(),
        ) else {
            info!("nothing to write");
            return Ok(());
        };

        let report = write_artifacts(&ctx.out_dir, &ctx.subject_id, ts, matrix);
        for failure in &report.failures {
            ctx.warnings.push(format!(
                "could not write {} to {}: {}",
                failure.artifact,
                failure.path.display(),
                failure.reason
            ));
        }
        ctx.artifacts = Some(report);
        Ok(())
    }
}
