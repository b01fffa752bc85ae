use anyhow::Result;
use tracing::{info, warn};

use crate::connectivity::compute_connectivity;
use crate::ctx::AnalysisCtx;
use crate::pipeline::Stage;

pub struct Stage6Connectivity;

impl Stage6Connectivity {
    pub fn new() -> Self {
        Self
    }
}

impl Stage<AnalysisCtx> for Stage6Connectivity {
    fn name(&self) -> &'static str {
        "stage6_connectivity"
    }

    fn run(&self, ctx: &mut AnalysisCtx) -> Result<()> {
        let Some(ts) = ctx.roi.as_ref().and_then(|o| o.timeseries()) else {
            info!("no ROI time series; connectivity skipped");
            return Ok(());
        };
        match compute_connectivity(ts, ctx.kind) {
            Ok(matrix) => {
                info!(
                    kind = matrix.kind.as_str(),
                    dim = matrix.dim(),
                    mean = matrix.mean(),
                    "connectivity_ready"
                );
                ctx.connectivity = Some(matrix);
            }
            Err(err) => {
                warn!(error = %format!("{:#}", err), "connectivity failed");
                ctx.warnings
                    .push(format!("error computing connectivity: {:#}", err));
            }
        }
        Ok(())
    }
}
