use anyhow::Result;
use tracing::{info, warn};

use crate::ctx::QcCtx;
use crate::io::qc_csv::write_exclusions;
use crate::pipeline::Stage;
use crate::qc::exclusion::evaluate_exclusions;

pub struct Stage3Exclusions;

impl Stage3Exclusions {
    pub fn new() -> Self {
        Self
    }
}

impl Stage<QcCtx> for Stage3Exclusions {
    fn name(&self) -> &'static str {
        "stage3_exclusions"
    }

    fn run(&self, ctx: &mut QcCtx) -> Result<()> {
        if !ctx.has_metrics() {
            info!("no quality metrics; exclusions skipped");
            return Ok(());
        }

        let entries = evaluate_exclusions(
            ctx.bold.as_ref(),
            ctx.t1w.as_ref(),
            &ctx.exclusion_thresholds,
        );
        info!(entries = entries.len(), "exclusions_evaluated");

        if !entries.is_empty() {
            let path = &ctx.output.exclusions;
            match write_exclusions(path, &entries) {
                Ok(()) => ctx.written.push(path.clone()),
                Err(err) => {
                    warn!(path = %path.display(), error = %format!("{:#}", err), "exclusion write failed");
                    ctx.warnings.push(format!("could not write {}: {:#}", path.display(), err));
                }
            }
        }
        ctx.exclusions = Some(entries);
        Ok(())
    }
}
