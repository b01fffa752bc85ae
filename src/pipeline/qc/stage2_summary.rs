use anyhow::Result;
use tracing::{info, warn};

use crate::ctx::QcCtx;
use crate::io::qc_csv::write_qc_table;
use crate::pipeline::Stage;
use crate::qc::summary::{bold_rules, summarize, t1w_rules};

pub struct Stage2Summary;

impl Stage2Summary {
    pub fn new() -> Self {
        Self
    }
}

impl Stage<QcCtx> for Stage2Summary {
    fn name(&self) -> &'static str {
        "stage2_summary"
    }

    fn run(&self, ctx: &mut QcCtx) -> Result<()> {
        if let Some(table) = &ctx.bold {
            let summary = summarize(table, &bold_rules(&ctx.summary_thresholds));
            let path = &ctx.output.bold_summary;
            match write_qc_table(path, table) {
                Ok(()) => {
                    info!(path = %path.display(), rows = table.len(), "bold_summary_written");
                    ctx.written.push(path.clone());
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %format!("{:#}", err), "summary write failed");
                    ctx.warnings.push(format!("could not write {}: {:#}", path.display(), err));
                }
            }
            ctx.bold_summary = Some(summary);
        }

        if let Some(table) = &ctx.t1w {
            let summary = summarize(table, &t1w_rules(&ctx.summary_thresholds));
            let path = &ctx.output.t1w_summary;
            match write_qc_table(path, table) {
                Ok(()) => {
                    info!(path = %path.display(), rows = table.len(), "t1w_summary_written");
                    ctx.written.push(path.clone());
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %format!("{:#}", err), "summary write failed");
                    ctx.warnings.push(format!("could not write {}: {:#}", path.display(), err));
                }
            }
            ctx.t1w_summary = Some(summary);
        }

        Ok(())
    }
}
