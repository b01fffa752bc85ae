use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::confounds::{ConfoundSelection, select_confounds};
use crate::ctx::AnalysisCtx;
use crate::error::NeuroQcError;
use crate::pipeline::Stage;

pub struct Stage3Confounds;

impl Stage3Confounds {
    pub fn new() -> Self {
        Self
    }
}

impl Stage<AnalysisCtx> for Stage3Confounds {
    fn name(&self) -> &'static str {
        "stage3_confounds"
    }

    fn run(&self, ctx: &mut AnalysisCtx) -> Result<()> {
        let table = ctx
            .confound_table
            .as_ref()
            .context("confound table not loaded")?;
        let selection = select_confounds(table, ctx.confound_names.as_slice());
        match &selection {
            ConfoundSelection::Selected { names, .. } => {
                info!(selected = ?names, "confounds_selected");
            }
            ConfoundSelection::NoConfounds => {
                let searched = ctx
                    .inputs
                    .as_ref()
                    .map(|s| s.confounds.clone())
                    .unwrap_or_default();
                let err = NeuroQcError::MissingOptionalInput {
                    role: "standard confounds",
                    searched,
                };
                warn!(error = %err, "regression skipped");
                ctx.warnings
                    .push("No standard confounds found; continuing without regression".to_string());
            }
        }
        ctx.confounds = Some(selection);
        Ok(())
    }
}
