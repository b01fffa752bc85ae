use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::ctx::AnalysisCtx;
use crate::error::NeuroQcError;
use crate::io::nifti::read_mask;
use crate::pipeline::Stage;
use crate::signal::{condition, resolve_mask};

pub struct Stage4Condition;

impl Stage4Condition {
    pub fn new() -> Self {
        Self
    }
}

impl Stage<AnalysisCtx> for Stage4Condition {
    fn name(&self) -> &'static str {
        "stage4_condition"
    }

    fn run(&self, ctx: &mut AnalysisCtx) -> Result<()> {
        let inputs = ctx.inputs.as_ref().context("inputs not located")?;
        let bold = ctx.bold.as_ref().context("BOLD not loaded")?;
        let confounds = ctx.confounds.as_ref().context("confounds not selected")?;

        let provided = match &inputs.mask {
            Some(path) => match read_mask(path) {
                Ok(mask) => Some((path.clone(), mask)),
                Err(err) => {
                    warn!(mask = %path.display(), error = %format!("{:#}", err), "mask unreadable");
                    ctx.warnings.push(format!(
                        "mask {} unreadable ({:#}); derived a mask from the data",
                        path.display(),
                        err
                    ));
                    None
                }
            },
            None => {
                let err = NeuroQcError::MissingOptionalInput {
                    role: "brain mask",
                    searched: inputs.func_dir.clone(),
                };
                info!(reason = %err, "creating mask from data");
                None
            }
        };

        let (mask, source, mut warnings) = resolve_mask(bold, provided, &ctx.mask_params)?;
        let (scan, clean_warnings) = condition(bold, &mask, confounds, &ctx.filter, ctx.threads)?;
        warnings.extend(clean_warnings);

        ctx.warnings.extend(warnings);
        ctx.mask_source = Some(source);
        ctx.conditioned = Some(scan);
        Ok(())
    }
}
