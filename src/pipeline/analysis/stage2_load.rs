use anyhow::{Context, Result, bail};
use tracing::info;

use crate::ctx::AnalysisCtx;
use crate::io::confounds_tsv::read_confounds;
use crate::io::nifti::read_bold;
use crate::pipeline::Stage;

pub struct Stage2Load;

impl Stage2Load {
    pub fn new() -> Self {
        Self
    }
}

impl Stage<AnalysisCtx> for Stage2Load {
    fn name(&self) -> &'static str {
        "stage2_load"
    }

    fn run(&self, ctx: &mut AnalysisCtx) -> Result<()> {
        let inputs = ctx.inputs.as_ref().context("inputs not located")?;
        let bold = read_bold(&inputs.bold)?;
        let table = read_confounds(&inputs.confounds)?;

        // One confound row per volume.
        if table.n_rows != bold.n_volumes() {
            bail!(
                "confounds {} has {} rows but BOLD has {} volumes",
                inputs.confounds.display(),
                table.n_rows,
                bold.n_volumes()
            );
        }
        info!(
            columns = table.names.len(),
            rows = table.n_rows,
            "confounds_loaded"
        );

        ctx.bold = Some(bold);
        ctx.confound_table = Some(table);
        Ok(())
    }
}
