use anyhow::Result;
use tracing::info;

use crate::ctx::AnalysisCtx;
use crate::input::locate_subject;
use crate::pipeline::Stage;

pub struct Stage1Locate;

impl Stage1Locate {
    pub fn new() -> Self {
        Self
    }
}

impl Stage<AnalysisCtx> for Stage1Locate {
    fn name(&self) -> &'static str {
        "stage1_locate"
    }

    fn run(&self, ctx: &mut AnalysisCtx) -> Result<()> {
        let set = locate_subject(&ctx.derivatives_dir, &ctx.subject_id, &ctx.session_id)?;
        info!(
            subject = %set.subject_id,
            session = %set.session_id,
            bold = %set.bold.display(),
            confounds = %set.confounds.display(),
            mask = %set.mask.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "none".to_string()),
            "input_files"
        );
        ctx.inputs = Some(set);
        Ok(())
    }
}
