//! Derivatives-wide QC: load MRIQC metrics per modality, summarize with
//! warning flags, then derive exclusion suggestions.

use crate::ctx::QcCtx;
use crate::pipeline::Pipeline;

pub mod stage0_scaffold;
pub mod stage1_metrics;
pub mod stage2_summary;
pub mod stage3_exclusions;

pub fn pipeline() -> Pipeline<QcCtx> {
    Pipeline::new(vec![
        Box::new(stage0_scaffold::Stage0Scaffold::new()),
        Box::new(stage1_metrics::Stage1Metrics::new()),
        Box::new(stage2_summary::Stage2Summary::new()),
        Box::new(stage3_exclusions::Stage3Exclusions::new()),
    ])
}
