//! Single-subject analysis: locate, load, select confounds, clean, reduce to
//! ROIs, estimate connectivity, write artifacts.

use crate::ctx::AnalysisCtx;
use crate::pipeline::Pipeline;

pub mod stage1_locate;
pub mod stage2_load;
pub mod stage3_confounds;
pub mod stage4_condition;
pub mod stage5_parcellate;
pub mod stage6_connectivity;
pub mod stage7_artifacts;

pub fn pipeline() -> Pipeline<AnalysisCtx> {
    Pipeline::new(vec![
        Box::new(stage1_locate::Stage1Locate::new()),
        Box::new(stage2_load::Stage2Load::new()),
        Box::new(stage3_confounds::Stage3Confounds::new()),
        Box::new(stage4_condition::Stage4Condition::new()),
        Box::new(stage5_parcellate::Stage5Parcellate::new()),
        Box::new(stage6_connectivity::Stage6Connectivity::new()),
        Box::new(stage7_artifacts::Stage7Artifacts::new()),
    ])
}
