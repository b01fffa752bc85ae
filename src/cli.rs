use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "kira-neuroqc",
    version,
    about = "fMRI post-preprocessing analysis and MRIQC quality-control summaries"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarize MRIQC metrics and suggest exclusions
    Qc(QcArgs),
    /// Clean one subject's BOLD series and compute ROI connectivity
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Args)]
pub struct QcArgs {
    #[arg(
        long,
        default_value = "derivatives",
        help = "Path to derivatives directory (MRIQC output expected under <dir>/mriqc)"
    )]
    pub derivatives_dir: PathBuf,

    #[arg(long, default_value = "qc_reports")]
    pub out: PathBuf,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[arg(long, default_value = "derivatives/fmriprep", help = "fMRIPrep derivatives directory")]
    pub derivatives_dir: PathBuf,

    #[arg(long, default_value = "sub-01")]
    pub subject: String,

    #[arg(long, default_value = "ses-01")]
    pub session: String,

    #[arg(long, default_value = "aal", help = "Atlas: aal | harvard_oxford")]
    pub atlas: String,

    #[arg(
        long,
        default_value = "atlases",
        help = "Directory holding <atlas>/atlas.nii[.gz] and <atlas>/labels.txt"
    )]
    pub atlas_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = KindArg::Correlation)]
    pub kind: KindArg,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Confound columns to regress (default: 6 motion, FD, CSF, WM, global signal)"
    )]
    pub confounds: Option<Vec<String>>,

    #[arg(long, default_value = "analysis_outputs")]
    pub out: PathBuf,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Correlation,
    Covariance,
    PartialCorrelation,
}
