use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kira_neuroqc::cli::{AnalyzeArgs, Cli, Commands, KindArg, QcArgs};
use kira_neuroqc::connectivity::ConnectivityKind;
use kira_neuroqc::ctx::{AnalysisCtx, QcCtx};
use kira_neuroqc::error::NeuroQcError;
use kira_neuroqc::io;
use kira_neuroqc::pipeline;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Qc(args) => run_qc(args),
        Commands::Analyze(args) => run_analyze(args),
    }

    Ok(())
}

fn run_qc(args: QcArgs) {
    let mut ctx = QcCtx::new(args.derivatives_dir, args.out);
    if let Err(err) = pipeline::qc::pipeline().run(&mut ctx) {
        println!("❌ Error: {:#}", err);
        print_warnings(&ctx.warnings);
        return;
    }
    print!("{}", io::summary::format_qc_summary(&ctx));
    print_warnings(&ctx.warnings);
}

fn run_analyze(args: AnalyzeArgs) {
    if !args.derivatives_dir.exists() {
        print_missing_derivatives(&args);
        return;
    }

    let mut ctx = AnalysisCtx::new(
        args.derivatives_dir,
        args.subject,
        args.session,
        args.out,
    );
    ctx.atlas = args.atlas;
    ctx.atlas_dir = args.atlas_dir;
    ctx.kind = match args.kind {
        KindArg::Correlation => ConnectivityKind::Correlation,
        KindArg::Covariance => ConnectivityKind::Covariance,
        KindArg::PartialCorrelation => ConnectivityKind::PartialCorrelation,
    };
    if let Some(names) = args.confounds {
        ctx.confound_names = names;
    }
    ctx.threads = args.threads;

    if let Err(err) = pipeline::analysis::pipeline().run(&mut ctx) {
        println!("❌ Error: {:#}", err);
        print_warnings(&ctx.warnings);
        print_remediation(&err);
        return;
    }
    print!("{}", io::summary::format_analysis_summary(&ctx));
    print_warnings(&ctx.warnings);
}

fn print_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    println!("\nwarnings:");
    for warning in warnings {
        println!("⚠️  {}", warning);
    }
}

fn print_missing_derivatives(args: &AnalyzeArgs) {
    println!(
        "⚠️  Derivatives directory not found: {}",
        args.derivatives_dir.display()
    );
    println!("\nRun fMRIPrep first to produce preprocessed BOLD data, then retry:");
    println!(
        "  kira-neuroqc analyze --derivatives-dir <fmriprep_dir> --subject {} --session {}",
        args.subject, args.session
    );
}

fn print_remediation(err: &anyhow::Error) {
    println!("\nTroubleshooting:");
    match err.downcast_ref::<NeuroQcError>() {
        Some(NeuroQcError::MissingInput { role, searched }) => {
            println!("  1. Check that {} exists under {}", role, searched.display());
            println!("  2. Verify the subject and session identifiers");
            println!("  3. Confirm fMRIPrep finished without errors");
        }
        Some(NeuroQcError::Upstream { operation, .. }) => {
            println!("  1. {} could not complete on this scan", operation);
            println!("  2. Inspect the preprocessed BOLD image and its header");
        }
        _ => {
            println!("  1. Check that fMRIPrep completed successfully");
            println!("  2. Verify file paths and permissions");
            println!("  3. Ensure the derivatives directory is readable");
        }
    }
}
