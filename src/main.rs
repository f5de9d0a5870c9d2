use clap::{Parser, Subcommand};
use manuscript_prep::config::{CleanArgs, OverlayArgs, SegmentArgs};
use manuscript_prep::{
    render_overlay_file, CleanConfig, Cleaner, SegmentConfig, SegmentationOrchestrator,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "manuscript-prep")]
#[command(about = "Scan cleaning and line-segmentation verification for manuscript OCR")]
#[command(version)]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deduplicate, quality-gate and grayscale a raw scan tree
    Clean(CleanArgs),
    /// Binarize and segment one page with the external tool, then render an overlay
    Segment(SegmentArgs),
    /// Draw the line boxes of an existing segmentation result over an image
    Overlay(OverlayArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing; stdout is reserved for results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("manuscript-prep v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Commands::Clean(clean_args) => run_clean(clean_args).await,
        Commands::Segment(segment_args) => run_segment(segment_args).await,
        Commands::Overlay(overlay_args) => run_overlay(overlay_args),
    }
}

async fn run_clean(args: CleanArgs) -> anyhow::Result<()> {
    let report_path = args.report.clone();
    let config = CleanConfig::from(args);

    let report = tokio::task::spawn_blocking(move || Cleaner::new(config).run()).await??;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if let Some(path) = report_path {
        report.write_json(&path)?;
        tracing::info!("Report written to {}", path.display());
    }
    Ok(())
}

async fn run_segment(args: SegmentArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input image does not exist: {}", args.input.display());
    }

    let orchestrator = SegmentationOrchestrator::new(&SegmentConfig::from(&args));
    let artifacts = orchestrator.segment(&args.input).await?;

    println!("Binarized image: {}", artifacts.paths.binarized.display());
    println!("Segmentation: {}", artifacts.paths.segmentation.display());
    println!(
        "Overlay image: {} ({} lines drawn, {} skipped)",
        artifacts.paths.overlay.display(),
        artifacts.overlay.drawn,
        artifacts.overlay.skipped.len()
    );
    Ok(())
}

fn run_overlay(args: OverlayArgs) -> anyhow::Result<()> {
    let report = render_overlay_file(&args.segmentation, &args.image, &args.output)?;
    println!(
        "Overlay image saved as {} ({} lines drawn, {} skipped)",
        args.output.display(),
        report.drawn,
        report.skipped.len()
    );
    Ok(())
}
