use crate::cli::TrendArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use chitocoll::{engine::progress::ProgressReporter, workflows};
use tracing::info;

pub fn run(args: TrendArgs, workers: Option<usize>) -> Result<()> {
    let partial_config = PartialRunConfig::from_file(&args.scan.config)?;
    let final_config = partial_config.merge_trend_cli(&args, workers)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Plotting {} against the deacetylation degree...",
        final_config.interaction
    );
    let result = workflows::trend::run(&final_config, &reporter)?;
    info!(series = result.series.len(), "Trend plot rendered.");

    for series in &result.series {
        println!(
            "  {:<12} {:>3} points  {}  R² = {:.4}",
            series.label,
            series.points.len(),
            series.fit.equation(),
            series.r_squared
        );
    }
    println!("✓ Plot written to: {}", result.plot_path.display());

    Ok(())
}
