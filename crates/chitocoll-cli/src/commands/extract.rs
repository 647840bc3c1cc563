use crate::cli::ExtractArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use chitocoll::{engine::progress::ProgressReporter, workflows};
use tracing::{info, warn};

pub fn run(args: ExtractArgs, workers: Option<usize>) -> Result<()> {
    let partial_config = PartialRunConfig::from_file(&args.scan.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_extract_cli(&args, workers)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Scanning {} for {} interaction type(s)...",
        final_config.scan.input_root.display(),
        final_config.interactions.len()
    );
    let result = workflows::extract::run(&final_config, &reporter)?;

    info!(
        cases = result.cases.len(),
        rows = result.table.len(),
        "Extraction finished."
    );

    for summary in &result.summaries {
        for failure in &summary.file_failures {
            warn!("[{}] {}", summary.interaction, failure);
        }
        for failure in &summary.case_failures {
            warn!("[{}] {}", summary.interaction, failure);
        }

        println!(
            "  {:<22} {:>6} records, {} file(s) skipped, {} case(s) failed",
            summary.interaction.label(),
            summary.records,
            summary.file_failures.len(),
            summary.case_failures.len()
        );
        if let Some(path) = &summary.json_path {
            println!("    -> {}", path.display());
        }
    }

    println!(
        "✓ Merged table ({} rows x {} columns) written to: {}",
        result.table.len(),
        result.table.columns().len(),
        result.csv_path.display()
    );
    if result.total_file_failures() > 0 {
        println!(
            "Warning: {} file(s) could not be used; rerun with -v for details.",
            result.total_file_failures()
        );
    }

    Ok(())
}
