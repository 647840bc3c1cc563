use crate::cli::PredictArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use chitocoll::{engine::progress::ProgressReporter, workflows};
use tracing::{info, warn};

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

pub fn run(args: PredictArgs) -> Result<()> {
    let partial_config = PartialRunConfig::from_file(&args.config)?;
    let final_config = partial_config.merge_predict_cli(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Loading table from {:?}", &final_config.input_csv);
    let result = workflows::predict::run(&final_config, &reporter)?;

    if result.dropped_rows > 0 {
        warn!(
            "{} row(s) dropped because '{}' was missing.",
            result.dropped_rows, final_config.target
        );
    }

    println!(
        "Rows: {} usable, {} dropped",
        result.rows, result.dropped_rows
    );
    println!(
        "Train set: {} x {}    Test set: {} x {}",
        result.train_shape.0, result.train_shape.1, result.test_shape.0, result.test_shape.1
    );

    println!();
    println!(
        "{:<28} {:>6} {:>7} {:>12} {:>12} {:>12}",
        "column", "count", "missing", "mean", "min", "max"
    );
    for column in &result.description {
        println!(
            "{:<28} {:>6} {:>7} {:>12} {:>12} {:>12}",
            column.name,
            column.count,
            column.missing,
            fmt_opt(column.mean),
            fmt_opt(column.min),
            fmt_opt(column.max)
        );
    }

    let evaluation = &result.evaluation;
    println!();
    println!(
        "Least-squares baseline on {} test row(s): R² = {:.4}, RMSE = {:.4}, MAE = {:.4}",
        evaluation.samples, evaluation.r_squared, evaluation.rmse, evaluation.mae
    );

    if let Some((train, test)) = &result.written {
        println!("✓ Train set written to: {}", train.display());
        println!("✓ Test set written to: {}", test.display());
    }

    Ok(())
}
