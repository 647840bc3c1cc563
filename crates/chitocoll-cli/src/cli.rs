use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Piotr Wojciechowski",
    version,
    about = "chitocoll - extraction, aggregation and analysis of chitosan/collagen molecular-dynamics reports.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of case directories scanned concurrently.
    /// Overrides `aggregation.workers` from the config file.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub workers: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan every case directory, export per-interaction JSON files and the merged CSV table.
    Extract(ExtractArgs),
    /// Plot one interaction type against the deacetylation degree, one series per case.
    Trend(TrendArgs),
    /// Split the exported table into train/test sets and fit a least-squares baseline.
    Predict(PredictArgs),
}

/// Options shared by the commands that scan the input tree.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Path to the configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Root directory holding the `Wyniki_*` case directories.
    /// Overrides `input.root` from the config file.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Directory receiving the outputs. Overrides `output.directory`.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S merge.final-join=left
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `extract` subcommand.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Skip writing the per-interaction JSON files.
    #[arg(long)]
    pub no_json: bool,
}

/// Arguments for the `trend` subcommand.
#[derive(Args, Debug)]
pub struct TrendArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Interaction type to plot (e.g. 'hydrogen-bonds', 'binding-energy').
    #[arg(short, long, required = true, value_name = "NAME")]
    pub interaction: String,

    /// Case directory to plot (e.g. 'Wyniki_18HYP_1'). Can be used multiple times.
    /// Overrides `trend.cases`; when neither is given every case is plotted.
    #[arg(long = "case", value_name = "DIR")]
    pub cases: Vec<String>,
}

/// Arguments for the `predict` subcommand.
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Path to the configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Exported table to learn from.
    /// Defaults to `<output.directory>/<output.csv-name>` from the config file.
    #[arg(short, long, value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// Target column. Overrides `predict.target`.
    #[arg(short, long, value_name = "COLUMN")]
    pub target: Option<String>,

    /// Fraction of rows held out for testing. Overrides `predict.test-fraction`.
    #[arg(long, value_name = "FLOAT")]
    pub test_fraction: Option<f64>,

    /// Seed of the shuffling generator. Overrides `predict.seed`.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Directory receiving `train.csv` and `test.csv`.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
