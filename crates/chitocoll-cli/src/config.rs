use crate::cli::{ExtractArgs, PredictArgs, ScanArgs, TrendArgs};
use crate::error::{CliError, Result};
use chitocoll::core::io::export::DEFAULT_CSV_NAME;
use chitocoll::core::models::ids::CaseId;
use chitocoll::core::models::interaction::InteractionType;
use chitocoll::engine::config as core_config;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const DEFAULT_OUTPUT_DIR: &str = "Files";

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialInputConfig {
    root: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialOutputConfig {
    directory: Option<PathBuf>,
    #[serde(rename = "csv-name")]
    csv_name: Option<String>,
    #[serde(rename = "write-json")]
    write_json: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialAggregationConfig {
    workers: Option<usize>,
    interactions: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialMergeConfig {
    #[serde(rename = "intermediate-join")]
    intermediate_join: Option<String>,
    #[serde(rename = "final-join")]
    final_join: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, Copy)]
#[serde(deny_unknown_fields)]
struct PartialLayoutConfig {
    #[serde(rename = "header-row")]
    header_row: Option<usize>,
    #[serde(rename = "first-column")]
    first_column: Option<usize>,
    #[serde(rename = "max-rows")]
    max_rows: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialTrendConfig {
    cases: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialPredictConfig {
    target: Option<String>,
    #[serde(rename = "test-fraction")]
    test_fraction: Option<f64>,
    seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    input: Option<PartialInputConfig>,
    output: Option<PartialOutputConfig>,
    aggregation: Option<PartialAggregationConfig>,
    merge: Option<PartialMergeConfig>,
    layouts: Option<BTreeMap<String, PartialLayoutConfig>>,
    trend: Option<PartialTrendConfig>,
    predict: Option<PartialPredictConfig>,
}

/// Scan settings shared by `extract` and `trend`.
struct ScanParts {
    input_root: PathBuf,
    workers: Option<usize>,
    layouts: core_config::LayoutTable,
    output_dir: PathBuf,
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

fn parse_interaction(name: &str) -> Result<InteractionType> {
    name.parse::<InteractionType>()
        .map_err(|e| CliError::Config(e.to_string()))
}

fn parse_join(key: &str, value: &str) -> Result<core_config::JoinKind> {
    value
        .parse::<core_config::JoinKind>()
        .map_err(|e| CliError::Config(format!("{}: {}", key, e)))
}

fn parse_cases(names: &[String]) -> Result<Vec<CaseId>> {
    names
        .iter()
        .map(|name| CaseId::parse_directory_name(name).map_err(|e| CliError::Config(e.to_string())))
        .collect()
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_extract_cli(
        mut self,
        args: &ExtractArgs,
        workers: Option<usize>,
    ) -> Result<core_config::ExtractConfig> {
        self.apply_set_values(&args.scan.set_values)?;
        let scan = self.scan_parts(&args.scan, workers)?;
        let output = self.output.take().unwrap_or_default();
        let aggregation = self.aggregation.take().unwrap_or_default();

        let mut builder = core_config::ExtractConfigBuilder::new()
            .input_root(scan.input_root)
            .layouts(scan.layouts)
            .output_dir(scan.output_dir)
            .merge_policy(Self::merge_policy(self.merge.take())?)
            .write_json(!args.no_json && output.write_json.unwrap_or(true));

        if let Some(workers) = scan.workers {
            builder = builder.workers(workers);
        }
        if let Some(csv_name) = output.csv_name {
            builder = builder.csv_name(csv_name);
        }
        if let Some(names) = aggregation.interactions {
            let interactions = names
                .iter()
                .map(|n| parse_interaction(n))
                .collect::<Result<Vec<_>>>()?;
            builder = builder.interactions(interactions);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn merge_trend_cli(
        mut self,
        args: &TrendArgs,
        workers: Option<usize>,
    ) -> Result<core_config::TrendConfig> {
        self.apply_set_values(&args.scan.set_values)?;
        let scan = self.scan_parts(&args.scan, workers)?;

        let interaction = args
            .interaction
            .parse::<InteractionType>()
            .map_err(|e| CliError::Argument(e.to_string()))?;
        let cases = if args.cases.is_empty() {
            let file_cases = self.trend.take().and_then(|t| t.cases).unwrap_or_default();
            parse_cases(&file_cases)?
        } else {
            parse_cases(&args.cases)?
        };

        let mut builder = core_config::TrendConfigBuilder::new()
            .input_root(scan.input_root)
            .layouts(scan.layouts)
            .output_dir(scan.output_dir)
            .interaction(interaction)
            .cases(cases);
        if let Some(workers) = scan.workers {
            builder = builder.workers(workers);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn merge_predict_cli(mut self, args: &PredictArgs) -> Result<core_config::PredictConfig> {
        self.apply_set_values(&args.set_values)?;
        let output = self.output.take().unwrap_or_default();
        let predict = self.predict.take().unwrap_or_default();

        let input_csv = args.input.clone().unwrap_or_else(|| {
            output
                .directory
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
                .join(output.csv_name.as_deref().unwrap_or(DEFAULT_CSV_NAME))
        });

        let mut builder = core_config::PredictConfigBuilder::new()
            .input_csv(input_csv)
            .output_dir(args.output_dir.clone());
        if let Some(target) = args.target.clone().or(predict.target) {
            builder = builder.target(target);
        }
        if let Some(fraction) = args.test_fraction.or(predict.test_fraction) {
            builder = builder.test_fraction(fraction);
        }
        if let Some(seed) = args.seed.or(predict.seed) {
            builder = builder.seed(seed);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn scan_parts(&mut self, args: &ScanArgs, workers: Option<usize>) -> Result<ScanParts> {
        let input_root = args
            .root
            .clone()
            .or_else(|| self.input.take().and_then(|i| i.root))
            .ok_or_else(|| {
                CliError::Config(
                    "`input.root` is required either in the config file or via --root.".to_string(),
                )
            })?;
        let output_dir = args
            .output_dir
            .clone()
            .or_else(|| self.output.as_mut().and_then(|o| o.directory.take()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let workers = workers.or_else(|| self.aggregation.as_ref().and_then(|a| a.workers));

        Ok(ScanParts {
            input_root,
            workers,
            layouts: Self::layout_table(self.layouts.take())?,
            output_dir,
        })
    }

    fn layout_table(
        partial: Option<BTreeMap<String, PartialLayoutConfig>>,
    ) -> Result<core_config::LayoutTable> {
        let mut table = core_config::LayoutTable::new();
        for (name, p) in partial.unwrap_or_default() {
            let interaction = parse_interaction(&name)?;
            let mut layout = interaction.default_layout();
            if let Some(header_row) = p.header_row {
                layout.header_row = header_row;
            }
            if let Some(first_column) = p.first_column {
                layout.first_column = first_column;
            }
            if let Some(max_rows) = p.max_rows {
                if max_rows == 0 {
                    return Err(CliError::Config(format!(
                        "`layouts.{}.max-rows` must be at least 1",
                        name
                    )));
                }
                layout.max_rows = max_rows;
            }
            table = table.with_override(interaction, layout);
        }
        Ok(table)
    }

    fn merge_policy(partial: Option<PartialMergeConfig>) -> Result<core_config::MergePolicy> {
        let partial = partial.unwrap_or_default();
        let default = core_config::MergePolicy::default();
        Ok(core_config::MergePolicy {
            intermediate: match partial.intermediate_join {
                Some(v) => parse_join("merge.intermediate-join", &v)?,
                None => default.intermediate,
            },
            final_join: match partial.final_join {
                Some(v) => parse_join("merge.final-join", &v)?,
                None => default.final_join,
            },
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "input.root" => {
                    self.input.get_or_insert_with(Default::default).root =
                        Some(PathBuf::from(value_str));
                }
                "output.directory" => {
                    self.output.get_or_insert_with(Default::default).directory =
                        Some(PathBuf::from(value_str));
                }
                "output.csv-name" => {
                    self.output.get_or_insert_with(Default::default).csv_name =
                        Some(value_str.to_string());
                }
                "output.write-json" => {
                    self.output.get_or_insert_with(Default::default).write_json =
                        Some(parse_value(key, value_str)?);
                }
                "aggregation.workers" => {
                    self.aggregation.get_or_insert_with(Default::default).workers =
                        Some(parse_value(key, value_str)?);
                }
                "aggregation.interactions" => {
                    self.aggregation
                        .get_or_insert_with(Default::default)
                        .interactions = Some(
                        value_str
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect(),
                    );
                }
                "merge.intermediate-join" => {
                    self.merge
                        .get_or_insert_with(Default::default)
                        .intermediate_join = Some(value_str.to_string());
                }
                "merge.final-join" => {
                    self.merge.get_or_insert_with(Default::default).final_join =
                        Some(value_str.to_string());
                }
                "predict.target" => {
                    self.predict.get_or_insert_with(Default::default).target =
                        Some(value_str.to_string());
                }
                "predict.test-fraction" => {
                    self.predict
                        .get_or_insert_with(Default::default)
                        .test_fraction = Some(parse_value(key, value_str)?);
                }
                "predict.seed" => {
                    self.predict.get_or_insert_with(Default::default).seed =
                        Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use chitocoll::core::models::interaction::ReportLayout;
    use clap::Parser;
    use core_config::{JoinKind, MergePolicy};
    use once_cell::sync::Lazy;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("Failed to create temp dir"));

    const FULL_CONFIG: &str = r#"
        [input]
        root = "/data/Collagen+Chitosan"

        [output]
        directory = "./out"
        csv-name = "merged.csv"

        [aggregation]
        workers = 4
        interactions = ["hydrogen-bonds", "binding-energy"]

        [merge]
        intermediate-join = "outer"
        final-join = "left"

        [layouts.hydrogen-bonds]
        header-row = 72
        max-rows = 10

        [trend]
        cases = ["Wyniki_0HYP", "Wyniki_18HYP_1"]

        [predict]
        target = "Binding_Energy"
        test-fraction = 0.3
        seed = 42
    "#;

    fn write_config_file(name: &str, content: &str) -> PathBuf {
        let file_path = TEST_DIR.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("chitocoll").chain(args.iter().copied()))
    }

    fn extract_args(cli: Cli) -> ExtractArgs {
        match cli.command {
            Commands::Extract(args) => args,
            other => panic!("Expected 'extract' subcommand, got {:?}", other),
        }
    }

    #[test]
    fn full_file_is_loaded_into_extract_config() {
        let path = write_config_file("full.toml", FULL_CONFIG);
        let cli = parse(&["extract", "-c", path.to_str().unwrap()]);
        let workers = cli.workers;
        let config = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_extract_cli(&extract_args(cli), workers)
            .unwrap();

        assert_eq!(config.scan.input_root, PathBuf::from("/data/Collagen+Chitosan"));
        assert_eq!(config.scan.workers, 4);
        assert_eq!(config.output_dir, PathBuf::from("./out"));
        assert_eq!(config.csv_name, "merged.csv");
        assert_eq!(
            config.interactions,
            [InteractionType::HydrogenBonds, InteractionType::BindingEnergy]
        );
        assert_eq!(
            config.merge_policy,
            MergePolicy {
                intermediate: JoinKind::Outer,
                final_join: JoinKind::Left,
            }
        );
        assert_eq!(
            config.scan.layouts.layout_for(InteractionType::HydrogenBonds),
            ReportLayout::new(72, 27, 8).with_max_rows(10)
        );
        assert_eq!(
            config.scan.layouts.layout_for(InteractionType::IonicInteractions),
            InteractionType::IonicInteractions.default_layout()
        );
    }

    #[test]
    fn cli_arguments_override_file_values() {
        let path = write_config_file("override.toml", FULL_CONFIG);
        let cli = parse(&[
            "-j",
            "2",
            "extract",
            "-c",
            path.to_str().unwrap(),
            "--root",
            "/elsewhere",
            "-o",
            "plots",
            "--no-json",
        ]);
        let workers = cli.workers;
        let config = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_extract_cli(&extract_args(cli), workers)
            .unwrap();

        assert_eq!(config.scan.input_root, PathBuf::from("/elsewhere"));
        assert_eq!(config.scan.workers, 2);
        assert_eq!(config.output_dir, PathBuf::from("plots"));
        assert!(!config.write_json);
    }

    #[test]
    fn set_values_override_file_and_defaults() {
        let path = write_config_file("minimal.toml", "[input]\nroot = \"/data\"\n");
        let cli = parse(&[
            "extract",
            "-c",
            path.to_str().unwrap(),
            "-S",
            "merge.final-join=left",
            "-S",
            "aggregation.workers=3",
            "-S",
            "aggregation.interactions=ionic,hydrophobic",
        ]);
        let config = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_extract_cli(&extract_args(cli), None)
            .unwrap();

        assert_eq!(config.merge_policy.final_join, JoinKind::Left);
        assert_eq!(config.merge_policy.intermediate, JoinKind::Left);
        assert_eq!(config.scan.workers, 3);
        assert_eq!(
            config.interactions,
            [
                InteractionType::IonicInteractions,
                InteractionType::HydrophobicInteractions
            ]
        );
        assert_eq!(config.output_dir, PathBuf::from("Files"));
        assert_eq!(config.csv_name, "All_interactions.csv");
    }

    #[test]
    fn missing_root_returns_error() {
        let path = write_config_file("no_root.toml", "[aggregation]\nworkers = 2\n");
        let cli = parse(&["extract", "-c", path.to_str().unwrap()]);
        let result = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_extract_cli(&extract_args(cli), None);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("input.root")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let path = write_config_file("unknown.toml", "[input]\nroot = \"/data\"\ncolour = \"red\"\n");
        assert!(matches!(
            PartialRunConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));

        let path = write_config_file("unknown_set.toml", "");
        let cli = parse(&["extract", "-c", path.to_str().unwrap(), "--root", "/d", "-S", "trend.colour=red"]);
        let result = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_extract_cli(&extract_args(cli), None);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn invalid_join_kind_is_a_config_error() {
        let path = write_config_file("bad_join.toml", "[merge]\nfinal-join = \"inner\"\n");
        let cli = parse(&["extract", "-c", path.to_str().unwrap(), "--root", "/d"]);
        let result = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_extract_cli(&extract_args(cli), None);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("inner")));
    }

    #[test]
    fn trend_cases_come_from_cli_before_file() {
        let path = write_config_file("trend.toml", FULL_CONFIG);
        let cli = parse(&[
            "trend",
            "-c",
            path.to_str().unwrap(),
            "--interaction",
            "ionic",
            "--case",
            "Wyniki_42HYP",
        ]);
        let Commands::Trend(args) = cli.command else {
            panic!("Expected 'trend' subcommand");
        };
        let config = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_trend_cli(&args, None)
            .unwrap();
        assert_eq!(config.interaction, InteractionType::IonicInteractions);
        assert_eq!(config.cases, [CaseId::new(42, None)]);

        let cli = parse(&["trend", "-c", path.to_str().unwrap(), "-i", "hbonds"]);
        let Commands::Trend(args) = cli.command else {
            panic!("Expected 'trend' subcommand");
        };
        let config = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_trend_cli(&args, None)
            .unwrap();
        assert_eq!(
            config.cases,
            [CaseId::new(0, None), CaseId::new(18, Some(1))]
        );
    }

    #[test]
    fn predict_defaults_to_exported_csv() {
        let path = write_config_file("predict.toml", FULL_CONFIG);
        let cli = parse(&["predict", "-c", path.to_str().unwrap(), "--seed", "7"]);
        let Commands::Predict(args) = cli.command else {
            panic!("Expected 'predict' subcommand");
        };
        let config = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_predict_cli(&args)
            .unwrap();
        assert_eq!(config.input_csv, PathBuf::from("./out").join("merged.csv"));
        assert_eq!(config.test_fraction, 0.3);
        assert_eq!(config.seed, 7);
        assert_eq!(config.target, "Binding_Energy");
        assert!(config.output_dir.is_none());
    }
}
