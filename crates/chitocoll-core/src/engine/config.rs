use crate::core::io::export::DEFAULT_CSV_NAME;
use crate::core::models::ids::CaseId;
use crate::core::models::interaction::{InteractionType, ReportLayout};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 0;
pub const DEFAULT_TARGET: &str = "Binding_Energy";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {parameter}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Keeps exactly the keys of the left table.
    Left,
    /// Keeps the union of both tables' keys.
    Outer,
}

#[derive(Debug, Error)]
#[error("Invalid join kind '{0}', expected 'left' or 'outer'")]
pub struct ParseJoinKindError(pub String);

impl FromStr for JoinKind {
    type Err = ParseJoinKindError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "outer" | "full" => Ok(Self::Outer),
            _ => Err(ParseJoinKindError(s.to_string())),
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Left => "left",
                Self::Outer => "outer",
            }
        )
    }
}

/// How successive interaction tables are combined into the wide table.
///
/// Every join but the last uses `intermediate`; the last uses `final_join`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    pub intermediate: JoinKind,
    pub final_join: JoinKind,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            intermediate: JoinKind::Left,
            final_join: JoinKind::Outer,
        }
    }
}

/// Report windows per interaction type, falling back to the built-in layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutTable {
    overrides: HashMap<InteractionType, ReportLayout>,
}

impl LayoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, interaction: InteractionType, layout: ReportLayout) -> Self {
        self.overrides.insert(interaction, layout);
        self
    }

    pub fn layout_for(&self, interaction: InteractionType) -> ReportLayout {
        self.overrides
            .get(&interaction)
            .copied()
            .unwrap_or_else(|| interaction.default_layout())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub input_root: PathBuf,
    pub workers: usize,
    pub layouts: LayoutTable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    pub scan: ScanConfig,
    pub interactions: Vec<InteractionType>,
    pub merge_policy: MergePolicy,
    pub output_dir: PathBuf,
    pub csv_name: String,
    pub write_json: bool,
}

#[derive(Default)]
pub struct ExtractConfigBuilder {
    input_root: Option<PathBuf>,
    workers: Option<usize>,
    layouts: Option<LayoutTable>,
    interactions: Option<Vec<InteractionType>>,
    merge_policy: Option<MergePolicy>,
    output_dir: Option<PathBuf>,
    csv_name: Option<String>,
    write_json: Option<bool>,
}

fn validate_workers(workers: usize) -> Result<usize, ConfigError> {
    if workers == 0 {
        return Err(ConfigError::InvalidParameter {
            parameter: "workers",
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(workers)
}

impl ExtractConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_root(mut self, path: PathBuf) -> Self {
        self.input_root = Some(path);
        self
    }
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }
    pub fn layouts(mut self, layouts: LayoutTable) -> Self {
        self.layouts = Some(layouts);
        self
    }
    pub fn interactions(mut self, interactions: Vec<InteractionType>) -> Self {
        self.interactions = Some(interactions);
        self
    }
    pub fn merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = Some(policy);
        self
    }
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
    pub fn csv_name(mut self, name: String) -> Self {
        self.csv_name = Some(name);
        self
    }
    pub fn write_json(mut self, enabled: bool) -> Self {
        self.write_json = Some(enabled);
        self
    }

    pub fn build(self) -> Result<ExtractConfig, ConfigError> {
        let interactions = self
            .interactions
            .unwrap_or_else(|| InteractionType::ALL.to_vec());
        if interactions.is_empty() {
            return Err(ConfigError::InvalidParameter {
                parameter: "interactions",
                reason: "at least one interaction type is required".to_string(),
            });
        }
        for (i, interaction) in interactions.iter().enumerate() {
            if interactions[..i].contains(interaction) {
                return Err(ConfigError::InvalidParameter {
                    parameter: "interactions",
                    reason: format!("'{}' is listed twice", interaction.config_name()),
                });
            }
        }

        Ok(ExtractConfig {
            scan: ScanConfig {
                input_root: self
                    .input_root
                    .ok_or(ConfigError::MissingParameter("input_root"))?,
                workers: validate_workers(self.workers.unwrap_or(DEFAULT_WORKERS))?,
                layouts: self.layouts.unwrap_or_default(),
            },
            interactions,
            merge_policy: self.merge_policy.unwrap_or_default(),
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            csv_name: self.csv_name.unwrap_or_else(|| DEFAULT_CSV_NAME.to_string()),
            write_json: self.write_json.unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendConfig {
    pub scan: ScanConfig,
    pub interaction: InteractionType,
    /// Cases plotted as separate series; empty means every discovered case.
    pub cases: Vec<CaseId>,
    pub output_dir: PathBuf,
}

#[derive(Default)]
pub struct TrendConfigBuilder {
    input_root: Option<PathBuf>,
    workers: Option<usize>,
    layouts: Option<LayoutTable>,
    interaction: Option<InteractionType>,
    cases: Option<Vec<CaseId>>,
    output_dir: Option<PathBuf>,
}

impl TrendConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_root(mut self, path: PathBuf) -> Self {
        self.input_root = Some(path);
        self
    }
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }
    pub fn layouts(mut self, layouts: LayoutTable) -> Self {
        self.layouts = Some(layouts);
        self
    }
    pub fn interaction(mut self, interaction: InteractionType) -> Self {
        self.interaction = Some(interaction);
        self
    }
    pub fn cases(mut self, cases: Vec<CaseId>) -> Self {
        self.cases = Some(cases);
        self
    }
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }

    pub fn build(self) -> Result<TrendConfig, ConfigError> {
        Ok(TrendConfig {
            scan: ScanConfig {
                input_root: self
                    .input_root
                    .ok_or(ConfigError::MissingParameter("input_root"))?,
                workers: validate_workers(self.workers.unwrap_or(DEFAULT_WORKERS))?,
                layouts: self.layouts.unwrap_or_default(),
            },
            interaction: self
                .interaction
                .ok_or(ConfigError::MissingParameter("interaction"))?,
            cases: self.cases.unwrap_or_default(),
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictConfig {
    pub input_csv: PathBuf,
    pub target: String,
    pub test_fraction: f64,
    pub seed: u64,
    pub output_dir: Option<PathBuf>,
}

#[derive(Default)]
pub struct PredictConfigBuilder {
    input_csv: Option<PathBuf>,
    target: Option<String>,
    test_fraction: Option<f64>,
    seed: Option<u64>,
    output_dir: Option<PathBuf>,
}

impl PredictConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_csv(mut self, path: PathBuf) -> Self {
        self.input_csv = Some(path);
        self
    }
    pub fn target(mut self, column: String) -> Self {
        self.target = Some(column);
        self
    }
    pub fn test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = Some(fraction);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn output_dir(mut self, path: Option<PathBuf>) -> Self {
        self.output_dir = path;
        self
    }

    pub fn build(self) -> Result<PredictConfig, ConfigError> {
        let test_fraction = self.test_fraction.unwrap_or(DEFAULT_TEST_FRACTION);
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "test_fraction",
                reason: format!("{} is not strictly between 0 and 1", test_fraction),
            });
        }
        Ok(PredictConfig {
            input_csv: self
                .input_csv
                .ok_or(ConfigError::MissingParameter("input_csv"))?,
            target: self.target.unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            test_fraction,
            seed: self.seed.unwrap_or(DEFAULT_SEED),
            output_dir: self.output_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_builder_applies_defaults() {
        let config = ExtractConfigBuilder::new()
            .input_root(PathBuf::from("/data"))
            .output_dir(PathBuf::from("./Files"))
            .build()
            .unwrap();
        assert_eq!(config.scan.workers, 8);
        assert_eq!(config.interactions, InteractionType::ALL.to_vec());
        assert_eq!(config.merge_policy, MergePolicy::default());
        assert_eq!(config.csv_name, "All_interactions.csv");
        assert!(config.write_json);
    }

    #[test]
    fn extract_builder_requires_input_root() {
        let result = ExtractConfigBuilder::new()
            .output_dir(PathBuf::from("out"))
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("input_root")));
    }

    #[test]
    fn extract_builder_rejects_duplicate_interactions() {
        let result = ExtractConfigBuilder::new()
            .input_root(PathBuf::from("/data"))
            .output_dir(PathBuf::from("out"))
            .interactions(vec![
                InteractionType::HydrogenBonds,
                InteractionType::HydrogenBonds,
            ])
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                parameter: "interactions",
                ..
            })
        ));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let result = TrendConfigBuilder::new()
            .input_root(PathBuf::from("/data"))
            .output_dir(PathBuf::from("out"))
            .interaction(InteractionType::HydrogenBonds)
            .workers(0)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                parameter: "workers",
                ..
            })
        ));
    }

    #[test]
    fn predict_builder_validates_fraction() {
        for bad in [0.0, 1.0, -0.5, f64::NAN] {
            let result = PredictConfigBuilder::new()
                .input_csv(PathBuf::from("a.csv"))
                .test_fraction(bad)
                .build();
            assert!(result.is_err(), "fraction {} accepted", bad);
        }
        let config = PredictConfigBuilder::new()
            .input_csv(PathBuf::from("a.csv"))
            .build()
            .unwrap();
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.seed, 0);
        assert_eq!(config.target, "Binding_Energy");
    }

    #[test]
    fn layout_table_falls_back_to_defaults() {
        let custom = ReportLayout::new(72, 27, 8).with_max_rows(10);
        let table = LayoutTable::new().with_override(InteractionType::HydrogenBonds, custom);
        assert_eq!(table.layout_for(InteractionType::HydrogenBonds), custom);
        assert_eq!(
            table.layout_for(InteractionType::IonicInteractions),
            InteractionType::IonicInteractions.default_layout()
        );
    }

    #[test]
    fn join_kind_parses_case_insensitively() {
        assert_eq!("LEFT".parse::<JoinKind>().unwrap(), JoinKind::Left);
        assert_eq!("outer".parse::<JoinKind>().unwrap(), JoinKind::Outer);
        assert!("inner".parse::<JoinKind>().is_err());
    }
}
