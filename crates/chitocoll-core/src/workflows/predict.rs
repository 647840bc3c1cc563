use super::extract::ensure_dir;
use crate::core::io::export::ExportError;
use crate::core::stats::regression::{LeastSquares, r_squared};
use crate::engine::config::PredictConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const TRAIN_FILE_NAME: &str = "train.csv";
pub const TEST_FILE_NAME: &str = "test.csv";

/// Exported table split into a numeric target and the remaining feature columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub features: Vec<Vec<Option<f64>>>,
    pub target: Vec<f64>,
    /// Rows dropped because their target was empty or not numeric.
    pub dropped_rows: usize,
}

fn parse_cell(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

impl FeatureTable {
    pub fn from_csv_path(path: &Path, target: &str) -> Result<Self, EngineError> {
        let table_err = |source| EngineError::TableRead {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::Reader::from_path(path).map_err(table_err)?;
        let headers = reader.headers().map_err(table_err)?.clone();

        let target_idx = headers
            .iter()
            .position(|h| h == target)
            .ok_or_else(|| EngineError::MissingColumn(target.to_string()))?;
        let feature_names = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, h)| h.to_string())
            .collect();

        let mut table = FeatureTable {
            feature_names,
            target_name: target.to_string(),
            features: Vec::new(),
            target: Vec::new(),
            dropped_rows: 0,
        };
        for record in reader.records() {
            let record = record.map_err(table_err)?;
            let Some(value) = record.get(target_idx).and_then(parse_cell) else {
                table.dropped_rows += 1;
                continue;
            };
            table.target.push(value);
            table.features.push(
                record
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != target_idx)
                    .map(|(_, cell)| parse_cell(cell))
                    .collect(),
            );
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// `(rows, features)` of the subset selected by `indices`.
    pub fn shape(&self, indices: &[usize]) -> (usize, usize) {
        (indices.len(), self.feature_names.len())
    }

    /// Writes the selected rows with the target as the last column.
    pub fn write_subset(&self, indices: &[usize], path: &Path) -> Result<(), EngineError> {
        let export_err = |e: csv::Error| EngineError::Export {
            path: path.to_path_buf(),
            source: ExportError::Csv(e),
        };
        let mut writer = csv::Writer::from_path(path).map_err(export_err)?;
        writer
            .write_record(self.feature_names.iter().chain(std::iter::once(&self.target_name)))
            .map_err(export_err)?;
        for &i in indices {
            let row = self.features[i]
                .iter()
                .map(|v| v.map(|x| x.to_string()).unwrap_or_default())
                .chain(std::iter::once(self.target[i].to_string()));
            writer.write_record(row).map_err(export_err)?;
        }
        writer.flush().map_err(|e| EngineError::Export {
            path: path.to_path_buf(),
            source: ExportError::Io(e),
        })
    }
}

/// Shuffles `0..rows` with a seeded generator and cuts off `ceil(rows * test_fraction)`
/// indices for testing. Returns `(train, test)`.
pub fn train_test_split(
    rows: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), EngineError> {
    let invalid = || EngineError::InvalidSplit {
        rows,
        fraction: test_fraction,
    };
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(invalid());
    }
    let test_size = (rows as f64 * test_fraction).ceil() as usize;
    if test_size == 0 || test_size >= rows {
        return Err(invalid());
    }

    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let train = indices.split_off(test_size);
    Ok((train, indices))
}

/// Least-squares regression of the target on every feature column, with missing
/// feature values replaced by the training mean of their column.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub column_means: Vec<f64>,
    pub regression: LeastSquares,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub samples: usize,
    pub r_squared: f64,
    pub rmse: f64,
    pub mae: f64,
}

impl LinearModel {
    pub fn fit(table: &FeatureTable, train: &[usize]) -> Result<Self, EngineError> {
        let width = table.feature_names.len();
        let mut sums = vec![0.0; width];
        let mut counts = vec![0usize; width];
        for &i in train {
            for (c, value) in table.features[i].iter().enumerate() {
                if let Some(v) = value {
                    sums[c] += v;
                    counts[c] += 1;
                }
            }
        }
        let column_means: Vec<f64> = sums
            .iter()
            .zip(&counts)
            .map(|(s, &n)| if n == 0 { 0.0 } else { s / n as f64 })
            .collect();

        let rows: Vec<Vec<f64>> = train
            .iter()
            .map(|&i| impute(&table.features[i], &column_means))
            .collect();
        let targets: Vec<f64> = train.iter().map(|&i| table.target[i]).collect();
        let regression = LeastSquares::fit(&rows, &targets)?;

        Ok(Self {
            column_means,
            regression,
        })
    }

    pub fn predict(&self, features: &[Option<f64>]) -> f64 {
        self.regression
            .predict(&impute(features, &self.column_means))
    }

    pub fn evaluate(&self, table: &FeatureTable, rows: &[usize]) -> Result<Evaluation, EngineError> {
        let observed: Vec<f64> = rows.iter().map(|&i| table.target[i]).collect();
        let predicted: Vec<f64> = rows
            .iter()
            .map(|&i| self.predict(&table.features[i]))
            .collect();
        let r_squared = r_squared(&observed, &predicted)?;

        let n = observed.len() as f64;
        let (sq, abs) = observed
            .iter()
            .zip(&predicted)
            .fold((0.0, 0.0), |(sq, abs), (y, p)| {
                (sq + (y - p).powi(2), abs + (y - p).abs())
            });
        Ok(Evaluation {
            samples: observed.len(),
            r_squared,
            rmse: (sq / n).sqrt(),
            mae: abs / n,
        })
    }
}

fn impute(features: &[Option<f64>], means: &[f64]) -> Vec<f64> {
    features
        .iter()
        .zip(means)
        .map(|(v, m)| v.unwrap_or(*m))
        .collect()
}

/// Per-column description of a subset: count of present values, missing count,
/// and mean/min/max over the present values.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescription {
    pub name: String,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

pub fn describe(table: &FeatureTable, rows: &[usize]) -> Vec<ColumnDescription> {
    table
        .feature_names
        .iter()
        .enumerate()
        .map(|(c, name)| {
            let values: Vec<f64> = rows.iter().filter_map(|&i| table.features[i][c]).collect();
            let (mean, min, max) = if values.is_empty() {
                (None, None, None)
            } else {
                (
                    Some(values.iter().sum::<f64>() / values.len() as f64),
                    values.iter().copied().reduce(f64::min),
                    values.iter().copied().reduce(f64::max),
                )
            };
            ColumnDescription {
                name: name.clone(),
                count: values.len(),
                missing: rows.len() - values.len(),
                mean,
                min,
                max,
            }
        })
        .collect()
}

#[derive(Debug)]
pub struct PredictResult {
    pub rows: usize,
    pub dropped_rows: usize,
    pub train_shape: (usize, usize),
    pub test_shape: (usize, usize),
    pub description: Vec<ColumnDescription>,
    pub model: LinearModel,
    pub evaluation: Evaluation,
    /// `(train, test)` files when an output directory was configured.
    pub written: Option<(PathBuf, PathBuf)>,
}

#[instrument(skip_all, name = "predict_workflow")]
pub fn run(config: &PredictConfig, reporter: &ProgressReporter) -> Result<PredictResult, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Load table" });
    let table = FeatureTable::from_csv_path(&config.input_csv, &config.target)?;
    reporter.report(Progress::PhaseFinish);
    info!(
        rows = table.len(),
        dropped = table.dropped_rows,
        features = table.feature_names.len(),
        "Table loaded."
    );
    if table.is_empty() {
        return Err(EngineError::NoData(format!(
            "no row of '{}' has a numeric '{}'",
            config.input_csv.display(),
            config.target
        )));
    }

    let (train, test) = train_test_split(table.len(), config.test_fraction, config.seed)?;
    debug!(train = train.len(), test = test.len(), seed = config.seed, "Split done.");

    reporter.report(Progress::PhaseStart { name: "Fit model" });
    let model = LinearModel::fit(&table, &train)?;
    let evaluation = model.evaluate(&table, &test)?;
    reporter.report(Progress::PhaseFinish);
    info!(
        r_squared = evaluation.r_squared,
        rmse = evaluation.rmse,
        mae = evaluation.mae,
        "Model evaluated on held-out rows."
    );

    let written = match &config.output_dir {
        Some(dir) => {
            ensure_dir(dir)?;
            let train_path = dir.join(TRAIN_FILE_NAME);
            let test_path = dir.join(TEST_FILE_NAME);
            table.write_subset(&train, &train_path)?;
            table.write_subset(&test, &test_path)?;
            Some((train_path, test_path))
        }
        None => None,
    };

    Ok(PredictResult {
        rows: table.len(),
        dropped_rows: table.dropped_rows,
        train_shape: table.shape(&train),
        test_shape: table.shape(&test),
        description: describe(&table, &train),
        model,
        evaluation,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::PredictConfigBuilder;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::tempdir;

    const SAMPLE: &str = "\
HD,DD,Hydrogen_Bonds_ALA,Binding_Energy
0,0.125,1.0,-10.0
0,0.25,,-12.0
0.5,0.5,3.0,
0.5,0.75,4.0,n/a
1,1,5.0,-20.0
";

    fn linear_csv(dir: &Path, rows: usize) -> PathBuf {
        let mut text = String::from("HD,DD,Binding_Energy\n");
        for i in 0..rows {
            let hd = (i % 3) as f64 / 2.0;
            let dd = (i % 7) as f64 / 8.0;
            text.push_str(&format!("{},{},{}\n", hd, dd, -5.0 - 4.0 * hd - 10.0 * dd));
        }
        let path = dir.join("All_interactions.csv");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn rows_without_numeric_target_are_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        fs::write(&path, SAMPLE).unwrap();

        let table = FeatureTable::from_csv_path(&path, "Binding_Energy").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.dropped_rows, 2);
        assert_eq!(table.feature_names, ["HD", "DD", "Hydrogen_Bonds_ALA"]);
        assert_eq!(table.features[1], [Some(0.0), Some(0.25), None]);
        assert_eq!(table.target, [-10.0, -12.0, -20.0]);
    }

    #[test]
    fn unknown_target_column_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        fs::write(&path, SAMPLE).unwrap();
        assert!(matches!(
            FeatureTable::from_csv_path(&path, "Energy"),
            Err(EngineError::MissingColumn(name)) if name == "Energy"
        ));
    }

    #[test]
    fn split_sizes_follow_ceiling_and_cover_all_rows() {
        let (train, test) = train_test_split(11, 0.2, 0).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
        let all: BTreeSet<usize> = train.iter().chain(&test).copied().collect();
        assert_eq!(all, (0..11).collect());
    }

    #[test]
    fn split_is_reproducible_for_a_seed() {
        assert_eq!(
            train_test_split(50, 0.2, 7).unwrap(),
            train_test_split(50, 0.2, 7).unwrap()
        );
        assert_ne!(
            train_test_split(50, 0.2, 7).unwrap(),
            train_test_split(50, 0.2, 8).unwrap()
        );
    }

    #[test]
    fn degenerate_splits_are_rejected() {
        assert!(matches!(
            train_test_split(1, 0.2, 0),
            Err(EngineError::InvalidSplit { rows: 1, .. })
        ));
        assert!(train_test_split(10, 1.0, 0).is_err());
        assert!(train_test_split(10, 0.0, 0).is_err());
        assert!(train_test_split(0, 0.5, 0).is_err());
    }

    #[test]
    fn model_recovers_exact_relation() {
        let dir = tempdir().unwrap();
        let table = FeatureTable::from_csv_path(&linear_csv(dir.path(), 40), "Binding_Energy").unwrap();
        let (train, test) = train_test_split(table.len(), 0.25, 3).unwrap();
        let model = LinearModel::fit(&table, &train).unwrap();

        assert!((model.regression.intercept + 5.0).abs() < 1e-8);
        assert!((model.regression.coefficients[0] + 4.0).abs() < 1e-8);
        assert!((model.regression.coefficients[1] + 10.0).abs() < 1e-8);

        let evaluation = model.evaluate(&table, &test).unwrap();
        assert_eq!(evaluation.samples, 10);
        assert!(evaluation.rmse < 1e-8);
        assert!(evaluation.mae < 1e-8);
        assert!((evaluation.r_squared - 1.0).abs() < 1e-8);
    }

    #[test]
    fn missing_features_are_imputed_with_training_mean() {
        let table = FeatureTable {
            feature_names: vec!["x".to_string()],
            target_name: "y".to_string(),
            features: vec![vec![Some(1.0)], vec![Some(3.0)], vec![None], vec![Some(5.0)]],
            target: vec![2.0, 6.0, 0.0, 10.0],
            dropped_rows: 0,
        };
        let model = LinearModel::fit(&table, &[0, 1, 3]).unwrap();
        assert_eq!(model.column_means, [3.0]);
        assert!((model.predict(&[None]) - 6.0).abs() < 1e-8);
    }

    #[test]
    fn describe_counts_missing_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        fs::write(&path, SAMPLE).unwrap();
        let table = FeatureTable::from_csv_path(&path, "Binding_Energy").unwrap();

        let description = describe(&table, &[0, 1, 2]);
        let aa = &description[2];
        assert_eq!(aa.name, "Hydrogen_Bonds_ALA");
        assert_eq!(aa.count, 2);
        assert_eq!(aa.missing, 1);
        assert_eq!(aa.mean, Some(3.0));
        assert_eq!(aa.min, Some(1.0));
        assert_eq!(aa.max, Some(5.0));
    }

    #[test]
    fn run_writes_both_splits() {
        let dir = tempdir().unwrap();
        let input = linear_csv(dir.path(), 20);
        let out = dir.path().join("ml");
        let config = PredictConfigBuilder::new()
            .input_csv(input)
            .output_dir(Some(out.clone()))
            .build()
            .unwrap();

        let result = run(&config, &ProgressReporter::new()).unwrap();
        assert_eq!(result.rows, 20);
        assert_eq!(result.train_shape, (16, 2));
        assert_eq!(result.test_shape, (4, 2));
        assert_eq!(result.description.len(), 2);

        let (train_path, test_path) = result.written.unwrap();
        assert!(train_path.ends_with("train.csv"));
        let train = fs::read_to_string(&train_path).unwrap();
        let test = fs::read_to_string(&test_path).unwrap();
        assert!(train.starts_with("HD,DD,Binding_Energy"));
        assert_eq!(train.lines().count(), 17);
        assert_eq!(test.lines().count(), 5);
    }
}
