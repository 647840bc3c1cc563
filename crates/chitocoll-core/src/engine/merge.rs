use super::aggregate::{self, FileFailure, ScanOutcome};
use super::config::{JoinKind, MergePolicy, ScanConfig};
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::models::dataset::{Dataset, WideTable};
use crate::core::models::ids::CaseId;
use crate::core::models::interaction::InteractionType;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A case whose report directory could not be scanned at all.
#[derive(Debug, Error)]
#[error("{case}: {error}")]
pub struct CaseFailure {
    pub case: CaseId,
    pub path: PathBuf,
    pub error: EngineError,
}

#[derive(Debug)]
pub struct MergedScan {
    pub dataset: Dataset,
    pub failures: Vec<FileFailure>,
    pub case_failures: Vec<CaseFailure>,
    pub cases_scanned: usize,
}

/// Lists the case directories directly under `root`, sorted by case.
pub fn discover_cases(root: &Path) -> Result<Vec<(CaseId, PathBuf)>, EngineError> {
    let read_err = |source| EngineError::DirectoryRead {
        path: root.to_path_buf(),
        source,
    };
    let mut cases = Vec::new();
    for entry in fs::read_dir(root).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_dir() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match CaseId::parse_directory_name(&name) {
            Ok(case) => cases.push((case, path)),
            Err(e) => debug!("Ignoring directory: {}", e),
        }
    }
    cases.sort();
    Ok(cases)
}

/// Resolves the requested cases under `root`; an empty request means every case found.
pub fn resolve_cases(
    root: &Path,
    requested: &[CaseId],
) -> Result<Vec<(CaseId, PathBuf)>, EngineError> {
    if requested.is_empty() {
        return discover_cases(root);
    }
    requested
        .iter()
        .map(|case| {
            let path = root.join(case.directory_name());
            if path.is_dir() {
                Ok((*case, path))
            } else {
                Err(EngineError::CaseNotFound { case: *case })
            }
        })
        .collect()
}

type CaseResult = (CaseId, PathBuf, Result<ScanOutcome, EngineError>);

fn scan_case(
    case: CaseId,
    case_dir: &Path,
    interaction: InteractionType,
    scan: &ScanConfig,
    reporter: &ProgressReporter,
) -> CaseResult {
    let dir = case_dir.join(interaction.subdirectory());
    let layout = scan.layouts.layout_for(interaction);
    let result = aggregate::aggregate_directory(&dir, interaction, &layout);

    let (records, failures) = match &result {
        Ok(outcome) => (outcome.dataset.len(), outcome.failures.len()),
        Err(_) => (0, 0),
    };
    reporter.report(Progress::CaseScanned {
        case,
        records,
        failures,
    });
    (case, dir, result)
}

#[cfg(feature = "parallel")]
fn dispatch<F>(
    cases: &[(CaseId, PathBuf)],
    workers: usize,
    scan: F,
) -> Result<Vec<CaseResult>, EngineError>
where
    F: Fn(&(CaseId, PathBuf)) -> CaseResult + Send + Sync,
{
    if workers <= 1 || cases.len() <= 1 {
        return Ok(cases.iter().map(scan).collect());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| EngineError::WorkerPool(e.to_string()))?;
    Ok(pool.install(|| cases.par_iter().map(&scan).collect()))
}

#[cfg(not(feature = "parallel"))]
fn dispatch<F>(
    cases: &[(CaseId, PathBuf)],
    _workers: usize,
    scan: F,
) -> Result<Vec<CaseResult>, EngineError>
where
    F: Fn(&(CaseId, PathBuf)) -> CaseResult,
{
    Ok(cases.iter().map(scan).collect())
}

/// Scans one interaction type in every case and concatenates the records.
///
/// Per-case results are combined in case order whether or not they were
/// produced concurrently, so a key present in two cases always resolves to the
/// earlier case.
pub fn collect_interaction(
    cases: &[(CaseId, PathBuf)],
    interaction: InteractionType,
    scan: &ScanConfig,
    reporter: &ProgressReporter,
) -> Result<MergedScan, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: interaction.label(),
    });
    reporter.report(Progress::TaskStart {
        total_steps: cases.len() as u64,
    });

    let results = dispatch(cases, scan.workers, |(case, dir)| {
        scan_case(*case, dir, interaction, scan, reporter)
    })?;

    reporter.report(Progress::TaskFinish);

    let mut combined = ScanOutcome::new(interaction);
    let mut case_failures = Vec::new();
    for (case, dir, result) in results {
        match result {
            Ok(outcome) => {
                let foreign = outcome
                    .dataset
                    .keys()
                    .filter(|key| key.case_id() != case)
                    .count();
                if foreign > 0 {
                    warn!(
                        %case,
                        records = foreign,
                        "Reports describe structures of a different case."
                    );
                }
                combined.extend(outcome);
            }
            Err(error) => {
                warn!(%case, "Case skipped: {}", error);
                reporter.report(Progress::Message(format!("{} skipped: {}", case, error)));
                case_failures.push(CaseFailure {
                    case,
                    path: dir,
                    error,
                });
            }
        }
    }

    info!(
        interaction = interaction.label(),
        records = combined.dataset.len(),
        file_failures = combined.failures.len(),
        case_failures = case_failures.len(),
        "Interaction collected."
    );
    reporter.report(Progress::PhaseFinish);

    Ok(MergedScan {
        dataset: combined.dataset,
        failures: combined.failures,
        case_failures,
        cases_scanned: cases.len(),
    })
}

/// Joins two tables on the structure key, appending the right table's columns.
pub fn join(left: &WideTable, right: &WideTable, kind: JoinKind) -> Result<WideTable, EngineError> {
    if let Some(column) = right.columns.iter().find(|c| left.columns.contains(c)) {
        return Err(EngineError::ColumnCollision {
            column: column.clone(),
        });
    }

    let mut columns = left.columns.clone();
    columns.extend(right.columns.iter().cloned());
    let mut table = WideTable::new(columns);

    let left_blank = vec![None; left.columns.len()];
    let right_blank = vec![None; right.columns.len()];

    let keys: BTreeSet<_> = match kind {
        JoinKind::Left => left.rows.keys().copied().collect(),
        JoinKind::Outer => left.rows.keys().chain(right.rows.keys()).copied().collect(),
    };
    for key in keys {
        let mut row = left.rows.get(&key).unwrap_or(&left_blank).clone();
        row.extend_from_slice(right.rows.get(&key).unwrap_or(&right_blank));
        table.rows.insert(key, row);
    }
    Ok(table)
}

fn merge_rank(interaction: InteractionType) -> u8 {
    match interaction {
        InteractionType::HydrogenBonds => 0,
        InteractionType::HydrophobicInteractions => 1,
        InteractionType::IonicInteractions => 2,
        InteractionType::BindingEnergy => 3,
    }
}

/// Combines per-interaction datasets into one wide table.
///
/// Datasets are joined in the order hydrogen bonds, hydrophobic, ionic, binding
/// energy (whichever are present). Every join but the last uses
/// `policy.intermediate`; the last uses `policy.final_join`.
pub fn merge_interactions(
    datasets: &[Dataset],
    policy: MergePolicy,
) -> Result<WideTable, EngineError> {
    let mut ordered: Vec<&Dataset> = datasets.iter().collect();
    ordered.sort_by_key(|d| merge_rank(d.interaction()));

    let (first, rest) = ordered
        .split_first()
        .ok_or_else(|| EngineError::NoData("no datasets to merge".to_string()))?;

    let mut table = WideTable::from(*first);
    for (i, dataset) in rest.iter().enumerate() {
        let kind = if i + 1 == rest.len() {
            policy.final_join
        } else {
            policy.intermediate
        };
        debug!(
            interaction = dataset.interaction().label(),
            join = %kind,
            "Joining dataset."
        );
        table = join(&table, &WideTable::from(*dataset), kind)?;
    }
    Ok(table)
}
