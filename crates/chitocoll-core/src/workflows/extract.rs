use crate::core::io::export::{CsvExport, ExportError, JsonExport, json_file_name};
use crate::core::io::traits::ExportFile;
use crate::core::models::dataset::{Dataset, WideTable};
use crate::core::models::ids::CaseId;
use crate::core::models::interaction::InteractionType;
use crate::engine::aggregate::FileFailure;
use crate::engine::config::ExtractConfig;
use crate::engine::error::EngineError;
use crate::engine::merge::{self, CaseFailure};
use crate::engine::progress::{Progress, ProgressReporter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[derive(Debug)]
pub struct InteractionSummary {
    pub interaction: InteractionType,
    pub records: usize,
    pub file_failures: Vec<FileFailure>,
    pub case_failures: Vec<CaseFailure>,
    pub json_path: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ExtractResult {
    pub cases: Vec<CaseId>,
    pub summaries: Vec<InteractionSummary>,
    pub table: WideTable,
    pub csv_path: PathBuf,
}

impl ExtractResult {
    pub fn total_file_failures(&self) -> usize {
        self.summaries.iter().map(|s| s.file_failures.len()).sum()
    }
}

pub(crate) fn ensure_dir(path: &Path) -> Result<(), EngineError> {
    fs::create_dir_all(path).map_err(|e| EngineError::Export {
        path: path.to_path_buf(),
        source: ExportError::Io(e),
    })
}

fn export<E: ExportFile<Error = ExportError>>(
    input: &E::Input,
    path: PathBuf,
) -> Result<PathBuf, EngineError> {
    E::write_to_path(input, &path).map_err(|source| EngineError::Export {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "Export written.");
    Ok(path)
}

#[instrument(skip_all, name = "extract_workflow")]
pub fn run(config: &ExtractConfig, reporter: &ProgressReporter) -> Result<ExtractResult, EngineError> {
    let cases = merge::discover_cases(&config.scan.input_root)?;
    if cases.is_empty() {
        return Err(EngineError::NoData(format!(
            "no case directories under '{}'",
            config.scan.input_root.display()
        )));
    }
    info!(
        cases = cases.len(),
        interactions = config.interactions.len(),
        workers = config.scan.workers,
        "Starting extraction."
    );
    ensure_dir(&config.output_dir)?;

    let mut datasets: Vec<Dataset> = Vec::with_capacity(config.interactions.len());
    let mut summaries = Vec::with_capacity(config.interactions.len());
    for &interaction in &config.interactions {
        let scan = merge::collect_interaction(&cases, interaction, &config.scan, reporter)?;
        if scan.dataset.is_empty() {
            warn!(interaction = interaction.label(), "No records collected.");
        }

        let json_path = if config.write_json {
            let path = config.output_dir.join(json_file_name(&scan.dataset));
            Some(export::<JsonExport>(&scan.dataset, path)?)
        } else {
            None
        };

        summaries.push(InteractionSummary {
            interaction,
            records: scan.dataset.len(),
            file_failures: scan.failures,
            case_failures: scan.case_failures,
            json_path,
        });
        datasets.push(scan.dataset);
    }

    reporter.report(Progress::PhaseStart { name: "Merge" });
    let table = merge::merge_interactions(&datasets, config.merge_policy)?;
    let csv_path = export::<CsvExport>(&table, config.output_dir.join(&config.csv_name))?;
    reporter.report(Progress::PhaseFinish);

    info!(
        rows = table.len(),
        columns = table.columns().len(),
        "Extraction finished."
    );

    Ok(ExtractResult {
        cases: cases.into_iter().map(|(case, _)| case).collect(),
        summaries,
        table,
        csv_path,
    })
}
