use crate::core::io::filename::{self, FilenameError};
use crate::core::io::report::{self, ReportError};
use crate::core::models::dataset::{Dataset, StructureRecord};
use crate::core::models::ids::StructureKey;
use crate::core::models::interaction::{InteractionType, ReportLayout};
use crate::engine::error::EngineError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum FailureKind {
    #[error("filename not decodable: {0}")]
    Decode(#[from] FilenameError),
    #[error("report not readable: {0}")]
    Extract(#[from] ReportError),
    #[error("duplicate structure {key} (first seen in '{first}')", first = first.display())]
    DuplicateKey { key: StructureKey, first: PathBuf },
}

/// A report that did not contribute a record.
#[derive(Debug, Error)]
#[error("{}: {kind}", path.display())]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
}

impl FileFailure {
    pub fn is_decode(&self) -> bool {
        matches!(self.kind, FailureKind::Decode(_))
    }

    pub fn is_extract(&self) -> bool {
        matches!(self.kind, FailureKind::Extract(_))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self.kind, FailureKind::DuplicateKey { .. })
    }
}

/// Records and failures of one directory scan.
#[derive(Debug)]
pub struct ScanOutcome {
    pub dataset: Dataset,
    /// File each record was reduced from.
    pub sources: BTreeMap<StructureKey, PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl ScanOutcome {
    pub fn new(interaction: InteractionType) -> Self {
        Self {
            dataset: Dataset::new(interaction),
            sources: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    /// Adds a record, turning a key collision into a failure for `path`.
    pub fn absorb(&mut self, path: PathBuf, record: StructureRecord) {
        match self.dataset.insert(record) {
            Ok(()) => {
                self.sources.insert(record.key, path);
            }
            Err(rejected) => {
                let first = self
                    .sources
                    .get(&rejected.key)
                    .cloned()
                    .unwrap_or_default();
                warn!(key = %rejected.key, path = %path.display(), "Duplicate structure key.");
                self.failures.push(FileFailure {
                    path,
                    kind: FailureKind::DuplicateKey {
                        key: rejected.key,
                        first,
                    },
                });
            }
        }
    }

    pub fn fail(&mut self, path: PathBuf, kind: FailureKind) {
        debug!(path = %path.display(), error = %kind, "Skipping report.");
        self.failures.push(FileFailure { path, kind });
    }

    /// Moves everything from `other` into `self`, preserving failure order.
    pub fn extend(&mut self, other: ScanOutcome) {
        let ScanOutcome {
            dataset,
            mut sources,
            failures,
        } = other;
        self.failures.extend(failures);
        for record in dataset.iter() {
            let path = sources.remove(&record.key).unwrap_or_default();
            self.absorb(path, record);
        }
    }
}

fn list_report_files(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let read_err = |source| EngineError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn process_file(
    path: &Path,
    interaction: InteractionType,
    layout: &ReportLayout,
) -> Result<StructureRecord, FailureKind> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let key = filename::decode(&name)?;
    let measurement = report::extract(path, interaction, layout)?;
    Ok(StructureRecord { key, measurement })
}

/// Reduces every report directly inside `dir` to one record.
///
/// Files are visited in name order. A file whose name or content cannot be
/// decoded is recorded as a failure and the scan continues; only an unreadable
/// directory aborts.
#[instrument(skip(layout), fields(dir = %dir.display()))]
pub fn aggregate_directory(
    dir: &Path,
    interaction: InteractionType,
    layout: &ReportLayout,
) -> Result<ScanOutcome, EngineError> {
    let files = list_report_files(dir)?;
    debug!(files = files.len(), "Listing complete.");

    let mut outcome = ScanOutcome::new(interaction);
    for path in files {
        match process_file(&path, interaction, layout) {
            Ok(record) => outcome.absorb(path, record),
            Err(kind) => outcome.fail(path, kind),
        }
    }

    if !outcome.failures.is_empty() {
        warn!(
            records = outcome.dataset.len(),
            failures = outcome.failures.len(),
            "Directory scanned with failures."
        );
    }
    Ok(outcome)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::core::models::dataset::Measurement;
    use tempfile::tempdir;

    #[test]
    fn every_valid_file_yields_one_record() {
        let dir = tempdir().unwrap();
        write_energy_report(dir.path(), &key(0, 1, 125, 1), -10.0);
        write_energy_report(dir.path(), &key(0, 1, 125, 2), -12.5);
        write_energy_report(dir.path(), &key(0, 1, 250, 1), -14.0);

        let layout = InteractionType::BindingEnergy.default_layout();
        let outcome =
            aggregate_directory(dir.path(), InteractionType::BindingEnergy, &layout).unwrap();

        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.dataset.len(), 3);
        assert_eq!(
            outcome.dataset.get(&key(0, 1, 125, 2)),
            Some(&Measurement::Energy(-12.5))
        );
        assert_eq!(outcome.sources.len(), 3);
    }

    #[test]
    fn undecodable_filename_is_reported_not_fatal() {
        let dir = tempdir().unwrap();
        write_energy_report(dir.path(), &key(42, 1, 500, 1), -9.0);
        fs::write(dir.path().join("col_42HYP_1_chit_500DD.tab"), "Frame Energy\n0 1\n").unwrap();

        let layout = InteractionType::BindingEnergy.default_layout();
        let outcome =
            aggregate_directory(dir.path(), InteractionType::BindingEnergy, &layout).unwrap();

        assert_eq!(outcome.dataset.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        let failure = &outcome.failures[0];
        assert!(failure.is_decode());
        assert!(matches!(
            failure.kind,
            FailureKind::Decode(FilenameError::TooFewTokens { found: 3 })
        ));
        assert!(failure.path.ends_with("col_42HYP_1_chit_500DD.tab"));
    }

    #[test]
    fn malformed_content_is_reported_per_file() {
        let dir = tempdir().unwrap();
        write_energy_report(dir.path(), &key(0, 1, 125, 1), -10.0);
        let bad = filename::encode(&key(0, 1, 125, 2), InteractionType::BindingEnergy);
        fs::write(dir.path().join(&bad), "Frame Energy\n0 oops\n").unwrap();

        let layout = InteractionType::BindingEnergy.default_layout();
        let outcome =
            aggregate_directory(dir.path(), InteractionType::BindingEnergy, &layout).unwrap();

        assert_eq!(outcome.dataset.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].is_extract());
    }

    #[test]
    fn colliding_keys_keep_first_file_in_name_order() {
        let dir = tempdir().unwrap();
        let text = "Frame Energy\n0 -1.0\n";
        fs::write(dir.path().join("a_0HYP_1_125DD_1_pos1.tab"), text).unwrap();
        fs::write(dir.path().join("b_0HYP_1_125DD_1_pos1.tab"), text).unwrap();

        let layout = InteractionType::BindingEnergy.default_layout();
        let outcome =
            aggregate_directory(dir.path(), InteractionType::BindingEnergy, &layout).unwrap();

        assert_eq!(outcome.dataset.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].is_duplicate());
        assert!(outcome.failures[0].path.ends_with("b_0HYP_1_125DD_1_pos1.tab"));
        match &outcome.failures[0].kind {
            FailureKind::DuplicateKey { first, .. } => {
                assert!(first.ends_with("a_0HYP_1_125DD_1_pos1.tab"));
            }
            other => panic!("unexpected failure: {:?}", other),
        }
    }

    #[test]
    fn subdirectories_are_not_descended() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested_1_2_3_4_5");
        fs::create_dir(&nested).unwrap();
        write_energy_report(&nested, &key(0, 1, 125, 1), -10.0);

        let layout = InteractionType::BindingEnergy.default_layout();
        let outcome =
            aggregate_directory(dir.path(), InteractionType::BindingEnergy, &layout).unwrap();
        assert!(outcome.dataset.is_empty());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let layout = InteractionType::HydrogenBonds.default_layout();
        let result = aggregate_directory(
            &dir.path().join("absent"),
            InteractionType::HydrogenBonds,
            &layout,
        );
        assert!(matches!(result, Err(EngineError::DirectoryRead { .. })));
    }

    #[test]
    fn analysis_reports_yield_per_residue_means() {
        let dir = tempdir().unwrap();
        let block = [1.0, 0.5, 0.0, 2.0, 0.0, 1.5, 0.0, 3.0];
        write_analysis_report(
            dir.path(),
            &key(18, 2, 750, 1),
            InteractionType::HydrophobicInteractions,
            block,
        );

        let layout = InteractionType::HydrophobicInteractions.default_layout();
        let outcome = aggregate_directory(
            dir.path(),
            InteractionType::HydrophobicInteractions,
            &layout,
        )
        .unwrap();
        assert_eq!(
            outcome.dataset.get(&key(18, 2, 750, 1)),
            Some(&Measurement::PerResidue(block))
        );
    }
}
