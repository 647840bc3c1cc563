use crate::core::io::traits::ExportFile;
use crate::core::models::dataset::{Dataset, Measurement, WideTable};
use crate::core::models::interaction::AminoAcid;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use thiserror::Error;

pub const DEFAULT_CSV_NAME: &str = "All_interactions.csv";

/// Identifier columns leading every exported row.
pub const KEY_COLUMNS: [&str; 5] = ["HD", "DD", "Variant_HD", "Variant_DD", "Position"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One row per structure: identifier columns followed by every measurement column.
pub struct CsvExport;

impl ExportFile for CsvExport {
    type Input = WideTable;
    type Error = ExportError;

    fn write_to(input: &WideTable, writer: &mut impl Write) -> Result<(), ExportError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let header = KEY_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .chain(input.columns().iter().cloned());
        csv_writer.write_record(header)?;

        for (key, values) in input.rows() {
            let mut record = vec![
                key.hd().to_string(),
                key.dd().to_string(),
                key.variant_hd.to_string(),
                key.variant_dd.to_string(),
                key.position.to_string(),
            ];
            record.extend(
                values
                    .iter()
                    .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
            );
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
enum JsonValues {
    PerResidue {
        #[serde(rename = "AA")]
        amino_acids: BTreeMap<&'static str, f64>,
    },
    Energy {
        #[serde(rename = "Binding_Energy")]
        binding_energy: f64,
    },
}

#[derive(Debug, Serialize, PartialEq)]
struct JsonStructure {
    #[serde(rename = "Variant_HD")]
    variant_hd: u32,
    #[serde(rename = "Variant_DD")]
    variant_dd: u32,
    #[serde(rename = "Position")]
    position: u32,
    #[serde(flatten)]
    values: JsonValues,
}

type JsonDocument = BTreeMap<String, BTreeMap<String, Vec<JsonStructure>>>;

pub fn hd_key(hd: f64) -> String {
    format!("{:.2}", hd)
}

pub fn dd_key(dd: f64) -> String {
    format!("{:.3}", dd)
}

fn build_document(dataset: &Dataset) -> JsonDocument {
    let mut document = JsonDocument::new();
    for record in dataset.iter() {
        let values = match record.measurement {
            Measurement::Energy(binding_energy) => JsonValues::Energy { binding_energy },
            Measurement::PerResidue(block) => JsonValues::PerResidue {
                amino_acids: AminoAcid::ALL
                    .iter()
                    .map(|aa| aa.code())
                    .zip(block)
                    .collect(),
            },
        };
        document
            .entry(hd_key(record.key.hd()))
            .or_default()
            .entry(dd_key(record.key.dd()))
            .or_default()
            .push(JsonStructure {
                variant_hd: record.key.variant_hd,
                variant_dd: record.key.variant_dd,
                position: record.key.position,
                values,
            });
    }
    document
}

/// Nested `HD -> DD -> [structure]` document of one interaction type.
pub struct JsonExport;

impl ExportFile for JsonExport {
    type Input = Dataset;
    type Error = ExportError;

    fn write_to(input: &Dataset, writer: &mut impl Write) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut *writer, &build_document(input))?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Default JSON file name for a dataset, e.g. `Hydrogen_Bonds.json`.
pub fn json_file_name(dataset: &Dataset) -> String {
    format!("{}.json", dataset.interaction().column_prefix())
}
