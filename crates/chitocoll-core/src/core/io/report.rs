use crate::core::io::traits::ReportFile;
use crate::core::models::dataset::Measurement;
use crate::core::models::interaction::{AMINO_ACID_COUNT, InteractionType, ReportLayout};
use std::io::{self, BufRead};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Header row {header_row} not found (file has {lines} non-blank lines)")]
    MissingHeader { header_row: usize, lines: usize },
    #[error("No data rows follow the header")]
    NoDataRows,
    #[error("Line {line} has {found} columns, at least {expected} required")]
    MissingColumns {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Invalid number on line {line}, column {column} (value: '{value}')")]
    InvalidNumber {
        line: usize,
        column: usize,
        value: String,
    },
    #[error("Column {column} contains no numeric values")]
    EmptyColumn { column: usize },
    #[error("Layout reads {found} columns but {interaction} needs {expected}")]
    ColumnCountMismatch {
        interaction: InteractionType,
        expected: usize,
        found: usize,
    },
}

/// Column-wise means of a report window, rounded to two decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeans {
    pub header: Vec<String>,
    pub means: Vec<f64>,
    pub rows_read: usize,
}

impl ColumnMeans {
    pub fn into_measurement(
        self,
        interaction: InteractionType,
    ) -> Result<Measurement, ReportError> {
        let mismatch = |found| ReportError::ColumnCountMismatch {
            interaction,
            expected: interaction.measurement_width(),
            found,
        };
        if interaction.is_per_residue() {
            let block: [f64; AMINO_ACID_COUNT] = self
                .means
                .as_slice()
                .try_into()
                .map_err(|_| mismatch(self.means.len()))?;
            Ok(Measurement::PerResidue(block))
        } else {
            match self.means.as_slice() {
                [energy] => Ok(Measurement::Energy(*energy)),
                other => Err(mismatch(other.len())),
            }
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whitespace-delimited report table as written by the trajectory analysis tool.
pub struct ReportTable;

impl ReportFile for ReportTable {
    type Output = ColumnMeans;
    type Error = ReportError;

    fn read_from(
        reader: &mut impl BufRead,
        layout: &ReportLayout,
    ) -> Result<Self::Output, Self::Error> {
        let columns = layout.columns();
        let mut header: Option<Vec<String>> = None;
        let mut sums = vec![0.0; layout.column_count];
        let mut counts = vec![0usize; layout.column_count];
        let mut rows_read = 0;
        let mut non_blank = 0;

        for (line_idx, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            let row_idx = non_blank;
            non_blank += 1;

            if row_idx < layout.header_row {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < columns.end {
                return Err(ReportError::MissingColumns {
                    line: line_num,
                    expected: columns.end,
                    found: fields.len(),
                });
            }

            if header.is_none() {
                header = Some(fields[columns.clone()].iter().map(|s| s.to_string()).collect());
                continue;
            }

            for (offset, column) in columns.clone().enumerate() {
                let raw = fields[column];
                let value: f64 = raw.parse().map_err(|_| ReportError::InvalidNumber {
                    line: line_num,
                    column,
                    value: raw.to_string(),
                })?;
                if !value.is_nan() {
                    sums[offset] += value;
                    counts[offset] += 1;
                }
            }
            rows_read += 1;
            if rows_read == layout.max_rows {
                break;
            }
        }

        let header = header.ok_or(ReportError::MissingHeader {
            header_row: layout.header_row,
            lines: non_blank,
        })?;
        if rows_read == 0 {
            return Err(ReportError::NoDataRows);
        }

        let means = sums
            .iter()
            .zip(&counts)
            .enumerate()
            .map(|(offset, (sum, count))| match count {
                0 => Err(ReportError::EmptyColumn {
                    column: layout.first_column + offset,
                }),
                n => Ok(round2(sum / *n as f64)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ColumnMeans {
            header,
            means,
            rows_read,
        })
    }
}

/// Reads one report and reduces it to the measurement of `interaction`.
pub fn extract(
    path: &Path,
    interaction: InteractionType,
    layout: &ReportLayout,
) -> Result<Measurement, ReportError> {
    ReportTable::read_from_path(path, layout)?.into_measurement(interaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn energy_report(values: &[f64]) -> String {
        let mut text = String::from("Frame Binding_Energy Extra\n");
        for (i, v) in values.iter().enumerate() {
            text.push_str(&format!("{} {} 0.0\n", i, v));
        }
        text
    }

    fn analysis_report(header_row: usize, rows: &[[f64; 8]], first_column: usize) -> String {
        let mut text = String::new();
        for i in 0..header_row {
            text.push_str(&format!("# preamble line {}\n", i));
        }
        let width = first_column + 8 + 2;
        let header: Vec<String> = (0..width).map(|c| format!("c{}", c)).collect();
        text.push_str(&header.join(" "));
        text.push('\n');
        for row in rows {
            let mut fields: Vec<String> = (0..first_column).map(|c| format!("{}", c)).collect();
            fields.extend(row.iter().map(|v| v.to_string()));
            fields.push("9".into());
            fields.push("9".into());
            text.push_str(&fields.join("\t"));
            text.push('\n');
        }
        text
    }

    fn read(text: &str, layout: &ReportLayout) -> Result<ColumnMeans, ReportError> {
        ReportTable::read_from(&mut Cursor::new(text.as_bytes()), layout)
    }

    #[test]
    fn binding_energy_mean_over_31_rows_is_rounded() {
        let values: Vec<f64> = (0..31).map(|i| -20.0 - i as f64 * 0.337).collect();
        let layout = InteractionType::BindingEnergy.default_layout();
        let result = read(&energy_report(&values), &layout).unwrap();

        let expected = values.iter().sum::<f64>() / 31.0;
        assert_eq!(result.rows_read, 31);
        assert_eq!(result.header, vec!["Binding_Energy".to_string()]);
        assert_eq!(result.means, vec![round2(expected)]);
    }

    #[test]
    fn rows_beyond_max_rows_are_ignored() {
        let mut values = vec![1.0; 31];
        values.extend([1000.0; 5]);
        let layout = InteractionType::BindingEnergy.default_layout();
        let result = read(&energy_report(&values), &layout).unwrap();
        assert_eq!(result.rows_read, 31);
        assert_eq!(result.means, vec![1.0]);
    }

    #[test]
    fn per_residue_window_is_read_after_header_offset() {
        let rows: Vec<[f64; 8]> = (0..31)
            .map(|i| {
                let base = i as f64;
                [base, 1.0, 0.0, 2.0, 0.25, 3.0, 0.0, base / 3.0]
            })
            .collect();
        let layout = InteractionType::HydrogenBonds.default_layout();
        let text = analysis_report(70, &rows, 27);
        let result = read(&text, &layout).unwrap();

        for col in 0..8 {
            let mean = rows.iter().map(|r| r[col]).sum::<f64>() / 31.0;
            assert_eq!(result.means[col], round2(mean), "column {}", col);
        }
        assert_eq!(result.header[0], "c27");
        let measurement = result
            .into_measurement(InteractionType::HydrogenBonds)
            .unwrap();
        assert!(matches!(measurement, Measurement::PerResidue(_)));
    }

    #[test]
    fn blank_lines_do_not_count_toward_header_offset() {
        let layout = ReportLayout::new(2, 1, 1);
        let text = "first\n\n\nsecond\n\nname value\n0 4.0\n\n1 6.0\n";
        let result = read(text, &layout).unwrap();
        assert_eq!(result.means, vec![5.0]);
        assert_eq!(result.rows_read, 2);
    }

    #[test]
    fn short_file_reports_missing_header() {
        let layout = InteractionType::IonicInteractions.default_layout();
        let result = read("a b c\n1 2 3\n", &layout);
        assert!(matches!(
            result,
            Err(ReportError::MissingHeader {
                header_row: 70,
                lines: 2
            })
        ));
    }

    #[test]
    fn header_without_data_reports_no_rows() {
        let layout = InteractionType::BindingEnergy.default_layout();
        assert!(matches!(
            read("Frame Energy\n", &layout),
            Err(ReportError::NoDataRows)
        ));
    }

    #[test]
    fn narrow_row_reports_missing_columns() {
        let layout = InteractionType::BindingEnergy.default_layout();
        let result = read("Frame Energy\n0 -1.0\n1\n", &layout);
        assert!(matches!(
            result,
            Err(ReportError::MissingColumns {
                line: 3,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn non_numeric_cell_reports_position() {
        let layout = InteractionType::BindingEnergy.default_layout();
        let result = read("Frame Energy\n0 -1.0\n1 n/a\n", &layout);
        match result {
            Err(ReportError::InvalidNumber {
                line,
                column,
                value,
            }) => {
                assert_eq!(line, 3);
                assert_eq!(column, 1);
                assert_eq!(value, "n/a");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn nan_cells_are_skipped_in_mean() {
        let layout = InteractionType::BindingEnergy.default_layout();
        let result = read("Frame Energy\n0 -1.0\n1 NaN\n2 -3.0\n", &layout).unwrap();
        assert_eq!(result.means, vec![-2.0]);
    }

    #[test]
    fn wrong_width_is_rejected_for_interaction() {
        let means = ColumnMeans {
            header: vec!["a".into(), "b".into()],
            means: vec![1.0, 2.0],
            rows_read: 1,
        };
        assert!(matches!(
            means.into_measurement(InteractionType::BindingEnergy),
            Err(ReportError::ColumnCountMismatch {
                expected: 1,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn extract_reads_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("col_0HYP_1_chit_125DD_1_pos1_bindenergy_Mg.tab");
        fs::write(&path, energy_report(&[-10.0, -12.0])).unwrap();
        let measurement = extract(
            &path,
            InteractionType::BindingEnergy,
            &InteractionType::BindingEnergy.default_layout(),
        )
        .unwrap();
        assert_eq!(measurement, Measurement::Energy(-11.0));
    }

    #[test]
    fn extract_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = extract(
            &dir.path().join("absent.tab"),
            InteractionType::BindingEnergy,
            &InteractionType::BindingEnergy.default_layout(),
        );
        assert!(matches!(result, Err(ReportError::Io(_))));
    }
}
