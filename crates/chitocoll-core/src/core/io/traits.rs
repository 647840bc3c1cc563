use crate::core::models::interaction::ReportLayout;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Interface for reading one simulation report through a fixed layout window.
pub trait ReportFile {
    /// The reduced content of one report.
    type Output;

    /// The error type for parsing.
    type Error: Error + From<io::Error>;

    /// Reads and reduces a report from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the window described by `layout` is absent or not numeric.
    fn read_from(
        reader: &mut impl BufRead,
        layout: &ReportLayout,
    ) -> Result<Self::Output, Self::Error>;

    /// Reads and reduces a report from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(
        path: P,
        layout: &ReportLayout,
    ) -> Result<Self::Output, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, layout)
    }
}

/// Interface for serializing aggregated results to an on-disk format.
pub trait ExportFile {
    /// The value being exported.
    type Input: ?Sized;

    /// The error type for serialization.
    type Error: Error + From<io::Error>;

    /// Writes `input` to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying write fails.
    fn write_to(input: &Self::Input, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Writes `input` to a file path, creating or truncating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(input: &Self::Input, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(input, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
