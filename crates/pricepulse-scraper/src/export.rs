//! CSV artifacts. Every field is quoted so spreadsheet imports never split
//! names containing commas.

use std::io::Write;
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::ScraperError;

/// Writes `header` followed by `rows` to `writer`.
///
/// # Errors
///
/// Returns [`ScraperError::Csv`] if a record cannot be written.
pub fn write_csv<W: Write>(writer: W, header: &[String], rows: &[Vec<String>]) -> Result<(), ScraperError> {
    let mut csv = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);
    csv.write_record(header)?;
    for row in rows {
        csv.write_record(row)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes a CSV file, creating parent directories and replacing any previous
/// artifact.
///
/// # Errors
///
/// Returns [`ScraperError::Io`] if the file or its directory cannot be
/// created, or [`ScraperError::Csv`] if writing fails.
pub fn write_csv_file(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<(), ScraperError> {
    let io_err = |source| ScraperError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = std::fs::File::create(path).map_err(io_err)?;
    write_csv(std::io::BufWriter::new(file), header, rows)
}
