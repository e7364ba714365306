//! CSV output.
//!
//! Every output is UTF-8 CSV with a header row in a declared column order
//! and no index column. Parent directories are created as needed.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{OutputResult, PipelineResult};
use crate::models::{LongTable, Table};
use crate::parser::sheet;

/// Write a header and records to any writer.
pub fn write_csv<W, H, R>(writer: W, headers: &[H], records: R) -> OutputResult<()>
where
    W: Write,
    H: AsRef<str>,
    R: IntoIterator<Item = Vec<String>>,
{
    let mut csv_writer = csv::WriterBuilder::new().flexible(false).from_writer(writer);
    csv_writer.write_record(headers.iter().map(|h| h.as_ref()))?;
    for record in records {
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write a header and records to a file, creating parent directories.
pub fn write_csv_file<H, R>(path: &Path, headers: &[H], records: R) -> OutputResult<()>
where
    H: AsRef<str>,
    R: IntoIterator<Item = Vec<String>>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_csv(BufWriter::new(file), headers, records)
}

/// Write a long-format result.
pub fn write_long_table(path: &Path, table: &LongTable) -> OutputResult<()> {
    write_csv_file(path, &table.columns, table.rows.iter().map(|r| r.to_record()))
}

/// Write a raw table.
pub fn write_table(path: &Path, table: &Table) -> OutputResult<()> {
    write_csv_file(path, &table.headers, table.rows.iter().cloned())
}

/// Convert the first sheet of a workbook to CSV next to it.
///
/// The output path is the input path with its extension replaced by `.csv`.
pub fn convert_spreadsheet(path: &Path) -> PipelineResult<PathBuf> {
    let table = sheet::load_first_sheet(path)?;
    let output = path.with_extension("csv");
    write_table(&output, &table)?;
    Ok(output)
}
