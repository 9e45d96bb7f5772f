// src/sink/mod.rs

use std::fs;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, WriterBuilder};
use tracing::info;

use crate::error::{Error, Result};
use crate::report::Table;

/// Column name prepended to the header when an extraction date is stamped.
pub const EXTRACTION_DATE_COLUMN: &str = "Extraction Date";

/// Serialize `table` to a delimited file at `path`, every field quoted.
///
/// When `extraction_date` is set, the header gains a leading
/// `"Extraction Date"` column and every data row gains the stamp as its
/// first field. The file is created fresh (no append) and the writer is
/// flushed and closed on every exit path. Missing parent directories are
/// created. Returns the written path.
pub fn write_table(
    path: impl AsRef<Path>,
    table: &Table,
    delimiter: u8,
    extraction_date: Option<&str>,
) -> Result<PathBuf> {
    let path = path.as_ref();
    info!(path = %path.display(), rows = table.rows.len(), "writing report");

    write_inner(path, table, delimiter, extraction_date).map_err(|source| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(path.to_path_buf())
}

fn write_inner(
    path: &Path,
    table: &Table,
    delimiter: u8,
    extraction_date: Option<&str>,
) -> std::result::Result<(), csv::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .from_path(path)?;

    match extraction_date {
        None => {
            writer.write_record(&table.headers)?;
            for row in &table.rows {
                writer.write_record(row)?;
            }
        }
        Some(stamp) => {
            writer.write_record(
                std::iter::once(EXTRACTION_DATE_COLUMN)
                    .chain(table.headers.iter().map(String::as_str)),
            )?;
            for row in &table.rows {
                writer
                    .write_record(std::iter::once(stamp).chain(row.iter().map(String::as_str)))?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}
