use crate::error::{PipelineError, Result};
use crate::structs::{EtlConfig, SourceRow, SourceTable};
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Columns every source file must carry in its header row.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Variable Name",
    "Variable Id",
    "Area",
    "Area Id",
    "Year",
    "Value",
];

/// Reads every matching file in the source directory into memory.
///
/// A file matches when its name contains the configured filter substring
/// (case-sensitive). Matches are loaded in sorted-name order so every
/// downstream table is reproducible; the per-file parsing itself runs in
/// parallel, which doesn't affect the returned order.
///
/// # Errors
/// A missing or unreadable directory fails the run before anything is
/// written. A directory with no matching files is not an error and loads
/// as an empty set.
pub fn load_source_dir(config: &EtlConfig) -> Result<Vec<SourceTable>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(&config.source_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().contains(&config.file_filter) {
            paths.push(entry.path());
        }
    }
    paths.sort();
    debug!("{} matching files in {}", paths.len(), config.source_dir.display());

    let tables = paths
        .par_iter()
        .map(|path| load_source_file(path, config))
        .collect::<Result<Vec<SourceTable>>>()?;
    for table in &tables {
        debug!("{}: {} data rows", table.path.display(), table.rows.len());
    }
    Ok(tables)
}

/// Parses one source file, discarding the fixed boilerplate around the data.
///
/// Layout contract: `skip_header_rows` metadata rows, one header row, the
/// data rows, then `skip_footer_rows` footer rows. The header must contain
/// every required column.
///
/// # Errors
/// Returns a schema error naming the file when it is too short for the
/// layout or the header misses required columns, and a CSV error when a
/// data row fails to parse (e.g. a non-numeric value).
pub fn load_source_file(path: &Path, config: &EtlConfig) -> Result<SourceTable> {
    // Boilerplate rows don't share the data's field count, hence flexible.
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let records = reader
        .records()
        .collect::<std::result::Result<Vec<StringRecord>, csv::Error>>()?;

    let layout_rows = config.skip_header_rows + config.skip_footer_rows + 1;
    if records.len() < layout_rows {
        return Err(PipelineError::Schema(format!(
            "{}: {} rows, expected at least {} rows of header/footer boilerplate",
            path.display(),
            records.len(),
            layout_rows
        )));
    }

    let header = &records[config.skip_header_rows];
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|required| !header.iter().any(|column| column == *required))
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::Schema(format!(
            "{}: missing required column(s): {}",
            path.display(),
            missing.join(", ")
        )));
    }

    let data = &records[config.skip_header_rows + 1..records.len() - config.skip_footer_rows];
    let rows = data
        .iter()
        .map(|record| record.deserialize::<SourceRow>(Some(header)))
        .collect::<std::result::Result<Vec<SourceRow>, csv::Error>>()?;

    Ok(SourceTable {
        path: path.to_path_buf(),
        rows,
    })
}
