use log::{Log, Metadata, Record};
use serde::Deserialize;
use std::path::PathBuf;

/// Simple logger implementation
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        println!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

/// Pipeline configuration: where to read, where to write, and the fixed
/// row layout shared by every source file.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub source_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Substring a file name must contain to be loaded.
    pub file_filter: String,
    /// Boilerplate rows before the header row.
    pub skip_header_rows: usize,
    /// Footer rows discarded from the end of each file.
    pub skip_footer_rows: usize,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("../source"),
            out_dir: PathBuf::from("../.."),
            file_filter: "csv".to_string(),
            skip_header_rows: 2,
            skip_footer_rows: 8,
        }
    }
}

/// One observation row parsed from a source file.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRow {
    #[serde(rename = "Variable Name")]
    pub variable_name: String,
    #[serde(rename = "Variable Id")]
    pub variable_id: String,
    /// Composite `"CODE|Name"` field, split during extraction.
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "Area Id")]
    pub area_id: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Value")]
    pub value: f64,
}

/// The data rows of one source file, with the path they came from for
/// error reporting.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub path: PathBuf,
    pub rows: Vec<SourceRow>,
}

/// Continuous (measure) concept row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptRow {
    pub concept: String,
    pub concept_type: String,
    pub name: String,
    pub variable_id: String,
}

/// Discrete concept row. The set is fixed and documents the schema
/// metadata the source files don't carry themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscreteConceptRow {
    pub concept: &'static str,
    pub name: &'static str,
    pub concept_type: &'static str,
}

/// Area entity row: normalized identifier, display name, and the source
/// "Area Id" value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaRow {
    pub area: String,
    pub name: String,
    pub area_id: String,
}

/// One (area, year, value) observation for a single concept.
#[derive(Debug, Clone, PartialEq)]
pub struct DatapointRow {
    pub area: String,
    pub year: i32,
    pub value: f64,
}

/// Datapoints extracted for one variable of one source table. A variable
/// spanning several files yields one block per file; the writer merges
/// blocks that share a concept.
#[derive(Debug, Clone, PartialEq)]
pub struct DatapointsBlock {
    pub concept: String,
    pub rows: Vec<DatapointRow>,
}

/// Counts reported after a full pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub source_files: usize,
    pub continuous_concepts: usize,
    pub areas: usize,
    pub datapoint_files: usize,
}
