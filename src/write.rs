use crate::error::Result;
use crate::structs::{AreaRow, ConceptRow, DatapointRow, DatapointsBlock, DiscreteConceptRow};
use crate::text::format_float_sigfig;
use csv::Writer;
use log::debug;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Significant digits kept when formatting datapoint values.
const VALUE_SIGNIFICANT_DIGITS: usize = 5;

const CONCEPTS_CONTINUOUS_FILE: &str = "ddf--concepts--continuous.csv";
const CONCEPTS_DISCRETE_FILE: &str = "ddf--concepts--discrete.csv";
const ENTITIES_AREA_FILE: &str = "ddf--entities--area.csv";

fn datapoints_file(concept: &str) -> String {
    format!("ddf--datapoints--{concept}--by--area--year.csv")
}

/// Writes the continuous concept table.
///
/// The header row is always written, so an empty extract still produces a
/// well-formed (header-only) file.
pub fn write_concepts_continuous(concepts: &[ConceptRow], out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(CONCEPTS_CONTINUOUS_FILE);
    let file = File::create(&path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["concept", "concept_type", "name", "variable_id"])?;
    for row in concepts {
        writer.write_record([
            row.concept.as_str(),
            row.concept_type.as_str(),
            row.name.as_str(),
            row.variable_id.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(path)
}

/// Writes the discrete concept table.
pub fn write_concepts_discrete(concepts: &[DiscreteConceptRow], out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(CONCEPTS_DISCRETE_FILE);
    let file = File::create(&path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["concept", "name", "concept_type"])?;
    for row in concepts {
        writer.write_record([row.concept, row.name, row.concept_type])?;
    }

    writer.flush()?;
    Ok(path)
}

/// Writes the area entity table.
pub fn write_entities_area(areas: &[AreaRow], out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(ENTITIES_AREA_FILE);
    let file = File::create(&path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["area", "name", "area_id"])?;
    for row in areas {
        writer.write_record([row.area.as_str(), row.name.as_str(), row.area_id.as_str()])?;
    }

    writer.flush()?;
    Ok(path)
}

/// Drains the datapoint extractor and writes one file per concept.
///
/// Blocks sharing a concept (the same variable coming from several source
/// files) are accumulated into one table. Rows an earlier block already
/// contributed are dropped (first occurrence wins, values compared
/// bitwise); conflicting observations for the same (area, year) are all
/// kept. Values are formatted to a fixed number of significant digits,
/// which is lossy.
///
/// Files are independent of each other, so they are written in parallel;
/// the returned paths keep sorted-concept order.
///
/// # Errors
/// The first `Err` block aborts the drain, and any file that cannot be
/// created or written fails the run.
pub fn write_datapoints<I>(blocks: I, out_dir: &Path) -> Result<Vec<PathBuf>>
where
    I: IntoIterator<Item = Result<DatapointsBlock>>,
{
    let mut merged: BTreeMap<String, Vec<DatapointRow>> = BTreeMap::new();
    for block in blocks {
        let block = block?;
        merged.entry(block.concept).or_default().extend(block.rows);
    }

    // Drop rows another file already contributed, keeping first occurrence.
    for rows in merged.values_mut() {
        let mut seen: HashSet<(String, i32, u64)> = HashSet::new();
        rows.retain(|row| seen.insert((row.area.clone(), row.year, row.value.to_bits())));
    }
    debug!("{} datapoint tables after merging", merged.len());

    let tables: Vec<(String, Vec<DatapointRow>)> = merged.into_iter().collect();
    tables
        .par_iter()
        .map(|(concept, rows)| write_datapoints_table(concept, rows, out_dir))
        .collect::<Result<Vec<PathBuf>>>()
}

fn write_datapoints_table(concept: &str, rows: &[DatapointRow], out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(datapoints_file(concept));
    let file = File::create(&path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["area", "year", concept])?;
    for row in rows {
        writer.write_record(&[
            row.area.clone(),
            row.year.to_string(),
            format_float_sigfig(row.value, VALUE_SIGNIFICANT_DIGITS),
        ])?;
    }

    writer.flush()?;
    Ok(path)
}
