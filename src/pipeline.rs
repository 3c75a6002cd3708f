use crate::error::Result;
use crate::load::load_source_dir;
use crate::manifest::generate_manifest;
use crate::structs::{EtlConfig, RunSummary};
use crate::transform::{
    extract_concepts_continuous, extract_concepts_discrete, extract_datapoints,
    extract_entities_area,
};
use crate::write::{
    write_concepts_continuous, write_concepts_discrete, write_datapoints, write_entities_area,
};
use log::debug;
use std::fs;

/// Runs the whole conversion: load, extract, write, index.
///
/// Stages run strictly in order and the first failure aborts the run,
/// leaving whatever earlier stages already wrote on disk. An empty source
/// set is not a failure; it produces header-only concept/entity tables,
/// no datapoint files, and a manifest covering what exists.
pub fn run(config: &EtlConfig) -> Result<RunSummary> {
    println!("reading data files...");
    let tables = load_source_dir(config)?;

    fs::create_dir_all(&config.out_dir)?;

    println!("creating concepts files...");
    let continuous = extract_concepts_continuous(&tables);
    let path = write_concepts_continuous(&continuous, &config.out_dir)?;
    debug!("wrote {}", path.display());
    let path = write_concepts_discrete(&extract_concepts_discrete(), &config.out_dir)?;
    debug!("wrote {}", path.display());

    println!("creating entities files...");
    let areas = extract_entities_area(&tables)?;
    let path = write_entities_area(&areas, &config.out_dir)?;
    debug!("wrote {}", path.display());

    println!("creating datapoint files...");
    let datapoint_paths = write_datapoints(extract_datapoints(&tables), &config.out_dir)?;
    for path in &datapoint_paths {
        debug!("wrote {}", path.display());
    }

    println!("creating index file...");
    let path = generate_manifest(&config.out_dir)?;
    debug!("wrote {}", path.display());

    println!("Done.");
    Ok(RunSummary {
        source_files: tables.len(),
        continuous_concepts: continuous.len(),
        areas: areas.len(),
        datapoint_files: datapoint_paths.len(),
    })
}
