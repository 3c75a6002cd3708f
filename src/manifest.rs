use crate::error::{PipelineError, Result};
use log::debug;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "datapackage.json";
const DDF_PREFIX: &str = "ddf--";

/// Package manifest written next to the DDF tables.
#[derive(Debug, Serialize)]
pub struct Datapackage {
    pub name: String,
    pub language: Language,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Serialize)]
pub struct Language {
    pub id: String,
}

/// One DDF table described in the manifest.
#[derive(Debug, Serialize)]
pub struct Resource {
    pub path: String,
    pub name: String,
    pub schema: TableSchema,
}

#[derive(Debug, Serialize)]
pub struct TableSchema {
    pub fields: Vec<FieldInfo>,
    #[serde(rename = "primaryKey")]
    pub primary_key: PrimaryKey,
}

#[derive(Debug, Serialize)]
pub struct FieldInfo {
    pub name: String,
}

/// Concept and entity tables are keyed by a single column; datapoint
/// tables by their dimension columns.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Single(String),
    Composite(Vec<String>),
}

/// Scans the output directory and writes `datapackage.json` describing
/// every DDF table found.
///
/// Resources are sorted by file name and carry the column names read back
/// from each table plus a primary key derived from the DDF file naming
/// convention. Nothing time-dependent goes into the manifest, so repeated
/// runs on unchanged output are byte-identical.
///
/// # Errors
/// A `ddf--` file whose name doesn't parse as a concepts, entities or
/// datapoints table is a manifest error; unreadable files and
/// serialization failures surface as I/O, CSV or JSON errors.
pub fn generate_manifest(out_dir: &Path) -> Result<PathBuf> {
    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(out_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(DDF_PREFIX) && name.ends_with(".csv") {
            names.push(name);
        }
    }
    names.sort();

    let mut resources = Vec::with_capacity(names.len());
    for name in &names {
        resources.push(describe_resource(out_dir, name)?);
    }

    let package = Datapackage {
        name: package_name(out_dir),
        language: Language { id: "en".to_string() },
        resources,
    };

    let path = out_dir.join(MANIFEST_FILE);
    let file = File::create(&path)?;
    serde_json::to_writer_pretty(file, &package)?;
    debug!("{}: {} resources", path.display(), package.resources.len());
    Ok(path)
}

fn describe_resource(out_dir: &Path, file_name: &str) -> Result<Resource> {
    let stem = file_name.strip_suffix(".csv").unwrap_or(file_name);
    let primary_key = primary_key_for(stem).ok_or_else(|| {
        PipelineError::Manifest(format!("unrecognized DDF file name: {file_name}"))
    })?;

    let mut reader = csv::Reader::from_path(out_dir.join(file_name))?;
    let fields = reader
        .headers()?
        .iter()
        .map(|column| FieldInfo {
            name: column.to_string(),
        })
        .collect();

    Ok(Resource {
        path: file_name.to_string(),
        name: stem.to_string(),
        schema: TableSchema {
            fields,
            primary_key,
        },
    })
}

/// Derives the primary key from a DDF file stem: `ddf--concepts--…` is
/// keyed by `concept`, `ddf--entities--<domain>` by the domain, and
/// `ddf--datapoints--<concept>--by--<k…>` by the keys after `by`.
fn primary_key_for(stem: &str) -> Option<PrimaryKey> {
    let parts: Vec<&str> = stem.split("--").collect();
    match parts.as_slice() {
        ["ddf", "concepts", ..] => Some(PrimaryKey::Single("concept".to_string())),
        ["ddf", "entities", domain] => Some(PrimaryKey::Single((*domain).to_string())),
        ["ddf", "datapoints", _, "by", keys @ ..] if !keys.is_empty() => {
            Some(PrimaryKey::Composite(
                keys.iter().map(|key| (*key).to_string()).collect(),
            ))
        }
        _ => None,
    }
}

fn package_name(out_dir: &Path) -> String {
    let canonical = out_dir.canonicalize().unwrap_or_else(|_| out_dir.to_path_buf());
    canonical
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ddf".to_string())
}
