pub mod error;
pub mod load;
pub mod manifest;
pub mod pipeline;
pub mod structs;
pub mod text;
pub mod transform;
pub mod write;

// Re-export public API
pub use error::{PipelineError, Result};
pub use load::{load_source_dir, load_source_file};
pub use manifest::generate_manifest;
pub use pipeline::run;
pub use structs::{
    AreaRow, ConceptRow, DatapointRow, DatapointsBlock, DiscreteConceptRow, EtlConfig, RunSummary,
    SimpleLogger, SourceRow, SourceTable,
};
pub use text::{format_float_sigfig, to_concept_id};
pub use transform::{
    extract_concepts_continuous, extract_concepts_discrete, extract_datapoints,
    extract_entities_area,
};
pub use write::{
    write_concepts_continuous, write_concepts_discrete, write_datapoints, write_entities_area,
};
