use clap::Parser;
use lib::{EtlConfig, PipelineError, SimpleLogger, run};
use log::debug;
use std::path::PathBuf;
use std::time::Instant;

static LOGGER: SimpleLogger = SimpleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the raw source CSV files
    #[arg(short, long, default_value = "../source")]
    source_dir: PathBuf,

    /// Directory the DDF package is written to
    #[arg(short, long, default_value = "../..")]
    out_dir: PathBuf,

    /// Substring a source file name must contain to be loaded
    #[arg(long, default_value = "csv")]
    file_filter: String,

    /// Metadata rows before the header row of each source file
    #[arg(long, default_value_t = 2)]
    skip_header_rows: usize,

    /// Footer rows discarded from the end of each source file
    #[arg(long, default_value_t = 8)]
    skip_footer_rows: usize,

    /// Log level for output
    #[arg(long, default_value = "false")]
    debug: bool,
}

fn main() -> Result<(), PipelineError> {
    // Initialize timer and logger
    let total_start = Instant::now();
    log::set_logger(&LOGGER).unwrap();

    // Acquire CLI args
    let args = Args::parse();
    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }

    // UI
    println!("ddf-etl! CSV to DDF dataset pipeline");
    debug!(
        "Source dir: {} | Out dir: {}",
        args.source_dir.display(),
        args.out_dir.display()
    );
    debug!(
        "File filter: {:?} | Row layout: {} header rows, {} footer rows",
        args.file_filter, args.skip_header_rows, args.skip_footer_rows
    );

    let config = EtlConfig {
        source_dir: args.source_dir,
        out_dir: args.out_dir,
        file_filter: args.file_filter,
        skip_header_rows: args.skip_header_rows,
        skip_footer_rows: args.skip_footer_rows,
    };

    let summary = run(&config)?;

    // Show summary
    println!(
        "\nProcessed {} source files: {} concepts, {} areas, {} datapoint files",
        summary.source_files,
        summary.continuous_concepts,
        summary.areas,
        summary.datapoint_files
    );
    println!("Pipeline completed successfully in {:.2?}", total_start.elapsed());

    Ok(())
}
