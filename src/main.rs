mod canvas;
mod colormap;
mod error;
mod font;
mod layout;
mod linkage;
mod plot;
mod svg;

use clap::error::ErrorKind;
use clap::Parser;
use error::PlotError;
use log::{info, warn};
use plot::{Figure, OutputFormat};
use std::path::PathBuf;

const USAGE: &str = "Usage: dendroplot <linkage_file> <labels_csv> <output_file> <method_name>";

#[derive(Parser)]
#[command(name = "dendroplot", version)]
#[command(about = "Render a dendrogram from a precomputed linkage matrix.", long_about = None)]
struct Args {
    // MANDATORY ARGUMENTS
    /// Load the linkage matrix (left right distance size per row) from this FILE.
    #[arg(value_name = "LINKAGE_FILE")]
    linkage: PathBuf,

    /// Comma-separated leaf labels, one per leaf, in leaf-id order.
    #[arg(value_name = "LABELS_CSV", allow_hyphen_values = true)]
    labels: String,

    /// Write the dendrogram to this FILE (SVG or a raster format based on extension).
    #[arg(value_name = "OUTPUT_FILE")]
    out: PathBuf,

    /// Linkage method name shown in the title.
    #[arg(value_name = "METHOD_NAME", allow_hyphen_values = true)]
    method: String,

    // Figure Options
    /// Set the width in pixels of the output image.
    #[arg(short = 'x', long = "width", value_name = "N", default_value_t = 1200,
          value_parser = clap::value_parser!(u32).range(200..=20000))]
    width: u32,

    /// Set the height in pixels of the output image.
    #[arg(short = 'y', long = "height", value_name = "N", default_value_t = 800,
          value_parser = clap::value_parser!(u32).range(200..=20000))]
    height: u32,

    // Validation Options
    /// Reject linkage matrices whose merge distances decrease.
    #[arg(short = 's', long = "strict")]
    strict: bool,

    // Threading
    /// Number of threads to use for parallel operations.
    #[arg(short = 't', long = "threads", value_name = "N")]
    threads: Option<usize>,

    // Logging
    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

fn run(args: &Args) -> Result<(), PlotError> {
    let (linkage, labels) = linkage::load_inputs(&args.linkage, &args.labels, args.strict)?;

    info!("Computing layout...");
    let layout = layout::compute(&linkage)?;

    let format = OutputFormat::from_path(&args.out)?;
    let figure = Figure::new(args.width, args.height, &args.method, &layout, &labels);

    info!("Rendering {} links...", layout.links.len());
    info!("Saving to {:?}...", args.out);
    plot::render_to_file(&figure, format, &args.out)
}

/// Message printed for a failed run.
fn describe(err: &PlotError) -> String {
    match err {
        PlotError::LinkageUnreadable { .. } | PlotError::DimensionMismatch { .. } => {
            format!("Error: {}", err)
        }
        _ => format!("Unexpected error: {}", err),
    }
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return;
        }
        Err(e) => {
            eprintln!("{}", e.kind());
            println!("{}", USAGE);
            std::process::exit(1);
        }
    };

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
            warn!("Could not configure {} threads: {}", threads, e);
        }
    }

    info!("Starting dendrogram...");

    if let Err(e) = run(&args) {
        println!("{}", describe(&e));
        std::process::exit(1);
    }

    info!("Done.");
}
