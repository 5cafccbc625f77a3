// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flatscan: turn photos of paper into a clean multi-page PDF.
//
// Entry point. Initialises logging, loads settings, builds the scan pipeline
// once, runs one batch and stores the resulting document.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use flatscan_core::ScanConfig;
use flatscan_core::error::FlatscanError;
use flatscan_core::human_errors::humanize_error;
use flatscan_document::{ScanPipeline, Segmenter, SourceImage};

use services::{data_dir, output};

#[derive(Parser, Debug)]
#[command(name = "flatscan")]
#[command(about = "Turn photos of paper documents into one flat, clean PDF")]
#[command(version)]
struct Args {
    /// Photos to scan, in page order
    images: Vec<PathBuf>,

    /// Directory the PDF is written to [default: <data dir>/output]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Settings file [default: <data dir>/config.json when present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Background-removal model (needs the `segment-model` feature)
    #[arg(long, env = "FLATSCAN_MODEL")]
    model: Option<PathBuf>,

    /// Also save every normalized page as a PNG next to the PDF
    #[arg(long)]
    keep_pages: bool,

    /// Print the effective settings as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Scan failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::from(human.severity.exit_code() as u8)
        }
    }
}

fn run(args: Args) -> Result<(), FlatscanError> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::load_or_default(data_dir::config_path())?,
    };
    if let Some(model) = args.model {
        config.segmentation.model_path = Some(model);
    }

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if args.images.is_empty() {
        return Err(FlatscanError::EmptyInput);
    }

    tracing::info!(images = args.images.len(), "Flatscan starting");

    // Load the segmenter once, before any photo is touched.
    let segmenter = build_segmenter(&config)?;
    let pipeline = ScanPipeline::new(config, segmenter);

    let inputs = args
        .images
        .iter()
        .map(SourceImage::open)
        .collect::<Result<Vec<_>, _>>()?;
    let scan = pipeline.process(inputs)?;

    for (index, page) in scan.report.pages.iter().enumerate() {
        tracing::info!(
            page = index + 1,
            source = %page.source,
            rectification = ?page.rectification,
            refined = %page.refined_size,
            "Page summary"
        );
    }

    let out_dir = match args.output_dir {
        Some(dir) => dir,
        None => data_dir::data_subdir("output")?,
    };
    let pages = if args.keep_pages { scan.pages.as_slice() } else { &[] };
    let path = output::store_batch(&out_dir, &scan.document, pages)?;

    println!("{}", path.display());
    Ok(())
}

#[cfg(feature = "segment-model")]
fn build_segmenter(config: &ScanConfig) -> Result<Arc<dyn Segmenter>, FlatscanError> {
    use flatscan_document::{ModelSegmenter, PassthroughSegmenter};

    match config.segmentation.model_path {
        Some(_) => Ok(Arc::new(ModelSegmenter::load(&config.segmentation)?)),
        None => {
            tracing::info!("No segmentation model configured; photos are used as taken");
            Ok(Arc::new(PassthroughSegmenter))
        }
    }
}

#[cfg(not(feature = "segment-model"))]
fn build_segmenter(config: &ScanConfig) -> Result<Arc<dyn Segmenter>, FlatscanError> {
    use flatscan_document::PassthroughSegmenter;

    if let Some(path) = &config.segmentation.model_path {
        return Err(FlatscanError::Config(format!(
            "a segmentation model ({}) is configured but flatscan was built without the \
             `segment-model` feature",
            path.display()
        )));
    }
    Ok(Arc::new(PassthroughSegmenter))
}
