//! Open a classification result in the interactive point cloud viewer.
//!
//! ```text
//! cargo run -p caddy-demos --bin view_result -- demos/data/sample_result.json
//! ```
//!
//! Drag to orbit, right-drag (or shift-drag) to pan, middle-drag or scroll
//! to zoom. R resets the camera, F fits it to the data.

use anyhow::{Context, Result};
use caddy_core::ClassificationResult;
use caddy_visualization::{run_viewer, ViewerConfig, WindowOptions};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "view_result", about = "Show the point cloud of a CADDY classification result")]
struct Args {
    /// Classification result JSON file
    result: PathBuf,

    /// Viewer configuration JSON file (scene, camera and controls)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Window width in pixels
    #[arg(long, default_value_t = 1200)]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let result = ClassificationResult::from_path(&args.result)
        .with_context(|| format!("Failed to load classification result {:?}", args.result))?;

    let config = match &args.config {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
            serde_json::from_reader::<_, ViewerConfig>(BufReader::new(file))
                .with_context(|| format!("Failed to parse viewer config {:?}", path))?
        }
        None => ViewerConfig::default(),
    };

    log::info!(
        "{}: {:.1}% confidence, {} points",
        result.predicted_class,
        result.confidence,
        result.point_cloud.as_ref().map_or(0, |cloud| cloud.len())
    );
    for prediction in &result.top_predictions {
        log::info!("  {:<20} {:>6.2}%", prediction.class_name, prediction.probability);
    }

    let options = WindowOptions {
        title: format!("CADDY - {} ({:.1}%)", result.predicted_class, result.confidence),
        width: args.width,
        height: args.height,
        ..WindowOptions::default()
    };

    run_viewer(result.point_cloud(), config, options).context("Viewer failed")?;
    Ok(())
}
