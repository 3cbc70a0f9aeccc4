#![warn(clippy::all, rust_2018_idioms)]

//! Headless batch front end: load an image, apply filter parameters and
//! scripted strokes, write the composite as PNG.
//!
//! ```text
//! photo-markup photo.jpg out.png --state filters.json --strokes marks.json
//! photo-markup photo.jpg print.png --print
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use thiserror::Error;

use photo_markup::{ConfigError, EditorConfig, EditorError, EditorSession, FilterState, Stroke};

#[derive(Parser, Debug)]
#[command(name = "photo-markup", about = "Filter, annotate and export a photo without a GUI")]
struct CliArgs {
    /// Source image (PNG, JPEG, GIF, BMP or WEBP)
    input: PathBuf,

    /// Destination PNG file
    output: PathBuf,

    /// JSON file with filter parameters, e.g. {"contrast": 120, "sharpenLevel": 40}
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,

    /// JSON file with an array of strokes to draw, in order
    #[arg(long, value_name = "FILE")]
    strokes: Option<PathBuf>,

    /// JSON editor config
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Flatten onto the paper colour instead of keeping transparency
    #[arg(long)]
    print: bool,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Config: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Editor(#[from] EditorError),
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Io {
        path: path.to_owned(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let bytes = read(path)?;
    serde_json::from_slice(&bytes).map_err(|source| CliError::Json {
        path: path.to_owned(),
        source,
    })
}

fn run(args: &CliArgs) -> Result<(), CliError> {
    let started = Instant::now();

    let config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    // Batch runs have no UI to keep responsive.
    let config = EditorConfig {
        background_filtering: false,
        ..config
    };
    let mut session = EditorSession::new(config);
    session.load_image(&read(&args.input)?)?;

    if let Some(path) = &args.state {
        let state: FilterState = read_json(path)?;
        session.set_filter_state(state)?;
    }
    session.wait_for_filter();

    if let Some(path) = &args.strokes {
        let strokes: Vec<Stroke> = read_json(path)?;
        for stroke in &strokes {
            session.apply_stroke(stroke)?;
        }
        log::info!("Applied {} strokes", strokes.len());
    }

    let bytes = if args.print {
        session.print_png()?
    } else {
        session.export_png()?
    };
    fs::write(&args.output, &bytes).map_err(|source| CliError::Io {
        path: args.output.clone(),
        source,
    })?;

    log::info!(
        "Wrote {} ({} bytes) in {:.2?}",
        args.output.display(),
        bytes.len(),
        started.elapsed()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
