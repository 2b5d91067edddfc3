// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camerate")]
#[command(about = "Composition-guide camera tools: masks, capture correction and overlays")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize a guide mask from a photo
    Analyze {
        /// Source photo
        image: PathBuf,

        /// Output mask path (default: mask_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also store the mask as a preset
        #[arg(long)]
        save: bool,
    },

    /// Capture from an image file through the correction pipeline
    Correct {
        /// Image served as the raw camera frame
        image: PathBuf,

        /// Device orientation at the moment of capture
        #[arg(long, value_enum, default_value = "portrait")]
        orientation: cli::OrientationArg,

        /// Crop ratio as W:H or a decimal width/height
        #[arg(long, value_parser = cli::parse_aspect)]
        aspect: Option<f32>,

        /// EXIF orientation tag (1-8) carried by the raw frame
        #[arg(long, default_value = "1")]
        exif: u8,

        /// Digital zoom factor
        #[arg(long)]
        zoom: Option<f32>,

        /// Capture with the front camera
        #[arg(long)]
        front: bool,

        /// Output file path (default: photo_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage mask presets
    Presets {
        #[command(subcommand)]
        action: PresetCommand,
    },

    /// Draw a mask over a frame as the viewfinder shows it
    Overlay {
        /// Viewfinder frame
        frame: PathBuf,

        /// Mask image
        mask: PathBuf,

        /// Offset in frame pixels as X,Y
        #[arg(long, value_parser = cli::parse_offset, allow_hyphen_values = true)]
        offset: Option<(f32, f32)>,

        /// Uniform scale
        #[arg(long, default_value = "1.0")]
        scale: f32,

        /// Rotation in degrees
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        rotation: f32,

        /// Overlay opacity (0.1-0.9)
        #[arg(long, default_value = "0.4")]
        opacity: f32,

        /// Show the mask's own colours
        #[arg(long)]
        invert: bool,

        /// Output file path (default: overlay_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PresetCommand {
    /// List user and built-in presets
    List,

    /// Store an image as an uploaded preset
    Import {
        image: PathBuf,
    },

    /// Rasterize a JSON stroke drawing and store it
    Draw {
        /// Drawing JSON file
        drawing: PathBuf,

        /// Target width (default: canvas width)
        #[arg(long)]
        width: Option<u32>,

        /// Target height (default: canvas height)
        #[arg(long)]
        height: Option<u32>,
    },

    /// Delete a user preset
    Delete {
        id: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camerate=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { image, output, save } => cli::analyze(image, output, save),
        Commands::Correct {
            image,
            orientation,
            aspect,
            exif,
            zoom,
            front,
            output,
        } => cli::correct(cli::CorrectOptions {
            image,
            orientation,
            aspect,
            exif,
            zoom,
            front,
            output,
        }),
        Commands::Presets { action } => match action {
            PresetCommand::List => cli::list_presets(),
            PresetCommand::Import { image } => cli::import_preset(image),
            PresetCommand::Draw {
                drawing,
                width,
                height,
            } => cli::draw_preset(drawing, width, height),
            PresetCommand::Delete { id } => cli::delete_preset(&id),
        },
        Commands::Overlay {
            frame,
            mask,
            offset,
            scale,
            rotation,
            opacity,
            invert,
            output,
        } => cli::overlay(cli::OverlayOptions {
            frame,
            mask,
            offset,
            scale,
            rotation,
            opacity,
            invert,
            output,
        }),
    }
}
