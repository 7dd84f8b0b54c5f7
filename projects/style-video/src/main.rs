mod cli;
mod config;
mod pipeline;
mod run_context;
mod video;

use anyhow::{Context, Result};
use cli::{Args, Command};
use config::PipelineConfig;
use pipeline::model::{OnnxStyleModel, StyleModel};
use pipeline::orchestrator;
use std::path::Path;

fn load_model(config: &PipelineConfig) -> Result<Box<dyn StyleModel>> {
    Ok(Box::new(OnnxStyleModel::load(&config.model)?))
}

fn open_video(path: &Path, config: &PipelineConfig) -> Result<Box<dyn video::VideoReader>> {
    video::open_reader(path, config.backend)
        .with_context(|| format!("Failed to open video at: '{}'", path.display()))
}

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();
    let config = PipelineConfig::from_options(&args.options)?;

    match args.command {
        Command::Run { video, style } => {
            let mut reader = open_video(&video, &config)?;
            let style = config.style_source(style.as_deref());
            let manifest = orchestrator::run_pipeline(
                &config,
                &video,
                reader.as_mut(),
                &style,
                || load_model(&config),
            )?;
            tracing::info!(
                "Wrote {} ({} stylized frames); manifest at {}",
                manifest.output_video.display(),
                manifest.frames_stylized,
                config.manifest.display()
            );
        }
        Command::Slice { video } => {
            let mut reader = open_video(&video, &config)?;
            let stats = orchestrator::run_slice(&config, reader.as_mut())?;
            tracing::info!(
                "Wrote {} frames to {}",
                stats.frames_written,
                config.sampled_frames.dir.display()
            );
        }
        Command::Stylize {
            style,
            content,
            output,
        } => {
            let style = config.style_source(style.as_deref());
            match (content, output) {
                (Some(content), Some(output)) => {
                    let mut applier = orchestrator::build_applier(&config, load_model(&config)?);
                    let style_image = applier.load_style(&style)?;
                    applier.stylize_to_path(&content, &style_image, &output)?;
                    tracing::info!("Wrote {}", output.display());
                }
                _ => {
                    orchestrator::run_stylize(&config, &style, || load_model(&config))?;
                }
            }
        }
        Command::Combine => {
            let stats = orchestrator::run_combine(&config)?;
            tracing::info!(
                "Wrote {} frames ({}x{}) to {}",
                stats.frames_written,
                stats.width,
                stats.height,
                config.output_video.display()
            );
        }
    }

    Ok(())
}
