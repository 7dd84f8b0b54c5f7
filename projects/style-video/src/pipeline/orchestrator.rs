// Pipeline orchestrator: drives slicing, stylizing and combining in sequence.

use crate::config::{PipelineConfig, StyleSource};
use crate::pipeline::applier::{ApplierSizes, StyleApplier};
use crate::pipeline::combiner::{combine_frames, CombineStats};
use crate::pipeline::model::StyleModel;
use crate::pipeline::sampler::{slice_frames, SampleStats};
use crate::run_context::RunManifest;
use crate::video::VideoReader;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;

pub fn build_applier(config: &PipelineConfig, model: Box<dyn StyleModel>) -> StyleApplier {
    StyleApplier::new(
        model,
        ApplierSizes::square(config.content_size, config.style_size),
        config.model.cache_dir.clone(),
    )
}

pub fn run_slice(config: &PipelineConfig, reader: &mut dyn VideoReader) -> Result<SampleStats> {
    slice_frames(reader, &config.sampled_frames, config.frame_skip)
}

/// Stylizes the sampled frames on disk, from index 0 up to the first gap.
pub fn run_stylize<M>(config: &PipelineConfig, style: &StyleSource, load_model: M) -> Result<usize>
where
    M: FnOnce() -> Result<Box<dyn StyleModel>>,
{
    let frame_count = config.sampled_frames.contiguous_count();
    if frame_count == 0 {
        anyhow::bail!(
            "No sampled frames in {}",
            config.sampled_frames.dir.display()
        );
    }
    stylize_count(config, style, frame_count, load_model)
}

fn stylize_count<M>(
    config: &PipelineConfig,
    style: &StyleSource,
    frame_count: usize,
    load_model: M,
) -> Result<usize>
where
    M: FnOnce() -> Result<Box<dyn StyleModel>>,
{
    let mut applier = build_applier(config, load_model()?);
    let style_image = applier.load_style(style)?;
    applier.stylize_frames(
        &config.sampled_frames,
        &config.stylized_frames,
        frame_count,
        &style_image,
    )
}

pub fn run_combine(config: &PipelineConfig) -> Result<CombineStats> {
    combine_count(config, None)
}

fn combine_count(config: &PipelineConfig, count: Option<usize>) -> Result<CombineStats> {
    combine_frames(
        &config.stylized_frames,
        count,
        &config.output_video,
        &config.fourcc,
        config.output_fps,
    )
}

/// Slices `video`, stylizes the sampled frames and combines them, then
/// writes the run manifest. The model is only loaded once frames exist.
pub fn run_pipeline<M>(
    config: &PipelineConfig,
    video: &Path,
    reader: &mut dyn VideoReader,
    style: &StyleSource,
    load_model: M,
) -> Result<RunManifest>
where
    M: FnOnce() -> Result<Box<dyn StyleModel>>,
{
    tracing::info!("Stage 1/3: slicing {}", video.display());
    let sampled = run_slice(config, reader).context("Frame slicing failed")?;
    if sampled.frames_written == 0 {
        anyhow::bail!(
            "No frames sampled from {} ({} frames read, skip={})",
            video.display(),
            sampled.frames_read,
            config.frame_skip
        );
    }

    tracing::info!("Stage 2/3: stylizing {} frames", sampled.frames_written);
    let stylized = stylize_count(config, style, sampled.frames_written, load_model)
        .context("Style transfer failed")?;

    tracing::info!("Stage 3/3: combining into {}", config.output_video.display());
    let combined = combine_count(config, Some(stylized)).context("Frame combining failed")?;

    let manifest = RunManifest {
        created_at: Utc::now(),
        source_video: video.to_path_buf(),
        style: style.describe(),
        backend: format!("{:?}", config.backend).to_lowercase(),
        frame_skip: config.frame_skip,
        frames_read: sampled.frames_read,
        frames_sampled: sampled.frames_written,
        frames_stylized: stylized,
        output_video: config.output_video.clone(),
        output_fps: config.output_fps,
        output_width: combined.width,
        output_height: combined.height,
    };
    manifest.write(&config.manifest)?;

    Ok(manifest)
}
