use crate::config::StyleSource;
use crate::pipeline::cache::{ImageCache, ImageKey};
use crate::pipeline::frames::FrameNaming;
use crate::pipeline::fetch::fetch_url;
use crate::pipeline::model::StyleModel;
use crate::pipeline::preprocess::{avg_pool_3x3, load_image, tensor_to_image, ImageTensor};
use crate::video::processor::progress_bar;
use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Image sizes fed to the model, as (width, height).
#[derive(Debug, Clone, Copy)]
pub struct ApplierSizes {
    pub content: (u32, u32),
    pub style: (u32, u32),
}

impl ApplierSizes {
    pub fn square(content: u32, style: u32) -> Self {
        Self {
            content: (content, content),
            style: (style, style),
        }
    }
}

/// Runs the style model over content images. Owns the model for the whole
/// run and the cache of prepared style images.
pub struct StyleApplier {
    model: Box<dyn StyleModel>,
    cache: ImageCache,
    sizes: ApplierSizes,
    download_cache_dir: Option<PathBuf>,
}

impl StyleApplier {
    pub fn new(model: Box<dyn StyleModel>, sizes: ApplierSizes, download_cache_dir: Option<PathBuf>) -> Self {
        Self {
            model,
            cache: ImageCache::new(),
            sizes,
            download_cache_dir,
        }
    }

    /// Loads, normalizes and blurs the style reference. Repeated calls with the
    /// same image path reuse the first result.
    pub fn load_style(&mut self, source: &StyleSource) -> Result<Arc<ImageTensor>> {
        let path = match source {
            StyleSource::File(path) => path.clone(),
            StyleSource::Url(url) => fetch_url(url, self.download_cache_dir.as_deref())?,
        };
        self.load_style_path(&path)
    }

    fn load_style_path(&mut self, path: &Path) -> Result<Arc<ImageTensor>> {
        let key = ImageKey::new(path, self.sizes.style, true);
        let style = self.cache.get_or_load(key, |key| {
            tracing::info!("Loading style image {}", key.path.display());
            let image = load_image(&key.path, key.size, key.preserve_aspect_ratio)?;
            Ok(avg_pool_3x3(&image))
        })?;
        tracing::debug!("{} style images cached", self.cache.len());
        Ok(style)
    }

    pub fn load_content(&self, path: &Path) -> Result<ImageTensor> {
        load_image(path, self.sizes.content, true)
    }

    /// Stylizes one content image and returns it in memory.
    pub fn stylize(&mut self, content_path: &Path, style: &ImageTensor) -> Result<RgbImage> {
        let content = self.load_content(content_path)?;
        let stylized = self
            .model
            .stylize(&content, style)
            .with_context(|| format!("Style transfer failed for {}", content_path.display()))?;
        tracing::debug!(
            "Stylized {} at {}x{}",
            content_path.display(),
            stylized.width(),
            stylized.height()
        );
        tensor_to_image(&stylized)
    }

    /// Stylizes one content image and writes it to `output`.
    pub fn stylize_to_path(
        &mut self,
        content_path: &Path,
        style: &ImageTensor,
        output: &Path,
    ) -> Result<()> {
        let image = self.stylize(content_path, style)?;
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        image
            .save(output)
            .with_context(|| format!("Failed to write stylized image {}", output.display()))
    }

    /// Stylizes frames `0..frame_count` of `input`, writing each to the same
    /// index in `output`. Returns the number of frames written.
    pub fn stylize_frames(
        &mut self,
        input: &FrameNaming,
        output: &FrameNaming,
        frame_count: usize,
        style: &ImageTensor,
    ) -> Result<usize> {
        output.ensure_dir()?;

        let pb = progress_bar(frame_count)?;
        for index in 0..frame_count {
            let content_path = input.path_for(index);
            if !content_path.exists() {
                return Err(anyhow!(
                    "Sampled frame {} missing: {}",
                    index,
                    content_path.display()
                ));
            }
            self.stylize_to_path(&content_path, style, &output.path_for(index))?;
            pb.inc(1);
        }
        pb.finish_with_message("Done");

        tracing::info!(
            "Stylized {} frames into {}",
            frame_count,
            output.dir.display()
        );
        Ok(frame_count)
    }
}
