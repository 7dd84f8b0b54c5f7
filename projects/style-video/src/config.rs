use crate::cli::PipelineOptions;
use crate::pipeline::fetch::is_url;
use crate::pipeline::frames::FrameNaming;
use crate::video::Backend;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL_REPO: &str = "magenta/arbitrary-image-stylization-v1-256";
pub const DEFAULT_MODEL_FILE: &str = "model.onnx";
pub const DEFAULT_STYLE_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/0/0a/The_Great_Wave_off_Kanagawa.jpg";

/// Where the pretrained model comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    File(PathBuf),
    Url(String),
    Hub { repo: String, file: String },
}

/// Where the style reference image comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleSource {
    File(PathBuf),
    Url(String),
}

impl StyleSource {
    /// `http://` and `https://` values are downloaded; anything else is a path.
    pub fn parse(value: &str) -> Self {
        if is_url(value) {
            StyleSource::Url(value.to_string())
        } else {
            StyleSource::File(PathBuf::from(value))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            StyleSource::File(path) => path.display().to_string(),
            StyleSource::Url(url) => url.clone(),
        }
    }
}

/// Everything a model or style fetch needs to know.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub source: ModelSource,
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub frame_skip: usize,
    pub output_fps: f64,
    pub backend: Backend,
    pub sampled_frames: FrameNaming,
    pub stylized_frames: FrameNaming,
    pub output_video: PathBuf,
    pub fourcc: String,
    pub model: ModelConfig,
    pub default_style: String,
    pub content_size: u32,
    pub style_size: u32,
    pub manifest: PathBuf,
}

impl PipelineConfig {
    pub fn from_options(options: &PipelineOptions) -> Result<Self> {
        let cache_dir = match &options.model_cache_dir {
            Some(dir) => Some(dir.clone()),
            None => read_cache_dir_override(&options.path_info)?,
        };

        if let Some(dir) = &cache_dir {
            tracing::info!("Model cache directory: {}", dir.display());
        }

        let source = match options.model.as_deref() {
            Some(url) if is_url(url) => ModelSource::Url(url.to_string()),
            Some(path) => ModelSource::File(PathBuf::from(path)),
            None => ModelSource::Hub {
                repo: options.model_repo.clone(),
                file: options.model_file.clone(),
            },
        };

        if options.fourcc.len() != 4 || !options.fourcc.is_ascii() {
            anyhow::bail!("FourCC must be exactly 4 ASCII characters, got {:?}", options.fourcc);
        }
        if options.output_fps <= 0.0 {
            anyhow::bail!("Output frame rate must be positive, got {}", options.output_fps);
        }

        Ok(Self {
            frame_skip: options.frame_skip,
            output_fps: options.output_fps,
            backend: options.backend,
            sampled_frames: FrameNaming::new(&options.frames_dir, "testframe", "jpg"),
            stylized_frames: FrameNaming::new(&options.output_frames_dir, "outputframe", "jpg"),
            output_video: options.output_video.clone(),
            fourcc: options.fourcc.clone(),
            model: ModelConfig { source, cache_dir },
            default_style: options.default_style.clone(),
            content_size: options.content_size,
            style_size: options.style_size,
            manifest: options.manifest.clone(),
        })
    }

    /// Resolves the style reference: an explicit path or URL wins over the
    /// default style image.
    pub fn style_source(&self, style: Option<&str>) -> StyleSource {
        StyleSource::parse(style.unwrap_or(&self.default_style))
    }
}

/// Reads the cache directory override from the first line of the path info file.
/// A missing file or an empty first line means no override.
pub fn read_cache_dir_override(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        tracing::debug!("No path info file at {}", path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read path info file: {}", path.display()))?;
    let first = content.lines().next().unwrap_or("").trim();

    if first.is_empty() {
        Ok(None)
    } else {
        Ok(Some(PathBuf::from(first)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    fn options(extra: &[&str]) -> PipelineOptions {
        let mut argv = vec!["style-video", "combine"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv).options
    }

    #[test]
    fn test_path_info_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let info = dir.path().join("path_info.txt");

        fs::write(&info, "  /tmp/hub-cache  \nignored\n").unwrap();
        assert_eq!(
            read_cache_dir_override(&info).unwrap(),
            Some(PathBuf::from("/tmp/hub-cache"))
        );

        fs::write(&info, "\n/tmp/second-line\n").unwrap();
        assert_eq!(read_cache_dir_override(&info).unwrap(), None);

        fs::write(&info, "").unwrap();
        assert_eq!(read_cache_dir_override(&info).unwrap(), None);

        assert_eq!(
            read_cache_dir_override(&dir.path().join("missing.txt")).unwrap(),
            None
        );
    }

    #[test]
    fn test_cli_cache_dir_wins_over_path_info() {
        let dir = tempfile::tempdir().unwrap();
        let info = dir.path().join("path_info.txt");
        fs::write(&info, "/from/file\n").unwrap();
        let info_arg = info.to_str().unwrap();

        let config =
            PipelineConfig::from_options(&options(&["--path-info", info_arg])).unwrap();
        assert_eq!(config.model.cache_dir, Some(PathBuf::from("/from/file")));

        let config = PipelineConfig::from_options(&options(&[
            "--path-info",
            info_arg,
            "--model-cache-dir",
            "/from/cli",
        ]))
        .unwrap();
        assert_eq!(config.model.cache_dir, Some(PathBuf::from("/from/cli")));
    }

    #[test]
    fn test_defaults_match_fixed_layout() {
        let config = PipelineConfig::from_options(&options(&[
            "--path-info",
            "/nonexistent/path_info.txt",
        ]))
        .unwrap();

        assert_eq!(config.frame_skip, 10);
        assert_eq!(config.output_fps, 5.0);
        assert_eq!(config.content_size, 384);
        assert_eq!(config.style_size, 256);
        assert_eq!(
            config.sampled_frames.path_for(3),
            PathBuf::from("test_frames/testframe3.jpg")
        );
        assert_eq!(
            config.stylized_frames.path_for(3),
            PathBuf::from("output_frames/outputframe3.jpg")
        );
        assert_eq!(config.output_video, PathBuf::from("output.mp4"));
        assert!(matches!(config.model.source, ModelSource::Hub { .. }));
        assert_eq!(
            config.style_source(None),
            StyleSource::Url(DEFAULT_STYLE_URL.to_string())
        );
    }

    #[test]
    fn test_style_and_model_accept_paths_or_urls() {
        assert_eq!(
            StyleSource::parse("styles/wave.jpg"),
            StyleSource::File(PathBuf::from("styles/wave.jpg"))
        );
        assert_eq!(
            StyleSource::parse("https://example.com/wave.jpg"),
            StyleSource::Url("https://example.com/wave.jpg".to_string())
        );

        let config = PipelineConfig::from_options(&options(&[
            "--path-info",
            "/nonexistent/path_info.txt",
        ]))
        .unwrap();
        assert_eq!(
            config.style_source(Some("local.png")),
            StyleSource::File(PathBuf::from("local.png"))
        );

        let config = PipelineConfig::from_options(&options(&[
            "--path-info",
            "/nonexistent/path_info.txt",
            "--model",
            "https://example.com/stylize.onnx",
        ]))
        .unwrap();
        assert_eq!(
            config.model.source,
            ModelSource::Url("https://example.com/stylize.onnx".to_string())
        );

        let config = PipelineConfig::from_options(&options(&[
            "--path-info",
            "/nonexistent/path_info.txt",
            "--model",
            "models/stylize.onnx",
        ]))
        .unwrap();
        assert_eq!(
            config.model.source,
            ModelSource::File(PathBuf::from("models/stylize.onnx"))
        );
    }

    #[test]
    fn test_rejects_bad_fourcc() {
        let result = PipelineConfig::from_options(&options(&[
            "--path-info",
            "/nonexistent/path_info.txt",
            "--fourcc",
            "h264x",
        ]));
        assert!(result.is_err());

        let result = PipelineConfig::from_options(&options(&[
            "--path-info",
            "/nonexistent/path_info.txt",
            "--fourcc",
            "mp4é",
        ]));
        assert!(result.is_err());
    }
}
