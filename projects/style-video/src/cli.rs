use crate::video::Backend;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub options: PipelineOptions,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Slice, stylize and recombine a video
    Run {
        /// Source video
        #[arg(long)]
        video: PathBuf,

        /// Style reference image path or URL (defaults to --default-style)
        #[arg(long)]
        style: Option<String>,
    },
    /// Extract every Nth frame of a video into the frames directory
    Slice {
        /// Source video
        #[arg(long)]
        video: PathBuf,
    },
    /// Stylize the sampled frames, or a single content image
    Stylize {
        /// Style reference image path or URL (defaults to --default-style)
        #[arg(long)]
        style: Option<String>,

        /// Single content image to stylize instead of the sampled frames
        #[arg(long, requires = "output")]
        content: Option<PathBuf>,

        /// Destination for the single stylized image
        #[arg(long, requires = "content")]
        output: Option<PathBuf>,
    },
    /// Combine the stylized frames into a video
    Combine,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PipelineOptions {
    /// Frames skipped between two sampled frames
    #[arg(long, global = true, env = "STYLE_VIDEO_FRAME_SKIP", default_value_t = 10)]
    pub frame_skip: usize,

    /// Frame rate of the combined video
    #[arg(long, global = true, env = "STYLE_VIDEO_OUTPUT_FPS", default_value_t = 5.0)]
    pub output_fps: f64,

    /// Video decoding backend
    #[arg(long, global = true, env = "STYLE_VIDEO_BACKEND", value_enum, default_value_t = Backend::Opencv)]
    pub backend: Backend,

    /// Directory receiving sampled frames
    #[arg(long, global = true, env = "STYLE_VIDEO_FRAMES_DIR", default_value = "test_frames")]
    pub frames_dir: PathBuf,

    /// Directory receiving stylized frames
    #[arg(long, global = true, env = "STYLE_VIDEO_OUTPUT_FRAMES_DIR", default_value = "output_frames")]
    pub output_frames_dir: PathBuf,

    /// Combined output video
    #[arg(long = "output-video", global = true, env = "STYLE_VIDEO_OUTPUT", default_value = "output.mp4")]
    pub output_video: PathBuf,

    /// FourCC of the combined video
    #[arg(long, global = true, env = "STYLE_VIDEO_FOURCC", default_value = "mp4v")]
    pub fourcc: String,

    /// ONNX style-transfer model, as a local path or URL; skips the hub download
    #[arg(long, global = true, env = "STYLE_VIDEO_MODEL")]
    pub model: Option<String>,

    /// Hub repository hosting the model
    #[arg(long, global = true, env = "STYLE_VIDEO_MODEL_REPO", default_value = crate::config::DEFAULT_MODEL_REPO)]
    pub model_repo: String,

    /// Model file inside the hub repository
    #[arg(long, global = true, env = "STYLE_VIDEO_MODEL_FILE", default_value = crate::config::DEFAULT_MODEL_FILE)]
    pub model_file: String,

    /// Style image path or URL used when a command gets no --style
    #[arg(long, global = true, env = "STYLE_VIDEO_DEFAULT_STYLE", default_value = crate::config::DEFAULT_STYLE_URL)]
    pub default_style: String,

    /// Cache directory for downloads (overrides the path info file)
    #[arg(long, global = true, env = "STYLE_VIDEO_MODEL_CACHE_DIR")]
    pub model_cache_dir: Option<PathBuf>,

    /// File whose first line may name the model cache directory
    #[arg(long, global = true, env = "STYLE_VIDEO_PATH_INFO", default_value = "path_info.txt")]
    pub path_info: PathBuf,

    /// Square edge of the content image fed to the model
    #[arg(long, global = true, env = "STYLE_VIDEO_CONTENT_SIZE", default_value_t = 384)]
    pub content_size: u32,

    /// Square edge of the style image fed to the model
    #[arg(long, global = true, env = "STYLE_VIDEO_STYLE_SIZE", default_value_t = 256)]
    pub style_size: u32,

    /// Run manifest written after a full run
    #[arg(long, global = true, env = "STYLE_VIDEO_MANIFEST", default_value = "run.json")]
    pub manifest: PathBuf,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
