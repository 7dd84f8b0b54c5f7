pub mod ffmpeg_reader;
pub mod opencv_reader;
pub mod processor;
pub mod writer;

use anyhow::Result;
use opencv::core::Mat;
use std::path::Path;

/// Sequential frame source. `next_frame` yields BGR frames until the stream
/// is exhausted, then `None`.
pub trait VideoReader {
    fn frame_count(&self) -> Result<usize>;
    fn source_fps(&self) -> Result<f64>;
    fn next_frame(&mut self) -> Result<Option<Mat>>;
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Opencv,
    Ffmpeg,
}

pub fn open_reader(path: &Path, backend: Backend) -> Result<Box<dyn VideoReader>> {
    let reader: Box<dyn VideoReader> = match backend {
        Backend::Opencv => Box::new(opencv_reader::OpencvReader::new(path)?),
        Backend::Ffmpeg => Box::new(ffmpeg_reader::FfmpegReader::new(path)?),
    };
    Ok(reader)
}
