use anyhow::{anyhow, Context, Result};
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::VideoWriter,
};
use std::path::Path;

/// Thin wrapper over an OpenCV `VideoWriter` that remembers the frame size it
/// was opened with.
pub struct OpencvWriter {
    writer: VideoWriter,
    size: Size,
    frames_written: usize,
}

impl OpencvWriter {
    pub fn new(path: &Path, fourcc: &str, fps: f64, size: Size) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("Output path is not valid UTF-8: {:?}", path))?;

        let code = fourcc_code(fourcc)?;
        let writer = VideoWriter::new(path_str, code, fps, size, true)
            .with_context(|| format!("Failed to create video writer for {}", path_str))?;
        if !writer.is_opened()? {
            return Err(anyhow!(
                "Failed to open video writer for {} (fourcc={}, {}x{} @ {} fps)",
                path_str,
                fourcc,
                size.width,
                size.height,
                fps
            ));
        }

        tracing::info!(
            "OpencvWriter: writing {} ({}, {}x{} @ {:.2} fps)",
            path_str,
            fourcc,
            size.width,
            size.height,
            fps
        );

        Ok(Self {
            writer,
            size,
            frames_written: 0,
        })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn write(&mut self, frame: &Mat) -> Result<()> {
        self.writer.write(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        self.writer.release()?;
        Ok(self.frames_written)
    }
}

fn fourcc_code(fourcc: &str) -> Result<i32> {
    if !fourcc.is_ascii() {
        return Err(anyhow!("FourCC must be ASCII: {:?}", fourcc));
    }
    let chars: Vec<char> = fourcc.chars().collect();
    match chars.as_slice() {
        [a, b, c, d] => Ok(VideoWriter::fourcc(*a, *b, *c, *d)?),
        _ => Err(anyhow!("FourCC must be exactly 4 characters: {:?}", fourcc)),
    }
}
