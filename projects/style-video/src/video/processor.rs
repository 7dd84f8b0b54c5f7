use crate::video::VideoReader;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use opencv::core::Mat;
use std::time::{Duration, Instant};

pub struct ProcessingStats {
    pub processed_frames: usize,
    pub duration: Duration,
}

/// A trait for handling video frames. This separates the "how to process"
/// from the "how to read" logic.
pub trait FrameProcessor {
    fn process(&mut self, index: usize, frame: Mat) -> Result<()>;
}

/// Blanket implementation so any closure with the right signature
/// automatically implements FrameProcessor.
impl<F> FrameProcessor for F
where
    F: FnMut(usize, Mat) -> Result<()>,
{
    fn process(&mut self, index: usize, frame: Mat) -> Result<()> {
        self(index, frame)
    }
}

/// Progress bar shared by every stage that walks a known number of items.
pub fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec:.1.yellow} fps, {eta})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Feeds every frame of `reader`, in stream order, to `processor`.
pub fn process_video<P>(reader: &mut dyn VideoReader, mut processor: P) -> Result<ProcessingStats>
where
    P: FrameProcessor,
{
    let start_time = Instant::now();
    let pb = progress_bar(reader.frame_count()?)?;
    let mut processed_frames = 0;

    while let Some(frame) = reader.next_frame()? {
        processor.process(processed_frames, frame)?;
        processed_frames += 1;
        pb.inc(1);
    }

    pb.finish_with_message("Done");

    Ok(ProcessingStats {
        processed_frames,
        duration: start_time.elapsed(),
    })
}
