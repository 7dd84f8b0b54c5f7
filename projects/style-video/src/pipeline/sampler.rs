use crate::pipeline::frames::FrameNaming;
use crate::video::processor::process_video;
use crate::video::VideoReader;
use anyhow::{anyhow, Context, Result};
use opencv::{
    core::{Mat, Vector},
    imgcodecs,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleStats {
    pub frames_read: usize,
    pub frames_written: usize,
}

/// Keeps one frame out of every `skip + 1`: a counter advances on every
/// discarded frame and the frame that finds it equal to `skip` is written,
/// which resets the counter.
pub struct FrameSampler {
    skip: usize,
    counter: usize,
    written: usize,
}

impl FrameSampler {
    pub fn new(skip: usize) -> Self {
        Self {
            skip,
            counter: 0,
            written: 0,
        }
    }

    /// Returns the output index when the current frame should be kept.
    pub fn offer(&mut self) -> Option<usize> {
        if self.counter == self.skip {
            self.counter = 0;
            let index = self.written;
            self.written += 1;
            Some(index)
        } else {
            self.counter += 1;
            None
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

/// Reads `reader` to the end and writes every kept frame to `naming`.
pub fn slice_frames(
    reader: &mut dyn VideoReader,
    naming: &FrameNaming,
    skip: usize,
) -> Result<SampleStats> {
    naming.ensure_dir()?;

    let mut sampler = FrameSampler::new(skip);
    let params = Vector::<i32>::new();

    let stats = process_video(reader, |_: usize, frame: Mat| -> Result<()> {
        if let Some(index) = sampler.offer() {
            let path = naming.path_for(index);
            let path_str = path
                .to_str()
                .ok_or_else(|| anyhow!("Frame path is not valid UTF-8: {:?}", path))?;
            let ok = imgcodecs::imwrite(path_str, &frame, &params)
                .with_context(|| format!("Failed to write frame {}", path_str))?;
            if !ok {
                return Err(anyhow!("OpenCV refused to write frame {}", path_str));
            }
        }
        Ok(())
    })?;

    let frames_written = sampler.written();
    tracing::info!(
        "Sampled {} of {} frames (skip={}, source fps={:.2}) into {} in {:.2?}",
        frames_written,
        stats.processed_frames,
        skip,
        reader.source_fps()?,
        naming.dir.display(),
        stats.duration
    );

    Ok(SampleStats {
        frames_read: stats.processed_frames,
        frames_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC3};
    use std::collections::VecDeque;

    struct FakeReader {
        frames: VecDeque<Mat>,
        total: usize,
    }

    impl FakeReader {
        fn new(count: usize) -> Self {
            let frames = (0..count)
                .map(|i| {
                    Mat::new_rows_cols_with_default(
                        12,
                        16,
                        CV_8UC3,
                        Scalar::all((i % 256) as f64),
                    )
                    .unwrap()
                })
                .collect();
            Self {
                frames,
                total: count,
            }
        }
    }

    impl VideoReader for FakeReader {
        fn frame_count(&self) -> Result<usize> {
            Ok(self.total)
        }

        fn source_fps(&self) -> Result<f64> {
            Ok(30.0)
        }

        fn next_frame(&mut self) -> Result<Option<Mat>> {
            Ok(self.frames.pop_front())
        }
    }

    #[test]
    fn test_sampler_keeps_every_skip_plus_one() {
        let mut sampler = FrameSampler::new(2);
        let kept: Vec<Option<usize>> = (0..7).map(|_| sampler.offer()).collect();
        assert_eq!(
            kept,
            vec![None, None, Some(0), None, None, Some(1), None]
        );
        assert_eq!(sampler.written(), 2);
    }

    #[test]
    fn test_skip_zero_keeps_everything() {
        let mut sampler = FrameSampler::new(0);
        assert_eq!(sampler.offer(), Some(0));
        assert_eq!(sampler.offer(), Some(1));
    }

    #[test]
    fn test_slice_frames_count_and_names() {
        let dir = tempfile::tempdir().unwrap();
        let naming = FrameNaming::new(dir.path().join("test_frames"), "testframe", "jpg");

        let mut reader = FakeReader::new(90);
        let stats = slice_frames(&mut reader, &naming, 10).unwrap();

        assert_eq!(stats.frames_read, 90);
        assert_eq!(stats.frames_written, 90 / 11);
        let listed = naming.list_sorted().unwrap();
        assert_eq!(listed.len(), 8);
        for (i, path) in listed.iter().enumerate() {
            assert_eq!(path, &naming.path_for(i));
        }
    }

    #[test]
    fn test_empty_video_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let naming = FrameNaming::new(dir.path().join("test_frames"), "testframe", "jpg");

        let mut reader = FakeReader::new(0);
        let stats = slice_frames(&mut reader, &naming, 10).unwrap();

        assert_eq!(stats.frames_written, 0);
        assert!(naming.list_sorted().unwrap().is_empty());
    }
}
