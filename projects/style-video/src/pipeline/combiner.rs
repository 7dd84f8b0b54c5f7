use crate::pipeline::frames::FrameNaming;
use crate::video::processor::progress_bar;
use crate::video::writer::OpencvWriter;
use anyhow::{anyhow, Context, Result};
use opencv::{
    core::{Mat, Size},
    imgcodecs, imgproc,
    prelude::*,
};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombineStats {
    pub frames_written: usize,
    pub width: i32,
    pub height: i32,
}

fn read_frame(path: &Path) -> Result<Mat> {
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow!("Frame path is not valid UTF-8: {:?}", path))?;
    let frame = imgcodecs::imread(path_str, imgcodecs::IMREAD_COLOR)
        .with_context(|| format!("Failed to read frame {}", path_str))?;
    if frame.empty() {
        return Err(anyhow!("Frame could not be decoded: {}", path_str));
    }
    Ok(frame)
}

/// Writes frames into `output` in frame-index order: frames `0..count` when
/// the count is known, otherwise every matching file in the directory.
/// The first frame fixes the video resolution; later frames of another size
/// are resized to it.
pub fn combine_frames(
    frames: &FrameNaming,
    count: Option<usize>,
    output: &Path,
    fourcc: &str,
    fps: f64,
) -> Result<CombineStats> {
    let paths = match count {
        Some(count) => frames.indexed_paths(count)?,
        None => frames.list_sorted()?,
    };
    let first_path = paths.first().ok_or_else(|| {
        anyhow!(
            "No .{} frames found in {}",
            frames.extension,
            frames.dir.display()
        )
    })?;

    let first = read_frame(first_path)?;
    let size = first.size()?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = OpencvWriter::new(output, fourcc, fps, size)?;

    let pb = progress_bar(paths.len())?;
    writer.write(&first)?;
    pb.inc(1);

    for path in &paths[1..] {
        let frame = read_frame(path)?;
        let frame = fit_to(frame, writer.size(), path)?;
        writer.write(&frame)?;
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    let frames_written = writer.finish()?;
    tracing::info!(
        "Combined {} frames into {} ({}x{} @ {} fps)",
        frames_written,
        output.display(),
        size.width,
        size.height,
        fps
    );

    Ok(CombineStats {
        frames_written,
        width: size.width,
        height: size.height,
    })
}

fn fit_to(frame: Mat, size: Size, path: &Path) -> Result<Mat> {
    let frame_size = frame.size()?;
    if frame_size == size {
        return Ok(frame);
    }

    tracing::warn!(
        "Frame {} is {}x{}, resizing to {}x{}",
        path.display(),
        frame_size.width,
        frame_size.height,
        size.width,
        size.height
    );
    let mut resized = Mat::default();
    imgproc::resize(&frame, &mut resized, size, 0.0, 0.0, imgproc::INTER_LINEAR)?;
    Ok(resized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, Vector, CV_8UC3};
    use opencv::videoio::{VideoCapture, CAP_ANY, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH};

    fn write_solid(path: &Path, width: i32, height: i32, value: f64) {
        let mat =
            Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(value)).unwrap();
        imgcodecs::imwrite(path.to_str().unwrap(), &mat, &Vector::new()).unwrap();
    }

    fn count_frames(path: &Path) -> (usize, i32, i32) {
        let mut capture = VideoCapture::from_file(path.to_str().unwrap(), CAP_ANY).unwrap();
        assert!(capture.is_opened().unwrap());
        let width = capture.get(CAP_PROP_FRAME_WIDTH).unwrap() as i32;
        let height = capture.get(CAP_PROP_FRAME_HEIGHT).unwrap() as i32;
        let mut count = 0;
        let mut frame = Mat::default();
        while capture.read(&mut frame).unwrap() && !frame.empty() {
            count += 1;
        }
        (count, width, height)
    }

    #[test]
    fn test_combine_two_frames() {
        let dir = tempfile::tempdir().unwrap();
        let frames_dir = dir.path().join("output_frames");
        std::fs::create_dir_all(&frames_dir).unwrap();
        write_solid(&frames_dir.join("a.jpg"), 64, 48, 40.0);
        write_solid(&frames_dir.join("b.jpg"), 64, 48, 200.0);

        let naming = FrameNaming::new(&frames_dir, "outputframe", "jpg");
        let output = dir.path().join("output.avi");
        let stats = combine_frames(&naming, None, &output, "MJPG", 5.0).unwrap();

        assert_eq!(stats.frames_written, 2);
        assert_eq!((stats.width, stats.height), (64, 48));
        assert_eq!(count_frames(&output), (2, 64, 48));
    }

    #[test]
    fn test_mismatched_frame_is_resized() {
        let dir = tempfile::tempdir().unwrap();
        let naming = FrameNaming::new(dir.path().join("frames"), "outputframe", "jpg");
        naming.ensure_dir().unwrap();
        write_solid(&naming.path_for(0), 64, 48, 10.0);
        write_solid(&naming.path_for(1), 32, 32, 120.0);
        write_solid(&naming.path_for(2), 64, 48, 250.0);

        let output = dir.path().join("out.avi");
        let stats = combine_frames(&naming, None, &output, "MJPG", 5.0).unwrap();

        assert_eq!(stats.frames_written, 3);
        assert_eq!(count_frames(&output), (3, 64, 48));
    }

    #[test]
    fn test_known_count_ignores_other_frames() {
        let dir = tempfile::tempdir().unwrap();
        let naming = FrameNaming::new(dir.path().join("frames"), "outputframe", "jpg");
        naming.ensure_dir().unwrap();
        for i in 0..5 {
            write_solid(&naming.path_for(i), 64, 48, 30.0 * i as f64);
        }

        let output = dir.path().join("out.avi");
        let stats = combine_frames(&naming, Some(2), &output, "MJPG", 5.0).unwrap();

        assert_eq!(stats.frames_written, 2);
        assert_eq!(count_frames(&output), (2, 64, 48));
    }

    #[test]
    fn test_empty_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let naming = FrameNaming::new(dir.path(), "outputframe", "jpg");
        let err = combine_frames(&naming, None, &dir.path().join("out.avi"), "MJPG", 5.0).unwrap_err();
        assert!(err.to_string().contains("No .jpg frames"));
    }
}
