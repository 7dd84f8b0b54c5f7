// Frame file naming shared by the sampler, the applier and the combiner.

use anyhow::{anyhow, Context, Result};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// `<dir>/<prefix><index>.<extension>`
#[derive(Debug, Clone, PartialEq)]
pub struct FrameNaming {
    pub dir: PathBuf,
    pub prefix: String,
    pub extension: String,
}

impl FrameNaming {
    pub fn new(dir: impl Into<PathBuf>, prefix: &str, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.to_string(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("{}{}.{}", self.prefix, index, self.extension))
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))
    }

    pub fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|s| s.eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }

    /// Paths of frames `0..count`; every one of them must exist.
    pub fn indexed_paths(&self, count: usize) -> Result<Vec<PathBuf>> {
        (0..count)
            .map(|index| {
                let path = self.path_for(index);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(anyhow!("Frame {} missing: {}", index, path.display()))
                }
            })
            .collect()
    }

    /// Number of frames present without a gap from index 0.
    pub fn contiguous_count(&self) -> usize {
        (0..).take_while(|index| self.path_for(*index).is_file()).count()
    }

    /// Lists the files in `dir` carrying the configured extension, ordered by
    /// the numeric index at the end of their stem. Files without an index come
    /// last, in name order.
    pub fn list_sorted(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Err(anyhow!("Frame directory not found: {}", self.dir.display()));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| self.has_extension(p))
            .collect();

        files.sort_by(|a, b| compare_frame_paths(a, b));
        Ok(files)
    }
}

/// Trailing decimal digits of the file stem, e.g. `outputframe12.jpg` -> 12.
pub fn frame_index(path: &Path) -> Option<usize> {
    let stem = path.file_stem()?.to_str()?;
    let digits_start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    stem[digits_start..].parse().ok()
}

fn compare_frame_paths(a: &Path, b: &Path) -> Ordering {
    match (frame_index(a), frame_index(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_index() {
        assert_eq!(frame_index(Path::new("out/outputframe12.jpg")), Some(12));
        assert_eq!(frame_index(Path::new("testframe0.jpg")), Some(0));
        assert_eq!(frame_index(Path::new("a.jpg")), None);
        assert_eq!(frame_index(Path::new("frame_007.png")), Some(7));
    }

    #[test]
    fn test_list_sorted_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        let naming = FrameNaming::new(dir.path(), "outputframe", "jpg");

        for name in [
            "outputframe2.jpg",
            "outputframe10.jpg",
            "outputframe1.jpg",
            "notes.txt",
            "cover.jpg",
        ] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let names: Vec<String> = naming
            .list_sorted()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(
            names,
            vec![
                "outputframe1.jpg",
                "outputframe2.jpg",
                "outputframe10.jpg",
                "cover.jpg"
            ]
        );
    }

    #[test]
    fn test_indexed_paths_and_contiguous_count() {
        let dir = tempfile::tempdir().unwrap();
        let naming = FrameNaming::new(dir.path(), "testframe", "jpg");

        for name in ["testframe0.jpg", "testframe1.jpg", "testframe3.jpg", "cover.jpg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        assert_eq!(naming.contiguous_count(), 2);
        assert_eq!(
            naming.indexed_paths(2).unwrap(),
            vec![naming.path_for(0), naming.path_for(1)]
        );
        assert!(naming.indexed_paths(3).is_err());
        assert!(naming.indexed_paths(0).unwrap().is_empty());
    }

    #[test]
    fn test_missing_dir_is_error() {
        let naming = FrameNaming::new("/nonexistent/frames", "testframe", ".jpg");
        assert_eq!(naming.extension, "jpg");
        assert!(naming.list_sorted().is_err());
    }
}
