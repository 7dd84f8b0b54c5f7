use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Summary of one full pipeline run, persisted next to its outputs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunManifest {
    pub created_at: DateTime<Utc>,
    pub source_video: PathBuf,
    pub style: String,
    pub backend: String,
    pub frame_skip: usize,
    pub frames_read: usize,
    pub frames_sampled: usize,
    pub frames_stylized: usize,
    pub output_video: PathBuf,
    pub output_fps: f64,
    pub output_width: i32,
    pub output_height: i32,
}

impl RunManifest {
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write run manifest {}", path.display()))
    }
}
