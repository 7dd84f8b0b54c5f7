use crate::pipeline::preprocess::ImageTensor;
use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey {
    pub path: PathBuf,
    pub size: (u32, u32),
    pub preserve_aspect_ratio: bool,
}

impl ImageKey {
    pub fn new(path: &Path, size: (u32, u32), preserve_aspect_ratio: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            size,
            preserve_aspect_ratio,
        }
    }
}

/// Loaded image tensors for one pipeline run. Entries are never evicted; the
/// cache is dropped with the applier that owns it.
#[derive(Default)]
pub struct ImageCache {
    entries: HashMap<ImageKey, Arc<ImageTensor>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached tensor for `key`, running `load` only on a miss.
    /// A failed load leaves the cache untouched.
    pub fn get_or_load<F>(&mut self, key: ImageKey, load: F) -> Result<Arc<ImageTensor>>
    where
        F: FnOnce(&ImageKey) -> Result<ImageTensor>,
    {
        if let Some(tensor) = self.entries.get(&key) {
            tracing::debug!("Image cache hit: {}", key.path.display());
            return Ok(tensor.clone());
        }

        let tensor = Arc::new(load(&key)?);
        self.entries.insert(key, tensor.clone());
        Ok(tensor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
