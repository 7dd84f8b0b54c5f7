// Remote inputs: hub-hosted models and images addressed by URL.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const MAX_FILE_NAME_CHARS: usize = 128;

pub fn is_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Downloads `file` from hub repository `repo`, or returns the cached copy.
pub fn fetch_from_hub(repo: &str, file: &str, cache_dir: Option<&Path>) -> Result<PathBuf> {
    let mut builder = hf_hub::api::sync::ApiBuilder::new().with_progress(true);
    if let Some(dir) = cache_dir {
        builder = builder.with_cache_dir(dir.to_path_buf());
    }
    let api = builder.build().context("Failed to initialize hub client")?;

    tracing::info!("Fetching {} from hub repository {}", file, repo);
    let path = api
        .model(repo.to_string())
        .get(file)
        .with_context(|| format!("Failed to fetch {} from {}", file, repo))?;
    Ok(path)
}

/// Local file name for a download: the last path segment of the URL without
/// query or fragment, keeping at most its last 128 characters.
pub fn url_file_name(url: &str) -> Result<String> {
    let without_suffix = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
    let name = without_suffix
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .ok_or_else(|| anyhow!("URL has no file name: {}", url))?;

    let skip = name.chars().count().saturating_sub(MAX_FILE_NAME_CHARS);
    Ok(name.chars().skip(skip).collect())
}

pub fn download_dir(cache_dir: Option<&Path>) -> PathBuf {
    match cache_dir {
        Some(dir) => dir.join("downloads"),
        None => std::env::temp_dir().join("style-video").join("downloads"),
    }
}

/// Downloads `url` into the download directory unless a file of the same
/// name is already there. Returns the local path.
pub fn fetch_url(url: &str, cache_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = download_dir(cache_dir);
    let path = dir.join(url_file_name(url)?);
    if path.is_file() {
        tracing::debug!("Using cached download {}", path.display());
        return Ok(path);
    }

    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    tracing::info!("Downloading {} to {}", url, path.display());
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("Failed to download {}", url))?;

    let partial = path.with_extension("part");
    let mut file = fs::File::create(&partial)
        .with_context(|| format!("Failed to create {}", partial.display()))?;
    io::copy(&mut response.into_reader(), &mut file)
        .with_context(|| format!("Failed to save {}", url))?;
    fs::rename(&partial, &path)
        .with_context(|| format!("Failed to move download to {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/a.jpg"));
        assert!(is_url("HTTP://example.com/a.jpg"));
        assert!(!is_url("styles/wave.jpg"));
        assert!(!is_url("/tmp/https.jpg"));
    }

    #[test]
    fn test_url_file_name() {
        assert_eq!(
            url_file_name(
                "https://upload.wikimedia.org/wikipedia/commons/0/0a/The_Great_Wave_off_Kanagawa.jpg"
            )
            .unwrap(),
            "The_Great_Wave_off_Kanagawa.jpg"
        );
        assert_eq!(
            url_file_name("https://example.com/img/style.png?size=large#top").unwrap(),
            "style.png"
        );
        assert!(url_file_name("https://").is_err());

        let long = format!("https://example.com/{}.jpg", "x".repeat(200));
        let name = url_file_name(&long).unwrap();
        assert_eq!(name.chars().count(), 128);
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_fetch_url_reuses_existing_download() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = download_dir(Some(dir.path()));
        fs::create_dir_all(&downloads).unwrap();
        fs::write(downloads.join("wave.jpg"), b"cached").unwrap();

        let path = fetch_url("https://unreachable.invalid/styles/wave.jpg", Some(dir.path())).unwrap();

        assert_eq!(path, downloads.join("wave.jpg"));
        assert_eq!(fs::read(&path).unwrap(), b"cached");
    }
}
