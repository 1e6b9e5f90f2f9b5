//! Non-interactive downloads into a directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Error, Result};

use super::DownloadSink;

/// Highest `_N` suffix tried before giving up.
const MAX_SUFFIX: u32 = 10_000;

// ============================================================================
// DirectoryDownloads
// ============================================================================

/// Writes downloads into a fixed directory, creating it on demand.
///
/// An existing file is never overwritten: the name gets a `_1`, `_2`, ...
/// suffix before the extension instead.
#[derive(Debug, Clone)]
pub struct DirectoryDownloads {
    dir: PathBuf,
}

impl DirectoryDownloads {
    /// Creates a sink writing into `dir`.
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the target directory.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the first file name in the directory not already taken.
    ///
    /// The file is created with `create_new`, so concurrent saves never
    /// share a name.
    async fn create_unique(&self, filename: &str) -> Result<(File, PathBuf)> {
        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (filename, None),
        };

        for n in 0..MAX_SUFFIX {
            let name = match (n, ext) {
                (0, _) => filename.to_string(),
                (n, Some(ext)) => format!("{stem}_{n}.{ext}"),
                (n, None) => format!("{stem}_{n}"),
            };
            let candidate = self.dir.join(name);

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(file) => return Ok((file, candidate)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(Error::download(format!("{}: {e}", candidate.display())));
                }
            }
        }

        Err(Error::download(format!("no free name for {filename}")))
    }
}

#[async_trait]
impl DownloadSink for DirectoryDownloads {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        if filename.is_empty() || filename.contains(['/', '\\']) {
            return Err(Error::download(format!("invalid filename: {filename:?}")));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::download(format!("{}: {e}", self.dir.display())))?;

        let (mut file, path) = self.create_unique(filename).await?;
        let written = async {
            file.write_all(bytes).await?;
            file.flush().await
        };
        written
            .await
            .map_err(|e| Error::download(format!("{}: {e}", path.display())))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Download written");
        Ok(path)
    }
}

// ============================================================================
// Tests
// ============================================================================
