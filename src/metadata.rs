use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::pipeline::mime_type_for;

/// Filesystem facts about an image, gathered without decoding pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub size_bytes: u64,
    pub modified: DateTime<Local>,
    /// Extension with its leading dot, case as found on disk (`".JPG"`), or empty.
    pub extension: String,
    pub mime_type: String,
    /// Read from the image header; `0` when the header could not be parsed.
    pub width: u32,
    pub height: u32,
}

impl FileMetadata {
    /// File size in MiB.
    pub fn size_mib(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Stat an image file and infer its MIME type from the extension.
pub fn read_metadata(path: &Path) -> Result<FileMetadata> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;
    if !meta.is_file() {
        anyhow::bail!("Not a regular file: {}", path.display());
    }

    let modified = match meta.modified() {
        Ok(t) => DateTime::<Local>::from(t),
        Err(e) => {
            log::debug!("No modification time for {}: {e}", path.display());
            Local::now()
        }
    };

    let (width, height) = match image::image_dimensions(path) {
        Ok(dims) => dims,
        Err(e) => {
            log::debug!("Could not read dimensions of {}: {e}", path.display());
            (0, 0)
        }
    };

    Ok(FileMetadata {
        size_bytes: meta.len(),
        modified,
        extension: original_extension(path),
        mime_type: mime_type_for(path).to_string(),
        width,
        height,
    })
}

/// The extension of `path` with its dot, exactly as written (`".JPG"`), or `""`.
pub fn original_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}
