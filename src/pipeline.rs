use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;

/// Image formats the renamer knows a MIME type for.
///
/// Use [`ImageKind::from_path`] to detect the format from a file extension,
/// and [`mime_type_for`] when any path (known format or not) needs a MIME type.
///
/// # Example
///
/// ```rust
/// use image_renamer::pipeline::ImageKind;
/// use std::path::Path;
///
/// assert_eq!(ImageKind::from_path(Path::new("photo.JPG")), Some(ImageKind::Jpeg));
/// assert_eq!(ImageKind::Png.mime_type(), "image/png");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Bmp,
    Tiff,
    WebP,
}

impl ImageKind {
    /// Determine the image kind from a file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "bmp" => Some(Self::Bmp),
            "tiff" => Some(Self::Tiff),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// MIME type sent to the AI services.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::WebP => "image/webp",
        }
    }
}

/// MIME type for a path, defaulting to `image/jpeg` for unknown extensions.
pub fn mime_type_for(path: &Path) -> &'static str {
    ImageKind::from_path(path)
        .map(|k| k.mime_type())
        .unwrap_or("image/jpeg")
}

/// Collect supported image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Files are kept in the
/// order given; directories contribute their images sorted by file name,
/// one level deep unless `naming.recursive` is set.
///
/// A path that does not exist, or a directory that cannot be listed, fails
/// the whole call. Files with unsupported extensions are skipped with a warning.
///
/// # Example
///
/// ```rust,no_run
/// use image_renamer::config::Config;
/// use image_renamer::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let config = Config::default();
/// let images = collect_images(&[PathBuf::from("./photos")], &config).unwrap();
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path, config) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            let max_depth = if config.naming.recursive { usize::MAX } else { 1 };
            for entry in WalkDir::new(path)
                .max_depth(max_depth)
                .sort_by_file_name()
            {
                let entry = entry
                    .with_context(|| format!("Failed to scan directory {}", path.display()))?;
                let p = entry.path();
                if entry.file_type().is_file() && is_supported_image(p, config) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            anyhow::bail!("Path does not exist: {}", path.display());
        }
    }

    Ok(images)
}

/// Check if a file has an extension in the configured allow-list.
fn is_supported_image(path: &Path, config: &Config) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| config.is_supported_extension(ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // ── ImageKind ────────────────────────────────────────────────────

    #[test]
    fn image_kind_from_path() {
        assert_eq!(ImageKind::from_path(Path::new("a.jpg")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path(Path::new("a.JPEG")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path(Path::new("a.png")), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_path(Path::new("a.bmp")), Some(ImageKind::Bmp));
        assert_eq!(ImageKind::from_path(Path::new("a.tiff")), Some(ImageKind::Tiff));
        assert_eq!(ImageKind::from_path(Path::new("a.WebP")), Some(ImageKind::WebP));
        assert_eq!(ImageKind::from_path(Path::new("a.gif")), None);
        assert_eq!(ImageKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn mime_table() {
        assert_eq!(mime_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_type_for(Path::new("a.bmp")), "image/bmp");
        assert_eq!(mime_type_for(Path::new("a.tiff")), "image/tiff");
        assert_eq!(mime_type_for(Path::new("a.webp")), "image/webp");
    }

    #[test]
    fn mime_unknown_defaults_to_jpeg() {
        assert_eq!(mime_type_for(Path::new("a.heic")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("noext")), "image/jpeg");
    }

    // ── collect_images ───────────────────────────────────────────────

    #[test]
    fn collect_single_file() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("test.jpg");
        fs::write(&jpg, b"fake").unwrap();

        let images = collect_images(&[jpg.clone()], &Config::default()).unwrap();
        assert_eq!(images, vec![jpg]);
    }

    #[test]
    fn collect_skips_unsupported_files() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("readme.txt");
        fs::write(&txt, b"hello").unwrap();

        let images = collect_images(&[txt], &Config::default()).unwrap();
        assert!(images.is_empty());
    }

    #[test]
    fn collect_directory_sorted_and_shallow() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("b.png"), b"fake").unwrap();
        fs::write(dir.path().join("a.JPG"), b"fake").unwrap();
        fs::write(dir.path().join("c.txt"), b"fake").unwrap();
        fs::write(sub.join("d.webp"), b"fake").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()], &Config::default()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png"]);
    }

    #[test]
    fn collect_directory_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(sub.join("b.bmp"), b"fake").unwrap();

        let mut config = Config::default();
        config.naming.recursive = true;
        let images = collect_images(&[dir.path().to_path_buf()], &config).unwrap();
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn collect_keeps_input_order_for_files() {
        let dir = TempDir::new().unwrap();
        let z = dir.path().join("z.png");
        let a = dir.path().join("a.png");
        fs::write(&z, b"fake").unwrap();
        fs::write(&a, b"fake").unwrap();

        let images = collect_images(&[z.clone(), a.clone()], &Config::default()).unwrap();
        assert_eq!(images, vec![z, a]);
    }

    #[test]
    fn collect_nonexistent_path_is_error() {
        let result = collect_images(&[PathBuf::from("/nonexistent/path")], &Config::default());
        assert!(result.is_err());
    }

    #[test]
    fn collect_empty_dir() {
        let dir = TempDir::new().unwrap();
        let images = collect_images(&[dir.path().to_path_buf()], &Config::default()).unwrap();
        assert!(images.is_empty());
    }
}
