//! File utility functions for listing images and naming outputs.

use std::fs;
use std::path::{Path, PathBuf};

/// Raster formats the pipeline reads and writes.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Returns paths to all files in a directory matching the given extensions,
/// sorted by path. Extensions are matched case-insensitively.
pub fn files_with_extensions(dir: &Path, extensions: &[&str]) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| {
            if !path.is_file() {
                return false;
            }
            let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
            extensions.contains(&ext.to_lowercase().as_str())
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Returns paths to all supported raster images in the given directory.
pub fn image_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    files_with_extensions(dir, IMAGE_EXTENSIONS)
}

/// Output path for an annotated copy of `source`: `{stem}{suffix}{.ext}` in `output_dir`.
///
/// Sources without an extension get `.png`.
pub fn suffixed_output_path(source: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    output_dir.join(format!("{stem}{suffix}.{ext}"))
}
