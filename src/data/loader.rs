// ============================================================
// Layer 4 — Image Loader
// ============================================================
// Lists image files on disk and decodes them with the image crate.
//
// Two jobs live here because they share one rule: what counts
// as an image file:
//
//   list_image_files(dir)  → sorted paths of supported images
//   FsImageLoader::load    → DynamicImage for one path
//
// Both the collection scanner and the patient lister go through
// list_image_files, so a patient set can never mention a file
// the collection does not contain (and vice versa).
//
// Supported extensions (case-insensitive):
//   png, jpg, jpeg, bmp, ppm, pgm, tif, tiff, webp
//
// File names that are not valid UTF-8 are skipped: patient ids are
// parsed from the name, and such a file could not be attributed.
//
// Reference: image crate documentation
//            Rust Book §9 (Error Handling)

use image::DynamicImage;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::{DatasetError, DatasetResult};
use crate::domain::traits::ImageLoader;

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "ppm", "pgm", "tif", "tiff", "webp",
];

/// True if the path has one of the supported image extensions
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|ok| e.eq_ignore_ascii_case(ok)))
        .unwrap_or(false)
}

/// List the supported image files directly inside `dir`, sorted by path.
///
/// A missing or unreadable directory is an error, never an empty list:
/// it means the corpus paths are misconfigured.
pub fn list_image_files(dir: &Path) -> DatasetResult<Vec<PathBuf>> {
    let io_err = |source| DatasetError::DirectoryAccess {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() || !is_supported_image(&path) {
            tracing::trace!("Ignoring '{}'", path.display());
        } else if path.file_name().and_then(|n| n.to_str()).is_none() {
            tracing::warn!("Skipping '{}': file name is not valid UTF-8", path.display());
        } else {
            files.push(path);
        }
    }

    // read_dir order is platform dependent; sort for reproducible splits
    files.sort();
    Ok(files)
}

/// Decodes image files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageLoader;

impl FsImageLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&self, path: &Path) -> DatasetResult<DynamicImage> {
        image::open(path).map_err(|source| DatasetError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, GrayImage, Luma};

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_image(Path::new("a_1.png")));
        assert!(is_supported_image(Path::new("a_1.JPEG")));
        assert!(is_supported_image(Path::new("a_1.jpg")));
        assert!(is_supported_image(Path::new("a_1.tif")));
        assert!(is_supported_image(Path::new("a_1.webp")));
        assert!(is_supported_image(Path::new("a_1.BMP")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("Thumbs")));
    }

    #[test]
    fn test_lists_only_images_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["p2_a.png", "p1_b.png", "readme.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let files = list_image_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["p1_b.png", "p2_a.png"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_skips_non_utf8_file_names() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("p1_a.png"), b"x").unwrap();
        if fs::write(dir.path().join(OsStr::from_bytes(b"p\xff9_a.png")), b"x").is_err() {
            // filesystem refuses non-UTF-8 names
            return;
        }

        let files = list_image_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("p1_a.png")]);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_image_files(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, DatasetError::DirectoryAccess { .. }));
    }

    #[test]
    fn test_fs_loader_decodes_png() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("p1_a.png");
        GrayImage::from_pixel(4, 3, Luma([200u8])).save(&path).unwrap();

        let img = FsImageLoader::new().load(&path).unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));
    }

    #[test]
    fn test_fs_loader_reports_corrupt_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("p1_a.png");
        fs::write(&path, b"not a png").unwrap();

        let err = FsImageLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, DatasetError::ImageDecode { .. }));
    }
}
