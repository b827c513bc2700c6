// ============================================================
// Layer 3 — Image Record and Image Tensor
// ============================================================
// ImageRecord is one labelled file of the corpus:
//   (path on disk, index of its class directory)
//
// ImageTensor is what a transform turns an image into:
//   a flat row-major buffer of f32 pixel values in [0, 1]
//   plus its (channels, height, width) shape.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::patient::PatientId;

/// One labelled image file. Immutable once listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Full path to the image file
    pub path: PathBuf,

    /// Index of the class directory (0 = AD, 1 = NC for the ADNI layout)
    pub label: usize,
}

impl ImageRecord {
    pub fn new(path: impl Into<PathBuf>, label: usize) -> Self {
        Self { path: path.into(), label }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The bare file name, or "" if the path has none
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// Patient this image belongs to, derived from its file name
    pub fn patient_id(&self) -> PatientId {
        PatientId::from_file_name(self.file_name())
    }
}

/// A single image converted to numbers, CHW layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub channels: usize,
    pub height:   usize,
    pub width:    usize,
    /// channels * height * width values, row-major
    pub data:     Vec<f32>,
}

impl ImageTensor {
    pub fn shape(&self) -> [usize; 3] {
        [self.channels, self.height, self.width]
    }

    pub fn numel(&self) -> usize {
        self.channels * self.height * self.width
    }
}
