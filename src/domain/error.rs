// ============================================================
// Layer 3 — Dataset Errors
// ============================================================
// Every failure the data layer can report, as one typed enum.
// The application layer wraps these in anyhow with extra
// context; tests and callers that need to react to a specific
// failure (e.g. SamplingExhausted) match on the variant.
//
// Reference: Rust Book §9 (Recoverable Errors with Result)
//            thiserror crate documentation

use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    /// Missing or unreadable directory. Always fatal: it means the
    /// corpus paths are misconfigured.
    #[error("cannot read directory {path}: {source}")]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A requested class directory is not one of the scanned classes
    #[error("class directory '{name}' is not present in the corpus")]
    UnknownClass { name: String },

    /// The same class directory was requested more than once
    #[error("class directory '{name}' is listed more than once")]
    DuplicateClass { name: String },

    /// Images that matched no listed patient would land in both the
    /// train and the validation collection
    #[error("{count} images could not be attributed to a patient and would leak into both sets")]
    UnattributedImages { count: usize },

    #[error("index {index} out of range for collection of {len} images")]
    IndexOutOfRange { index: usize, len: usize },

    /// Rejection sampling gave up without a positive and a negative
    #[error("no positive/negative found for anchor {index} after {attempts} draws")]
    SamplingExhausted { index: usize, attempts: usize },

    #[error("collection cannot serve triplets: {reason}")]
    DegenerateCollection { reason: String },

    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },
}
