// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two collaborators the data layer depends on but does not
// want to know the details of:
//
//   ImageLoader     path → raw decoded image
//   ImageTransform  raw image → fixed-size numeric tensor
//
// The sampler only ever sees these traits, so tests can plug in
// in-memory loaders and the CLI plugs in the filesystem one.
//
// Both traits require Send + Sync: burn's DataLoader calls the
// dataset from several worker threads at once.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use image::DynamicImage;
use std::path::Path;

use crate::domain::error::DatasetResult;
use crate::domain::image_record::ImageTensor;

// ─── ImageLoader ──────────────────────────────────────────────────────────────
/// Anything that can turn a path into a decoded image.
///
/// Implementations:
///   - FsImageLoader → decodes files from disk with the image crate
pub trait ImageLoader: Send + Sync {
    fn load(&self, path: &Path) -> DatasetResult<DynamicImage>;
}

// ─── ImageTransform ───────────────────────────────────────────────────────────
/// Deterministic conversion of a decoded image into a tensor.
///
/// Implementations:
///   - GrayscaleResize → 1 channel, fixed height × width, values in [0, 1]
pub trait ImageTransform: Send + Sync {
    fn apply(&self, image: DynamicImage) -> DatasetResult<ImageTensor>;
}
