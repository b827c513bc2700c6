// ============================================================
// Layer 4 — Image Transform
// ============================================================
// Turns a decoded MRI slice into the tensor the network expects:
//
//   1. Grayscale   → one luma channel (slices are stored as RGB
//                    or palette PNGs but carry no colour)
//   2. Resize      → exactly height × width, bilinear filter
//   3. To tensor   → u8 pixel / 255.0, so every value is in [0, 1]
//
// The default size is 256 × 240 (height × width).
//
// Reference: image crate documentation (imageops::FilterType)
//            Rust Book §13 (Iterators)

use image::{imageops::FilterType, DynamicImage, GenericImageView};

use crate::domain::error::{DatasetError, DatasetResult};
use crate::domain::image_record::ImageTensor;
use crate::domain::traits::ImageTransform;

pub const DEFAULT_HEIGHT: usize = 256;
pub const DEFAULT_WIDTH:  usize = 240;

/// Convert an image to a single-channel tensor at its native size.
/// Used when a sampler has no transform configured.
pub fn to_luma_tensor(image: &DynamicImage) -> ImageTensor {
    let luma = image.to_luma8();
    let (width, height) = luma.dimensions();
    let data = luma.pixels().map(|p| p.0[0] as f32 / 255.0).collect();

    ImageTensor {
        channels: 1,
        height:   height as usize,
        width:    width as usize,
        data,
    }
}

/// Grayscale + exact resize + scaling to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrayscaleResize {
    pub height: usize,
    pub width:  usize,
}

impl GrayscaleResize {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }
}

impl Default for GrayscaleResize {
    fn default() -> Self {
        Self::new(DEFAULT_HEIGHT, DEFAULT_WIDTH)
    }
}

impl ImageTransform for GrayscaleResize {
    fn apply(&self, image: DynamicImage) -> DatasetResult<ImageTensor> {
        if self.height == 0 || self.width == 0 {
            return Err(DatasetError::InvalidImage {
                reason: format!("target size {}x{} is empty", self.height, self.width),
            });
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(DatasetError::InvalidImage {
                reason: "source image has no pixels".to_string(),
            });
        }

        // resize_exact takes (width, height)
        let resized = image.resize_exact(
            self.width as u32,
            self.height as u32,
            FilterType::Triangle,
        );
        Ok(to_luma_tensor(&resized))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_output_shape_is_target_size() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 40, Rgb([10, 20, 30])));
        let t   = GrayscaleResize::new(16, 12).apply(img).unwrap();
        assert_eq!(t.shape(), [1, 16, 12]);
        assert_eq!(t.data.len(), 16 * 12);
    }

    #[test]
    fn test_default_size() {
        let t = GrayscaleResize::default();
        assert_eq!((t.height, t.width), (256, 240));
    }

    #[test]
    fn test_values_in_unit_range() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(8, 8, |x, y| {
            Rgb([(x * 30) as u8, (y * 30) as u8, 255])
        }));
        let t = GrayscaleResize::new(4, 4).apply(img).unwrap();
        assert!(t.data.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_white_pixels_become_one() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb([255, 255, 255])));
        let t   = to_luma_tensor(&img);
        assert_eq!(t.shape(), [1, 3, 3]);
        assert!(t.data.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_empty_target_is_rejected() {
        let img = DynamicImage::new_luma8(4, 4);
        let err = GrayscaleResize::new(0, 4).apply(img).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidImage { .. }));
    }
}
