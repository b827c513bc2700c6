// ============================================================
// Layer 4 — Triplet Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<Triplet> into
// four tensors.
//
// How batching works here:
//   Input:  Vec of N Triplets, each image of shape [C, H, W]
//   Output: TripletBatch with
//             labels    [N]           Int
//             anchors   [N, C, H, W]  Float
//             positives [N, C, H, W]  Float
//             negatives [N, C, H, W]  Float
//
//   Each image is already a flat CHW buffer, so stacking is just
//   concatenating the buffers and declaring the 4-D shape.
//
// Every triplet in a batch must share one image shape. The
// resizing transform guarantees that. Without it, the first
// triplet's shape wins and triplets of any other shape are
// dropped from the batch with a warning.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    tensor::{backend::Backend, Int, Tensor, TensorData},
};

use crate::data::dataset::Triplet;
use crate::domain::image_record::ImageTensor;

// ─── TripletBatch ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TripletBatch<B: Backend> {
    /// Anchor class labels, shape [batch_size]
    pub labels: Tensor<B, 1, Int>,

    /// shape: [batch_size, channels, height, width]
    pub anchors: Tensor<B, 4>,

    pub positives: Tensor<B, 4>,

    pub negatives: Tensor<B, 4>,
}

// ─── TripletBatcher ───────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct TripletBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TripletBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Stack one role (anchor, positive or negative) of every triplet
    fn stack<'a>(&self, images: impl Iterator<Item = &'a ImageTensor>, shape: [usize; 4]) -> Tensor<B, 4> {
        let flat: Vec<f32> = images.flat_map(|img| img.data.iter().copied()).collect();
        Tensor::<B, 4>::from_data(TensorData::new(flat, shape), &self.device)
    }
}

/// True if all three images have `shape` and a buffer of matching length
fn fits(t: &Triplet, shape: [usize; 3]) -> bool {
    [&t.anchor, &t.positive, &t.negative]
        .iter()
        .all(|img| img.shape() == shape && img.data.len() == img.numel())
}

impl<B: Backend> Batcher<Triplet, TripletBatch<B>> for TripletBatcher<B> {
    fn batch(&self, items: Vec<Triplet>) -> TripletBatch<B> {
        let received = items.len();
        let items: Vec<Triplet> = match items.first().map(Triplet::shape) {
            Some(first) => items.into_iter().filter(|t| fits(t, first)).collect(),
            None        => items,
        };
        if items.len() < received {
            tracing::warn!(
                "Dropped {} of {} triplets whose image shape differs from the batch",
                received - items.len(),
                received,
            );
        }

        let batch_size         = items.len();
        let [channels, h, w]   = items.first().map(Triplet::shape).unwrap_or([1, 0, 0]);
        let shape              = [batch_size, channels, h, w];

        let labels: Vec<i64> = items.iter().map(|t| t.label as i64).collect();
        let labels = Tensor::<B, 1, Int>::from_data(TensorData::new(labels, [batch_size]), &self.device);

        TripletBatch {
            labels,
            anchors:   self.stack(items.iter().map(|t| &t.anchor), shape),
            positives: self.stack(items.iter().map(|t| &t.positive), shape),
            negatives: self.stack(items.iter().map(|t| &t.negative), shape),
        }
    }
}
