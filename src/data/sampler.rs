// ============================================================
// Layer 4 — Triplet Sampler
// ============================================================
// Serves (label, anchor, positive, negative) triplets from one
// ImageCollection for metric-learning training.
//
//   anchor    = the record at `index` (never random)
//   positive  = a different image of the anchor's class
//   negative  = any image of another class
//
// Positive and negative are found by rejection sampling over
// the WHOLE collection, anchor included:
//
//   loop:
//     candidate = uniform draw
//     same path as anchor   → reject
//     same class as anchor  → positive = candidate
//     otherwise             → negative = candidate
//     both found            → done
//
// The loop is bounded. A class with a single image can never
// produce a positive, so after `max_attempts` draws the sampler
// gives up with DatasetError::SamplingExhausted instead of
// spinning forever.
//
// Nothing is cached: every call re-samples, so one anchor meets
// different positives and negatives across epochs.
//
// Concurrency: `get` draws from rand::thread_rng(), which is
// thread-local, and only reads the collection. DataLoader
// workers can call it in parallel without any locking.
//
// Reference: rand crate documentation (Rng::gen_range)
//            Rust Book §16 (Fearless Concurrency)

use rand::Rng;
use std::sync::Arc;

use crate::data::{collection::ImageCollection, dataset::Triplet, transform::to_luma_tensor};
use crate::domain::error::{DatasetError, DatasetResult};
use crate::domain::image_record::{ImageRecord, ImageTensor};
use crate::domain::traits::ImageTransform;

/// Draw budget per record in the collection
pub const ATTEMPTS_PER_RECORD: usize = 10;

/// Lower bound on the draw budget, so tiny collections still get
/// enough draws to find both partners with high probability
pub const MIN_ATTEMPTS: usize = 100;

/// Indices into the collection chosen for one triplet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripletDraw {
    pub anchor:   usize,
    pub positive: usize,
    pub negative: usize,
}

#[derive(Clone)]
pub struct TripletSampler {
    collection:   ImageCollection,
    transform:    Option<Arc<dyn ImageTransform>>,
    max_attempts: usize,
}

impl TripletSampler {
    /// Wrap a collection with no transform and the default draw budget
    pub fn new(collection: ImageCollection) -> Self {
        let max_attempts = attempt_budget(collection.len(), ATTEMPTS_PER_RECORD);
        Self { collection, transform: None, max_attempts }
    }

    pub fn with_transform(mut self, transform: Arc<dyn ImageTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Set the budget as `per_record` draws per image in the collection
    pub fn with_attempts_per_record(mut self, per_record: usize) -> Self {
        self.max_attempts = attempt_budget(self.collection.len(), per_record);
        self
    }

    /// Set an absolute draw budget
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn collection(&self) -> &ImageCollection {
        &self.collection
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Number of anchors this sampler can serve
    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Fails unless every anchor can in principle get a triplet:
    /// at least two non-empty classes, and no class with exactly one image.
    pub fn check_preconditions(&self) -> DatasetResult<()> {
        let counts    = self.collection.class_counts();
        let non_empty = counts.iter().filter(|&&c| c > 0).count();

        if non_empty < 2 {
            return Err(DatasetError::DegenerateCollection {
                reason: format!("{} non-empty classes, need at least 2", non_empty),
            });
        }

        if let Some(label) = counts.iter().position(|&c| c == 1) {
            let name = self
                .collection
                .classes()
                .get(label)
                .map(String::as_str)
                .unwrap_or("?");
            return Err(DatasetError::DegenerateCollection {
                reason: format!("class '{}' has a single image, no positive exists", name),
            });
        }

        Ok(())
    }

    /// Choose positive and negative indices for the anchor at `index`.
    pub fn draw<R>(&self, index: usize, rng: &mut R) -> DatasetResult<TripletDraw>
    where
        R: Rng + ?Sized,
    {
        let records = self.collection.records();
        let anchor  = self.anchor(index)?;

        let mut positive = None;
        let mut negative = None;

        for _ in 0..self.max_attempts {
            let candidate = rng.gen_range(0..records.len());
            let record    = &records[candidate];

            if record.path == anchor.path {
                continue;
            } else if record.label == anchor.label {
                positive = Some(candidate);
            } else {
                negative = Some(candidate);
            }

            if let (Some(positive), Some(negative)) = (positive, negative) {
                return Ok(TripletDraw { anchor: index, positive, negative });
            }
        }

        tracing::debug!(
            "Anchor {} ('{}'): gave up after {} draws",
            index,
            anchor.path.display(),
            self.max_attempts
        );
        Err(DatasetError::SamplingExhausted { index, attempts: self.max_attempts })
    }

    /// Sample, load and transform a triplet for the anchor at `index`,
    /// drawing from the calling thread's RNG.
    pub fn get(&self, index: usize) -> DatasetResult<Triplet> {
        self.get_with_rng(index, &mut rand::thread_rng())
    }

    /// Same as `get` with an explicit RNG, for reproducible sampling
    pub fn get_with_rng<R>(&self, index: usize, rng: &mut R) -> DatasetResult<Triplet>
    where
        R: Rng + ?Sized,
    {
        let draw    = self.draw(index, rng)?;
        let records = self.collection.records();
        let anchor  = &records[draw.anchor];

        Ok(Triplet {
            label:    anchor.label,
            anchor:   self.load_tensor(anchor)?,
            positive: self.load_tensor(&records[draw.positive])?,
            negative: self.load_tensor(&records[draw.negative])?,
        })
    }

    fn anchor(&self, index: usize) -> DatasetResult<&ImageRecord> {
        self.collection.get(index).ok_or(DatasetError::IndexOutOfRange {
            index,
            len: self.collection.len(),
        })
    }

    fn load_tensor(&self, record: &ImageRecord) -> DatasetResult<ImageTensor> {
        let image = self.collection.load(record)?;
        match &self.transform {
            Some(t) => t.apply(image),
            None    => Ok(to_luma_tensor(&image)),
        }
    }
}

fn attempt_budget(len: usize, per_record: usize) -> usize {
    len.saturating_mul(per_record).max(MIN_ATTEMPTS)
}
