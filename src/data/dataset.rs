use burn::data::dataset::Dataset;

use crate::data::sampler::TripletSampler;
use crate::domain::image_record::ImageTensor;

/// One training example for a triplet loss.
/// `label` is the anchor's class; positive shares it, negative does not.
#[derive(Debug, Clone, PartialEq)]
pub struct Triplet {
    pub label:    usize,
    pub anchor:   ImageTensor,
    pub positive: ImageTensor,
    pub negative: ImageTensor,
}

impl Triplet {
    pub fn shape(&self) -> [usize; 3] {
        self.anchor.shape()
    }
}

/// burn only lets a dataset say "no item". Sampling, decoding and
/// transform errors are logged here and surface as None, which ends
/// the DataLoader iteration.
impl Dataset<Triplet> for TripletSampler {
    fn get(&self, index: usize) -> Option<Triplet> {
        match TripletSampler::get(self, index) {
            Ok(triplet) => Some(triplet),
            Err(e) => {
                tracing::error!("Triplet {} unavailable: {}", index, e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        TripletSampler::len(self)
    }
}
