// ============================================================
// Layer 2 — PreviewUseCase
// ============================================================
// Builds the sampler for one subset and pulls a single batch of
// triplets through Burn's DataLoader, the same path a training
// loop would take:
//
//   train / validation  → SplitUseCase (patient-level split)
//   test                → full held-out corpus, no split
//        │
//        ▼
//   TripletSampler → DataLoaderBuilder(TripletBatcher) → first batch
//
// Useful to check a corpus layout and the transform settings
// before handing the data to a training job.

use anyhow::{Context, Result};
use burn::{backend::NdArray, data::dataloader::DataLoaderBuilder};
use rand::Rng;
use std::{fmt, path::Path, sync::Arc};

use crate::application::split_use_case::{DataConfig, SplitUseCase};
use crate::data::{
    batcher::TripletBatcher, collection::ImageCollection, loader::FsImageLoader,
    sampler::TripletSampler,
};

type PreviewBackend = NdArray;

/// Which subset to preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subset {
    Train,
    Validation,
    Test,
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train      => write!(f, "train"),
            Self::Validation => write!(f, "validation"),
            Self::Test       => write!(f, "test"),
        }
    }
}

/// What the first batch looked like
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewReport {
    pub subset:      Subset,
    pub anchors:     usize,
    pub batch_shape: [usize; 4],
    pub labels:      Vec<i64>,
}

pub struct PreviewUseCase {
    config: DataConfig,
    subset: Subset,
}

impl PreviewUseCase {
    pub fn new(config: DataConfig, subset: Subset) -> Self {
        Self { config, subset }
    }

    /// Sampler for the configured subset
    pub fn sampler(&self) -> Result<TripletSampler> {
        match self.subset {
            Subset::Train      => Ok(SplitUseCase::new(self.config.clone()).samplers()?.0),
            Subset::Validation => Ok(SplitUseCase::new(self.config.clone()).samplers()?.1),
            Subset::Test => {
                self.config.validate()?;
                let root       = Path::new(&self.config.test_root);
                let collection = ImageCollection::scan(root, Arc::new(FsImageLoader::new()))
                    .with_context(|| format!("Cannot read test corpus '{}'", self.config.test_root))?;
                Ok(self.config.sampler(collection))
            }
        }
    }

    pub fn execute(&self) -> Result<PreviewReport> {
        let cfg     = &self.config;
        let sampler = self.sampler()?;
        let anchors = sampler.len();

        sampler
            .check_preconditions()
            .with_context(|| format!("The {} subset cannot serve triplets", self.subset))?;

        let batcher     = TripletBatcher::<PreviewBackend>::new(Default::default());
        let mut builder = DataLoaderBuilder::new(batcher)
            .batch_size(cfg.batch_size)
            .num_workers(cfg.num_workers);
        if cfg.shuffle {
            let seed = cfg.seed.unwrap_or_else(|| rand::thread_rng().gen());
            builder = builder.shuffle(seed);
        }
        let loader = builder.build(sampler);

        let batch = loader
            .iter()
            .next()
            .with_context(|| format!("The {} subset produced no batch", self.subset))?;

        let labels: Vec<i64> = batch
            .labels
            .into_data()
            .convert::<i64>()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("Cannot read batch labels: {e:?}"))?;
        let batch_shape = batch.anchors.dims();

        tracing::info!(
            "{} subset: {} anchors, first batch {:?}",
            self.subset,
            anchors,
            batch_shape
        );

        Ok(PreviewReport { subset: self.subset, anchors, batch_shape, labels })
    }
}
