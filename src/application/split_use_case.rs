// ============================================================
// Layer 2 — SplitUseCase
// ============================================================
// Orchestrates the patient-level split in order:
//
//   Step 1: Validate the configuration
//   Step 2: Split patients per class and filter the corpus (Layer 4)
//   Step 3: Log a per-class summary
//   Step 4: Optionally save a split manifest              (Layer 6)
//
// and builds the triplet samplers that wrap each collection.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{ensure, Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::{Path, PathBuf}, sync::Arc};

use crate::data::{
    collection::ImageCollection,
    loader::FsImageLoader,
    sampler::{TripletSampler, ATTEMPTS_PER_RECORD},
    splitter::{build_split, CorpusSplit, MatchMode, DEFAULT_TRAIN_FRACTION},
    transform::{GrayscaleResize, DEFAULT_HEIGHT, DEFAULT_WIDTH},
};
use crate::infra::manifest::{ManifestStore, SplitManifest};

// ─── Data Configuration ──────────────────────────────────────────────────────
// Everything the data pipeline needs, passed in explicitly.
// Serialisable so it can be written into the split manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub train_root:          String,
    pub test_root:           String,
    pub class_dirs:          Vec<String>,
    pub train_fraction:      f64,
    pub image_height:        usize,
    pub image_width:         usize,
    pub channels:            usize,
    pub batch_size:          usize,
    pub num_workers:         usize,
    pub shuffle:             bool,
    pub seed:                Option<u64>,
    pub match_mode:          MatchMode,
    pub attempts_per_record: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            train_root:          "AD_NC/train".to_string(),
            test_root:           "AD_NC/test".to_string(),
            class_dirs:          vec!["AD".to_string(), "NC".to_string()],
            train_fraction:      DEFAULT_TRAIN_FRACTION,
            image_height:        DEFAULT_HEIGHT,
            image_width:         DEFAULT_WIDTH,
            channels:            1,
            batch_size:          32,
            num_workers:         2,
            shuffle:             true,
            seed:                None,
            match_mode:          MatchMode::Exact,
            attempts_per_record: ATTEMPTS_PER_RECORD,
        }
    }
}

impl DataConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.train_fraction),
            "train fraction must be within [0, 1], got {}",
            self.train_fraction
        );
        ensure!(self.channels == 1, "only single-channel (grayscale) images are supported");
        ensure!(
            self.image_height > 0 && self.image_width > 0,
            "image size must be non-zero"
        );
        ensure!(self.batch_size > 0, "batch size must be at least 1");
        ensure!(!self.class_dirs.is_empty(), "at least one class directory is required");

        let mut seen = HashSet::new();
        for class in &self.class_dirs {
            ensure!(seen.insert(class.as_str()), "class directory '{}' is listed more than once", class);
        }
        Ok(())
    }

    /// Seeded RNG if a seed is configured, otherwise one seeded from the OS
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        }
    }

    /// Wrap a collection in a sampler using this configuration's
    /// transform and draw budget
    pub fn sampler(&self, collection: ImageCollection) -> TripletSampler {
        TripletSampler::new(collection)
            .with_transform(Arc::new(GrayscaleResize::new(self.image_height, self.image_width)))
            .with_attempts_per_record(self.attempts_per_record)
    }
}

// ─── SplitUseCase ─────────────────────────────────────────────────────────────
pub struct SplitUseCase {
    config:       DataConfig,
    manifest_dir: Option<PathBuf>,
}

impl SplitUseCase {
    pub fn new(config: DataConfig) -> Self {
        Self { config, manifest_dir: None }
    }

    /// Also save a split manifest into `dir`
    pub fn with_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifest_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    /// Run the split end to end
    pub fn execute(&self) -> Result<CorpusSplit> {
        let cfg = &self.config;

        // ── Step 1: Validate ─────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Split ────────────────────────────────────────────────────
        tracing::info!(
            "Splitting '{}' by patient ({:.0}% train, {:?} matching)",
            cfg.train_root,
            cfg.train_fraction * 100.0,
            cfg.match_mode,
        );
        let mut rng = cfg.rng();
        let split   = build_split(
            Path::new(&cfg.train_root),
            &cfg.class_dirs,
            cfg.train_fraction,
            cfg.match_mode,
            Arc::new(FsImageLoader::new()),
            &mut rng,
        )
        .with_context(|| format!("Cannot split corpus '{}'", cfg.train_root))?;

        // ── Step 3: Summary ──────────────────────────────────────────────────
        let train_counts = split.train.class_counts();
        let val_counts   = split.validation.class_counts();
        for a in &split.assignments {
            tracing::info!(
                "{:<4} patients {:>4} train / {:>4} validation | images {:>6} / {:>6}",
                a.class_name,
                a.split.train.len(),
                a.split.validation.len(),
                train_counts.get(a.label).copied().unwrap_or(0),
                val_counts.get(a.label).copied().unwrap_or(0),
            );
            if a.split.train.is_empty() || a.split.validation.is_empty() {
                tracing::warn!("Class '{}' has an empty side after the split", a.class_name);
            }
        }

        // ── Step 4: Manifest ─────────────────────────────────────────────────
        if let Some(dir) = &self.manifest_dir {
            let path = ManifestStore::new(dir)?.save(&SplitManifest::new(cfg, &split))?;
            tracing::info!("Split manifest written to '{}'", path.display());
        }

        Ok(split)
    }

    /// Run the split and wrap both collections in triplet samplers
    pub fn samplers(&self) -> Result<(TripletSampler, TripletSampler)> {
        let split = self.execute()?;
        Ok((self.config.sampler(split.train), self.config.sampler(split.validation)))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn corpus() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (class, patients) in [("AD", 0..10), ("NC", 10..20)] {
            fs::create_dir(dir.path().join(class)).unwrap();
            for p in patients {
                for k in 0..2 {
                    fs::write(dir.path().join(class).join(format!("{p}_{k}.png")), b"").unwrap();
                }
            }
        }
        dir
    }

    fn config(root: &Path) -> DataConfig {
        DataConfig {
            train_root: root.to_string_lossy().into_owned(),
            seed:       Some(3),
            ..DataConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let cfg = DataConfig::default();
        assert_eq!(cfg.train_fraction, 0.9);
        assert_eq!((cfg.image_height, cfg.image_width, cfg.channels), (256, 240, 1));
        assert_eq!((cfg.batch_size, cfg.num_workers), (32, 2));
        assert!(cfg.shuffle);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = DataConfig { train_fraction: 1.2, ..DataConfig::default() };
        assert!(bad.validate().is_err());

        let rgb = DataConfig { channels: 3, ..DataConfig::default() };
        assert!(rgb.validate().is_err());
    }

    #[test]
    fn test_duplicate_class_dirs_rejected() {
        let cfg = DataConfig {
            class_dirs: vec!["AD".into(), "AD".into(), "NC".into()],
            ..DataConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("'AD'"));
    }

    #[test]
    fn test_execute_splits_nine_to_one() {
        let dir   = corpus();
        let split = SplitUseCase::new(config(dir.path())).execute().unwrap();

        for a in &split.assignments {
            assert_eq!(a.split.train.len(), 9);
            assert_eq!(a.split.validation.len(), 1);
        }
        assert_eq!(split.train.len(), 36);
        assert_eq!(split.validation.len(), 4);
    }

    #[test]
    fn test_seeded_runs_agree() {
        let dir = corpus();
        let a   = SplitUseCase::new(config(dir.path())).execute().unwrap();
        let b   = SplitUseCase::new(config(dir.path())).execute().unwrap();
        assert_eq!(a.assignments, b.assignments);
    }

    #[test]
    fn test_manifest_written() {
        let dir = corpus();
        let out = tempfile::tempdir().unwrap();
        let uc  = SplitUseCase::new(config(dir.path())).with_manifest_dir(out.path());
        uc.execute().unwrap();

        let manifest = ManifestStore::new(out.path()).unwrap().load().unwrap();
        assert_eq!(manifest.config, *uc.config());
        assert_eq!(manifest.train_images + manifest.validation_images, 40);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir.path().join("missing"));
        assert!(SplitUseCase::new(cfg).execute().is_err());
    }

    #[test]
    fn test_samplers_wrap_collections() {
        let dir = corpus();
        let (train, val) = SplitUseCase::new(config(dir.path())).samplers().unwrap();
        assert_eq!(train.len(), 36);
        assert_eq!(val.len(), 4);
        assert_eq!(train.max_attempts(), 360);
    }
}
