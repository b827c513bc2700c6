// ============================================================
// Layer 6 — Split Manifest
// ============================================================
// Records which patients went where, so a split can be audited
// or compared with the one used by an earlier experiment.
//
// What gets saved:
//   split_manifest.json
//     config        — the DataConfig the split was computed with
//     classes[]     — per class: name, label, train + validation patients
//     counts        — images per collection, unassigned / shared images
//
// The patient lists are what matters: with the same seed and the
// same corpus the split is reproducible, but a manifest survives
// corpus edits and seed-less runs.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::application::split_use_case::DataConfig;
use crate::data::splitter::{ClassAssignment, CorpusSplit};

const MANIFEST_FILE: &str = "split_manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitManifest {
    pub config:            DataConfig,
    pub classes:           Vec<ClassAssignment>,
    pub train_images:      usize,
    pub validation_images: usize,
    pub unassigned_images: usize,
    pub shared_images:     usize,
}

impl SplitManifest {
    pub fn new(config: &DataConfig, split: &CorpusSplit) -> Self {
        Self {
            config:            config.clone(),
            classes:           split.assignments.clone(),
            train_images:      split.train.len(),
            validation_images: split.validation.len(),
            unassigned_images: split.unassigned,
            shared_images:     split.shared,
        }
    }
}

/// Reads and writes the manifest in one directory
pub struct ManifestStore {
    dir: PathBuf,
}

impl ManifestStore {
    /// Create a store, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create manifest directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    pub fn save(&self, manifest: &SplitManifest) -> Result<PathBuf> {
        let path = self.path();
        let json = serde_json::to_string_pretty(manifest)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write manifest to '{}'", path.display()))?;

        tracing::debug!("Saved split manifest to '{}'", path.display());
        Ok(path)
    }

    pub fn load(&self) -> Result<SplitManifest> {
        let path = self.path();
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read manifest from '{}'", path.display()))?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed manifest '{}'", path.display()))
    }
}
