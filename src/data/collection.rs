// ============================================================
// Layer 4 — Image Collection
// ============================================================
// The in-memory listing of a labelled corpus:
//
//   root/
//     AD/  p1_a.png  p1_b.png  p2_a.png      → label 0
//     NC/  p3_a.png  p4_a.png                → label 1
//
// Classes are the sub-directories of the root, sorted by name;
// a class label is the position in that sorted list. Records
// are listed class by class, each class sorted by path.
//
// A collection also carries the loader used to decode its
// images. The loader sits behind an Arc so the train and
// validation collections derived from one scan share it.
//
// Collections are never mutated after construction. Subsets
// are produced with `filtered`, which builds a new collection.
//
// Reference: Rust Book §8 (Collections), §15 (Rc/Arc)

use image::DynamicImage;
use std::{
    collections::{BTreeSet, HashSet},
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::data::loader::list_image_files;
use crate::domain::error::{DatasetError, DatasetResult};
use crate::domain::image_record::ImageRecord;
use crate::domain::patient::PatientId;
use crate::domain::traits::ImageLoader;

#[derive(Clone)]
pub struct ImageCollection {
    root:    PathBuf,
    classes: Vec<String>,
    records: Vec<ImageRecord>,
    loader:  Arc<dyn ImageLoader>,
}

impl ImageCollection {
    /// Scan `root` for class directories and list every image in them.
    pub fn scan(root: &Path, loader: Arc<dyn ImageLoader>) -> DatasetResult<Self> {
        let io_err = |source| DatasetError::DirectoryAccess {
            path: root.to_path_buf(),
            source,
        };

        let mut classes = Vec::new();
        for entry in fs::read_dir(root).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                classes.push(name.to_string());
            }
        }
        classes.sort();

        let mut records = Vec::new();
        for (label, class) in classes.iter().enumerate() {
            let files = list_image_files(&root.join(class))?;
            tracing::debug!("Class '{}' (label {}): {} images", class, label, files.len());
            records.extend(files.into_iter().map(|path| ImageRecord::new(path, label)));
        }

        if classes.is_empty() {
            tracing::warn!("No class directories found under '{}'", root.display());
        }

        Ok(Self::from_records(root, classes, records, loader))
    }

    /// Build a collection from already-listed records.
    /// Records with a path seen earlier in the list are dropped.
    pub fn from_records(
        root:    impl Into<PathBuf>,
        classes: Vec<String>,
        records: Vec<ImageRecord>,
        loader:  Arc<dyn ImageLoader>,
    ) -> Self {
        let total    = records.len();
        let mut seen = HashSet::with_capacity(total);
        let records: Vec<ImageRecord> = records
            .into_iter()
            .filter(|r| seen.insert(r.path.clone()))
            .collect();

        if records.len() < total {
            tracing::warn!("Dropped {} duplicate image paths", total - records.len());
        }

        Self { root: root.into(), classes, records, loader }
    }

    /// A new collection holding only the records `keep` accepts.
    /// Shares the class list and loader with `self`.
    pub fn filtered(&self, keep: impl Fn(&ImageRecord) -> bool) -> Self {
        Self {
            root:    self.root.clone(),
            classes: self.classes.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
            loader:  Arc::clone(&self.loader),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Label of the class directory called `name`
    pub fn class_index(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == name)
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&ImageRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records per label, indexed by label
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for r in &self.records {
            if let Some(c) = counts.get_mut(r.label) {
                *c += 1;
            }
        }
        counts
    }

    /// Distinct patients with at least one image of class `label`
    pub fn patients(&self, label: usize) -> BTreeSet<PatientId> {
        self.records
            .iter()
            .filter(|r| r.label == label)
            .map(ImageRecord::patient_id)
            .collect()
    }

    /// Decode the image behind `record` with this collection's loader
    pub fn load(&self, record: &ImageRecord) -> DatasetResult<DynamicImage> {
        self.loader.load(&record.path)
    }
}

impl fmt::Debug for ImageCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCollection")
            .field("root", &self.root)
            .field("classes", &self.classes)
            .field("records", &self.records.len())
            .finish()
    }
}
