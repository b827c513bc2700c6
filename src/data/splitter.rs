// ============================================================
// Layer 4 — Patient-Level Train/Validation Splitter
// ============================================================
// Splits a corpus into training and validation collections so
// that no patient contributes images to both.
//
// Why split by patient and not by image?
//   Each patient has many near-identical MRI slices. If slices of
//   one patient land on both sides, the validation score measures
//   how well the model recognises that patient, not the disease.
//
// The pipeline, per class directory:
//
//   list_patients(AD/)        → [p1, p2, ...]      unique, first-seen order
//        │
//        ▼
//   split_patients(.., 0.9)   → shuffle, cut at floor(len * 0.9)
//        │
//        ▼
//   build_split               → train = corpus minus validation patients
//                               validation = corpus minus train patients
//
// Both output collections are pure filters over one shared scan;
// nothing is removed from a list in place.
//
// Split ratio applies to PATIENTS, so the image-level ratio can
// drift from 90/10 when patients have different scan counts.
//
// Reference: Rust Book §8 (Vectors, HashMaps)
//            rand crate documentation (SliceRandom)

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::Arc,
};

use crate::data::{collection::ImageCollection, loader::list_image_files};
use crate::domain::error::{DatasetError, DatasetResult};
use crate::domain::image_record::ImageRecord;
use crate::domain::patient::PatientId;
use crate::domain::traits::ImageLoader;

pub const DEFAULT_TRAIN_FRACTION: f64 = 0.9;

// ─── Matching Rule ────────────────────────────────────────────────────────────
/// How an image is attributed to a patient when filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The file's patient id must equal the patient id.
    #[default]
    Exact,

    /// The patient id only has to occur somewhere in the file name.
    /// Reproduces splits made with the older, looser rule. Patient
    /// "12" also claims "120_3.png", so some images can end up in
    /// neither collection.
    Substring,
}

impl MatchMode {
    /// True if `record` belongs to any patient in `patients`
    pub fn matches_any(self, record: &ImageRecord, patients: &HashSet<PatientId>) -> bool {
        match self {
            MatchMode::Exact => patients.contains(&record.patient_id()),
            MatchMode::Substring => {
                let name = record.file_name();
                patients.iter().any(|p| name.contains(p.as_str()))
            }
        }
    }
}

// ─── Split Types ──────────────────────────────────────────────────────────────
/// Disjoint train/validation patient lists for one class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSplit {
    pub train:      Vec<PatientId>,
    pub validation: Vec<PatientId>,
}

impl PatientSplit {
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The patient split computed for one class directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAssignment {
    pub class_name: String,
    pub label:      usize,
    pub split:      PatientSplit,
}

/// Result of build_split
#[derive(Debug, Clone)]
pub struct CorpusSplit {
    pub train:       ImageCollection,
    pub validation:  ImageCollection,
    pub assignments: Vec<ClassAssignment>,
    /// Records of a split class that ended up in neither collection.
    /// Always 0 with MatchMode::Exact.
    pub unassigned:  usize,
    /// Records of a split class that matched no listed patient. Always 0:
    /// build_split fails with UnattributedImages instead of returning
    /// collections that share images.
    pub shared:      usize,
}

// ─── Operations ───────────────────────────────────────────────────────────────

/// Unique patient ids of the images in one class directory, in
/// first-seen order over the sorted file listing.
///
/// A missing directory is an error; an empty one gives an empty list.
pub fn list_patients(dir: &Path) -> DatasetResult<Vec<PatientId>> {
    let mut seen     = HashSet::new();
    let mut patients = Vec::new();

    for path in list_image_files(dir)? {
        if let Some(id) = PatientId::from_path(&path) {
            if seen.insert(id.clone()) {
                patients.push(id);
            }
        }
    }

    tracing::debug!("{}: {} patients", dir.display(), patients.len());
    Ok(patients)
}

/// Randomly shuffle `samples` and split into (train, validation).
///
/// The cut is `floor(len * train_fraction)`; the fraction is clamped
/// to [0, 1], so either side may come back empty but this never fails.
pub fn split_train_val<T, R>(
    mut samples:    Vec<T>,
    train_fraction: f64,
    rng:            &mut R,
) -> (Vec<T>, Vec<T>)
where
    R: Rng + ?Sized,
{
    // Fisher-Yates shuffle, every permutation equally likely
    samples.shuffle(rng);

    let total    = samples.len();
    let fraction = if train_fraction.is_nan() { 0.0 } else { train_fraction.clamp(0.0, 1.0) };
    let split_at = ((total as f64) * fraction).floor() as usize;
    let split_at = split_at.min(total);

    // After this: samples = [0..split_at], val = [split_at..total]
    let val = samples.split_off(split_at);
    (samples, val)
}

/// Shuffle a class's patients and cut them into train/validation.
pub fn split_patients<R>(patients: Vec<PatientId>, train_fraction: f64, rng: &mut R) -> PatientSplit
where
    R: Rng + ?Sized,
{
    let (train, validation) = split_train_val(patients, train_fraction, rng);
    PatientSplit { train, validation }
}

/// Split the corpus at `corpus_root` into patient-disjoint train and
/// validation collections.
///
/// Only the classes named in `class_dirs` are split; images of any
/// other class directory are kept in both collections. Naming a class
/// twice is an error, as is any image of a split class that cannot be
/// attributed to one of its listed patients.
pub fn build_split<S, R>(
    corpus_root:    &Path,
    class_dirs:     &[S],
    train_fraction: f64,
    match_mode:     MatchMode,
    loader:         Arc<dyn ImageLoader>,
    rng:            &mut R,
) -> DatasetResult<CorpusSplit>
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    let mut requested = HashSet::with_capacity(class_dirs.len());
    for class in class_dirs {
        if !requested.insert(class.as_ref()) {
            return Err(DatasetError::DuplicateClass { name: class.as_ref().to_string() });
        }
    }

    // ── Step 1: patient split per class ──────────────────────────────────────
    let mut per_class = Vec::with_capacity(class_dirs.len());
    for class in class_dirs {
        let class    = class.as_ref();
        let patients = list_patients(&corpus_root.join(class))?;
        let split    = split_patients(patients, train_fraction, rng);
        tracing::debug!(
            "Class '{}': {} train / {} validation patients",
            class,
            split.train.len(),
            split.validation.len(),
        );
        per_class.push((class.to_string(), split));
    }

    // ── Step 2: full unfiltered listing ──────────────────────────────────────
    let full = ImageCollection::scan(corpus_root, loader)?;

    let mut assignments = Vec::with_capacity(per_class.len());
    for (class_name, split) in per_class {
        let label = full
            .class_index(&class_name)
            .ok_or_else(|| DatasetError::UnknownClass { name: class_name.clone() })?;
        assignments.push(ClassAssignment { class_name, label, split });
    }

    for (label, class) in full.classes().iter().enumerate() {
        if !assignments.iter().any(|a| a.label == label) {
            tracing::warn!(
                "Class '{}' is not split by patient; its images go to both collections",
                class
            );
        }
    }

    // ── Step 3: per-label exclusion sets ─────────────────────────────────────
    let mut train_ids: HashMap<usize, HashSet<PatientId>> = HashMap::new();
    let mut val_ids:   HashMap<usize, HashSet<PatientId>> = HashMap::new();
    for a in &assignments {
        train_ids.entry(a.label).or_default().extend(a.split.train.iter().cloned());
        val_ids.entry(a.label).or_default().extend(a.split.validation.iter().cloned());
    }

    let belongs_to = |ids: &HashMap<usize, HashSet<PatientId>>, r: &ImageRecord| {
        ids.get(&r.label)
            .map(|set| match_mode.matches_any(r, set))
            .unwrap_or(false)
    };

    // ── Step 4: filter ───────────────────────────────────────────────────────
    let train      = full.filtered(|r| !belongs_to(&val_ids, r));
    let validation = full.filtered(|r| !belongs_to(&train_ids, r));

    // A record of a split class is dropped when it matches both sides and
    // duplicated when it matches neither. Neither should happen in exact mode.
    let mut unassigned = 0usize;
    let mut shared     = 0usize;
    for r in full.records().iter().filter(|r| train_ids.contains_key(&r.label)) {
        match (belongs_to(&train_ids, r), belongs_to(&val_ids, r)) {
            (true, true)   => unassigned += 1,
            (false, false) => shared += 1,
            _ => {}
        }
    }

    if unassigned > 0 {
        tracing::warn!(
            "{} images matched patients on both sides and are in neither collection",
            unassigned
        );
    }
    if shared > 0 {
        tracing::error!(
            "{} images matched no listed patient and would be in both collections",
            shared
        );
        return Err(DatasetError::UnattributedImages { count: shared });
    }

    tracing::info!(
        "Patient split: {} train images, {} validation images (of {})",
        train.len(),
        validation.len(),
        full.len(),
    );

    Ok(CorpusSplit { train, validation, assignments, unassigned, shared })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::FsImageLoader;
    use rand::{rngs::StdRng, SeedableRng};
    use std::{collections::BTreeSet, fs};

    fn ids(names: &[&str]) -> Vec<PatientId> {
        names.iter().map(|n| PatientId::new(*n)).collect()
    }

    fn corpus(layout: &[(&str, &[&str])]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (class, files) in layout {
            fs::create_dir(dir.path().join(class)).unwrap();
            for f in *files {
                fs::write(dir.path().join(class).join(f), b"").unwrap();
            }
        }
        dir
    }

    fn split(dir: &Path, fraction: f64, mode: MatchMode, seed: u64) -> CorpusSplit {
        let mut rng = StdRng::seed_from_u64(seed);
        build_split(dir, &["AD", "NC"], fraction, mode, Arc::new(FsImageLoader), &mut rng).unwrap()
    }

    fn patients_of(c: &ImageCollection, label: usize) -> BTreeSet<PatientId> {
        c.patients(label)
    }

    #[test]
    fn test_ten_patients_split_nine_one() {
        let mut rng = StdRng::seed_from_u64(7);
        let patients: Vec<PatientId> = (0..10).map(|i| PatientId::new(i.to_string())).collect();
        let split = split_patients(patients, 0.9, &mut rng);
        assert_eq!(split.train.len(), 9);
        assert_eq!(split.validation.len(), 1);
    }

    #[test]
    fn test_cut_uses_floor() {
        // 7 * 0.9 = 6.3 → 6
        let mut rng = StdRng::seed_from_u64(1);
        let (train, val) = split_train_val((0..7).collect::<Vec<_>>(), 0.9, &mut rng);
        assert_eq!((train.len(), val.len()), (6, 1));
    }

    #[test]
    fn test_empty_patient_list() {
        let mut rng = StdRng::seed_from_u64(0);
        let split = split_patients(Vec::new(), 0.9, &mut rng);
        assert!(split.train.is_empty());
        assert!(split.validation.is_empty());
    }

    #[test]
    fn test_extreme_fractions_do_not_fail() {
        let mut rng = StdRng::seed_from_u64(3);
        let all = split_patients(ids(&["a", "b", "c"]), 1.0, &mut rng);
        assert_eq!((all.train.len(), all.validation.len()), (3, 0));

        let none = split_patients(ids(&["a", "b", "c"]), 0.0, &mut rng);
        assert_eq!((none.train.len(), none.validation.len()), (0, 3));

        let clamped = split_patients(ids(&["a", "b"]), 1.5, &mut rng);
        assert_eq!(clamped.train.len(), 2);
    }

    #[test]
    fn test_all_patients_preserved() {
        let mut rng = StdRng::seed_from_u64(11);
        let input   = ids(&["a", "b", "c", "d", "e"]);
        let split   = split_patients(input.clone(), 0.6, &mut rng);

        let mut out: Vec<_> = split.train.iter().chain(&split.validation).cloned().collect();
        out.sort();
        assert_eq!(out, input);
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_patients(ids(&["a", "b", "c", "d"]), 0.5, &mut StdRng::seed_from_u64(9));
        let b = split_patients(ids(&["a", "b", "c", "d"]), 0.5, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_list_patients_unique_first_seen() {
        let dir = corpus(&[("AD", &["p2_a.png", "p1_b.png", "p1_a.png", "notes.txt"])]);
        let patients = list_patients(&dir.path().join("AD")).unwrap();
        assert_eq!(patients, ids(&["p1", "p2"]));
    }

    #[test]
    fn test_list_patients_empty_dir() {
        let dir = corpus(&[("AD", &[])]);
        assert!(list_patients(&dir.path().join("AD")).unwrap().is_empty());
    }

    #[test]
    fn test_list_patients_missing_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_patients(&dir.path().join("AD")).unwrap_err();
        assert!(matches!(err, DatasetError::DirectoryAccess { .. }));
    }

    #[test]
    fn test_end_to_end_half_split() {
        let dir = corpus(&[
            ("AD", &["p1_a.png", "p1_b.png", "p2_a.png"]),
            ("NC", &["p3_a.png", "p4_a.png"]),
        ]);
        let s = split(dir.path(), 0.5, MatchMode::Exact, 42);

        let ad = &s.assignments[0];
        assert_eq!(ad.class_name, "AD");
        assert_eq!(ad.label, 0);
        assert_eq!(ad.split.train.len(), 1);
        assert_eq!(ad.split.validation.len(), 1);

        let train_ad = &ad.split.train[0];
        let val_ad   = &ad.split.validation[0];
        for r in s.train.records().iter().filter(|r| r.label == 0) {
            assert!(r.file_name().starts_with(&format!("{}_", train_ad)));
        }
        for r in s.validation.records().iter().filter(|r| r.label == 0) {
            assert!(r.file_name().starts_with(&format!("{}_", val_ad)));
        }

        assert_eq!(s.train.len() + s.validation.len(), 5);
        assert_eq!(s.unassigned, 0);
        assert_eq!(s.shared, 0);
    }

    #[test]
    fn test_collections_disjoint_and_complete() {
        let files: Vec<String> = (0..20)
            .flat_map(|p| (0..3).map(move |k| format!("{}_{}.png", 1000 + p, k)))
            .collect();
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        let dir = corpus(&[("AD", &refs[..30]), ("NC", &refs[30..])]);

        for seed in 0..5 {
            let s    = split(dir.path(), 0.9, MatchMode::Exact, seed);
            let full = ImageCollection::scan(dir.path(), Arc::new(FsImageLoader)).unwrap();

            for label in 0..2 {
                let train = patients_of(&s.train, label);
                let val   = patients_of(&s.validation, label);
                assert!(train.is_disjoint(&val));

                let union: BTreeSet<_> = train.union(&val).cloned().collect();
                assert_eq!(union, full.patients(label));
            }
        }
    }

    #[test]
    fn test_empty_class_dir_gives_empty_split() {
        let dir = corpus(&[("AD", &[]), ("NC", &["p3_a.png", "p4_a.png"])]);
        let s   = split(dir.path(), 0.9, MatchMode::Exact, 1);
        assert!(s.assignments[0].split.is_empty());
        assert_eq!(s.train.len() + s.validation.len(), 2);
    }

    #[test]
    fn test_missing_class_dir_is_fatal() {
        let dir = corpus(&[("AD", &["p1_a.png"])]);
        let mut rng = StdRng::seed_from_u64(0);
        let err = build_split(dir.path(), &["AD", "NC"], 0.9, MatchMode::Exact, Arc::new(FsImageLoader), &mut rng)
            .unwrap_err();
        assert!(matches!(err, DatasetError::DirectoryAccess { .. }));
    }

    #[test]
    fn test_nested_dir_is_unknown_class() {
        let dir = corpus(&[("AD", &["p1_a.png"]), ("NC", &["p3_a.png"])]);
        fs::create_dir(dir.path().join("AD").join("extra")).unwrap();
        fs::write(dir.path().join("AD").join("extra").join("p9_a.png"), b"").unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        let err = build_split(dir.path(), &["AD/extra"], 0.9, MatchMode::Exact, Arc::new(FsImageLoader), &mut rng)
            .unwrap_err();
        assert!(matches!(err, DatasetError::UnknownClass { .. }));
    }

    #[test]
    fn test_substring_mode_drops_prefix_collisions() {
        let dir = corpus(&[("AD", &["1_a.png", "12_a.png"]), ("NC", &["3_a.png", "4_a.png"])]);

        // find a seed that puts "1" in validation and "12" in train
        let s = (0..64)
            .map(|seed| split(dir.path(), 0.5, MatchMode::Substring, seed))
            .find(|s| s.assignments[0].split.validation == ids(&["1"]))
            .expect("some seed sends patient 1 to validation");

        // "12_a.png" contains "1" → removed from train,
        // and contains "12" → removed from validation
        assert_eq!(s.unassigned, 1);
        assert!(s.train.records().iter().all(|r| r.file_name() != "12_a.png"));
        assert!(s.validation.records().iter().all(|r| r.file_name() != "12_a.png"));

        let exact = split(dir.path(), 0.5, MatchMode::Exact, 0);
        assert_eq!(exact.unassigned, 0);
    }

    #[test]
    fn test_substring_mode_keeps_collections_disjoint() {
        let dir = corpus(&[
            ("AD", &["1_a.png", "1_b.png", "12_a.png", "123_a.png", "2_a.png", "3_a.png", "6_a.png", "7_a.png"]),
            ("NC", &["4_a.png", "45_a.png", "45_b.png", "5_a.png", "8_a.png", "9_a.png"]),
        ]);
        let full = ImageCollection::scan(dir.path(), Arc::new(FsImageLoader)).unwrap();

        for seed in 0..16 {
            let s = split(dir.path(), 0.5, MatchMode::Substring, seed);
            assert_eq!(s.shared, 0);

            for label in 0..2 {
                let train = patients_of(&s.train, label);
                let val   = patients_of(&s.validation, label);
                assert!(train.is_disjoint(&val), "seed {seed}, label {label}");

                let all = full.patients(label);
                let union: BTreeSet<_> = train.union(&val).cloned().collect();
                assert!(union.is_subset(&all));

                // patients whose id neither contains nor is contained in
                // another id of the class cannot be caught by a collision
                let free = all.iter().filter(|p| {
                    all.iter().all(|q| q == *p || !(q.as_str().contains(p.as_str()) || p.as_str().contains(q.as_str())))
                });
                for p in free {
                    assert!(
                        train.contains(p) != val.contains(p),
                        "seed {seed}: patient {p} must be in exactly one set",
                    );
                }
            }
        }
    }

    #[test]
    fn test_duplicate_class_dir_is_rejected() {
        let files: Vec<String> = (0..10).map(|p| format!("{p}_a.png")).collect();
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        let dir = corpus(&[("AD", &refs), ("NC", &["p3_a.png"])]);

        let mut rng = StdRng::seed_from_u64(0);
        let err = build_split(dir.path(), &["AD", "AD", "NC"], 0.5, MatchMode::Exact, Arc::new(FsImageLoader), &mut rng)
            .unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateClass { ref name } if name == "AD"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_file_is_in_neither_collection() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let dir = corpus(&[("AD", &["p1_a.png", "p2_a.png"]), ("NC", &["p3_a.png", "p4_a.png"])]);
        let odd = dir.path().join("AD").join(OsStr::from_bytes(b"p\xff9_a.png"));
        if fs::write(&odd, b"").is_err() {
            // filesystem refuses non-UTF-8 names
            return;
        }

        for seed in 0..8 {
            let s = split(dir.path(), 0.5, MatchMode::Exact, seed);
            assert_eq!(s.shared, 0);
            assert_eq!(s.train.len() + s.validation.len(), 4);
            for r in s.train.records() {
                assert!(!s.validation.records().contains(r));
            }
        }
    }
}
