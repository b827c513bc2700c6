// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `split` and `preview`, and the
// data flags they share.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{preview_use_case::Subset, split_use_case::DataConfig};
use crate::data::splitter::MatchMode;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split the training corpus by patient and report the result
    Split(SplitArgs),

    /// Pull one batch of triplets from a subset through the data loader
    Preview(PreviewArgs),
}

/// Corpus and sampling flags shared by every command.
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Training corpus root (contains one directory per class)
    #[arg(long, default_value = "AD_NC/train")]
    pub train_root: String,

    /// Held-out test corpus root
    #[arg(long, default_value = "AD_NC/test")]
    pub test_root: String,

    /// Class directories to split by patient (repeatable)
    #[arg(long = "class-dir", default_values = ["AD", "NC"])]
    pub class_dirs: Vec<String>,

    /// Fraction of each class's PATIENTS that go to training
    #[arg(long, default_value_t = 0.9)]
    pub train_fraction: f64,

    /// Height images are resized to
    #[arg(long, default_value_t = 256)]
    pub image_height: usize,

    /// Width images are resized to
    #[arg(long, default_value_t = 240)]
    pub image_width: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// DataLoader worker threads
    #[arg(long, default_value_t = 2)]
    pub num_workers: usize,

    /// Keep the dataset order instead of shuffling batches
    #[arg(long)]
    pub no_shuffle: bool,

    /// Seed for the patient shuffle and batch order; random if omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// How images are attributed to patients when filtering
    #[arg(long, value_enum, default_value_t = MatchModeArg::Exact)]
    pub match_mode: MatchModeArg,

    /// Rejection-sampling draws allowed per image before giving up
    #[arg(long, default_value_t = 10)]
    pub attempts_per_record: usize,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchModeArg {
    /// File's patient id must equal the patient id
    Exact,
    /// Patient id may appear anywhere in the file name (legacy)
    Substring,
}

impl From<MatchModeArg> for MatchMode {
    fn from(m: MatchModeArg) -> Self {
        match m {
            MatchModeArg::Exact     => MatchMode::Exact,
            MatchModeArg::Substring => MatchMode::Substring,
        }
    }
}

/// Convert CLI DataArgs into the application-layer DataConfig.
/// The application layer never sees clap types.
impl From<DataArgs> for DataConfig {
    fn from(a: DataArgs) -> Self {
        DataConfig {
            train_root:          a.train_root,
            test_root:           a.test_root,
            class_dirs:          a.class_dirs,
            train_fraction:      a.train_fraction,
            image_height:        a.image_height,
            image_width:         a.image_width,
            channels:            1,
            batch_size:          a.batch_size,
            num_workers:         a.num_workers,
            shuffle:             !a.no_shuffle,
            seed:                a.seed,
            match_mode:          a.match_mode.into(),
            attempts_per_record: a.attempts_per_record,
        }
    }
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Write split_manifest.json into this directory
    #[arg(long)]
    pub manifest_dir: Option<String>,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Subset to draw the batch from
    #[arg(long, value_enum, default_value_t = SubsetArg::Train)]
    pub subset: SubsetArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsetArg {
    Train,
    Validation,
    Test,
}

impl From<SubsetArg> for Subset {
    fn from(s: SubsetArg) -> Self {
        match s {
            SubsetArg::Train      => Subset::Train,
            SubsetArg::Validation => Subset::Validation,
            SubsetArg::Test       => Subset::Test,
        }
    }
}
