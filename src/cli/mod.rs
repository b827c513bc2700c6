// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and delegates to Layer 2 (application).
//
//   1. `split`   — patient-level split, optional manifest
//   2. `preview` — one batch of triplets from train/validation/test
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PreviewArgs, SplitArgs};

use crate::application::{
    preview_use_case::PreviewUseCase,
    split_use_case::SplitUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "patient-triplets",
    version,
    about = "Patient-level train/validation split and triplet sampling for MRI corpora."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Split(args)   => run_split(args),
            Commands::Preview(args) => run_preview(args),
        }
    }
}

fn run_split(args: SplitArgs) -> Result<()> {
    let mut use_case = SplitUseCase::new(args.data.into());
    if let Some(dir) = args.manifest_dir {
        use_case = use_case.with_manifest_dir(dir);
    }

    let split = use_case.execute()?;

    for a in &split.assignments {
        println!(
            "{}: {} train patients, {} validation patients",
            a.class_name,
            a.split.train.len(),
            a.split.validation.len()
        );
    }
    println!(
        "Images: {} train, {} validation",
        split.train.len(),
        split.validation.len()
    );
    if split.unassigned > 0 {
        println!("Warning: {} images were assigned to neither set", split.unassigned);
    }
    Ok(())
}

fn run_preview(args: PreviewArgs) -> Result<()> {
    let report = PreviewUseCase::new(args.data.into(), args.subset.into()).execute()?;

    println!(
        "{}: {} anchors, batch shape {:?}",
        report.subset, report.anchors, report.batch_shape
    );
    println!("Labels: {:?}", report.labels);
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{preview_use_case::Subset, split_use_case::DataConfig};
    use crate::data::splitter::MatchMode;

    #[test]
    fn test_split_defaults_match_data_config() {
        let cli = Cli::try_parse_from(["patient-triplets", "split"]).unwrap();
        let Commands::Split(args) = cli.command else { panic!("expected split") };
        assert!(args.manifest_dir.is_none());
        assert_eq!(DataConfig::from(args.data), DataConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "patient-triplets", "preview",
            "--train-root", "/data/train",
            "--class-dir", "AD", "--class-dir", "NC", "--class-dir", "MCI",
            "--train-fraction", "0.8",
            "--match-mode", "substring",
            "--no-shuffle",
            "--seed", "7",
            "--subset", "test",
        ])
        .unwrap();

        let Commands::Preview(args) = cli.command else { panic!("expected preview") };
        assert_eq!(Subset::from(args.subset), Subset::Test);

        let cfg = DataConfig::from(args.data);
        assert_eq!(cfg.train_root, "/data/train");
        assert_eq!(cfg.class_dirs, vec!["AD", "NC", "MCI"]);
        assert_eq!(cfg.train_fraction, 0.8);
        assert_eq!(cfg.match_mode, MatchMode::Substring);
        assert!(!cfg.shuffle);
        assert_eq!(cfg.seed, Some(7));
    }
}
