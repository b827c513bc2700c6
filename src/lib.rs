// ============================================================
// patient-triplets
// ============================================================
// Prepares a labelled MRI corpus for triplet (metric-learning)
// training:
//
//   Layer 1  cli          — argument parsing, printing
//   Layer 2  application  — split / preview workflows
//   Layer 3  domain       — records, patients, errors, traits
//   Layer 4  data         — scanning, splitting, sampling, batching
//   Layer 6  infra        — split manifest persistence
//
// The data layer is usable on its own: build a split with
// `data::splitter::build_split`, wrap each collection in a
// `data::sampler::TripletSampler`, and hand the sampler to a
// Burn DataLoader with `data::batcher::TripletBatcher`.

pub mod cli;
pub mod application;
pub mod domain;
pub mod data;
pub mod infra;
