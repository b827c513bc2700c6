// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from a folder of labelled MRI
// slices all the way to tensor batches of triplets.
//
// The pipeline flows in this order:
//
//   AD_NC/train/{AD,NC}/*.png
//       │
//       ▼
//   ImageCollection   → lists classes and labelled image paths
//       │
//       ▼
//   Splitter          → patient-disjoint train / validation collections
//       │
//       ▼
//   TripletSampler    → (label, anchor, positive, negative) per index
//       │               loads through FsImageLoader,
//       │               converts through GrayscaleResize
//       ▼
//   Dataset impl      → Burn's Dataset trait over the sampler
//       │
//       ▼
//   TripletBatcher    → stacks triplets into tensor batches
//       │
//       ▼
//   DataLoader        → shuffles and feeds batches to the consumer
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Lists and decodes image files from disk
pub mod loader;

/// Grayscale / resize / to-tensor conversion
pub mod transform;

/// Labelled image listing of a corpus directory
pub mod collection;

/// Patient-level train/validation split
pub mod splitter;

/// Rejection-sampled triplets over a collection
pub mod sampler;

/// Triplet type and Burn's Dataset trait
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
