// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal each (splitting a corpus, previewing triplet batches).
//
// Rules for this layer:
//   - No sampling or splitting logic here (that's Layer 4)
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The patient-level split workflow and the shared DataConfig
pub mod split_use_case;

// Build a sampler and pull one batch through the DataLoader
pub mod preview_use_case;
