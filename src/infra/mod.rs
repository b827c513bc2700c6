// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence that does not belong to any one
// business layer:
//
//   manifest.rs — Split manifest
//                 Saves the patient assignment of a split and the
//                 configuration that produced it as JSON, and
//                 reads it back.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Split manifest saving and loading
pub mod manifest;
