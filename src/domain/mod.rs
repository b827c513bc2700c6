// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, enums and traits describing the corpus:
// images, their labels, the patients they belong to, and the
// collaborators that load and transform them.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Patient identifiers derived from filenames
pub mod patient;

// Labelled image records and image tensors
pub mod image_record;

// Typed errors for the data layer
pub mod error;

// Loader / transform abstractions
pub mod traits;
