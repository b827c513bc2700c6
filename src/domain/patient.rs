// ============================================================
// Layer 3 — Patient Identity
// ============================================================
// A patient is never stored as its own record on disk. The only
// place a patient identifier exists is the image filename:
//
//   218391_78.png   →  patient "218391"
//   p1_a.png        →  patient "p1"
//   scan.png        →  patient "scan.png"   (no underscore)
//
// The identifier is therefore a derived key, computed by a pure
// function from a path, and compared by value.
//
// Reference: Rust Book §5 (Structs), §8 (Strings)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Identifier of one patient, taken from the filename prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the patient identifier from a bare file name:
    /// everything before the first `_`, or the whole name if
    /// there is no `_`.
    pub fn from_file_name(file_name: &str) -> Self {
        let token = file_name.split('_').next().unwrap_or(file_name);
        Self(token.to_string())
    }

    /// Derive the patient identifier from a full path.
    /// Returns None for paths without a UTF-8 file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(Self::from_file_name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
