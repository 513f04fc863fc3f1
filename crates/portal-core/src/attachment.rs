//! Files staged for a contribution before upload.
//!
//! Within one submission the file name is the identity of a staged file:
//! picking a file whose name is already staged is silently ignored, even if
//! its bytes differ.

use std::collections::HashSet;

use bytes::Bytes;

/// A file held client-side until the submission is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
  pub name:         String,
  /// MIME type, e.g. `application/pdf`.
  pub content_type: String,
  pub data:         Bytes,
}

impl StagedFile {
  pub fn new(
    name: impl Into<String>,
    content_type: impl Into<String>,
    data: impl Into<Bytes>,
  ) -> Self {
    Self {
      name:         name.into(),
      content_type: content_type.into(),
      data:         data.into(),
    }
  }
}

/// Merge `incoming` into `existing`, keeping the first file seen for each
/// name and the order in which names first appeared.
pub fn add_files(
  existing: Vec<StagedFile>,
  incoming: impl IntoIterator<Item = StagedFile>,
) -> Vec<StagedFile> {
  let mut seen: HashSet<String> = existing.iter().map(|f| f.name.clone()).collect();
  let mut merged = existing;
  for file in incoming {
    if seen.insert(file.name.clone()) {
      merged.push(file);
    }
  }
  merged
}

/// Drop the staged file named exactly `name`, if any.
pub fn remove_file(mut files: Vec<StagedFile>, name: &str) -> Vec<StagedFile> {
  files.retain(|f| f.name != name);
  files
}
