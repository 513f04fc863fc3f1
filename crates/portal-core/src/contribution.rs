//! Contributions: student submissions against a topic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attachment::StagedFile;

/// Review status of a contribution.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum ContributionStatus {
  Pending,
  Approved,
  Rejected,
}

/// The status as the backend populates it: `{"_id": ..., "statusName": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRef {
  #[serde(rename = "_id")]
  pub status_id: String,
  #[serde(rename = "statusName")]
  pub name:      ContributionStatus,
}

/// A file the backend has already stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
  #[serde(rename = "_id")]
  pub file_id:      String,
  #[serde(rename = "fileName")]
  pub name:         String,
  #[serde(rename = "fileType")]
  pub content_type: String,
  /// Server path or URL the file can be downloaded from.
  #[serde(rename = "filePath")]
  pub path:         String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
  #[serde(rename = "_id")]
  pub contribution_id: String,
  #[serde(rename = "userID")]
  pub user_id:         String,
  #[serde(rename = "facultyID")]
  pub faculty_id:      String,
  #[serde(rename = "topicID")]
  pub topic_id:        String,
  #[serde(rename = "statusID")]
  pub status:          StatusRef,
  pub title:           String,
  pub content:         String,
  #[serde(rename = "agreedToTnC")]
  pub terms_accepted:  bool,
  #[serde(default)]
  pub files:           Vec<StoredFile>,
  #[serde(rename = "submissionDate")]
  pub submitted_at:    DateTime<Utc>,
  /// Reviewer feedback, once a reviewer has left some.
  #[serde(default)]
  pub comments:        Option<String>,
}

impl Contribution {
  pub fn is_published(&self) -> bool {
    self.status.name == ContributionStatus::Approved
  }
}

/// Input to contribution create/update. Sent as multipart form data, so it
/// carries the staged file bytes rather than stored paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContribution {
  pub user_id:        String,
  pub faculty_id:     String,
  pub topic_id:       String,
  pub status_id:      String,
  pub title:          String,
  pub content:        String,
  pub terms_accepted: bool,
  pub files:          Vec<StagedFile>,
}

/// Which contributions a collection holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContributionScope {
  /// One student's own contributions for a topic.
  Student {
    user_id:    String,
    faculty_id: String,
    topic_id:   String,
  },
  /// Every contribution submitted against a topic (reviewer view).
  Topic { topic_id: String },
  /// Every contribution the caller may see (public view).
  All,
}

/// Contributions that have been approved, in input order.
pub fn published(contributions: &[Contribution]) -> Vec<&Contribution> {
  contributions.iter().filter(|c| c.is_published()).collect()
}
