//! Error types for `portal-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A collaborator error, boxed so the engine stays independent of the
/// transport's concrete error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The mutating operations a coordinator can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
  CreateTopic,
  UpdateTopic,
  DeleteTopic,
  CreateContribution,
  UpdateContribution,
  DeleteContribution,
}

/// A single reason a payload was refused before reaching the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Invalid {
  #[error("topic name is required")]
  TopicName,

  #[error("release date {release} is after end date {end}")]
  ReleaseAfterEnd {
    release: DateTime<Utc>,
    end:     DateTime<Utc>,
  },

  #[error("title is required")]
  Title,

  #[error("content is required")]
  Content,

  #[error("terms and conditions must be accepted")]
  TermsNotAccepted,

  #[error("at least one file is required")]
  NoFiles,

  #[error("unknown status filter {0:?}")]
  StatusFilter(String),
}

#[derive(Debug, Error)]
pub enum Error {
  /// Listing a collection failed. The last fetched snapshot is kept.
  #[error("failed to fetch {collection}: {source}")]
  Fetch {
    collection: &'static str,
    #[source]
    source:     BoxError,
  },

  /// The backend rejected a create/update/delete. Nothing local changed.
  #[error("{operation} rejected: {source}")]
  Mutation {
    operation: Operation,
    #[source]
    source:    BoxError,
  },

  #[error("validation failed: {}", describe(.0))]
  Validation(Vec<Invalid>),

  #[error("submission window for topic {topic_id} closed at {end_date} (now {now})")]
  GateViolation {
    topic_id: String,
    end_date: DateTime<Utc>,
    now:      DateTime<Utc>,
  },
}

fn describe(problems: &[Invalid]) -> String {
  problems
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
