//! Topic: a time-boxed prompt that students submit contributions against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::window::{Window, classify};

/// A topic as returned by the backend.
///
/// The submission window is never stored here; call [`Topic::window`] with
/// the instant you are rendering for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
  #[serde(rename = "_id")]
  pub topic_id:     String,
  #[serde(rename = "topicName")]
  pub name:         String,
  #[serde(rename = "facultyID")]
  pub faculty_id:   String,
  #[serde(rename = "releaseDate")]
  pub release_date: DateTime<Utc>,
  #[serde(rename = "endDate")]
  pub end_date:     DateTime<Utc>,
}

impl Topic {
  /// Classify this topic's submission window relative to `now`.
  pub fn window(&self, now: DateTime<Utc>) -> Window {
    classify(self.end_date, now)
  }
}

/// Input to [`crate::backend::PortalBackend::create_topic`] and
/// [`crate::backend::PortalBackend::update_topic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTopic {
  #[serde(rename = "topicName")]
  pub name:         String,
  #[serde(rename = "facultyID")]
  pub faculty_id:   String,
  #[serde(rename = "releaseDate")]
  pub release_date: DateTime<Utc>,
  #[serde(rename = "endDate")]
  pub end_date:     DateTime<Utc>,
}

impl From<&Topic> for NewTopic {
  fn from(topic: &Topic) -> Self {
    Self {
      name:         topic.name.clone(),
      faculty_id:   topic.faculty_id.clone(),
      release_date: topic.release_date,
      end_date:     topic.end_date,
    }
  }
}
