//! Status filtering and display ordering for topic collections.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Invalid,
  topic::Topic,
  window::{Window, WindowState},
};

/// The status selector shown above every topic table.
///
/// The string forms match the values the dashboards have always sent:
/// `""`, `"expired"`, `"soonToExpire"` and `"active"`.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::AsRefStr,
  strum::EnumString,
)]
pub enum StatusFilter {
  #[default]
  #[serde(rename = "")]
  #[strum(serialize = "")]
  All,
  #[serde(rename = "expired")]
  #[strum(serialize = "expired")]
  Expired,
  #[serde(rename = "soonToExpire")]
  #[strum(serialize = "soonToExpire")]
  SoonToExpire,
  #[serde(rename = "active")]
  #[strum(serialize = "active")]
  Active,
}

impl StatusFilter {
  /// Parse a filter string, reporting unknown values as a validation error.
  pub fn parse(raw: &str) -> crate::Result<Self> {
    Self::from_str(raw)
      .map_err(|_| Error::Validation(vec![Invalid::StatusFilter(raw.to_owned())]))
  }

  /// Whether a topic with this window passes the filter.
  ///
  /// `SoonToExpire` excludes expired topics even though their raw
  /// `is_soon_to_expire` predicate holds.
  pub fn matches(self, window: Window) -> bool {
    match self {
      Self::All => true,
      Self::Expired => window.is_expired,
      Self::SoonToExpire => window.is_soon_to_expire && !window.is_expired,
      Self::Active => !window.is_expired && !window.is_soon_to_expire,
    }
  }
}

/// One topic ready for display, with the window it was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicRow<'a> {
  pub topic:  &'a Topic,
  pub window: Window,
}

impl TopicRow<'_> {
  pub fn state(&self) -> WindowState { self.window.state() }
}

/// Filter `topics` by `filter` and order them Active, then SoonToExpire,
/// then Expired.
///
/// Every topic is classified against the same `now`. The sort is stable, so
/// topics in the same state keep their input order. An empty input, or one
/// that filters down to nothing, yields an empty vector.
pub fn filter_and_sort(
  topics: &[Topic],
  filter: StatusFilter,
  now: DateTime<Utc>,
) -> Vec<TopicRow<'_>> {
  let mut rows: Vec<TopicRow<'_>> = topics
    .iter()
    .map(|topic| TopicRow {
      topic,
      window: topic.window(now),
    })
    .filter(|row| filter.matches(row.window))
    .collect();
  rows.sort_by_key(|row| row.state());
  rows
}
