//! Submission-window classification.
//!
//! A topic's window is derived from its end date and a reference instant.
//! The two predicates overlap: a topic whose end date is in the
//! past also satisfies "ends within the look-ahead". Callers that need a
//! single state use [`Window::state`], which gives expiry precedence.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// How far ahead of `now` an end date counts as "soon to expire".
pub const SOON_TO_EXPIRE_DAYS: i64 = 3;

/// The raw predicates for one topic at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
  /// `end_date < now`
  pub is_expired:        bool,
  /// `end_date <= now + 3 days`; also true for every expired topic.
  pub is_soon_to_expire: bool,
}

/// The resolved state of a window, ordered for display:
/// `Active < SoonToExpire < Expired`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  strum::Display,
  strum::AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum WindowState {
  Active,
  SoonToExpire,
  Expired,
}

impl Window {
  /// Resolve the overlap: expired first, then soon-to-expire.
  pub fn state(self) -> WindowState {
    if self.is_expired {
      WindowState::Expired
    } else if self.is_soon_to_expire {
      WindowState::SoonToExpire
    } else {
      WindowState::Active
    }
  }

  pub fn is_active(self) -> bool { self.state() == WindowState::Active }
}

/// Classify an end date against `now`.
pub fn classify(end_date: DateTime<Utc>, now: DateTime<Utc>) -> Window {
  let horizon = now.checked_add_signed(TimeDelta::days(SOON_TO_EXPIRE_DAYS));
  Window {
    is_expired:        end_date < now,
    // An unrepresentable horizon lies beyond every end date.
    is_soon_to_expire: horizon.is_none_or(|limit| end_date <= limit),
  }
}
