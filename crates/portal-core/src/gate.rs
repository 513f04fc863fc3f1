//! Whether a contribution may be created or edited for a topic.
//!
//! The same rule applies to both actions: the window stays open up to and
//! including the end instant itself. There is no grace period.

use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// `true` unless `end_date` is strictly before `now`.
pub fn can_submit(end_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
  end_date >= now
}

/// Like [`can_submit`], but yields [`Error::GateViolation`] when closed.
pub fn ensure_open(
  topic_id: &str,
  end_date: DateTime<Utc>,
  now: DateTime<Utc>,
) -> Result<()> {
  if can_submit(end_date, now) {
    Ok(())
  } else {
    Err(Error::GateViolation {
      topic_id: topic_id.to_owned(),
      end_date,
      now,
    })
  }
}
