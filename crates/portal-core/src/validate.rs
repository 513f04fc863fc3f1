//! Payload checks that run before anything is sent to the backend.
//!
//! Every problem is collected, not just the first, so a form can highlight
//! all of them at once.

use crate::{
  Error, Invalid, Result, contribution::NewContribution, topic::NewTopic,
};

/// Whether a contribution payload is a first submission or an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
  Create,
  /// Edits may keep the files already stored and upload none.
  Edit,
}

pub fn check_topic(topic: &NewTopic) -> Result<()> {
  let mut problems = Vec::new();
  if topic.name.trim().is_empty() {
    problems.push(Invalid::TopicName);
  }
  if topic.release_date > topic.end_date {
    problems.push(Invalid::ReleaseAfterEnd {
      release: topic.release_date,
      end:     topic.end_date,
    });
  }
  finish(problems)
}

pub fn check_contribution(
  contribution: &NewContribution,
  submission: Submission,
) -> Result<()> {
  let mut problems = Vec::new();
  if contribution.title.trim().is_empty() {
    problems.push(Invalid::Title);
  }
  if contribution.content.trim().is_empty() {
    problems.push(Invalid::Content);
  }
  if !contribution.terms_accepted {
    problems.push(Invalid::TermsNotAccepted);
  }
  if submission == Submission::Create && contribution.files.is_empty() {
    problems.push(Invalid::NoFiles);
  }
  finish(problems)
}

fn finish(problems: Vec<Invalid>) -> Result<()> {
  if problems.is_empty() {
    Ok(())
  } else {
    Err(Error::Validation(problems))
  }
}
