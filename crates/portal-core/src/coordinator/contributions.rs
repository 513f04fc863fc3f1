//! Contribution collection for one scope (a student's own, a topic's, or
//! the public list).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
  Result,
  backend::PortalBackend,
  collection::{FetchState, MutationState},
  contribution::{Contribution, ContributionScope, NewContribution, published},
  coordinator::{MutationOutcome, Synced},
  error::Operation,
  gate::ensure_open,
  validate::{Submission, check_contribution},
};

/// The contribution counterpart of
/// [`TopicCoordinator`](crate::coordinator::TopicCoordinator).
///
/// Create and edit are gated on the owning topic's end date as the caller
/// knows it; the topic is not refetched to check.
pub struct ContributionCoordinator<B> {
  backend:       Arc<B>,
  scope:         ContributionScope,
  contributions: Synced<Contribution>,
}

impl<B: PortalBackend> ContributionCoordinator<B> {
  pub fn new(backend: Arc<B>, scope: ContributionScope) -> Self {
    Self {
      backend,
      scope,
      contributions: Synced::new("contributions"),
    }
  }

  pub fn scope(&self) -> &ContributionScope { &self.scope }

  pub fn contributions(&self) -> Vec<Contribution> { self.contributions.snapshot() }

  /// Approved contributions only, for the guest-facing list.
  pub fn published(&self) -> Vec<Contribution> {
    let all = self.contributions.snapshot();
    published(&all).into_iter().cloned().collect()
  }

  pub fn fetch_state(&self) -> FetchState { self.contributions.fetch_state() }

  pub fn mutation_state(&self) -> MutationState { self.contributions.mutation_state() }

  // ── Fetching ──────────────────────────────────────────────────────────

  pub async fn load(&self) -> Result<()> {
    self
      .contributions
      .load(self.backend.list_contributions(&self.scope))
      .await
  }

  pub async fn refresh(&self) -> Result<()> {
    self
      .contributions
      .refresh(self.backend.list_contributions(&self.scope))
      .await
  }

  // ── Mutations ─────────────────────────────────────────────────────────

  /// Submit a new contribution while the topic ending at `topic_end` is
  /// still open at `now`.
  pub async fn create(
    &self,
    payload: NewContribution,
    topic_end: DateTime<Utc>,
    now: DateTime<Utc>,
  ) -> Result<MutationOutcome<Contribution>> {
    ensure_open(&payload.topic_id, topic_end, now)?;
    check_contribution(&payload, Submission::Create)?;
    let outcome = self
      .contributions
      .mutate(
        Operation::CreateContribution,
        self.backend.create_contribution(&payload),
        self.backend.list_contributions(&self.scope),
      )
      .await?;
    if let MutationOutcome::Applied(c) = &outcome {
      info!(
        contribution_id = %c.contribution_id,
        topic_id = %c.topic_id,
        files = payload.files.len(),
        "contribution submitted"
      );
    }
    Ok(outcome)
  }

  /// Edit an existing contribution under the same gate as
  /// [`ContributionCoordinator::create`].
  pub async fn update(
    &self,
    contribution_id: &str,
    payload: NewContribution,
    topic_end: DateTime<Utc>,
    now: DateTime<Utc>,
  ) -> Result<MutationOutcome<Contribution>> {
    ensure_open(&payload.topic_id, topic_end, now)?;
    check_contribution(&payload, Submission::Edit)?;
    let outcome = self
      .contributions
      .mutate(
        Operation::UpdateContribution,
        self.backend.update_contribution(contribution_id, &payload),
        self.backend.list_contributions(&self.scope),
      )
      .await?;
    if outcome != MutationOutcome::Ignored {
      info!(%contribution_id, "contribution updated");
    }
    Ok(outcome)
  }

  pub async fn remove(&self, contribution_id: &str) -> Result<MutationOutcome<()>> {
    let outcome = self
      .contributions
      .mutate(
        Operation::DeleteContribution,
        self.backend.delete_contribution(contribution_id),
        self.backend.list_contributions(&self.scope),
      )
      .await?;
    if outcome != MutationOutcome::Ignored {
      info!(%contribution_id, "contribution deleted");
    }
    Ok(outcome)
  }
}
