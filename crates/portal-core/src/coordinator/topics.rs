//! Topic collection for one faculty.

use std::sync::Arc;

use tracing::info;

use crate::{
  Result,
  backend::PortalBackend,
  collection::{FetchState, MutationState},
  coordinator::{MutationOutcome, Synced},
  error::Operation,
  topic::{NewTopic, Topic},
  validate::check_topic,
};

/// Owns a faculty's topic list and keeps it consistent across
/// create/update/delete by refetching the whole list after each success.
pub struct TopicCoordinator<B> {
  backend:    Arc<B>,
  faculty_id: String,
  topics:     Synced<Topic>,
}

impl<B: PortalBackend> TopicCoordinator<B> {
  pub fn new(backend: Arc<B>, faculty_id: impl Into<String>) -> Self {
    Self {
      backend,
      faculty_id: faculty_id.into(),
      topics: Synced::new("topics"),
    }
  }

  pub fn faculty_id(&self) -> &str { &self.faculty_id }

  /// The last successfully fetched topics, in backend order.
  pub fn topics(&self) -> Vec<Topic> { self.topics.snapshot() }

  pub fn fetch_state(&self) -> FetchState { self.topics.fetch_state() }

  pub fn mutation_state(&self) -> MutationState { self.topics.mutation_state() }

  // ── Fetching ──────────────────────────────────────────────────────────

  /// Load the topic list the first time the view needs it. Later calls are
  /// no-ops; use [`TopicCoordinator::refresh`] to force a reload.
  pub async fn load(&self) -> Result<()> {
    self
      .topics
      .load(self.backend.list_topics(&self.faculty_id))
      .await
  }

  pub async fn refresh(&self) -> Result<()> {
    self
      .topics
      .refresh(self.backend.list_topics(&self.faculty_id))
      .await
  }

  // ── Mutations ─────────────────────────────────────────────────────────

  pub async fn create(&self, payload: NewTopic) -> Result<MutationOutcome<Topic>> {
    check_topic(&payload)?;
    let outcome = self
      .topics
      .mutate(
        Operation::CreateTopic,
        self.backend.create_topic(&payload),
        self.backend.list_topics(&self.faculty_id),
      )
      .await?;
    if let MutationOutcome::Applied(topic) = &outcome {
      info!(topic_id = %topic.topic_id, name = %topic.name, "topic created");
    }
    Ok(outcome)
  }

  pub async fn update(
    &self,
    topic_id: &str,
    payload: NewTopic,
  ) -> Result<MutationOutcome<Topic>> {
    check_topic(&payload)?;
    let outcome = self
      .topics
      .mutate(
        Operation::UpdateTopic,
        self.backend.update_topic(topic_id, &payload),
        self.backend.list_topics(&self.faculty_id),
      )
      .await?;
    if outcome != MutationOutcome::Ignored {
      info!(%topic_id, "topic updated");
    }
    Ok(outcome)
  }

  pub async fn remove(&self, topic_id: &str) -> Result<MutationOutcome<()>> {
    let outcome = self
      .topics
      .mutate(
        Operation::DeleteTopic,
        self.backend.delete_topic(topic_id),
        self.backend.list_topics(&self.faculty_id),
      )
      .await?;
    if outcome != MutationOutcome::Ignored {
      info!(%topic_id, "topic deleted");
    }
    Ok(outcome)
  }
}
