//! The `PortalBackend` trait, the REST collaborator the engine drives.
//!
//! The trait is implemented by transports (e.g. the reqwest client in
//! `portal-cli`). Coordinators depend on this abstraction only; credentials,
//! routing and wire formats are the implementation's business.

use std::future::Future;

use crate::{
  contribution::{Contribution, ContributionScope, NewContribution},
  topic::{NewTopic, Topic},
};

/// Abstraction over the portal's REST backend.
///
/// All methods return `Send` futures so implementations can be driven from
/// a multi-threaded runtime. Implementations must not issue a request until
/// the returned future is first polled: coordinators build the refetch future
/// up front and drop it unpolled when a mutation is ignored or rejected.
pub trait PortalBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Topics ────────────────────────────────────────────────────────────

  /// Every topic owned by `faculty_id`, in backend order.
  fn list_topics<'a>(
    &'a self,
    faculty_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Topic>, Self::Error>> + Send + 'a;

  fn create_topic<'a>(
    &'a self,
    payload: &'a NewTopic,
  ) -> impl Future<Output = Result<Topic, Self::Error>> + Send + 'a;

  fn update_topic<'a>(
    &'a self,
    topic_id: &'a str,
    payload: &'a NewTopic,
  ) -> impl Future<Output = Result<Topic, Self::Error>> + Send + 'a;

  fn delete_topic<'a>(
    &'a self,
    topic_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Contributions ─────────────────────────────────────────────────────

  fn list_contributions<'a>(
    &'a self,
    scope: &'a ContributionScope,
  ) -> impl Future<Output = Result<Vec<Contribution>, Self::Error>> + Send + 'a;

  fn create_contribution<'a>(
    &'a self,
    payload: &'a NewContribution,
  ) -> impl Future<Output = Result<Contribution, Self::Error>> + Send + 'a;

  fn update_contribution<'a>(
    &'a self,
    contribution_id: &'a str,
    payload: &'a NewContribution,
  ) -> impl Future<Output = Result<Contribution, Self::Error>> + Send + 'a;

  fn delete_contribution<'a>(
    &'a self,
    contribution_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
