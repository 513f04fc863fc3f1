//! Coordinators issue mutations through a [`PortalBackend`] and keep a
//! [`Collection`] in step with the server by refetching after each one.
//!
//! [`PortalBackend`]: crate::backend::PortalBackend

mod contributions;
mod topics;

pub use contributions::ContributionCoordinator;
pub use topics::TopicCoordinator;

use std::future::Future;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
  Error, Result,
  collection::{Collection, FetchState, FetchTicket, MutationState},
  error::Operation,
};

/// What happened to a requested mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome<T> {
  /// The backend accepted it and the collection was refetched.
  Applied(T),
  /// Another mutation was already in flight; nothing was sent.
  Ignored,
}

impl<T> MutationOutcome<T> {
  pub fn applied(self) -> Option<T> {
    match self {
      Self::Applied(value) => Some(value),
      Self::Ignored => None,
    }
  }
}

/// A collection behind a lock that is never held across an `.await`.
#[derive(Debug)]
struct Synced<T> {
  name:  &'static str,
  state: Mutex<Collection<T>>,
}

impl<T: Clone> Synced<T> {
  fn new(name: &'static str) -> Self {
    Self {
      name,
      state: Mutex::new(Collection::new()),
    }
  }

  fn snapshot(&self) -> Vec<T> { self.state.lock().items().to_vec() }

  fn fetch_state(&self) -> FetchState { self.state.lock().fetch_state().clone() }

  fn mutation_state(&self) -> MutationState { self.state.lock().mutation_state() }

  /// Run the first load unless one has already been started.
  async fn load<F, E>(&self, fetch: F) -> Result<()>
  where
    F: Future<Output = std::result::Result<Vec<T>, E>>,
    E: std::error::Error + Send + Sync + 'static,
  {
    let claimed = self.state.lock().claim_first_load();
    match claimed {
      Some(ticket) => self.run_fetch(ticket, fetch).await,
      None => {
        debug!(collection = self.name, "already loaded; skipping first load");
        Ok(())
      }
    }
  }

  async fn refresh<F, E>(&self, fetch: F) -> Result<()>
  where
    F: Future<Output = std::result::Result<Vec<T>, E>>,
    E: std::error::Error + Send + Sync + 'static,
  {
    let ticket = self.state.lock().begin_fetch();
    self.run_fetch(ticket, fetch).await
  }

  async fn run_fetch<F, E>(&self, ticket: FetchTicket, fetch: F) -> Result<()>
  where
    F: Future<Output = std::result::Result<Vec<T>, E>>,
    E: std::error::Error + Send + Sync + 'static,
  {
    debug!(collection = self.name, ?ticket, "fetching");
    let pending = PendingFetch {
      synced:  self,
      ticket,
      settled: false,
    };
    let result = fetch.await;
    pending.settle();
    match result {
      Ok(items) => {
        self.state.lock().complete_fetch(ticket, Ok(items));
        Ok(())
      }
      Err(e) => {
        warn!(collection = self.name, error = %e, "fetch failed");
        self.state.lock().complete_fetch(ticket, Err(e.to_string()));
        Err(Error::Fetch {
          collection: self.name,
          source:     Box::new(e),
        })
      }
    }
  }

  /// Drive one mutation through `Idle -> Pending -> Refetching -> Idle`.
  ///
  /// Both futures are lazy: if a mutation is already in flight neither is
  /// polled and no request is made. Dropping the returned future releases
  /// the in-flight slot.
  async fn mutate<R, M, F, E>(
    &self,
    operation: Operation,
    mutation: M,
    refetch: F,
  ) -> Result<MutationOutcome<R>>
  where
    M: Future<Output = std::result::Result<R, E>>,
    F: Future<Output = std::result::Result<Vec<T>, E>>,
    E: std::error::Error + Send + Sync + 'static,
  {
    let started = self.state.lock().try_begin_mutation();
    if !started {
      warn!(collection = self.name, %operation, "mutation already in flight; ignoring");
      return Ok(MutationOutcome::Ignored);
    }
    let _slot = MutationSlot { synced: self };

    debug!(collection = self.name, %operation, "mutation pending");
    let value = match mutation.await {
      Ok(value) => value,
      Err(e) => {
        warn!(collection = self.name, %operation, error = %e, "mutation rejected");
        return Err(Error::Mutation {
          operation,
          source: Box::new(e),
        });
      }
    };

    let ticket = self.state.lock().mutation_succeeded();
    let refreshed = self.run_fetch(ticket, refetch).await;
    refreshed.map(|()| MutationOutcome::Applied(value))
  }
}

/// Returns the collection to `Idle` when the mutation ends, whether it
/// finished or its future was dropped mid-flight.
struct MutationSlot<'a, T> {
  synced: &'a Synced<T>,
}

impl<T> Drop for MutationSlot<'_, T> {
  fn drop(&mut self) { self.synced.state.lock().finish_mutation(); }
}

/// An issued fetch ticket. Dropped without [`PendingFetch::settle`], it
/// marks the fetch abandoned so the collection is not left `Loading`.
struct PendingFetch<'a, T> {
  synced:  &'a Synced<T>,
  ticket:  FetchTicket,
  settled: bool,
}

impl<T> PendingFetch<'_, T> {
  fn settle(mut self) { self.settled = true; }
}

impl<T> Drop for PendingFetch<'_, T> {
  fn drop(&mut self) {
    if self.settled {
      return;
    }
    debug!(collection = self.synced.name, ticket = ?self.ticket, "fetch dropped");
    self.synced.state.lock().abandon_fetch(self.ticket);
  }
}
