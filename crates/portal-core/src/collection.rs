//! Client-side snapshot of a server collection and its sync state.
//!
//! A [`Collection`] is only ever replaced wholesale by a fetch result. It is
//! never patched after a mutation; the coordinator refetches instead. State
//! transitions are crate-private so only coordinators drive them.

use tracing::{debug, warn};

/// Progress of the view's data load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FetchState {
  #[default]
  NotStarted,
  Loading,
  Loaded,
  /// The most recent fetch failed; the snapshot is the last one that
  /// succeeded (empty if none did).
  Error(String),
}

/// Progress of the single mutation allowed in flight.
///
/// `Idle -> Pending -> {Refetching -> Idle, Idle}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationState {
  #[default]
  Idle,
  Pending,
  Refetching,
}

/// Sequence number handed out when a fetch is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Debug)]
pub struct Collection<T> {
  items:    Vec<T>,
  fetch:    FetchState,
  mutation: MutationState,
  /// Highest ticket handed out.
  issued:   u64,
  /// Highest ticket whose result was applied.
  applied:  u64,
}

impl<T> Default for Collection<T> {
  fn default() -> Self {
    Self {
      items:    Vec::new(),
      fetch:    FetchState::NotStarted,
      mutation: MutationState::Idle,
      issued:   0,
      applied:  0,
    }
  }
}

impl<T> Collection<T> {
  pub fn new() -> Self { Self::default() }

  pub fn items(&self) -> &[T] { &self.items }

  pub fn fetch_state(&self) -> &FetchState { &self.fetch }

  pub fn mutation_state(&self) -> MutationState { self.mutation }

  // ── Fetching ──────────────────────────────────────────────────────────

  /// Issue a ticket for the view's first load, or `None` if a load has
  /// already been started. Failed first loads are retried via
  /// [`Collection::begin_fetch`], not here.
  pub(crate) fn claim_first_load(&mut self) -> Option<FetchTicket> {
    (self.fetch == FetchState::NotStarted).then(|| self.begin_fetch())
  }

  pub(crate) fn begin_fetch(&mut self) -> FetchTicket {
    self.issued += 1;
    self.fetch = FetchState::Loading;
    FetchTicket(self.issued)
  }

  /// Apply a fetch result. Results older than one already applied are
  /// dropped and `false` is returned.
  pub(crate) fn complete_fetch(
    &mut self,
    ticket: FetchTicket,
    outcome: Result<Vec<T>, String>,
  ) -> bool {
    if ticket.0 <= self.applied {
      warn!(ticket = ticket.0, applied = self.applied, "discarding stale fetch result");
      return false;
    }
    self.applied = ticket.0;
    // A newer fetch is still outstanding; it decides the final state.
    let latest = ticket.0 == self.issued;
    match outcome {
      Ok(items) => {
        debug!(ticket = ticket.0, count = items.len(), "snapshot replaced");
        self.items = items;
        if latest {
          self.fetch = FetchState::Loaded;
        }
      }
      Err(message) => {
        if latest {
          self.fetch = FetchState::Error(message);
        }
      }
    }
    true
  }

  /// Settle a fetch whose future was dropped before it resolved. Only the
  /// latest outstanding fetch moves the state: back to `NotStarted` if no
  /// snapshot was ever applied, so the next `load` retries, otherwise to
  /// `Error` with the last snapshot kept.
  pub(crate) fn abandon_fetch(&mut self, ticket: FetchTicket) {
    if ticket.0 != self.issued || self.fetch != FetchState::Loading {
      return;
    }
    warn!(ticket = ticket.0, "fetch abandoned before completing");
    self.fetch = if self.applied == 0 {
      FetchState::NotStarted
    } else {
      FetchState::Error("fetch cancelled".into())
    };
  }

  // ── Mutations ─────────────────────────────────────────────────────────

  /// Move `Idle -> Pending`. Returns `false` if a mutation is already in
  /// flight.
  pub(crate) fn try_begin_mutation(&mut self) -> bool {
    if self.mutation != MutationState::Idle {
      return false;
    }
    self.mutation = MutationState::Pending;
    true
  }

  /// Move `Pending -> Refetching` and issue the forced refetch's ticket.
  pub(crate) fn mutation_succeeded(&mut self) -> FetchTicket {
    self.mutation = MutationState::Refetching;
    self.begin_fetch()
  }

  pub(crate) fn finish_mutation(&mut self) { self.mutation = MutationState::Idle; }
}
