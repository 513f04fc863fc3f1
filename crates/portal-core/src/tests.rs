//! Coordinator scenarios against an in-memory backend.

use std::{
  future::Future,
  sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{
  Error, Invalid,
  attachment::StagedFile,
  backend::PortalBackend,
  collection::{FetchState, MutationState},
  contribution::{
    Contribution, ContributionScope, ContributionStatus, NewContribution, StatusRef,
    StoredFile,
  },
  coordinator::{ContributionCoordinator, MutationOutcome, TopicCoordinator},
  error::Operation,
  filter::{StatusFilter, filter_and_sort},
  topic::{NewTopic, Topic},
};

// ─── Fake backend ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("backend refused: {0}")]
struct Refused(&'static str);

#[derive(Default)]
struct FakeBackend {
  topics:           Mutex<Vec<Topic>>,
  contributions:    Mutex<Vec<Contribution>>,
  calls:            Mutex<Vec<&'static str>>,
  reject_mutations: AtomicBool,
  fail_lists:       AtomicBool,
  /// When set, mutations wait for a notification before completing.
  hold:             Option<Arc<Notify>>,
  /// When set, topic listings wait for a notification before completing.
  hold_lists:       Option<Arc<Notify>>,
  next_id:          AtomicUsize,
}

impl FakeBackend {
  fn with_topics(topics: Vec<Topic>) -> Self {
    Self {
      topics: Mutex::new(topics),
      ..Self::default()
    }
  }

  fn calls(&self) -> Vec<&'static str> { self.calls.lock().clone() }

  fn record(&self, call: &'static str) { self.calls.lock().push(call); }

  fn next_id(&self, prefix: &str) -> String {
    format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
  }

  async fn mutation_gate(&self) -> Result<(), Refused> {
    if let Some(gate) = &self.hold {
      gate.notified().await;
    }
    if self.reject_mutations.load(Ordering::SeqCst) {
      return Err(Refused("mutation rejected"));
    }
    Ok(())
  }

  fn contribution_from(&self, id: String, payload: &NewContribution) -> Contribution {
    Contribution {
      contribution_id: id,
      user_id:         payload.user_id.clone(),
      faculty_id:      payload.faculty_id.clone(),
      topic_id:        payload.topic_id.clone(),
      status:          StatusRef {
        status_id: payload.status_id.clone(),
        name:      ContributionStatus::Pending,
      },
      title:           payload.title.clone(),
      content:         payload.content.clone(),
      terms_accepted:  payload.terms_accepted,
      files:           payload
        .files
        .iter()
        .map(|f| StoredFile {
          file_id:      format!("file-{}", f.name),
          name:         f.name.clone(),
          content_type: f.content_type.clone(),
          path:         format!("/uploads/{}", f.name),
        })
        .collect(),
      submitted_at:    now(),
      comments:        None,
    }
  }
}

impl PortalBackend for FakeBackend {
  type Error = Refused;

  fn list_topics<'a>(
    &'a self,
    faculty_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Topic>, Refused>> + Send + 'a {
    async move {
      self.record("list_topics");
      if let Some(gate) = &self.hold_lists {
        gate.notified().await;
      }
      if self.fail_lists.load(Ordering::SeqCst) {
        return Err(Refused("list failed"));
      }
      Ok(
        self
          .topics
          .lock()
          .iter()
          .filter(|t| t.faculty_id == faculty_id)
          .cloned()
          .collect(),
      )
    }
  }

  fn create_topic<'a>(
    &'a self,
    payload: &'a NewTopic,
  ) -> impl Future<Output = Result<Topic, Refused>> + Send + 'a {
    async move {
      self.record("create_topic");
      self.mutation_gate().await?;
      let topic = Topic {
        topic_id:     self.next_id("topic"),
        name:         payload.name.clone(),
        faculty_id:   payload.faculty_id.clone(),
        release_date: payload.release_date,
        end_date:     payload.end_date,
      };
      self.topics.lock().push(topic.clone());
      Ok(topic)
    }
  }

  fn update_topic<'a>(
    &'a self,
    topic_id: &'a str,
    payload: &'a NewTopic,
  ) -> impl Future<Output = Result<Topic, Refused>> + Send + 'a {
    async move {
      self.record("update_topic");
      self.mutation_gate().await?;
      let mut topics = self.topics.lock();
      let topic = topics
        .iter_mut()
        .find(|t| t.topic_id == topic_id)
        .ok_or(Refused("no such topic"))?;
      topic.name = payload.name.clone();
      topic.release_date = payload.release_date;
      topic.end_date = payload.end_date;
      Ok(topic.clone())
    }
  }

  fn delete_topic<'a>(
    &'a self,
    topic_id: &'a str,
  ) -> impl Future<Output = Result<(), Refused>> + Send + 'a {
    async move {
      self.record("delete_topic");
      self.mutation_gate().await?;
      self.topics.lock().retain(|t| t.topic_id != topic_id);
      Ok(())
    }
  }

  fn list_contributions<'a>(
    &'a self,
    scope: &'a ContributionScope,
  ) -> impl Future<Output = Result<Vec<Contribution>, Refused>> + Send + 'a {
    async move {
      self.record("list_contributions");
      if self.fail_lists.load(Ordering::SeqCst) {
        return Err(Refused("list failed"));
      }
      Ok(
        self
          .contributions
          .lock()
          .iter()
          .filter(|c| match scope {
            ContributionScope::Student {
              user_id,
              faculty_id,
              topic_id,
            } => {
              &c.user_id == user_id
                && &c.faculty_id == faculty_id
                && &c.topic_id == topic_id
            }
            ContributionScope::Topic { topic_id } => &c.topic_id == topic_id,
            ContributionScope::All => true,
          })
          .cloned()
          .collect(),
      )
    }
  }

  fn create_contribution<'a>(
    &'a self,
    payload: &'a NewContribution,
  ) -> impl Future<Output = Result<Contribution, Refused>> + Send + 'a {
    async move {
      self.record("create_contribution");
      self.mutation_gate().await?;
      let contribution = self.contribution_from(self.next_id("contribution"), payload);
      self.contributions.lock().push(contribution.clone());
      Ok(contribution)
    }
  }

  fn update_contribution<'a>(
    &'a self,
    contribution_id: &'a str,
    payload: &'a NewContribution,
  ) -> impl Future<Output = Result<Contribution, Refused>> + Send + 'a {
    async move {
      self.record("update_contribution");
      self.mutation_gate().await?;
      let mut contributions = self.contributions.lock();
      let existing = contributions
        .iter_mut()
        .find(|c| c.contribution_id == contribution_id)
        .ok_or(Refused("no such contribution"))?;
      existing.title = payload.title.clone();
      existing.content = payload.content.clone();
      Ok(existing.clone())
    }
  }

  fn delete_contribution<'a>(
    &'a self,
    contribution_id: &'a str,
  ) -> impl Future<Output = Result<(), Refused>> + Send + 'a {
    async move {
      self.record("delete_contribution");
      self.mutation_gate().await?;
      self
        .contributions
        .lock()
        .retain(|c| c.contribution_id != contribution_id);
      Ok(())
    }
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() }

fn topic(id: &str, ends_in: TimeDelta) -> Topic {
  Topic {
    topic_id:     id.into(),
    name:         format!("Topic {id}"),
    faculty_id:   "fac-1".into(),
    release_date: now() - TimeDelta::days(14),
    end_date:     now() + ends_in,
  }
}

fn new_topic(name: &str) -> NewTopic {
  NewTopic {
    name:         name.into(),
    faculty_id:   "fac-1".into(),
    release_date: now(),
    end_date:     now() + TimeDelta::days(10),
  }
}

fn submission(topic_id: &str) -> NewContribution {
  NewContribution {
    user_id:        "student-1".into(),
    faculty_id:     "fac-1".into(),
    topic_id:       topic_id.into(),
    status_id:      "status-pending".into(),
    title:          "My entry".into(),
    content:        "Some words".into(),
    terms_accepted: true,
    files:          vec![StagedFile::new("entry.pdf", "application/pdf", "%PDF")],
  }
}

fn student_scope(topic_id: &str) -> ContributionScope {
  ContributionScope::Student {
    user_id:    "student-1".into(),
    faculty_id: "fac-1".into(),
    topic_id:   topic_id.into(),
  }
}

// ─── Topics: fetching ────────────────────────────────────────────────────────

#[tokio::test]
async fn first_load_happens_once() {
  let backend = Arc::new(FakeBackend::with_topics(vec![topic("a", TimeDelta::days(5))]));
  let coord = TopicCoordinator::new(backend.clone(), "fac-1");
  assert_eq!(coord.fetch_state(), FetchState::NotStarted);

  coord.load().await.unwrap();
  coord.load().await.unwrap();

  assert_eq!(backend.calls(), vec!["list_topics"]);
  assert_eq!(coord.fetch_state(), FetchState::Loaded);
  assert_eq!(coord.topics().len(), 1);
}

#[tokio::test]
async fn refresh_always_refetches() {
  let backend = Arc::new(FakeBackend::default());
  let coord = TopicCoordinator::new(backend.clone(), "fac-1");
  coord.load().await.unwrap();
  coord.refresh().await.unwrap();
  coord.refresh().await.unwrap();
  assert_eq!(backend.calls(), vec!["list_topics"; 3]);
}

#[tokio::test]
async fn failed_first_load_leaves_empty_collection() {
  let backend = Arc::new(FakeBackend::with_topics(vec![topic("a", TimeDelta::days(5))]));
  backend.fail_lists.store(true, Ordering::SeqCst);
  let coord = TopicCoordinator::new(backend.clone(), "fac-1");

  let err = coord.load().await.unwrap_err();
  assert!(matches!(err, Error::Fetch { collection: "topics", .. }));
  assert!(coord.topics().is_empty());
  assert!(matches!(coord.fetch_state(), FetchState::Error(_)));

  // The guard does not re-run the first load; an explicit refresh does.
  coord.load().await.unwrap();
  assert_eq!(backend.calls().len(), 1);
  backend.fail_lists.store(false, Ordering::SeqCst);
  coord.refresh().await.unwrap();
  assert_eq!(coord.topics().len(), 1);
  assert_eq!(coord.fetch_state(), FetchState::Loaded);
}

#[tokio::test]
async fn only_the_faculty_topics_are_listed() {
  let mut other = topic("elsewhere", TimeDelta::days(5));
  other.faculty_id = "fac-2".into();
  let backend = Arc::new(FakeBackend::with_topics(vec![
    topic("mine", TimeDelta::days(5)),
    other,
  ]));
  let coord = TopicCoordinator::new(backend, "fac-1");
  coord.load().await.unwrap();
  let ids: Vec<_> = coord.topics().into_iter().map(|t| t.topic_id).collect();
  assert_eq!(ids, vec!["mine"]);
}

// ─── Topics: mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn update_is_followed_by_exactly_one_refetch() {
  let backend = Arc::new(FakeBackend::with_topics(vec![topic("a", TimeDelta::days(5))]));
  let coord = TopicCoordinator::new(backend.clone(), "fac-1");
  coord.load().await.unwrap();

  let outcome = coord.update("a", new_topic("Renamed")).await.unwrap();

  let updated = outcome.applied().expect("update applied");
  assert_eq!(updated.name, "Renamed");
  assert_eq!(backend.calls(), vec![
    "list_topics",
    "update_topic",
    "list_topics"
  ]);
  assert_eq!(coord.topics()[0].name, "Renamed");
  assert_eq!(coord.mutation_state(), MutationState::Idle);
}

#[tokio::test]
async fn failed_create_leaves_list_untouched() {
  let backend = Arc::new(FakeBackend::with_topics(vec![topic("a", TimeDelta::days(5))]));
  let coord = TopicCoordinator::new(backend.clone(), "fac-1");
  coord.load().await.unwrap();
  let before = coord.topics();

  backend.reject_mutations.store(true, Ordering::SeqCst);
  let err = coord.create(new_topic("Doomed")).await.unwrap_err();

  assert!(matches!(err, Error::Mutation {
    operation: Operation::CreateTopic,
    ..
  }));
  assert_eq!(coord.topics(), before);
  assert_eq!(backend.calls(), vec!["list_topics", "create_topic"]);
  assert_eq!(coord.mutation_state(), MutationState::Idle);
  assert_eq!(coord.fetch_state(), FetchState::Loaded);
}

#[tokio::test]
async fn invalid_topic_never_reaches_backend() {
  let backend = Arc::new(FakeBackend::default());
  let coord = TopicCoordinator::new(backend.clone(), "fac-1");
  let mut payload = new_topic("Backwards");
  payload.release_date = payload.end_date + TimeDelta::days(1);

  let err = coord.create(payload).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Validation(ref p) if matches!(p.as_slice(), [Invalid::ReleaseAfterEnd { .. }])
  ));
  assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn create_and_delete_resync_the_list() {
  let backend = Arc::new(FakeBackend::default());
  let coord = TopicCoordinator::new(backend.clone(), "fac-1");

  let created = coord
    .create(new_topic("Fresh"))
    .await
    .unwrap()
    .applied()
    .unwrap();
  assert_eq!(coord.topics(), vec![created.clone()]);
  // The forced refetch counts as the first load.
  coord.load().await.unwrap();

  coord.remove(&created.topic_id).await.unwrap();
  assert!(coord.topics().is_empty());
  assert_eq!(backend.calls(), vec![
    "create_topic",
    "list_topics",
    "delete_topic",
    "list_topics"
  ]);
}

#[tokio::test]
async fn second_mutation_while_pending_is_ignored() {
  let gate = Arc::new(Notify::new());
  let backend = Arc::new(FakeBackend {
    hold: Some(gate.clone()),
    ..FakeBackend::default()
  });
  let coord = TopicCoordinator::new(backend.clone(), "fac-1");

  let (first, second) = tokio::join!(coord.create(new_topic("First")), async {
    let second = coord.create(new_topic("Second")).await;
    gate.notify_one();
    second
  });

  assert!(matches!(first.unwrap(), MutationOutcome::Applied(_)));
  assert_eq!(second.unwrap(), MutationOutcome::Ignored);
  assert_eq!(backend.calls(), vec!["create_topic", "list_topics"]);
  assert_eq!(coord.topics().len(), 1);
}

#[tokio::test]
async fn dropped_mutation_frees_the_slot() {
  let gate = Arc::new(Notify::new());
  let backend = Arc::new(FakeBackend {
    hold: Some(gate.clone()),
    ..FakeBackend::default()
  });
  let coord = TopicCoordinator::new(backend.clone(), "fac-1");

  let timed_out = tokio::time::timeout(
    Duration::from_millis(20),
    coord.create(new_topic("First")),
  )
  .await;
  assert!(timed_out.is_err());
  assert_eq!(coord.mutation_state(), MutationState::Idle);

  gate.notify_one();
  let second = coord.create(new_topic("Second")).await.unwrap();
  assert!(matches!(second, MutationOutcome::Applied(ref t) if t.name == "Second"));
  assert_eq!(backend.calls(), vec![
    "create_topic",
    "create_topic",
    "list_topics"
  ]);
  assert_eq!(coord.topics().len(), 1);
}

#[tokio::test]
async fn dropped_first_load_is_retried_by_the_next_load() {
  let gate = Arc::new(Notify::new());
  let backend = Arc::new(FakeBackend {
    topics: Mutex::new(vec![topic("a", TimeDelta::days(5))]),
    hold_lists: Some(gate.clone()),
    ..FakeBackend::default()
  });
  let coord = TopicCoordinator::new(backend.clone(), "fac-1");

  let timed_out = tokio::time::timeout(Duration::from_millis(20), coord.load()).await;
  assert!(timed_out.is_err());
  assert_eq!(coord.fetch_state(), FetchState::NotStarted);

  gate.notify_one();
  coord.load().await.unwrap();
  assert_eq!(coord.fetch_state(), FetchState::Loaded);
  assert_eq!(coord.topics().len(), 1);
  assert_eq!(backend.calls(), vec!["list_topics", "list_topics"]);
}

#[tokio::test]
async fn failed_refetch_after_success_keeps_last_snapshot() {
  let backend = Arc::new(FakeBackend::with_topics(vec![topic("a", TimeDelta::days(5))]));
  let coord = TopicCoordinator::new(backend.clone(), "fac-1");
  coord.load().await.unwrap();

  backend.fail_lists.store(true, Ordering::SeqCst);
  let err = coord.update("a", new_topic("Renamed")).await.unwrap_err();

  assert!(matches!(err, Error::Fetch { .. }));
  assert_eq!(coord.topics()[0].name, "Topic a");
  assert!(matches!(coord.fetch_state(), FetchState::Error(_)));
  assert_eq!(coord.mutation_state(), MutationState::Idle);
}

#[tokio::test]
async fn snapshot_feeds_filter_and_sort() {
  let backend = Arc::new(FakeBackend::with_topics(vec![
    topic("old", TimeDelta::days(-1)),
    topic("closing", TimeDelta::days(2)),
    topic("open", TimeDelta::days(20)),
  ]));
  let coord = TopicCoordinator::new(backend, "fac-1");
  coord.load().await.unwrap();

  let topics = coord.topics();
  let rows = filter_and_sort(&topics, StatusFilter::All, now());
  let order: Vec<_> = rows.iter().map(|r| r.topic.topic_id.as_str()).collect();
  assert_eq!(order, vec!["open", "closing", "old"]);
}

// ─── Contributions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn submission_to_open_topic_refetches_scope() {
  let backend = Arc::new(FakeBackend::default());
  let coord = ContributionCoordinator::new(backend.clone(), student_scope("t1"));
  coord.load().await.unwrap();

  let end = now() + TimeDelta::days(2);
  let created = coord
    .create(submission("t1"), end, now())
    .await
    .unwrap()
    .applied()
    .unwrap();

  assert_eq!(created.files[0].name, "entry.pdf");
  assert_eq!(coord.contributions(), vec![created]);
  assert_eq!(backend.calls(), vec![
    "list_contributions",
    "create_contribution",
    "list_contributions"
  ]);
}

#[tokio::test]
async fn submission_at_the_end_instant_is_allowed() {
  let backend = Arc::new(FakeBackend::default());
  let coord = ContributionCoordinator::new(backend, student_scope("t1"));
  let outcome = coord.create(submission("t1"), now(), now()).await.unwrap();
  assert!(outcome.applied().is_some());
}

#[tokio::test]
async fn expired_topic_blocks_create_and_edit() {
  let backend = Arc::new(FakeBackend::default());
  let coord = ContributionCoordinator::new(backend.clone(), student_scope("t1"));
  let end = now() - TimeDelta::days(1);

  let err = coord.create(submission("t1"), end, now()).await.unwrap_err();
  assert!(matches!(err, Error::GateViolation { ref topic_id, .. } if topic_id == "t1"));

  let err = coord
    .update("contribution-0", submission("t1"), end, now())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::GateViolation { .. }));
  assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn incomplete_submission_is_rejected_locally() {
  let backend = Arc::new(FakeBackend::default());
  let coord = ContributionCoordinator::new(backend.clone(), student_scope("t1"));
  let mut payload = submission("t1");
  payload.terms_accepted = false;
  payload.files.clear();

  let err = coord
    .create(payload, now() + TimeDelta::days(1), now())
    .await
    .unwrap_err();
  match err {
    Error::Validation(problems) => {
      assert_eq!(problems, vec![Invalid::TermsNotAccepted, Invalid::NoFiles]);
    }
    other => panic!("expected validation failure, got {other:?}"),
  }
  assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn edit_refetches_and_rejection_keeps_snapshot() {
  let backend = Arc::new(FakeBackend::default());
  let coord = ContributionCoordinator::new(backend.clone(), ContributionScope::Topic {
    topic_id: "t1".into(),
  });
  let end = now() + TimeDelta::days(1);
  let created = coord
    .create(submission("t1"), end, now())
    .await
    .unwrap()
    .applied()
    .unwrap();

  let mut edit = submission("t1");
  edit.title = "Revised".into();
  edit.files.clear();
  coord
    .update(&created.contribution_id, edit, end, now())
    .await
    .unwrap();
  assert_eq!(coord.contributions()[0].title, "Revised");

  backend.reject_mutations.store(true, Ordering::SeqCst);
  let err = coord.remove(&created.contribution_id).await.unwrap_err();
  assert!(matches!(err, Error::Mutation {
    operation: Operation::DeleteContribution,
    ..
  }));
  assert_eq!(coord.contributions().len(), 1);
}

#[tokio::test]
async fn contribution_delete_resyncs_the_scope() {
  let backend = Arc::new(FakeBackend::default());
  let coord = ContributionCoordinator::new(backend.clone(), student_scope("t1"));
  let end = now() + TimeDelta::days(3);
  let created = coord
    .create(submission("t1"), end, now())
    .await
    .unwrap()
    .applied()
    .unwrap();
  assert_eq!(coord.contributions().len(), 1);

  let outcome = coord.remove(&created.contribution_id).await.unwrap();
  assert_eq!(outcome, MutationOutcome::Applied(()));
  assert!(coord.contributions().is_empty());
  assert_eq!(coord.mutation_state(), MutationState::Idle);
  assert_eq!(backend.calls(), vec![
    "create_contribution",
    "list_contributions",
    "delete_contribution",
    "list_contributions"
  ]);
}

#[tokio::test]
async fn published_view_shows_only_approved() {
  let backend = Arc::new(FakeBackend::default());
  let approved = {
    let mut c = backend.contribution_from("c-approved".into(), &submission("t1"));
    c.status.name = ContributionStatus::Approved;
    c
  };
  let pending = backend.contribution_from("c-pending".into(), &submission("t1"));
  backend
    .contributions
    .lock()
    .extend([pending, approved.clone()]);

  let coord = ContributionCoordinator::new(backend, ContributionScope::All);
  coord.load().await.unwrap();
  assert_eq!(coord.contributions().len(), 2);
  assert_eq!(coord.published(), vec![approved]);
}
