//! `portal`: command-line client for the contribution portal.
//!
//! # Usage
//!
//! ```
//! portal topics list --faculty f1 --status soonToExpire
//! portal topics create --faculty f1 --name "Green campus" \
//!   --release 2024-03-01T00:00:00Z --end 2024-03-10T00:00:00Z
//! portal contributions submit --user u1 --faculty f1 --topic t1 \
//!   --status-id s1 --title Poster --content "..." --agree \
//!   --file poster.pdf --topic-end 2024-03-10T00:00:00Z
//! portal contributions list --published
//! ```

mod client;
mod render;
mod settings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use portal_core::{
  attachment::{StagedFile, add_files},
  contribution::{ContributionScope, NewContribution},
  coordinator::{ContributionCoordinator, MutationOutcome, TopicCoordinator},
  filter::{StatusFilter, filter_and_sort},
  topic::NewTopic,
};
use settings::{Overrides, Settings};
use tracing::{debug, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "portal", about = "Manage topics and contributions on the portal")]
struct Args {
  /// Path to a TOML config file (base_url, token).
  #[arg(short, long, value_name = "FILE", default_value = "portal.toml", global = true)]
  config: PathBuf,

  /// Base URL of the portal API (default: http://localhost:5000).
  #[arg(long, global = true)]
  url: Option<String>,

  /// Bearer token sent with every request.
  #[arg(long, global = true)]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Faculty topics and their submission windows.
  #[command(subcommand)]
  Topics(TopicCommand),
  /// Student contributions.
  #[command(subcommand)]
  Contributions(ContributionCommand),
}

#[derive(Subcommand, Debug)]
enum TopicCommand {
  /// List a faculty's topics, open ones first.
  List {
    #[arg(long)]
    faculty: String,
    /// One of `active`, `soonToExpire`, `expired`; all topics when omitted.
    #[arg(long)]
    status:  Option<String>,
  },
  Create(TopicArgs),
  Update {
    id:    String,
    #[command(flatten)]
    topic: TopicArgs,
  },
  Delete {
    id:      String,
    #[arg(long)]
    faculty: String,
  },
}

#[derive(clap::Args, Debug)]
struct TopicArgs {
  #[arg(long)]
  faculty: String,
  #[arg(long)]
  name:    String,
  /// RFC 3339 instant, e.g. 2024-03-01T00:00:00Z.
  #[arg(long)]
  release: DateTime<Utc>,
  /// RFC 3339 instant after which submissions close.
  #[arg(long)]
  end:     DateTime<Utc>,
}

impl From<TopicArgs> for NewTopic {
  fn from(args: TopicArgs) -> Self {
    Self {
      name:         args.name,
      faculty_id:   args.faculty,
      release_date: args.release,
      end_date:     args.end,
    }
  }
}

#[derive(Subcommand, Debug)]
enum ContributionCommand {
  /// List contributions for a student, a topic, or everyone.
  List {
    #[arg(long, conflicts_with = "published")]
    topic:     Option<String>,
    #[arg(long, requires_all = ["topic", "faculty"])]
    student:   Option<String>,
    #[arg(long)]
    faculty:   Option<String>,
    /// Approved contributions only.
    #[arg(long)]
    published: bool,
  },
  Submit(SubmissionArgs),
  Edit {
    id:         String,
    #[command(flatten)]
    submission: SubmissionArgs,
  },
  Delete {
    id:    String,
    /// Topic whose contributions are listed afterwards.
    #[arg(long)]
    topic: Option<String>,
  },
}

#[derive(clap::Args, Debug)]
struct SubmissionArgs {
  #[arg(long)]
  user:      String,
  #[arg(long)]
  faculty:   String,
  #[arg(long)]
  topic:     String,
  #[arg(long, value_name = "ID")]
  status_id: String,
  #[arg(long)]
  title:     String,
  #[arg(long)]
  content:   String,
  /// Accept the terms and conditions.
  #[arg(long)]
  agree:     bool,
  /// File to attach; repeat for several. Later files with a name already
  /// attached are skipped.
  #[arg(long = "file", value_name = "PATH")]
  files:     Vec<PathBuf>,
  /// End date of the topic being submitted to.
  #[arg(long, value_name = "RFC3339")]
  topic_end: DateTime<Utc>,
}

impl SubmissionArgs {
  fn scope(&self) -> ContributionScope {
    ContributionScope::Student {
      user_id:    self.user.clone(),
      faculty_id: self.faculty.clone(),
      topic_id:   self.topic.clone(),
    }
  }

  fn into_payload(self, files: Vec<StagedFile>) -> NewContribution {
    NewContribution {
      user_id:        self.user,
      faculty_id:     self.faculty,
      topic_id:       self.topic,
      status_id:      self.status_id,
      title:          self.title,
      content:        self.content,
      terms_accepted: self.agree,
      files,
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let settings = Settings::load(&args.config, Overrides {
    base_url: args.url,
    token:    args.token,
  })
  .context("failed to load settings")?;
  debug!(base_url = %settings.base_url, "settings loaded");

  let api = Arc::new(ApiClient::new(ApiConfig {
    base_url: settings.base_url,
    token:    settings.token,
  })?);

  // One instant per command, so every classification agrees.
  let now = Utc::now();

  match args.command {
    Command::Topics(command) => run_topics(api, command, now).await,
    Command::Contributions(command) => run_contributions(api, command, now).await,
  }
}

// ─── Topics ───────────────────────────────────────────────────────────────────

async fn run_topics(api: Arc<ApiClient>, command: TopicCommand, now: DateTime<Utc>) -> Result<()> {
  let coordinator = match &command {
    TopicCommand::List { faculty, .. } | TopicCommand::Delete { faculty, .. } => {
      TopicCoordinator::new(api, faculty.clone())
    }
    TopicCommand::Create(topic) | TopicCommand::Update { topic, .. } => {
      TopicCoordinator::new(api, topic.faculty.clone())
    }
  };

  match command {
    TopicCommand::List { status, .. } => {
      let filter = StatusFilter::parse(status.as_deref().unwrap_or_default())?;
      coordinator.load().await.context("listing topics")?;
      let topics = coordinator.topics();
      print!("{}", render::topics(&filter_and_sort(&topics, filter, now)));
      return Ok(());
    }
    TopicCommand::Create(topic) => {
      let outcome = coordinator
        .create(topic.into())
        .await
        .context("creating topic")?;
      report(outcome, |t| format!("Created topic {} ({})", t.name, t.topic_id));
    }
    TopicCommand::Update { id, topic } => {
      let outcome = coordinator
        .update(&id, topic.into())
        .await
        .context("updating topic")?;
      report(outcome, |t| format!("Updated topic {}", t.topic_id));
    }
    TopicCommand::Delete { id, .. } => {
      let outcome = coordinator.remove(&id).await.context("deleting topic")?;
      report(outcome, |()| format!("Deleted topic {id}"));
    }
  }

  let topics = coordinator.topics();
  print!(
    "{}",
    render::topics(&filter_and_sort(&topics, StatusFilter::All, now))
  );
  Ok(())
}

// ─── Contributions ────────────────────────────────────────────────────────────

async fn run_contributions(
  api: Arc<ApiClient>,
  command: ContributionCommand,
  now: DateTime<Utc>,
) -> Result<()> {
  match command {
    ContributionCommand::List {
      topic,
      student,
      faculty,
      published,
    } => {
      let scope = match (topic, student, faculty) {
        (Some(topic_id), Some(user_id), Some(faculty_id)) => ContributionScope::Student {
          user_id,
          faculty_id,
          topic_id,
        },
        (Some(topic_id), ..) => ContributionScope::Topic { topic_id },
        _ => ContributionScope::All,
      };
      let coordinator = ContributionCoordinator::new(api, scope);
      coordinator.load().await.context("listing contributions")?;
      let items = if published {
        coordinator.published()
      } else {
        coordinator.contributions()
      };
      print!("{}", render::contributions(&items));
    }
    ContributionCommand::Submit(submission) => {
      let files = stage_files(&submission.files).await?;
      let topic_end = submission.topic_end;
      let coordinator = ContributionCoordinator::new(api, submission.scope());
      let outcome = coordinator
        .create(submission.into_payload(files), topic_end, now)
        .await
        .context("submitting contribution")?;
      report(outcome, |c| format!("Submitted contribution {}", c.contribution_id));
      print!("{}", render::contributions(&coordinator.contributions()));
    }
    ContributionCommand::Edit { id, submission } => {
      let files = stage_files(&submission.files).await?;
      let topic_end = submission.topic_end;
      let coordinator = ContributionCoordinator::new(api, submission.scope());
      let outcome = coordinator
        .update(&id, submission.into_payload(files), topic_end, now)
        .await
        .context("editing contribution")?;
      report(outcome, |c| format!("Updated contribution {}", c.contribution_id));
      print!("{}", render::contributions(&coordinator.contributions()));
    }
    ContributionCommand::Delete { id, topic } => {
      let scope = match topic {
        Some(topic_id) => ContributionScope::Topic { topic_id },
        None => ContributionScope::All,
      };
      let coordinator = ContributionCoordinator::new(api, scope);
      let outcome = coordinator
        .remove(&id)
        .await
        .context("deleting contribution")?;
      report(outcome, |()| format!("Deleted contribution {id}"));
      print!("{}", render::contributions(&coordinator.contributions()));
    }
  }
  Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn report<T>(outcome: MutationOutcome<T>, describe: impl FnOnce(T) -> String) {
  match outcome {
    MutationOutcome::Applied(value) => println!("{}", describe(value)),
    MutationOutcome::Ignored => warn!("another change is still in flight; nothing was sent"),
  }
}

/// Read attachments from disk, dropping repeats of a file name.
async fn stage_files(paths: &[PathBuf]) -> Result<Vec<StagedFile>> {
  let mut picked = Vec::with_capacity(paths.len());
  for path in paths {
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .with_context(|| format!("{} is not a file", path.display()))?;
    let data = tokio::fs::read(path)
      .await
      .with_context(|| format!("reading {}", path.display()))?;
    picked.push(StagedFile::new(name, content_type_for(path), data));
  }
  Ok(add_files(Vec::new(), picked))
}

fn content_type_for(path: &Path) -> &'static str {
  let ext = path
    .extension()
    .map(|e| e.to_string_lossy().to_ascii_lowercase())
    .unwrap_or_default();
  match ext.as_str() {
    "pdf" => "application/pdf",
    "doc" => "application/msword",
    "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "jpg" | "jpeg" => "image/jpeg",
    "png" => "image/png",
    "gif" => "image/gif",
    "txt" => "text/plain",
    _ => "application/octet-stream",
  }
}
