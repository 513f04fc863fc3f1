//! Async HTTP client for the portal REST API.
//!
//! [`ApiClient`] is the production [`PortalBackend`]: topics travel as JSON,
//! contributions as multipart form data so staged files ride along.

use std::{future::Future, time::Duration};

use portal_core::{
  backend::PortalBackend,
  contribution::{Contribution, ContributionScope, NewContribution},
  topic::{NewTopic, Topic},
};
use reqwest::{
  Client, Method, RequestBuilder, Response, StatusCode,
  multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Connection settings for the portal API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Sent as a bearer token on every request when present.
  pub token:    Option<String>,
}

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("failed to build HTTP client: {0}")]
  Build(#[source] reqwest::Error),

  #[error("{method} {path} failed: {source}")]
  Transport {
    method: Method,
    path:   String,
    #[source]
    source: reqwest::Error,
  },

  #[error("{method} {path} → {status}: {body}")]
  Status {
    method: Method,
    path:   String,
    status: StatusCode,
    body:   String,
  },

  #[error("invalid attachment {name}: {source}")]
  Attachment {
    name:   String,
    #[source]
    source: reqwest::Error,
  },
}

/// Async HTTP client for the portal REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(ClientError::Build)?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let req = self.client.request(method, self.url(path));
    match &self.config.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Send `req` and turn anything but a 2xx into [`ClientError::Status`].
  async fn send(
    &self,
    method: Method,
    path: &str,
    req: RequestBuilder,
  ) -> Result<Response, ClientError> {
    debug!(%method, path, "request");
    let resp = req.send().await.map_err(|source| ClientError::Transport {
      method: method.clone(),
      path: path.to_owned(),
      source,
    })?;

    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status {
      method,
      path: path.to_owned(),
      status,
      body,
    })
  }

  async fn json<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    req: RequestBuilder,
  ) -> Result<T, ClientError> {
    let resp = self.send(method.clone(), path, req).await?;
    resp.json().await.map_err(|source| ClientError::Transport {
      method,
      path: path.to_owned(),
      source,
    })
  }

  async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ClientError> {
    self
      .json(Method::GET, path, self.request(Method::GET, path))
      .await
  }

  async fn delete(&self, path: &str) -> Result<(), ClientError> {
    self
      .send(Method::DELETE, path, self.request(Method::DELETE, path))
      .await
      .map(drop)
  }
}

/// Path of the listing for one contribution scope.
fn scope_path(scope: &ContributionScope) -> String {
  match scope {
    ContributionScope::Student {
      user_id,
      faculty_id,
      topic_id,
    } => format!("/contributions/student/{user_id}/{faculty_id}/{topic_id}"),
    ContributionScope::Topic { topic_id } => format!("/contributions/topic/{topic_id}"),
    ContributionScope::All => "/contributions".to_owned(),
  }
}

/// Multipart body for contribution create/update. Every staged file is a
/// `files` part.
fn contribution_form(payload: &NewContribution) -> Result<Form, ClientError> {
  let mut form = Form::new()
    .text("userID", payload.user_id.clone())
    .text("facultyID", payload.faculty_id.clone())
    .text("topicID", payload.topic_id.clone())
    .text("statusID", payload.status_id.clone())
    .text("title", payload.title.clone())
    .text("content", payload.content.clone())
    .text("agreedToTnC", payload.terms_accepted.to_string());

  for file in &payload.files {
    let part = Part::bytes(file.data.to_vec())
      .file_name(file.name.clone())
      .mime_str(&file.content_type)
      .map_err(|source| ClientError::Attachment {
        name: file.name.clone(),
        source,
      })?;
    form = form.part("files", part);
  }
  Ok(form)
}

impl PortalBackend for ApiClient {
  type Error = ClientError;

  // ── Topics ────────────────────────────────────────────────────────────────

  /// `GET /api/topics/faculty/{faculty_id}`
  fn list_topics<'a>(
    &'a self,
    faculty_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Topic>, ClientError>> + Send + 'a {
    async move { self.get_list(&format!("/topics/faculty/{faculty_id}")).await }
  }

  /// `POST /api/topics`
  fn create_topic<'a>(
    &'a self,
    payload: &'a NewTopic,
  ) -> impl Future<Output = Result<Topic, ClientError>> + Send + 'a {
    async move {
      let path = "/topics";
      let req = self.request(Method::POST, path).json(payload);
      self.json(Method::POST, path, req).await
    }
  }

  /// `PUT /api/topics/{topic_id}`
  fn update_topic<'a>(
    &'a self,
    topic_id: &'a str,
    payload: &'a NewTopic,
  ) -> impl Future<Output = Result<Topic, ClientError>> + Send + 'a {
    async move {
      let path = format!("/topics/{topic_id}");
      let req = self.request(Method::PUT, &path).json(payload);
      self.json(Method::PUT, &path, req).await
    }
  }

  /// `DELETE /api/topics/{topic_id}`
  fn delete_topic<'a>(
    &'a self,
    topic_id: &'a str,
  ) -> impl Future<Output = Result<(), ClientError>> + Send + 'a {
    async move { self.delete(&format!("/topics/{topic_id}")).await }
  }

  // ── Contributions ─────────────────────────────────────────────────────────

  fn list_contributions<'a>(
    &'a self,
    scope: &'a ContributionScope,
  ) -> impl Future<Output = Result<Vec<Contribution>, ClientError>> + Send + 'a {
    async move { self.get_list(&scope_path(scope)).await }
  }

  /// `POST /api/contributions` (multipart)
  fn create_contribution<'a>(
    &'a self,
    payload: &'a NewContribution,
  ) -> impl Future<Output = Result<Contribution, ClientError>> + Send + 'a {
    async move {
      let path = "/contributions";
      let form = contribution_form(payload)?;
      let req = self.request(Method::POST, path).multipart(form);
      self.json(Method::POST, path, req).await
    }
  }

  /// `PUT /api/contributions/{contribution_id}` (multipart)
  fn update_contribution<'a>(
    &'a self,
    contribution_id: &'a str,
    payload: &'a NewContribution,
  ) -> impl Future<Output = Result<Contribution, ClientError>> + Send + 'a {
    async move {
      let path = format!("/contributions/{contribution_id}");
      let form = contribution_form(payload)?;
      let req = self.request(Method::PUT, &path).multipart(form);
      self.json(Method::PUT, &path, req).await
    }
  }

  /// `DELETE /api/contributions/{contribution_id}`
  fn delete_contribution<'a>(
    &'a self,
    contribution_id: &'a str,
  ) -> impl Future<Output = Result<(), ClientError>> + Send + 'a {
    async move { self.delete(&format!("/contributions/{contribution_id}")).await }
  }
}
