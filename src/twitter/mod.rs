use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::RepositoryRef;

pub mod oauth;

pub use oauth::OAuthCredentials;

const REPOSITORY_HOST: &str = "https://github.com";

#[derive(Debug, Error)]
pub enum PostError {
    #[error("failed to reach Twitter: {0}")]
    Http(#[from] reqwest::Error),
    #[error("twitter rejected the post {status}: {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("invalid Twitter request: {0}")]
    Request(String),
}

#[async_trait]
pub trait SocialPoster: Send + Sync {
    /// URL the post links to; doubles as the announcement key.
    fn build_target_url(&self, repo: &RepositoryRef) -> String {
        contribute_url(repo)
    }

    /// Publish an announcement for `repo`, returning the id of the new post.
    async fn post(&self, repo: &RepositoryRef) -> Result<String, PostError>;
}

/// GitHub's newcomer landing page for a repository.
pub fn contribute_url(repo: &RepositoryRef) -> String {
    format!(
        "{}/{}/{}/contribute",
        REPOSITORY_HOST, repo.owner, repo.name
    )
}

pub fn format_post(repo: &RepositoryRef, target_url: &str) -> String {
    format!(
        "{} has good first issues waiting for new contributors! {} #goodfirstissue #opensource",
        repo, target_url
    )
}

#[derive(Clone)]
pub struct TwitterClient {
    http: Client,
    base_url: Url,
    credentials: OAuthCredentials,
}

impl fmt::Debug for TwitterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: CreatedTweet,
}

#[derive(Deserialize)]
struct CreatedTweet {
    id: String,
}

/// Id of the created post, or `unknown` when a successful response body
/// cannot be decoded. The post exists either way.
fn post_id_from_body(body: &str) -> String {
    match serde_json::from_str::<CreateTweetResponse>(body) {
        Ok(payload) => payload.data.id,
        Err(err) => {
            warn!(%err, "could not decode create-tweet response");
            "unknown".into()
        }
    }
}

impl TwitterClient {
    pub fn new(base_url: &str, credentials: OAuthCredentials) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid Twitter API base URL: {}", base_url))?;
        let http = Client::builder()
            .user_agent(concat!("gfi-populate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Signed `POST 2/tweets` request carrying `body`.
    pub fn build_request(
        &self,
        body: &Value,
        nonce: &str,
        timestamp: i64,
    ) -> Result<reqwest::Request, PostError> {
        let endpoint = self
            .base_url
            .join("2/tweets")
            .map_err(|e| PostError::Request(e.to_string()))?;
        let authorization = oauth::authorization_header(
            &self.credentials,
            &Method::POST,
            &endpoint,
            nonce,
            timestamp,
        )
        .map_err(|e| PostError::Request(e.to_string()))?;
        Ok(self
            .http
            .post(endpoint)
            .header("Authorization", authorization)
            .header("Content-Type", "application/json")
            .json(body)
            .build()?)
    }
}

#[async_trait]
impl SocialPoster for TwitterClient {
    async fn post(&self, repo: &RepositoryRef) -> Result<String, PostError> {
        let text = format_post(repo, &self.build_target_url(repo));
        let body = json!({ "text": text });
        let request = self.build_request(
            &body,
            &oauth::generate_nonce(),
            oauth::current_timestamp(),
        )?;
        debug!(url=%request.url(), payload=%body, "sending tweet");
        let res = self.http.execute(request).await?;

        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(PostError::Rejected { status, body: text });
        }
        Ok(post_id_from_body(&text))
    }
}
