use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LAST_MODIFIED};
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use thiserror::Error;
use tracing::debug;

pub mod model;

pub use model::{Issue, Owner, Repository};

const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("repository {owner}/{name} not found")]
    NotFound { owner: String, name: String },
    #[error("failed to reach GitHub: {0}")]
    Http(#[from] reqwest::Error),
    #[error("github error {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("invalid GitHub request: {0}")]
    Request(String),
}

/// Parameters for listing labelled issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueQuery {
    pub label: String,
    pub state: String,
    pub limit: u32,
    pub sort: String,
    pub direction: String,
}

impl Default for IssueQuery {
    fn default() -> Self {
        Self {
            label: "good first issue".into(),
            state: "open".into(),
            limit: 10,
            sort: "created".into(),
            direction: "desc".into(),
        }
    }
}

#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository, TrackerError>;

    /// At most `query.limit` issues, ordered as the query asks.
    async fn list_issues(
        &self,
        repository: &Repository,
        query: &IssueQuery,
    ) -> Result<Vec<Issue>, TrackerError>;
}

#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    pub fn new(base_url: &str, token: String) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid GitHub API base URL: {}", base_url))?;
        let http = Client::builder()
            .user_agent(concat!("gfi-populate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn headers(&self) -> Result<HeaderMap, TrackerError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| TrackerError::Request("access token is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        Ok(headers)
    }

    fn endpoint(&self, path: &str) -> Result<Url, TrackerError> {
        self.base_url
            .join(path)
            .map_err(|e| TrackerError::Request(format!("{}: {}", path, e)))
    }

    pub fn build_repository_request(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<reqwest::Request, TrackerError> {
        let url = self.endpoint(&format!("repos/{}/{}", owner, name))?;
        Ok(self.http.get(url).headers(self.headers()?).build()?)
    }

    pub fn build_issues_request(
        &self,
        owner: &str,
        name: &str,
        query: &IssueQuery,
    ) -> Result<reqwest::Request, TrackerError> {
        let url = self.endpoint(&format!("repos/{}/{}/issues", owner, name))?;
        let per_page = query.limit.to_string();
        Ok(self
            .http
            .get(url)
            .headers(self.headers()?)
            .query(&[
                ("labels", query.label.as_str()),
                ("state", query.state.as_str()),
                ("per_page", per_page.as_str()),
                ("sort", query.sort.as_str()),
                ("direction", query.direction.as_str()),
            ])
            .build()?)
    }
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository, TrackerError> {
        let request = self.build_repository_request(owner, name)?;
        debug!(url=%request.url(), "fetching repository");
        let res = self.http.execute(request).await?;

        if res.status() == StatusCode::NOT_FOUND {
            return Err(TrackerError::NotFound {
                owner: owner.to_string(),
                name: name.to_string(),
            });
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(TrackerError::Api { status, body });
        }

        let last_modified = res
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let mut repository: Repository = res.json().await?;
        repository.last_modified = last_modified.or_else(|| repository.updated_at.clone());
        Ok(repository)
    }

    async fn list_issues(
        &self,
        repository: &Repository,
        query: &IssueQuery,
    ) -> Result<Vec<Issue>, TrackerError> {
        let request = self.build_issues_request(&repository.owner.login, &repository.name, query)?;
        debug!(url=%request.url(), "listing issues");
        let res = self.http.execute(request).await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(TrackerError::Api { status, body });
        }

        let mut issues: Vec<Issue> = res.json().await?;
        issues.truncate(query.limit as usize);
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GitHubClient {
        GitHubClient::new("https://api.github.com/", "gh-token".into()).unwrap()
    }

    #[test]
    fn repository_request_targets_repos_endpoint() {
        let req = client().build_repository_request("foo", "bar").unwrap();
        assert_eq!(req.method(), reqwest::Method::GET);
        assert_eq!(req.url().as_str(), "https://api.github.com/repos/foo/bar");
        assert_eq!(req.headers()[AUTHORIZATION], "Bearer gh-token");
        assert_eq!(req.headers()[ACCEPT], "application/vnd.github+json");
        assert_eq!(req.headers()["x-github-api-version"], GITHUB_API_VERSION);
    }

    #[test]
    fn issues_request_carries_query() {
        let req = client()
            .build_issues_request("foo", "bar", &IssueQuery::default())
            .unwrap();
        let url = req.url();
        assert_eq!(url.path(), "/repos/foo/bar/issues");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("labels".into(), "good first issue".into())));
        assert!(pairs.contains(&("state".into(), "open".into())));
        assert!(pairs.contains(&("per_page".into(), "10".into())));
        assert!(pairs.contains(&("sort".into(), "created".into())));
        assert!(pairs.contains(&("direction".into(), "desc".into())));
    }

    #[test]
    fn custom_base_url_is_honoured() {
        let c = GitHubClient::new("http://127.0.0.1:9999/api/", "t".into()).unwrap();
        let req = c.build_repository_request("a", "b").unwrap();
        assert_eq!(req.url().as_str(), "http://127.0.0.1:9999/api/repos/a/b");
    }

    #[test]
    fn invalid_base_url_rejected() {
        assert!(GitHubClient::new("not a url", "t".into()).is_err());
    }

    #[test]
    fn repository_payload_decodes() {
        let body = r#"{
            "id": 1296269,
            "name": "Hello-World",
            "full_name": "octocat/Hello-World",
            "html_url": "https://github.com/octocat/Hello-World",
            "description": null,
            "language": "Rust",
            "stargazers_count": 80,
            "owner": { "login": "octocat", "id": 1 },
            "updated_at": "2011-01-26T19:14:43Z",
            "forks": 9
        }"#;
        let repo: Repository = serde_json::from_str(body).unwrap();
        assert_eq!(repo.id, 1296269);
        assert_eq!(repo.owner.login, "octocat");
        assert_eq!(repo.description, None);
        assert_eq!(repo.last_modified, None);
    }

    #[test]
    fn issue_payload_decodes() {
        let body = r#"[{
            "number": 1347,
            "title": "Found a bug",
            "html_url": "https://github.com/octocat/Hello-World/issues/1347",
            "created_at": "2011-04-22T13:33:48Z",
            "labels": []
        }]"#;
        let issues: Vec<Issue> = serde_json::from_str(body).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].number, 1347);
        let created = issues[0].created_at.to_rfc3339();
        assert_eq!(created, "2011-04-22T13:33:48+00:00");
    }
}
