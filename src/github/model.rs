use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Subset of `GET /repos/{owner}/{repo}` used to build a snapshot record.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub owner: Owner,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Taken from the `Last-Modified` response header, not the body.
    #[serde(skip)]
    pub last_modified: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub login: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
}
