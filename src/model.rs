use serde::{Deserialize, Serialize};
use std::fmt;

/// Owner/name pair parsed out of a configured repository URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One entry of the generated snapshot. Field names are part of the output format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub name: String,
    pub owner: String,
    pub language: Option<String>,
    pub url: String,
    pub stars: u64,
    pub stars_display: String,
    pub last_modified: Option<String>,
    pub id: String,
    pub description: Option<String>,
    pub repo_display_name: String,
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub issues: Vec<IssueRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueRecord {
    pub title: String,
    pub url: String,
    pub number: u64,
    pub created_at: String,
}

/// Result of looking a repository up on the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOutcome {
    /// The repository exists and has at least one qualifying issue.
    Qualified(RepositoryRecord),
    /// The repository exists but nothing carries the label right now.
    NoQualifyingIssues,
    NotFound,
}
