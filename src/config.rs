//! Configuration loader and validator for the good-first-issue populator.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::github::IssueQuery;
use crate::twitter::OAuthCredentials;

pub const GITHUB_TOKEN_ENV: &str = "GITHUB_ACCESS_TOKEN";
pub const TWITTER_APP_KEY_ENV: &str = "TWITTER_APP_KEY";
pub const TWITTER_APP_SECRET_ENV: &str = "TWITTER_APP_SECRET";
pub const TWITTER_TOKEN_ENV: &str = "TWITTER_OAUTH_TOKEN";
pub const TWITTER_TOKEN_SECRET_ENV: &str = "TWITTER_OAUTH_TOKEN_SECRET";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("No repository list found at {}", .0.display())]
    MissingRepositories(PathBuf),
    #[error("Missing credential: environment variable `{0}` is not set")]
    MissingEnv(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    #[serde(default)]
    pub github: GitHub,
    #[serde(default)]
    pub twitter: Twitter,
}

/// Paths used by a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
    pub repositories_file: String,
    pub snapshot_file: String,
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

/// Issue tracker settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHub {
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default = "default_issue_limit")]
    pub issue_limit: u32,
}

/// Social feed settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Twitter {
    #[serde(default = "default_twitter_api_base")]
    pub api_base: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_database_file() -> String {
    "goodfirstissues.db".into()
}

fn default_github_api_base() -> String {
    "https://api.github.com/".into()
}

fn default_label() -> String {
    "good first issue".into()
}

fn default_issue_limit() -> u32 {
    10
}

fn default_twitter_api_base() -> String {
    "https://api.twitter.com/".into()
}

fn default_enabled() -> bool {
    true
}

impl Default for GitHub {
    fn default() -> Self {
        Self {
            api_base: default_github_api_base(),
            label: default_label(),
            issue_limit: default_issue_limit(),
        }
    }
}

impl Default for Twitter {
    fn default() -> Self {
        Self {
            api_base: default_twitter_api_base(),
            enabled: default_enabled(),
        }
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        fs::create_dir_all(&self.app.data_dir)
    }

    /// SQLite URL for the announcement store. `DATABASE_URL` wins when set.
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            let path = Path::new(&self.app.data_dir).join(&self.app.database_file);
            format!("sqlite://{}", path.display())
        })
    }

    /// Query parameters used for every repository in a run.
    pub fn issue_query(&self) -> IssueQuery {
        IssueQuery {
            label: self.github.label.clone(),
            limit: self.github.issue_limit,
            ..IssueQuery::default()
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.app.repositories_file.trim().is_empty() {
        return Err(ConfigError::Invalid("app.repositories_file must be non-empty"));
    }
    if cfg.app.snapshot_file.trim().is_empty() {
        return Err(ConfigError::Invalid("app.snapshot_file must be non-empty"));
    }
    if cfg.app.database_file.trim().is_empty() {
        return Err(ConfigError::Invalid("app.database_file must be non-empty"));
    }

    if cfg.github.api_base.trim().is_empty() {
        return Err(ConfigError::Invalid("github.api_base must be non-empty"));
    }
    if cfg.github.label.trim().is_empty() {
        return Err(ConfigError::Invalid("github.label must be non-empty"));
    }
    // GitHub caps per_page at 100.
    if cfg.github.issue_limit == 0 || cfg.github.issue_limit > 100 {
        return Err(ConfigError::Invalid("github.issue_limit must be within 1..=100"));
    }

    if cfg.twitter.enabled && cfg.twitter.api_base.trim().is_empty() {
        return Err(ConfigError::Invalid("twitter.api_base must be non-empty"));
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct RepositoryList {
    repositories: Vec<String>,
}

/// Read the list of repository URLs. A missing file aborts the run.
pub fn load_repositories(path: &Path) -> Result<Vec<String>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingRepositories(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let list: RepositoryList = serde_yaml::from_str(&content)?;
    Ok(list.repositories)
}

/// Secrets taken from the process environment at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub github_token: String,
    pub twitter: Option<OAuthCredentials>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &"[REDACTED]")
            .field("twitter", &self.twitter)
            .finish()
    }
}

impl Credentials {
    pub fn from_env(announce: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(announce, |name| std::env::var(name).ok())
    }

    /// Resolve credentials through `lookup`; the four Twitter keys are only
    /// required when `announce` is set.
    pub fn from_lookup<F>(announce: bool, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };
        let github_token = require(GITHUB_TOKEN_ENV)?;
        let twitter = if announce {
            Some(OAuthCredentials {
                consumer_key: require(TWITTER_APP_KEY_ENV)?,
                consumer_secret: require(TWITTER_APP_SECRET_ENV)?,
                token: require(TWITTER_TOKEN_ENV)?,
                token_secret: require(TWITTER_TOKEN_SECRET_ENV)?,
            })
        } else {
            None
        };
        Ok(Self {
            github_token,
            twitter,
        })
    }
}

/// Example settings file.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  repositories_file: "./data/repositories.yaml"
  snapshot_file: "./data/generated.json"
  database_file: "goodfirstissues.db"

github:
  api_base: "https://api.github.com/"
  label: "good first issue"
  issue_limit: 10

twitter:
  api_base: "https://api.twitter.com/"
  enabled: true
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.github.issue_limit, 10);
        assert!(cfg.twitter.enabled);
    }

    #[test]
    fn sections_default_when_omitted() {
        let cfg: Config = serde_yaml::from_str(
            "app:\n  data_dir: d\n  repositories_file: r.yaml\n  snapshot_file: out.json\n",
        )
        .unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.github, GitHub::default());
        assert_eq!(cfg.twitter, Twitter::default());
        assert_eq!(cfg.app.database_file, "goodfirstissues.db");
    }

    #[test]
    fn invalid_paths() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.snapshot_file = "  ".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("snapshot_file")),
            _ => panic!("wrong error"),
        }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.repositories_file = "".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_issue_limit() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.github.issue_limit = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
        cfg.github.issue_limit = 101;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn issue_query_uses_configured_label_and_limit() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.github.label = "help wanted".into();
        cfg.github.issue_limit = 5;
        let q = cfg.issue_query();
        assert_eq!(q.label, "help wanted");
        assert_eq!(q.limit, 5);
        assert_eq!(q.state, "open");
        assert_eq!(q.direction, "desc");
    }

    #[test]
    fn load_repositories_missing_is_fatal() {
        let td = tempdir().unwrap();
        let err = load_repositories(&td.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRepositories(_)));
    }

    #[test]
    fn load_repositories_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("repositories.yaml");
        fs::write(
            &p,
            "repositories:\n  - https://github.com/foo/bar\n  - https://github.com/baz/qux\n",
        )
        .unwrap();
        let repos = load_repositories(&p).unwrap();
        assert_eq!(
            repos,
            vec!["https://github.com/foo/bar", "https://github.com/baz/qux"]
        );
    }

    #[test]
    fn credentials_require_github_token() {
        let err = Credentials::from_lookup(false, |_| None).unwrap_err();
        match err {
            ConfigError::MissingEnv(name) => assert_eq!(name, GITHUB_TOKEN_ENV),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn credentials_twitter_only_when_announcing() {
        let lookup = |name: &str| (name == GITHUB_TOKEN_ENV).then(|| "gh".to_string());
        let creds = Credentials::from_lookup(false, lookup).unwrap();
        assert_eq!(creds.twitter, None);

        let err = Credentials::from_lookup(true, lookup).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(TWITTER_APP_KEY_ENV)));

        let creds = Credentials::from_lookup(true, |name| Some(format!(" {} ", name))).unwrap();
        assert_eq!(creds.github_token, GITHUB_TOKEN_ENV);
        let twitter = creds.twitter.unwrap();
        assert_eq!(twitter.consumer_key, TWITTER_APP_KEY_ENV);
        assert_eq!(twitter.consumer_secret, TWITTER_APP_SECRET_ENV);
        assert_eq!(twitter.token, TWITTER_TOKEN_ENV);
        assert_eq!(twitter.token_secret, TWITTER_TOKEN_SECRET_ENV);
    }

    #[test]
    fn credentials_need_every_oauth_key() {
        let lookup = |name: &str| (name != TWITTER_TOKEN_SECRET_ENV).then(|| "x".to_string());
        let err = Credentials::from_lookup(true, lookup).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(TWITTER_TOKEN_SECRET_ENV)));
    }

    #[test]
    fn credentials_debug_redacts() {
        let lookup = |name: &str| Some(format!("value-of-{}", name));
        let creds = Credentials::from_lookup(true, lookup).unwrap();
        let out = format!("{:?}", creds);
        for hidden in [
            GITHUB_TOKEN_ENV,
            TWITTER_APP_SECRET_ENV,
            TWITTER_TOKEN_ENV,
            TWITTER_TOKEN_SECRET_ENV,
        ] {
            assert!(!out.contains(&format!("value-of-{}", hidden)));
        }
        // The consumer key identifies the app and is not secret.
        assert!(out.contains(&format!("value-of-{}", TWITTER_APP_KEY_ENV)));
    }

    #[test]
    fn ensure_dirs_creates_data_dir() {
        let td = tempdir().unwrap();
        let data_path = td.path().join("data");
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.data_dir = data_path.to_string_lossy().to_string();
        cfg.ensure_dirs().unwrap();
        assert!(data_path.exists());
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.github.label, "good first issue");
    }
}
