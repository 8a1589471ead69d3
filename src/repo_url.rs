use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::RepositoryRef;

static GITHUB_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"github\.com/(?P<owner>[\w.-]+)/(?P<name>[\w.-]+)/?")
        .expect("valid repository URL regex")
});

/// Extract the owner and name from a GitHub repository URL.
///
/// Returns `None` when the string has no `github.com/<owner>/<name>` path;
/// callers skip such entries.
pub fn parse(url: &str) -> Option<RepositoryRef> {
    let caps = GITHUB_URL.captures(url)?;
    Some(RepositoryRef::new(&caps["owner"], &caps["name"]))
}
