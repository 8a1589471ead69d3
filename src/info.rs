use tracing::{info, instrument};

use crate::github::{IssueQuery, IssueTracker, TrackerError};
use crate::model::{IssueRecord, RepoOutcome, RepositoryRecord, RepositoryRef};

const UNITS: [&str; 4] = ["k", "M", "B", "T"];

/// Look a repository up and turn it into a snapshot record when it has
/// at least one qualifying issue.
///
/// Only a missing repository is folded into [`RepoOutcome::NotFound`]; other
/// tracker failures are returned as errors.
#[instrument(skip_all, fields(owner = %repo.owner, name = %repo.name))]
pub async fn fetch_repository_info(
    tracker: &dyn IssueTracker,
    repo: &RepositoryRef,
    query: &IssueQuery,
) -> Result<RepoOutcome, TrackerError> {
    info!("getting repository info");

    let repository = match tracker.get_repository(&repo.owner, &repo.name).await {
        Ok(r) => r,
        Err(TrackerError::NotFound { .. }) => return Ok(RepoOutcome::NotFound),
        Err(err) => return Err(err),
    };

    let issues = tracker.list_issues(&repository, query).await?;
    info!(count = issues.len(), "found good first issues");
    if issues.is_empty() {
        return Ok(RepoOutcome::NoQualifyingIssues);
    }

    let id = repository.id.to_string();
    Ok(RepoOutcome::Qualified(RepositoryRecord {
        name: repo.name.clone(),
        owner: repo.owner.clone(),
        language: repository.language,
        url: repository.html_url,
        stars: repository.stargazers_count,
        stars_display: humanize_count(repository.stargazers_count),
        last_modified: repository.last_modified,
        id: id.clone(),
        description: repository.description,
        repo_display_name: repository.full_name,
        object_id: id,
        issues: issues
            .into_iter()
            .map(|issue| IssueRecord {
                title: issue.title,
                url: issue.html_url,
                number: issue.number,
                created_at: issue.created_at.to_rfc3339(),
            })
            .collect(),
    }))
}

/// Abbreviate a count for display: `999`, `1.5k`, `1.23k`, `2M`.
pub fn humanize_count(n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }
    let mut divisor: u128 = 1000;
    let mut unit = 0;
    loop {
        // Hundredths of the scaled value, rounded half-up.
        let hundredths = (u128::from(n) * 100 + divisor / 2) / divisor;
        if hundredths < 100_000 || unit == UNITS.len() - 1 {
            return format!("{}{}", trim_hundredths(hundredths), UNITS[unit]);
        }
        divisor *= 1000;
        unit += 1;
    }
}

fn trim_hundredths(h: u128) -> String {
    let (whole, frac) = (h / 100, h % 100);
    if frac == 0 {
        whole.to_string()
    } else if frac % 10 == 0 {
        format!("{}.{}", whole, frac / 10)
    } else {
        format!("{}.{:02}", whole, frac)
    }
}
