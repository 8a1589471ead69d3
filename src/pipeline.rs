//! One pass over the configured repositories: fetch, announce, snapshot.
//!
//! Repositories are handled strictly one after another. Announcement
//! deduplication is a check-then-record sequence against the store and
//! assumes a single running instance; two overlapping runs could both post
//! for the same key.
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{error, info, instrument, warn};

use crate::config::{self, Config};
use crate::db::{self, AnnouncementStore};
use crate::github::{IssueQuery, IssueTracker};
use crate::info::fetch_repository_info;
use crate::model::{RepoOutcome, RepositoryRecord, RepositoryRef};
use crate::repo_url;
use crate::snapshot;
use crate::twitter::SocialPoster;

/// Counters and collected records from one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records: Vec<RepositoryRecord>,
    pub announced: usize,
    pub already_announced: usize,
    pub post_failures: usize,
    pub skipped: usize,
}

pub struct Pipeline<'a> {
    tracker: &'a dyn IssueTracker,
    poster: Option<&'a dyn SocialPoster>,
    store: &'a AnnouncementStore,
    query: IssueQuery,
}

impl<'a> Pipeline<'a> {
    /// `poster` set to `None` disables the announcement step entirely.
    pub fn new(
        tracker: &'a dyn IssueTracker,
        poster: Option<&'a dyn SocialPoster>,
        store: &'a AnnouncementStore,
        query: IssueQuery,
    ) -> Self {
        Self {
            tracker,
            poster,
            store,
            query,
        }
    }

    /// Walk `urls` in order. Per-repository failures are logged and skipped.
    #[instrument(skip_all, fields(count = urls.len()))]
    pub async fn process(&self, urls: &[String]) -> RunSummary {
        let mut summary = RunSummary::default();
        for url in urls {
            let Some(repo) = repo_url::parse(url) else {
                summary.skipped += 1;
                continue;
            };

            let record = match fetch_repository_info(self.tracker, &repo, &self.query).await {
                Ok(RepoOutcome::Qualified(record)) => record,
                Ok(RepoOutcome::NoQualifyingIssues) => {
                    info!(repo = %repo, "no good first issues; skipping");
                    summary.skipped += 1;
                    continue;
                }
                Ok(RepoOutcome::NotFound) => {
                    warn!(repo = %repo, "repository not found; skipping");
                    summary.skipped += 1;
                    continue;
                }
                Err(err) => {
                    warn!(repo = %repo, %err, "failed to fetch repository; skipping");
                    summary.skipped += 1;
                    continue;
                }
            };
            summary.records.push(record);

            if let Some(poster) = self.poster {
                self.announce(poster, &repo, &mut summary).await;
            }
        }
        summary
    }

    async fn announce(
        &self,
        poster: &dyn SocialPoster,
        repo: &RepositoryRef,
        summary: &mut RunSummary,
    ) {
        let key = poster.build_target_url(repo);
        match self.store.has_been_announced(&key).await {
            Ok(true) => {
                summary.already_announced += 1;
                return;
            }
            Ok(false) => {}
            Err(err) => {
                error!(?err, key = %key, "failed to query announcement store; not posting");
                summary.post_failures += 1;
                return;
            }
        }

        match poster.post(repo).await {
            Ok(post_id) => {
                info!(repo = %repo, key = %key, post_id = %post_id, "announced repository");
                if let Err(err) = self.store.record_announcement(&key, &db::now_timestamp()).await {
                    error!(?err, key = %key, "posted but failed to record announcement");
                }
                summary.announced += 1;
            }
            Err(err) => {
                error!(repo = %repo, %err, "failed to post announcement");
                summary.post_failures += 1;
            }
        }
    }
}

/// Run the whole job: read the repository list, open the store, process every
/// repository, shuffle and write the snapshot.
#[instrument(skip_all)]
pub async fn run(
    cfg: &Config,
    database_url: &str,
    tracker: &dyn IssueTracker,
    poster: Option<&dyn SocialPoster>,
) -> Result<RunSummary> {
    let repositories_file = Path::new(&cfg.app.repositories_file);
    let urls = config::load_repositories(repositories_file)?;
    info!(
        count = urls.len(),
        file = %repositories_file.display(),
        "found repository entries"
    );

    let store = AnnouncementStore::open(database_url)
        .await
        .context("announcement store unavailable")?;

    let pipeline = Pipeline::new(tracker, poster, &store, cfg.issue_query());
    let mut summary = pipeline.process(&urls).await;
    store.close().await;

    snapshot::shuffle_records(&mut summary.records);
    let snapshot_file = Path::new(&cfg.app.snapshot_file);
    snapshot::write_snapshot(snapshot_file, &summary.records)?;
    info!(
        count = summary.records.len(),
        file = %snapshot_file.display(),
        announced = summary.announced,
        already_announced = summary.already_announced,
        post_failures = summary.post_failures,
        skipped = summary.skipped,
        "wrote repository data"
    );
    Ok(summary)
}
