use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::error;

use gfi_populate::config::{self, Credentials};
use gfi_populate::github::GitHubClient;
use gfi_populate::pipeline;
use gfi_populate::twitter::{SocialPoster, TwitterClient};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Write the snapshot without posting or recording announcements
    #[arg(long)]
    no_announce: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let announce = cfg.twitter.enabled && !args.no_announce;
    let creds = Credentials::from_env(announce)?;

    let tracker = GitHubClient::new(&cfg.github.api_base, creds.github_token.clone())?;
    let poster = match creds.twitter.clone() {
        Some(oauth) if announce => Some(TwitterClient::new(&cfg.twitter.api_base, oauth)?),
        _ => None,
    };

    pipeline::run(
        &cfg,
        &cfg.database_url(),
        &tracker,
        poster.as_ref().map(|p| p as &dyn SocialPoster),
    )
    .await?;
    Ok(())
}
