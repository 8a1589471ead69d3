//! Scan configured GitHub repositories for good first issues, announce newly
//! seen ones and write a JSON snapshot for the site.

pub mod config;
pub mod db;
pub mod github;
pub mod info;
pub mod model;
pub mod pipeline;
pub mod repo_url;
pub mod snapshot;
pub mod twitter;
