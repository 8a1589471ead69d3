//! Database module: the announcement store.
//!
//! - `model`: rows returned by the store.
//! - `repo`: pool setup, migrations and the SQL behind [`AnnouncementStore`].

pub mod model;
pub mod repo;

pub use model::AnnouncementEntry;
pub use repo::*;
