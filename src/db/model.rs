use sqlx::FromRow;

/// A persisted announcement. Rows are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AnnouncementEntry {
    pub key: String,
    #[sqlx(rename = "announced_at")]
    pub timestamp: String,
}
