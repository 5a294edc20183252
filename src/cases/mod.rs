pub mod embeds;
pub mod manager;
pub mod store;

pub use manager::{CaseManager, PendingDelete};
pub use store::{CaseStore, NewCase};

use chrono::{DateTime, Utc};

/// The category of moderation action a case records.
///
/// Stored as lowercase text in the `cases` table; doubles as a slash
/// command choice parameter.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    sqlx::Type,
    poise::ChoiceParameter,
    strum_macros::Display,
)]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CaseType {
    Warn,
    Kick,
    Ban,
    Timeout,
    Mute,
    Note,
}

/// A single moderation case, one row in the `cases` table.
///
/// Snowflake ids are stored as `i64` (SQLite has no unsigned 64-bit
/// integer type).
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ModCase {
    pub id: i64,
    pub guild_id: i64,
    pub user_id: i64,
    pub creator_user_id: i64,
    pub kind: CaseType,
    pub description: Option<String>,
    pub resolved: bool,
    pub time_created: DateTime<Utc>,
    pub time_updated: Option<DateTime<Utc>>,
    pub time_expires: Option<DateTime<Utc>>,
}

impl ModCase {
    /// The duration of a temporary action, or `None` for permanent cases
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.time_expires.map(|expires| expires - self.time_created)
    }

    pub fn is_permanent(&self) -> bool {
        self.time_expires.is_none()
    }

    pub fn reason(&self) -> &str {
        self.description.as_deref().unwrap_or("No reason provided")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// No case with this id exists within the manager's guild. Raced
    /// deletes land here too, never in `Storage`.
    #[error("Case {0} was not found in this server")]
    NotFound(i64),

    /// Underlying persistence failure. Never retried here; the caller
    /// decides what to show.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
