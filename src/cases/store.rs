use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{CaseType, ModCase};

const CASE_COLUMNS: &str =
    "id, guild_id, user_id, creator_user_id, kind, description, resolved, time_created, time_updated, time_expires";

/// Fields the manager supplies when persisting a new case. The store
/// assigns the id; `resolved` always starts false.
#[derive(Debug, Clone)]
pub struct NewCase {
    pub guild_id: i64,
    pub user_id: i64,
    pub creator_user_id: i64,
    pub kind: CaseType,
    pub description: Option<String>,
    pub time_created: DateTime<Utc>,
    pub time_expires: Option<DateTime<Utc>>,
}

/// Creates the `cases` table and its guild/user index. Run once at startup.
///
/// AUTOINCREMENT (rather than a bare rowid key) so case ids are never
/// reused after a hard delete.
pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS cases (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            guild_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            creator_user_id INTEGER NOT NULL,
            kind TEXT NOT NULL,
            description TEXT,
            resolved BOOLEAN NOT NULL DEFAULT FALSE,
            time_created TIMESTAMP NOT NULL,
            time_updated TIMESTAMP,
            time_expires TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS cases_guild_user_idx ON cases (guild_id, user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Durable CRUD over the `cases` table. All lookups are guild-scoped;
/// the manager owns validation and not-found translation.
pub struct CaseStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CaseStore<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, new: NewCase) -> Result<ModCase, sqlx::Error> {
        sqlx::query_as::<_, ModCase>(&format!(
            "INSERT INTO cases (guild_id, user_id, creator_user_id, kind, description, resolved, time_created, time_expires)
             VALUES (?, ?, ?, ?, ?, FALSE, ?, ?)
             RETURNING {CASE_COLUMNS}"
        ))
        .bind(new.guild_id)
        .bind(new.user_id)
        .bind(new.creator_user_id)
        .bind(new.kind)
        .bind(new.description)
        .bind(new.time_created)
        .bind(new.time_expires)
        .fetch_one(self.pool)
        .await
    }

    pub async fn get_by_id(
        &self,
        guild_id: i64,
        case_id: i64,
    ) -> Result<Option<ModCase>, sqlx::Error> {
        sqlx::query_as::<_, ModCase>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE guild_id = ? AND id = ?"
        ))
        .bind(guild_id)
        .bind(case_id)
        .fetch_optional(self.pool)
        .await
    }

    /// All cases for a user in a guild, oldest first. Ids break ties so
    /// same-timestamp inserts stay in insertion order.
    pub async fn list_by_user(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> Result<Vec<ModCase>, sqlx::Error> {
        sqlx::query_as::<_, ModCase>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE guild_id = ? AND user_id = ?
             ORDER BY time_created ASC, id ASC"
        ))
        .bind(guild_id)
        .bind(user_id)
        .fetch_all(self.pool)
        .await
    }

    /// Hard delete. Returns whether a row was actually removed.
    pub async fn delete(&self, guild_id: i64, case_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cases WHERE guild_id = ? AND id = ?")
            .bind(guild_id)
            .bind(case_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Closes every unresolved temporary case whose expiry has passed,
    /// stamping `time_updated`. Returns the number of cases closed.
    pub async fn resolve_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cases SET resolved = TRUE, time_updated = ?
             WHERE resolved = FALSE AND time_expires IS NOT NULL AND time_expires <= ?",
        )
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("failed to open in-memory database");
        init(&pool).await.expect("failed to create schema");
        pool
    }

    fn warn_case(guild_id: i64, user_id: i64) -> NewCase {
        NewCase {
            guild_id,
            user_id,
            creator_user_id: 7,
            kind: CaseType::Warn,
            description: Some("spam".to_string()),
            time_created: Utc::now(),
            time_expires: None,
        }
    }

    #[tokio::test]
    async fn insert_assigns_unique_ids_and_defaults() {
        let pool = test_pool().await;
        let store = CaseStore::new(&pool);

        let first = store.insert(warn_case(1, 42)).await.unwrap();
        let second = store.insert(warn_case(1, 42)).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(!first.resolved);
        assert!(first.time_updated.is_none());
        assert!(first.time_expires.is_none());
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let pool = test_pool().await;
        let store = CaseStore::new(&pool);

        let first = store.insert(warn_case(1, 42)).await.unwrap();
        assert!(store.delete(1, first.id).await.unwrap());

        let second = store.insert(warn_case(1, 42)).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn get_by_id_is_guild_scoped() {
        let pool = test_pool().await;
        let store = CaseStore::new(&pool);

        let case = store.insert(warn_case(1, 42)).await.unwrap();

        assert!(store.get_by_id(1, case.id).await.unwrap().is_some());
        assert!(store.get_by_id(2, case.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_by_user_orders_oldest_first() {
        let pool = test_pool().await;
        let store = CaseStore::new(&pool);

        let now = Utc::now();
        // Insert out of chronological order
        for offset in [30i64, 10, 20] {
            let mut new = warn_case(1, 99);
            new.time_created = now + chrono::Duration::seconds(offset);
            store.insert(new).await.unwrap();
        }

        let cases = store.list_by_user(1, 99).await.unwrap();
        assert_eq!(cases.len(), 3);
        assert!(cases.windows(2).all(|w| w[0].time_created <= w[1].time_created));
    }

    #[tokio::test]
    async fn list_by_user_excludes_other_users_and_guilds() {
        let pool = test_pool().await;
        let store = CaseStore::new(&pool);

        store.insert(warn_case(1, 42)).await.unwrap();
        store.insert(warn_case(1, 43)).await.unwrap();
        store.insert(warn_case(2, 42)).await.unwrap();

        let cases = store.list_by_user(1, 42).await.unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].guild_id, 1);
        assert_eq!(cases[0].user_id, 42);
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let pool = test_pool().await;
        let store = CaseStore::new(&pool);

        let case = store.insert(warn_case(1, 42)).await.unwrap();

        assert!(store.delete(1, case.id).await.unwrap());
        assert!(!store.delete(1, case.id).await.unwrap());
        assert!(!store.delete(1, 9999).await.unwrap());
    }

    #[tokio::test]
    async fn resolve_expired_closes_only_lapsed_cases() {
        let pool = test_pool().await;
        let store = CaseStore::new(&pool);

        let now = Utc::now();

        let mut lapsed = warn_case(1, 42);
        lapsed.time_expires = Some(now - chrono::Duration::minutes(5));
        let lapsed = store.insert(lapsed).await.unwrap();

        let mut active = warn_case(1, 42);
        active.time_expires = Some(now + chrono::Duration::hours(1));
        let active = store.insert(active).await.unwrap();

        let permanent = store.insert(warn_case(1, 42)).await.unwrap();

        let closed = store.resolve_expired(now).await.unwrap();
        assert_eq!(closed, 1);

        let lapsed = store.get_by_id(1, lapsed.id).await.unwrap().unwrap();
        assert!(lapsed.resolved);
        assert!(lapsed.time_updated.is_some());

        let active = store.get_by_id(1, active.id).await.unwrap().unwrap();
        assert!(!active.resolved);
        assert!(active.time_updated.is_none());

        let permanent = store.get_by_id(1, permanent.id).await.unwrap().unwrap();
        assert!(!permanent.resolved);

        // A second sweep finds nothing left to close
        assert_eq!(store.resolve_expired(now).await.unwrap(), 0);
    }
}
