use chrono::Utc;
use log::info;

use crate::cases::CaseStore;

/// Moves lapsed temporary cases from Open to Closed. The case rows stay
/// around for history; only `resolved`/`time_updated` change.
pub async fn expire_cases(pool: &sqlx::SqlitePool) -> Result<(), crate::Error> {
    let closed = CaseStore::new(pool).resolve_expired(Utc::now()).await?;

    if closed > 0 {
        info!("Closed {} expired cases", closed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::{store, CaseType, NewCase};
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn sweep_closes_lapsed_cases() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        store::init(&pool).await.unwrap();

        let case_store = CaseStore::new(&pool);
        let now = Utc::now();

        let lapsed = case_store
            .insert(NewCase {
                guild_id: 1,
                user_id: 42,
                creator_user_id: 7,
                kind: CaseType::Timeout,
                description: None,
                time_created: now - chrono::Duration::hours(2),
                time_expires: Some(now - chrono::Duration::hours(1)),
            })
            .await
            .unwrap();

        expire_cases(&pool).await.unwrap();

        let lapsed = case_store.get_by_id(1, lapsed.id).await.unwrap().unwrap();
        assert!(lapsed.resolved);
        assert!(lapsed.time_updated.is_some());
    }
}
