use chrono::Utc;
use poise::serenity_prelude::{GuildId, UserId};
use sqlx::SqlitePool;

use super::{CaseError, CaseStore, CaseType, ModCase, NewCase};

/// Guild-scoped facade over the case store; the only thing command
/// handlers talk to. One instance per command invocation, construction
/// does no I/O, and the caller owns the pool.
pub struct CaseManager<'a> {
    store: CaseStore<'a>,
    guild_id: GuildId,
}

impl<'a> CaseManager<'a> {
    pub fn new(pool: &'a SqlitePool, guild_id: GuildId) -> Self {
        Self {
            store: CaseStore::new(pool),
            guild_id,
        }
    }

    fn guild(&self) -> i64 {
        self.guild_id.get() as i64
    }

    /// Records a new case. A duration makes the action temporary
    /// (`time_expires = now + duration`); no duration means permanent.
    pub async fn create_case(
        &self,
        user_id: UserId,
        creator_user_id: UserId,
        kind: CaseType,
        description: Option<String>,
        duration: Option<chrono::Duration>,
    ) -> Result<ModCase, CaseError> {
        let now = Utc::now();

        let case = self
            .store
            .insert(NewCase {
                guild_id: self.guild(),
                user_id: user_id.get() as i64,
                creator_user_id: creator_user_id.get() as i64,
                kind,
                description,
                time_created: now,
                time_expires: duration.map(|duration| now + duration),
            })
            .await?;

        Ok(case)
    }

    /// Point lookup within the bound guild. A case belonging to another
    /// guild is not visible here even if the id exists there.
    pub async fn get_case_by_id(&self, case_id: i64) -> Result<ModCase, CaseError> {
        self.store
            .get_by_id(self.guild(), case_id)
            .await?
            .ok_or(CaseError::NotFound(case_id))
    }

    /// All cases for a user in the bound guild, oldest first. A user
    /// with no cases yields an empty vec, not an error.
    pub async fn get_cases_by_user(&self, user_id: UserId) -> Result<Vec<ModCase>, CaseError> {
        Ok(self
            .store
            .list_by_user(self.guild(), user_id.get() as i64)
            .await?)
    }

    /// Hard delete. Fails with `NotFound` when the case is absent; a
    /// raced delete that removes zero rows reports `NotFound` too.
    pub async fn delete_case(&self, case_id: i64) -> Result<(), CaseError> {
        self.get_case_by_id(case_id).await?;

        if !self.store.delete(self.guild(), case_id).await? {
            return Err(CaseError::NotFound(case_id));
        }

        Ok(())
    }

    /// Phase one of a confirmed delete: verify the case exists and hand
    /// back a token snapshotting it. Nothing is removed until the token
    /// is committed; dropping it cancels.
    pub async fn begin_delete(&self, case_id: i64) -> Result<PendingDelete, CaseError> {
        Ok(PendingDelete {
            case: self.get_case_by_id(case_id).await?,
        })
    }
}

/// A delete awaiting confirmation. Keeps the destructive call out of
/// whatever UI collects the confirmation.
#[must_use = "a pending delete does nothing until committed"]
pub struct PendingDelete {
    case: ModCase,
}

impl PendingDelete {
    pub fn case(&self) -> &ModCase {
        &self.case
    }

    /// Phase two: perform the delete. Returns the snapshot so callers
    /// can render what was removed.
    pub async fn commit(self, manager: &CaseManager<'_>) -> Result<ModCase, CaseError> {
        manager.delete_case(self.case.id).await?;
        Ok(self.case)
    }
}
