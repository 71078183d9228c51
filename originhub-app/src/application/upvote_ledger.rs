use crate::domain::{Idea, UpvoteStatus};
use crate::infrastructure::db::entities::idea;
use crate::infrastructure::db::{self, IdeaRepository, UpvoteRepository};
use originhub_errors::AppError;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Owns the "user upvoted idea" relation and the cached `ideas.upvotes`.
///
/// The cached count is never incremented or decremented. Every mutation
/// recomputes it from the ledger inside the same transaction, so a count
/// left stale by anything else heals on the next mutation or `recount`.
/// Removing a user recounts that user's ideas the same way
/// (see `UserDirectory::remove`).
#[derive(Clone)]
pub struct UpvoteLedger {
    db: DatabaseConnection,
}

/// Outcome of a full recount sweep. Ideas that failed keep their old
/// cached value and show up in `failed`; the sweep can simply be re-run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecountSummary {
    pub counts: BTreeMap<Uuid, i32>,
    pub failed: Vec<Uuid>,
}

impl UpvoteLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Pure ledger lookup; does not care whether the idea exists.
    pub async fn has_upvoted(&self, idea_id: Uuid, user_id: &str) -> Result<bool, AppError> {
        UpvoteRepository::new(&self.db)
            .exists(idea_id, user_id)
            .await
            .map_err(db::storage_error)
    }

    pub async fn status(&self, idea_id: Uuid, user_id: &str) -> Result<UpvoteStatus, AppError> {
        let idea = IdeaRepository::new(&self.db)
            .find_by_id(idea_id)
            .await
            .map_err(db::storage_error)?
            .ok_or_else(|| AppError::IdeaNotFound(idea_id.to_string()))?;
        let upvoted = self.has_upvoted(idea_id, user_id).await?;
        Ok(UpvoteStatus {
            upvoted,
            upvotes: idea.upvotes,
        })
    }

    pub async fn add_upvote(&self, idea_id: Uuid, user_id: &str) -> Result<Idea, AppError> {
        let user_id = user_id.to_string();
        let refreshed = self
            .db
            .transaction::<_, idea::Model, AppError>(move |txn| {
                Box::pin(async move {
                    let locked = lock_idea(txn, idea_id).await?;
                    let ledger = UpvoteRepository::new(txn);

                    if ledger
                        .exists(idea_id, &user_id)
                        .await
                        .map_err(db::storage_error)?
                    {
                        return Err(AppError::AlreadyUpvoted);
                    }
                    // The existence check is only a fast path; a concurrent
                    // insert of the same pair is caught by the primary key.
                    ledger
                        .create(idea_id, &user_id)
                        .await
                        .map_err(|err| insert_error(err, &user_id))?;

                    recount_locked(txn, locked).await
                })
            })
            .await
            .map_err(db::transaction_error)?;

        tracing::info!(%idea_id, upvotes = refreshed.upvotes, "Idea upvoted");
        Ok(refreshed.into())
    }

    pub async fn remove_upvote(&self, idea_id: Uuid, user_id: &str) -> Result<Idea, AppError> {
        let user_id = user_id.to_string();
        let refreshed = self
            .db
            .transaction::<_, idea::Model, AppError>(move |txn| {
                Box::pin(async move {
                    let locked = lock_idea(txn, idea_id).await?;

                    let removed = UpvoteRepository::new(txn)
                        .delete(idea_id, &user_id)
                        .await
                        .map_err(db::storage_error)?;
                    if removed == 0 {
                        return Err(AppError::NotUpvoted);
                    }

                    recount_locked(txn, locked).await
                })
            })
            .await
            .map_err(db::transaction_error)?;

        tracing::info!(%idea_id, upvotes = refreshed.upvotes, "Upvote removed");
        Ok(refreshed.into())
    }

    /// Rewrites one idea's cached count from the ledger and returns it.
    pub async fn recount(&self, idea_id: Uuid) -> Result<i32, AppError> {
        let (before, after) = self
            .db
            .transaction::<_, (i32, i32), AppError>(move |txn| {
                Box::pin(async move {
                    let locked = lock_idea(txn, idea_id).await?;
                    let before = locked.upvotes;
                    let refreshed = recount_locked(txn, locked).await?;
                    Ok((before, refreshed.upvotes))
                })
            })
            .await
            .map_err(db::transaction_error)?;

        if before != after {
            tracing::warn!(%idea_id, before, after, "Repaired drifted upvote count");
        }
        Ok(after)
    }

    /// Recounts every idea, one transaction per idea. There is no atomicity
    /// across ideas: a failure is logged, recorded, and the sweep moves on.
    pub async fn recount_all(&self) -> Result<RecountSummary, AppError> {
        let ids = IdeaRepository::new(&self.db)
            .all_ids()
            .await
            .map_err(db::storage_error)?;

        let mut summary = RecountSummary::default();
        for idea_id in ids {
            match self.recount(idea_id).await {
                Ok(count) => {
                    summary.counts.insert(idea_id, count);
                }
                // Deleted while the sweep was running.
                Err(AppError::IdeaNotFound(_)) => {}
                Err(err) => {
                    tracing::warn!(%idea_id, error = %err, "Upvote recount failed");
                    summary.failed.push(idea_id);
                }
            }
        }

        tracing::info!(
            repaired = summary.counts.len(),
            failed = summary.failed.len(),
            "Upvote recount sweep finished"
        );
        Ok(summary)
    }
}

pub(super) async fn lock_idea<C: ConnectionTrait>(conn: &C, idea_id: Uuid) -> Result<idea::Model, AppError> {
    IdeaRepository::new(conn)
        .find_by_id_for_update(idea_id)
        .await
        .map_err(db::storage_error)?
        .ok_or_else(|| AppError::IdeaNotFound(idea_id.to_string()))
}

pub(super) async fn recount_locked<C: ConnectionTrait>(
    conn: &C,
    locked: idea::Model,
) -> Result<idea::Model, AppError> {
    let count = UpvoteRepository::new(conn)
        .count_for_idea(locked.id)
        .await
        .map_err(db::storage_error)?;
    let count = i32::try_from(count)
        .map_err(|_| AppError::Internal(format!("upvote count {count} overflows")))?;

    IdeaRepository::new(conn)
        .set_upvotes(locked, count)
        .await
        .map_err(db::storage_error)
}

fn insert_error(err: DbErr, user_id: &str) -> AppError {
    if db::is_unique_violation(&err) {
        AppError::AlreadyUpvoted
    } else if db::is_foreign_key_violation(&err) {
        AppError::Validation(format!("Unknown user {user_id}"))
    } else {
        db::storage_error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::test_support::{corrupt_upvotes, seed_idea, seed_user, setup_db};

    #[tokio::test]
    async fn test_add_then_add_again_is_rejected() {
        let db = setup_db().await;
        let ledger = UpvoteLedger::new(db.clone());
        let user = seed_user(&db, "user_a").await;
        let idea = seed_idea(&db, None, "Water drones").await;

        let upvoted = ledger.add_upvote(idea.id, &user).await.unwrap();
        assert_eq!(upvoted.upvotes, 1);

        let err = ledger.add_upvote(idea.id, &user).await.unwrap_err();
        assert_eq!(err, AppError::AlreadyUpvoted);

        let count = UpvoteRepository::new(&db).count_for_idea(idea.id).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(ledger.status(idea.id, &user).await.unwrap().upvotes, 1);
    }

    #[tokio::test]
    async fn test_add_then_remove_restores_count() {
        let db = setup_db().await;
        let ledger = UpvoteLedger::new(db.clone());
        let first = seed_user(&db, "user_a").await;
        let second = seed_user(&db, "user_b").await;
        let idea = seed_idea(&db, None, "Bike library").await;

        ledger.add_upvote(idea.id, &first).await.unwrap();
        let before = ledger.status(idea.id, &second).await.unwrap().upvotes;

        let added = ledger.add_upvote(idea.id, &second).await.unwrap();
        assert_eq!(added.upvotes, before + 1);
        assert!(ledger.has_upvoted(idea.id, &second).await.unwrap());

        let removed = ledger.remove_upvote(idea.id, &second).await.unwrap();
        assert_eq!(removed.upvotes, before);
        assert!(!ledger.has_upvoted(idea.id, &second).await.unwrap());
        assert!(ledger.has_upvoted(idea.id, &first).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_without_upvote_is_rejected() {
        let db = setup_db().await;
        let ledger = UpvoteLedger::new(db.clone());
        let user = seed_user(&db, "user_a").await;
        let idea = seed_idea(&db, None, "Seed bank").await;

        let err = ledger.remove_upvote(idea.id, &user).await.unwrap_err();
        assert_eq!(err, AppError::NotUpvoted);
    }

    #[tokio::test]
    async fn test_unknown_idea() {
        let db = setup_db().await;
        let ledger = UpvoteLedger::new(db.clone());
        let user = seed_user(&db, "user_a").await;
        let missing = Uuid::new_v4();

        assert!(matches!(
            ledger.add_upvote(missing, &user).await,
            Err(AppError::IdeaNotFound(_))
        ));
        assert!(matches!(
            ledger.remove_upvote(missing, &user).await,
            Err(AppError::IdeaNotFound(_))
        ));
        assert!(matches!(
            ledger.recount(missing).await,
            Err(AppError::IdeaNotFound(_))
        ));
        // The plain lookup does not require the idea.
        assert!(!ledger.has_upvoted(missing, &user).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_user_leaves_nothing_behind() {
        let db = setup_db().await;
        let ledger = UpvoteLedger::new(db.clone());
        let idea = seed_idea(&db, None, "Ghost votes").await;

        let err = ledger.add_upvote(idea.id, "nobody").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(
            UpvoteRepository::new(&db).count_for_idea(idea.id).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_cached_count_tracks_ledger_across_mixed_sequence() {
        let db = setup_db().await;
        let ledger = UpvoteLedger::new(db.clone());
        let idea = seed_idea(&db, None, "Tool sharing").await;
        let mut users = Vec::new();
        for i in 0..5 {
            users.push(seed_user(&db, &format!("user_{i}")).await);
        }

        for user in &users {
            ledger.add_upvote(idea.id, user).await.unwrap();
        }
        ledger.remove_upvote(idea.id, &users[1]).await.unwrap();
        ledger.remove_upvote(idea.id, &users[3]).await.unwrap();
        let last = ledger.add_upvote(idea.id, &users[1]).await.unwrap();

        let ledger_count = UpvoteRepository::new(&db).count_for_idea(idea.id).await.unwrap();
        assert_eq!(ledger_count, 4);
        assert_eq!(last.upvotes as u64, ledger_count);
    }

    #[tokio::test]
    async fn test_mutation_heals_a_stale_counter() {
        let db = setup_db().await;
        let ledger = UpvoteLedger::new(db.clone());
        let first = seed_user(&db, "user_a").await;
        let second = seed_user(&db, "user_b").await;
        let idea = seed_idea(&db, None, "Repair cafe").await;

        ledger.add_upvote(idea.id, &first).await.unwrap();
        corrupt_upvotes(&db, idea.id, 42).await;

        let refreshed = ledger.add_upvote(idea.id, &second).await.unwrap();
        assert_eq!(refreshed.upvotes, 2);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_upvotes_leave_one_record() {
        let db = setup_db().await;
        let ledger = UpvoteLedger::new(db.clone());
        let user = seed_user(&db, "user_a").await;
        let idea = seed_idea(&db, None, "Night market").await;

        let attempts = 8;
        let idea_id = idea.id;
        let mut handles = Vec::new();
        for _ in 0..attempts {
            let ledger = ledger.clone();
            let user = user.clone();
            handles.push(tokio::spawn(async move {
                ledger.add_upvote(idea_id, &user).await
            }));
        }

        let mut succeeded = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(AppError::AlreadyUpvoted) => rejected += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(rejected, attempts - 1);
        assert_eq!(
            UpvoteRepository::new(&db).count_for_idea(idea.id).await.unwrap(),
            1
        );
        assert_eq!(ledger.status(idea.id, &user).await.unwrap().upvotes, 1);
    }

    #[tokio::test]
    async fn test_recount_all_repairs_corrupted_counts() {
        let db = setup_db().await;
        let ledger = UpvoteLedger::new(db.clone());
        let a = seed_user(&db, "user_a").await;
        let b = seed_user(&db, "user_b").await;
        let popular = seed_idea(&db, None, "Popular").await;
        let lonely = seed_idea(&db, None, "Lonely").await;
        let quiet = seed_idea(&db, None, "Quiet").await;

        ledger.add_upvote(popular.id, &a).await.unwrap();
        ledger.add_upvote(popular.id, &b).await.unwrap();
        ledger.add_upvote(lonely.id, &a).await.unwrap();

        corrupt_upvotes(&db, popular.id, -3).await;
        corrupt_upvotes(&db, lonely.id, 0).await;
        corrupt_upvotes(&db, quiet.id, 17).await;

        let summary = ledger.recount_all().await.unwrap();
        assert!(summary.failed.is_empty());
        assert_eq!(summary.counts.len(), 3);
        assert_eq!(summary.counts[&popular.id], 2);
        assert_eq!(summary.counts[&lonely.id], 1);
        assert_eq!(summary.counts[&quiet.id], 0);

        // Idempotent.
        assert_eq!(ledger.recount_all().await.unwrap(), summary);
        assert_eq!(ledger.status(quiet.id, &a).await.unwrap().upvotes, 0);
    }

    #[tokio::test]
    async fn test_removing_a_user_recounts_their_upvoted_ideas() {
        let db = setup_db().await;
        let ledger = UpvoteLedger::new(db.clone());
        let users = crate::application::UserDirectory::new(db.clone());
        let a = seed_user(&db, "user_a").await;
        let b = seed_user(&db, "user_b").await;
        let shared = seed_idea(&db, None, "Commons").await;
        let only_b = seed_idea(&db, None, "Side project").await;
        let untouched = seed_idea(&db, None, "Quiet corner").await;

        ledger.add_upvote(shared.id, &a).await.unwrap();
        ledger.add_upvote(shared.id, &b).await.unwrap();
        ledger.add_upvote(only_b.id, &b).await.unwrap();
        ledger.add_upvote(untouched.id, &a).await.unwrap();

        assert!(users.remove(&b).await.unwrap());

        // Correct right away, with no recount in between.
        assert_eq!(ledger.status(shared.id, &a).await.unwrap().upvotes, 1);
        assert_eq!(ledger.status(only_b.id, &a).await.unwrap().upvotes, 0);
        assert_eq!(ledger.status(untouched.id, &a).await.unwrap().upvotes, 1);

        // A recount has nothing left to repair.
        let summary = ledger.recount_all().await.unwrap();
        assert_eq!(summary.counts[&shared.id], 1);
        assert_eq!(summary.counts[&only_b.id], 0);
        assert_eq!(summary.counts[&untouched.id], 1);
    }

    #[tokio::test]
    async fn test_duplicate_insert_maps_to_already_upvoted() {
        let db = setup_db().await;
        let user = seed_user(&db, "user_a").await;
        let idea = seed_idea(&db, None, "Twice over").await;
        let repo = UpvoteRepository::new(&db);

        repo.create(idea.id, &user).await.unwrap();
        // Skips the existence check, straight into the primary key.
        let err = repo.create(idea.id, &user).await.unwrap_err();
        assert!(db::is_unique_violation(&err));
        assert_eq!(insert_error(err, &user), AppError::AlreadyUpvoted);

        let err = repo.create(idea.id, "nobody").await.unwrap_err();
        assert!(matches!(insert_error(err, "nobody"), AppError::Validation(_)));
    }
}
