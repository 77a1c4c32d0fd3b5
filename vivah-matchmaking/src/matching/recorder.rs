use metrics::counter;
use uuid::Uuid;

use vivah_shared::errors::{AppError, AppResult, ErrorCode};
use vivah_shared::types::event::payloads::LikeReceived;

use crate::models::{MatchStatus, PairChange, PairKey, UserProfile};

use super::service::{ActionOutcome, MatchService};

impl MatchService {
    /// Records `actor`'s decision about the profile `target_profile_id`.
    /// Returns whether the pair is a mutual match after the write.
    pub async fn record_action(&self, actor: Uuid, target_profile_id: i64, action: &str) -> AppResult<bool> {
        let outcome = self.apply_action(actor, target_profile_id, action).await?;
        Ok(outcome.is_mutual_match)
    }

    /// Revises a prior decision, reporting whether a mutual match was formed
    /// or broken by the change.
    pub async fn update_action(
        &self,
        actor: Uuid,
        target_profile_id: i64,
        action: &str,
    ) -> AppResult<ActionOutcome> {
        self.apply_action(actor, target_profile_id, action).await
    }

    async fn apply_action(&self, actor: Uuid, target_profile_id: i64, action: &str) -> AppResult<ActionOutcome> {
        let target = self
            .profiles
            .get_profile_by_id(target_profile_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "target profile not found"))?;

        let status: MatchStatus = action.parse()?;

        if target.user_id == actor {
            return Err(AppError::new(
                ErrorCode::CannotActOnSelf,
                "cannot act on your own profile",
            ));
        }

        let pair = PairKey::new(actor, target.user_id);
        let lease = self.locks.acquire(pair).await?;
        let result = self.apply_locked(actor, &target, status).await;
        lease.release().await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                counter!("match_actions_recorded_total", "status" => "failed").increment(1);
                tracing::error!(
                    error = %e,
                    actor = %actor,
                    target_profile_id,
                    status = %status,
                    "failed to record match action"
                );
                return Err(e);
            }
        };

        counter!("match_actions_recorded_total", "status" => status.as_str()).increment(1);
        tracing::info!(
            actor = %actor,
            target_profile_id,
            status = %status,
            is_mutual_match = outcome.is_mutual_match,
            was_mutual_match_broken = outcome.was_mutual_match_broken,
            "match action recorded"
        );

        if status == MatchStatus::Liked {
            self.notify_like(actor, &target).await;
        }

        Ok(outcome)
    }

    /// Runs with the pair lock held. The edge write and the pair's mutual
    /// state change commit together.
    async fn apply_locked(&self, actor: Uuid, target: &UserProfile, status: MatchStatus) -> AppResult<ActionOutcome> {
        let change = self
            .matches
            .apply_match_action(actor, target.user_id, status)
            .await?;

        match change {
            PairChange::Created => {
                counter!("mutual_matches_created_total").increment(1);
                tracing::info!(pair = %PairKey::new(actor, target.user_id), "mutual match created");
            }
            PairChange::Broken => {
                counter!("mutual_matches_broken_total").increment(1);
                tracing::info!(pair = %PairKey::new(actor, target.user_id), "mutual match deactivated");
            }
            PairChange::Kept | PairChange::Unchanged => {}
        }

        Ok(ActionOutcome::from(change))
    }

    /// Queues a "you were liked" notice for the target. Never fails the caller.
    async fn notify_like(&self, actor: Uuid, target: &UserProfile) {
        let Some(dispatcher) = &self.notifications else {
            return;
        };

        let liker = match self.profiles.get_profile_by_user_id(actor).await {
            Ok(Some(liker)) => liker,
            Ok(None) => {
                tracing::warn!(actor = %actor, "liker has no profile, skipping like notification");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, actor = %actor, "failed to load liker profile for notification");
                return;
            }
        };

        dispatcher.dispatch(LikeReceived {
            recipient_user_id: target.user_id,
            liker_profile_id: liker.id,
            liker_display_name: liker.full_name,
        });
    }
}
