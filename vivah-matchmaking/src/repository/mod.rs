//! Persistence ports consumed by the matchmaking engine.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use vivah_shared::errors::AppResult;
use vivah_shared::types::PageWindow;

use crate::matching::filters::CandidateQuery;
use crate::models::{
    HistoryEntry, MatchAction, MatchStatus, MutualEntry, MutualMatch, PairChange, PartnerPreferences,
    UserProfile,
};

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile_by_user_id(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;

    /// Looks up by public profile id. Soft-deleted profiles are not returned.
    async fn get_profile_by_id(&self, profile_id: i64) -> AppResult<Option<UserProfile>>;
}

#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    async fn get_partner_preferences(&self, profile_id: i64) -> AppResult<Option<PartnerPreferences>>;
}

#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Public profile ids of everyone `user_id` has acted upon.
    async fn get_matched_profile_ids(&self, user_id: Uuid) -> AppResult<Vec<i64>>;

    /// Candidate source: every profile passing the hard filters in `query`.
    async fn get_potential_profiles(&self, query: CandidateQuery<'_>) -> AppResult<Vec<UserProfile>>;

    /// Writes the ordered edge `user_id -> target_user_id` and brings the
    /// pair's mutual match in line with both edges, as one unit: when any
    /// step fails nothing is written. Callers hold the pair lock.
    async fn apply_match_action(
        &self,
        user_id: Uuid,
        target_user_id: Uuid,
        status: MatchStatus,
    ) -> AppResult<PairChange>;

    /// Most recent first.
    async fn get_match_history(
        &self,
        user_id: Uuid,
        status: Option<MatchStatus>,
        window: PageWindow,
    ) -> AppResult<(Vec<HistoryEntry>, i64)>;

    /// Active matches only, most recent first.
    async fn get_mutual_matches(&self, user_id: Uuid, window: PageWindow) -> AppResult<(Vec<MutualEntry>, i64)>;
}

/// Decides what writing `status` for one direction does to the pair's match.
///
/// The reverse like only counts when it was recorded after the pair's last
/// retraction, so a retracted match comes back only once both sides have
/// liked again.
pub fn pair_change(
    status: MatchStatus,
    reverse: Option<&MatchAction>,
    existing: Option<&MutualMatch>,
) -> PairChange {
    let was_active = existing.is_some_and(|m| m.is_active);
    let reverse_likes = reverse.is_some_and(|r| {
        r.status == MatchStatus::Liked
            && match existing {
                Some(m) if !m.is_active => m.deactivated_at.map_or(true, |at| r.updated_at > at),
                _ => true,
            }
    });

    match (status == MatchStatus::Liked && reverse_likes, was_active) {
        (true, true) => PairChange::Kept,
        (true, false) => PairChange::Created,
        (false, true) => PairChange::Broken,
        (false, false) => PairChange::Unchanged,
    }
}
