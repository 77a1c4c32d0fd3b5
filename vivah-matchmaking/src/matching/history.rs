use chrono::Utc;
use uuid::Uuid;

use vivah_shared::errors::AppResult;
use vivah_shared::types::{PageWindow, Paginated};

use crate::models::{MatchHistoryItem, MatchStatus, MutualMatchData};

use super::service::MatchService;

pub const DEFAULT_HISTORY_LIMIT: i64 = 20;
pub const DEFAULT_MUTUAL_LIMIT: i64 = 20;

impl MatchService {
    /// Everything `user_id` has acted upon, most recently changed first.
    pub async fn get_match_history(
        &self,
        user_id: Uuid,
        status: Option<MatchStatus>,
        window: PageWindow,
    ) -> AppResult<Paginated<MatchHistoryItem>> {
        let (entries, total) = self.matches.get_match_history(user_id, status, window).await?;
        let today = Utc::now().date_naive();
        let items = entries
            .into_iter()
            .map(|e| MatchHistoryItem::project(e, today))
            .collect();
        Ok(Paginated::new(items, total, window))
    }

    pub async fn get_mutual_matches(&self, user_id: Uuid, window: PageWindow) -> AppResult<Paginated<MutualMatchData>> {
        let (entries, total) = self.matches.get_mutual_matches(user_id, window).await?;
        let today = Utc::now().date_naive();
        let items = entries
            .into_iter()
            .map(|e| MutualMatchData::project(e, today))
            .collect();
        Ok(Paginated::new(items, total, window))
    }
}
