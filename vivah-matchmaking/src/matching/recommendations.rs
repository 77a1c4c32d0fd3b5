use std::time::Instant;

use chrono::{NaiveDate, Utc};
use metrics::histogram;
use uuid::Uuid;

use vivah_shared::errors::{AppError, AppResult, ErrorCode};
use vivah_shared::types::{PageWindow, Paginated};

use crate::models::{PartnerPreferences, RecommendedProfile};

use super::filters::CandidateQuery;
use super::ranker::{rank, RankedCandidate};
use super::scorer::Scorer;
use super::service::MatchService;

pub const DEFAULT_RECOMMENDATION_LIMIT: i64 = 10;

impl MatchService {
    /// One page of ranked candidates for `user_id`. The whole candidate set is
    /// scored and sorted before the window is cut, so pages are consistent.
    /// Exceeding the configured deadline fails the call; no partial page is
    /// ever returned.
    pub async fn get_recommended_matches(
        &self,
        user_id: Uuid,
        window: PageWindow,
    ) -> AppResult<Paginated<RecommendedProfile>> {
        let started = Instant::now();
        let result = tokio::time::timeout(self.recommendation_timeout, self.recommend(user_id, window)).await;
        histogram!("recommendation_duration_seconds").record(started.elapsed().as_secs_f64());

        match result {
            Ok(page) => page,
            Err(_) => {
                tracing::warn!(
                    user_id = %user_id,
                    timeout_ms = self.recommendation_timeout.as_millis() as u64,
                    "recommendation query timed out"
                );
                Err(AppError::new(
                    ErrorCode::DeadlineExceeded,
                    "recommendation query timed out",
                ))
            }
        }
    }

    async fn recommend(&self, user_id: Uuid, window: PageWindow) -> AppResult<Paginated<RecommendedProfile>> {
        let me = self.own_profile(user_id).await?;
        let prefs = self.preferences.get_partner_preferences(me.id).await?;

        let excluded = match self.matches.get_matched_profile_ids(user_id).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user_id, "failed to load acted-upon profiles, not excluding any");
                Vec::new()
            }
        };

        let now = Utc::now();
        let today = now.date_naive();
        let candidates = self
            .matches
            .get_potential_profiles(CandidateQuery {
                requester_user_id: user_id,
                prefs: prefs.as_ref(),
                excluded_profile_ids: &excluded,
                today,
            })
            .await?;

        let scorer = Scorer::new(self.weights, now);
        let ranked = rank(candidates, prefs.as_ref(), &scorer);
        let total = ranked.len() as i64;

        tracing::debug!(user_id = %user_id, total, excluded = excluded.len(), "candidates ranked");

        let items = window
            .slice(ranked)
            .into_iter()
            .map(|r| recommended(r, prefs.as_ref(), &scorer, today))
            .collect();

        Ok(Paginated::new(items, total, window))
    }
}

fn recommended(
    ranked: RankedCandidate,
    prefs: Option<&PartnerPreferences>,
    scorer: &Scorer,
    today: NaiveDate,
) -> RecommendedProfile {
    let match_reasons = scorer.reasons(&ranked.profile, prefs);
    let age = ranked.profile.age_on(today);
    let p = ranked.profile;

    RecommendedProfile {
        profile_id: p.id,
        full_name: p.full_name,
        age,
        height_cm: p.height_cm,
        community: p.community,
        profession: p.profession,
        profession_type: p.profession_type,
        education_level: p.education_level,
        home_district: p.home_district,
        profile_picture_url: p.profile_picture_url,
        last_login: p.last_login,
        match_score: ranked.score,
        match_reasons,
    }
}
