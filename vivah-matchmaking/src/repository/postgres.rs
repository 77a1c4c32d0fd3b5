//! Diesel-backed repositories. Queries run on the blocking pool so a slow
//! database never stalls the async workers, and so a timed-out caller can
//! walk away from an in-flight query. Match-state timestamps are taken from
//! the database clock, never from the instance that served the request.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::dsl::now;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use vivah_shared::clients::db::DbPool;
use vivah_shared::errors::{AppError, AppResult};
use vivah_shared::types::PageWindow;

use crate::matching::filters::CandidateQuery;
use crate::models::{
    HistoryEntry, MatchAction, MatchActionRow, MatchStatus, MutualEntry, MutualMatch, NewMatchAction,
    NewMutualMatch, PairChange, PairKey, PartnerPreferences, UserProfile,
};
use crate::schema::{match_actions, mutual_matches, partner_preferences, profiles};

use super::{pair_change, MatchRepository, PreferencesRepository, ProfileRepository};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn run<T, F>(&self, f: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> AppResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))?
    }
}

/// Owned copy of the hard filters, movable onto the blocking pool.
struct CandidateFilter {
    requester_user_id: Uuid,
    excluded_profile_ids: Vec<i64>,
    born_on_or_before: Option<NaiveDate>,
    born_after: Option<NaiveDate>,
    prefs: Option<PartnerPreferences>,
}

impl From<CandidateQuery<'_>> for CandidateFilter {
    fn from(query: CandidateQuery<'_>) -> Self {
        let dates = query.birth_dates();
        Self {
            requester_user_id: query.requester_user_id,
            excluded_profile_ids: query.excluded_profile_ids.to_vec(),
            born_on_or_before: dates.born_on_or_before,
            born_after: dates.born_after,
            prefs: query.prefs.cloned(),
        }
    }
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn get_profile_by_user_id(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        self.run(move |conn| {
            Ok(profiles::table
                .filter(profiles::user_id.eq(user_id))
                .filter(profiles::is_deleted.eq(false))
                .select(UserProfile::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn get_profile_by_id(&self, profile_id: i64) -> AppResult<Option<UserProfile>> {
        self.run(move |conn| {
            Ok(profiles::table
                .filter(profiles::id.eq(profile_id))
                .filter(profiles::is_deleted.eq(false))
                .select(UserProfile::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }
}

#[async_trait]
impl PreferencesRepository for PgStore {
    async fn get_partner_preferences(&self, profile_id: i64) -> AppResult<Option<PartnerPreferences>> {
        self.run(move |conn| {
            Ok(partner_preferences::table
                .filter(partner_preferences::profile_id.eq(profile_id))
                .select(PartnerPreferences::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }
}

#[async_trait]
impl MatchRepository for PgStore {
    async fn get_matched_profile_ids(&self, user_id: Uuid) -> AppResult<Vec<i64>> {
        self.run(move |conn| {
            Ok(match_actions::table
                .inner_join(profiles::table.on(profiles::user_id.eq(match_actions::target_user_id)))
                .filter(match_actions::user_id.eq(user_id))
                .select(profiles::id)
                .load::<i64>(conn)?)
        })
        .await
    }

    async fn get_potential_profiles(&self, query: CandidateQuery<'_>) -> AppResult<Vec<UserProfile>> {
        let filter = CandidateFilter::from(query);

        self.run(move |conn| {
            let mut q = profiles::table
                .select(UserProfile::as_select())
                .filter(profiles::is_deleted.eq(false))
                .filter(profiles::user_id.ne(filter.requester_user_id))
                .into_boxed();

            if !filter.excluded_profile_ids.is_empty() {
                q = q.filter(profiles::id.ne_all(filter.excluded_profile_ids));
            }

            if let Some(prefs) = filter.prefs {
                if let Some(date) = filter.born_on_or_before {
                    q = q.filter(profiles::date_of_birth.le(date));
                }
                if let Some(date) = filter.born_after {
                    q = q.filter(profiles::date_of_birth.gt(date));
                }
                if let Some(min) = prefs.min_height_cm {
                    q = q.filter(profiles::height_cm.ge(min));
                }
                if let Some(max) = prefs.max_height_cm {
                    q = q.filter(profiles::height_cm.le(max));
                }
                if !prefs.accept_physically_challenged {
                    q = q.filter(profiles::is_physically_challenged.eq(false));
                }
                if !prefs.preferred_marital_statuses.is_empty() {
                    q = q.filter(profiles::marital_status.eq_any(prefs.preferred_marital_statuses));
                }
                if !prefs.preferred_education_levels.is_empty() {
                    q = q.filter(profiles::education_level.eq_any(prefs.preferred_education_levels));
                }
                if !prefs.preferred_profession_types.is_empty() {
                    q = q.filter(profiles::profession_type.eq_any(prefs.preferred_profession_types));
                }
            }

            Ok(q.order(profiles::id.asc()).load(conn)?)
        })
        .await
    }

    async fn apply_match_action(
        &self,
        user_id: Uuid,
        target_user_id: Uuid,
        status: MatchStatus,
    ) -> AppResult<PairChange> {
        let pair = PairKey::new(user_id, target_user_id);

        self.run(move |conn| {
            conn.transaction::<PairChange, AppError, _>(|conn| {
                let existing = mutual_matches::table
                    .filter(mutual_matches::user_a_id.eq(pair.low))
                    .filter(mutual_matches::user_b_id.eq(pair.high))
                    .select(MutualMatch::as_select())
                    .for_update()
                    .first::<MutualMatch>(conn)
                    .optional()?;

                let reverse = match_actions::table
                    .filter(match_actions::user_id.eq(target_user_id))
                    .filter(match_actions::target_user_id.eq(user_id))
                    .select(MatchActionRow::as_select())
                    .first::<MatchActionRow>(conn)
                    .optional()?
                    .map(MatchAction::try_from)
                    .transpose()?;

                diesel::insert_into(match_actions::table)
                    .values(&NewMatchAction {
                        user_id,
                        target_user_id,
                        status: status.as_str(),
                    })
                    .on_conflict((match_actions::user_id, match_actions::target_user_id))
                    .do_update()
                    .set((
                        match_actions::status.eq(status.as_str()),
                        match_actions::updated_at.eq(now),
                    ))
                    .execute(conn)?;

                let change = pair_change(status, reverse.as_ref(), existing.as_ref());
                match (change, existing) {
                    (PairChange::Created, Some(m)) => {
                        diesel::update(mutual_matches::table.find(m.id))
                            .set((
                                mutual_matches::is_active.eq(true),
                                mutual_matches::matched_at.eq(now),
                                mutual_matches::deactivated_at.eq(None::<DateTime<Utc>>),
                            ))
                            .execute(conn)?;
                    }
                    (PairChange::Created, None) => {
                        diesel::insert_into(mutual_matches::table)
                            .values(&NewMutualMatch::for_pair(pair))
                            .execute(conn)?;
                    }
                    (PairChange::Broken, Some(m)) => {
                        diesel::update(mutual_matches::table.find(m.id))
                            .set((
                                mutual_matches::is_active.eq(false),
                                mutual_matches::deactivated_at.eq(now),
                            ))
                            .execute(conn)?;
                    }
                    _ => {}
                }

                Ok(change)
            })
        })
        .await
    }

    async fn get_match_history(
        &self,
        user_id: Uuid,
        status: Option<MatchStatus>,
        window: PageWindow,
    ) -> AppResult<(Vec<HistoryEntry>, i64)> {
        let statuses: Vec<&'static str> = match status {
            Some(s) => vec![s.as_str()],
            None => MatchStatus::ALL.iter().map(|s| s.as_str()).collect(),
        };

        self.run(move |conn| {
            let total: i64 = match_actions::table
                .inner_join(profiles::table.on(profiles::user_id.eq(match_actions::target_user_id)))
                .filter(match_actions::user_id.eq(user_id))
                .filter(match_actions::status.eq_any(statuses.clone()))
                .filter(profiles::is_deleted.eq(false))
                .count()
                .get_result(conn)?;

            let rows: Vec<(MatchActionRow, UserProfile)> = match_actions::table
                .inner_join(profiles::table.on(profiles::user_id.eq(match_actions::target_user_id)))
                .filter(match_actions::user_id.eq(user_id))
                .filter(match_actions::status.eq_any(statuses))
                .filter(profiles::is_deleted.eq(false))
                .order((match_actions::updated_at.desc(), profiles::id.asc()))
                .limit(window.limit())
                .offset(window.offset())
                .select((MatchActionRow::as_select(), UserProfile::as_select()))
                .load(conn)?;

            let entries = rows
                .into_iter()
                .map(|(row, profile)| {
                    Ok(HistoryEntry {
                        action: MatchAction::try_from(row)?,
                        profile,
                    })
                })
                .collect::<AppResult<Vec<_>>>()?;

            Ok((entries, total))
        })
        .await
    }

    async fn get_mutual_matches(&self, user_id: Uuid, window: PageWindow) -> AppResult<(Vec<MutualEntry>, i64)> {
        self.run(move |conn| {
            // Join the other side of the pair: the profile on either end that
            // is not the caller.
            let total: i64 = mutual_matches::table
                .inner_join(
                    profiles::table.on(profiles::user_id
                        .eq(mutual_matches::user_a_id)
                        .or(profiles::user_id.eq(mutual_matches::user_b_id))),
                )
                .filter(mutual_matches::is_active.eq(true))
                .filter(
                    mutual_matches::user_a_id
                        .eq(user_id)
                        .or(mutual_matches::user_b_id.eq(user_id)),
                )
                .filter(profiles::user_id.ne(user_id))
                .filter(profiles::is_deleted.eq(false))
                .count()
                .get_result(conn)?;

            let rows: Vec<(MutualMatch, UserProfile)> = mutual_matches::table
                .inner_join(
                    profiles::table.on(profiles::user_id
                        .eq(mutual_matches::user_a_id)
                        .or(profiles::user_id.eq(mutual_matches::user_b_id))),
                )
                .filter(mutual_matches::is_active.eq(true))
                .filter(
                    mutual_matches::user_a_id
                        .eq(user_id)
                        .or(mutual_matches::user_b_id.eq(user_id)),
                )
                .filter(profiles::user_id.ne(user_id))
                .filter(profiles::is_deleted.eq(false))
                .order((mutual_matches::matched_at.desc(), profiles::id.asc()))
                .limit(window.limit())
                .offset(window.offset())
                .select((MutualMatch::as_select(), UserProfile::as_select()))
                .load(conn)?;

            let entries = rows
                .into_iter()
                .map(|(mutual, profile)| MutualEntry { mutual, profile })
                .collect();

            Ok((entries, total))
        })
        .await
    }
}
