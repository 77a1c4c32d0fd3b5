//! In-process store implementing every repository port. Used by the test
//! suites and for running the engine without Postgres.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use vivah_shared::errors::{AppError, AppResult};
use vivah_shared::types::PageWindow;

use crate::matching::filters::CandidateQuery;
use crate::models::{
    HistoryEntry, MatchAction, MatchStatus, MutualEntry, MutualMatch, PairChange, PairKey,
    PartnerPreferences, UserProfile,
};

use super::{pair_change, MatchRepository, PreferencesRepository, ProfileRepository};

#[derive(Default)]
struct State {
    profiles: HashMap<i64, UserProfile>,
    preferences: HashMap<i64, PartnerPreferences>,
    actions: HashMap<(Uuid, Uuid), MatchAction>,
    mutual: HashMap<PairKey, MutualMatch>,
}

impl State {
    fn profile_by_user(&self, user_id: Uuid) -> Option<&UserProfile> {
        self.profiles.values().find(|p| p.user_id == user_id)
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    fail_matched_ids: AtomicBool,
    fail_action_writes: AtomicBool,
    fail_mutual_writes: AtomicBool,
    candidate_delay: Mutex<Option<Duration>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&self, profile: UserProfile) {
        self.write().profiles.insert(profile.id, profile);
    }

    pub fn set_preferences(&self, prefs: PartnerPreferences) {
        self.write().preferences.insert(prefs.profile_id, prefs);
    }

    pub fn soft_delete_profile(&self, profile_id: i64) {
        if let Some(p) = self.write().profiles.get_mut(&profile_id) {
            p.is_deleted = true;
        }
    }

    pub fn action_count(&self) -> usize {
        self.read().actions.len()
    }

    /// Makes `get_matched_profile_ids` fail.
    pub fn fail_matched_ids(&self, fail: bool) {
        self.fail_matched_ids.store(fail, Ordering::SeqCst);
    }

    /// Makes `apply_match_action` fail before anything is written.
    pub fn fail_action_writes(&self, fail: bool) {
        self.fail_action_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes the mutual-match step of `apply_match_action` fail.
    pub fn fail_mutual_writes(&self, fail: bool) {
        self.fail_mutual_writes.store(fail, Ordering::SeqCst);
    }

    /// Slows the candidate source down by `delay`.
    pub fn delay_candidates(&self, delay: Option<Duration>) {
        *self.candidate_delay.lock().unwrap_or_else(|p| p.into_inner()) = delay;
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }
}

fn storage_failure(op: &str) -> AppError {
    AppError::Internal(anyhow::anyhow!("in-memory store: {op} failed"))
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn get_profile_by_user_id(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        Ok(self
            .read()
            .profile_by_user(user_id)
            .filter(|p| !p.is_deleted)
            .cloned())
    }

    async fn get_profile_by_id(&self, profile_id: i64) -> AppResult<Option<UserProfile>> {
        Ok(self
            .read()
            .profiles
            .get(&profile_id)
            .filter(|p| !p.is_deleted)
            .cloned())
    }
}

#[async_trait]
impl PreferencesRepository for InMemoryStore {
    async fn get_partner_preferences(&self, profile_id: i64) -> AppResult<Option<PartnerPreferences>> {
        Ok(self.read().preferences.get(&profile_id).cloned())
    }
}

#[async_trait]
impl MatchRepository for InMemoryStore {
    async fn get_matched_profile_ids(&self, user_id: Uuid) -> AppResult<Vec<i64>> {
        if self.fail_matched_ids.load(Ordering::SeqCst) {
            return Err(storage_failure("get_matched_profile_ids"));
        }
        let state = self.read();
        Ok(state
            .actions
            .values()
            .filter(|a| a.user_id == user_id)
            .filter_map(|a| state.profile_by_user(a.target_user_id).map(|p| p.id))
            .collect())
    }

    async fn get_potential_profiles(&self, query: CandidateQuery<'_>) -> AppResult<Vec<UserProfile>> {
        let delay = *self.candidate_delay.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .read()
            .profiles
            .values()
            .filter(|p| query.admits(p))
            .cloned()
            .collect())
    }

    async fn apply_match_action(
        &self,
        user_id: Uuid,
        target_user_id: Uuid,
        status: MatchStatus,
    ) -> AppResult<PairChange> {
        if self.fail_action_writes.load(Ordering::SeqCst) {
            return Err(storage_failure("apply_match_action"));
        }
        let now = Utc::now();
        let pair = PairKey::new(user_id, target_user_id);
        let mut state = self.write();

        let change = pair_change(
            status,
            state.actions.get(&(target_user_id, user_id)),
            state.mutual.get(&pair),
        );
        if change.writes_match() && self.fail_mutual_writes.load(Ordering::SeqCst) {
            return Err(storage_failure("mutual match write"));
        }

        state
            .actions
            .entry((user_id, target_user_id))
            .and_modify(|a| {
                a.status = status;
                a.updated_at = now;
            })
            .or_insert_with(|| MatchAction {
                user_id,
                target_user_id,
                status,
                created_at: now,
                updated_at: now,
            });

        match change {
            PairChange::Created => {
                state
                    .mutual
                    .entry(pair)
                    .and_modify(|m| {
                        m.is_active = true;
                        m.matched_at = now;
                        m.deactivated_at = None;
                    })
                    .or_insert_with(|| MutualMatch {
                        id: Uuid::now_v7(),
                        user_a_id: pair.low,
                        user_b_id: pair.high,
                        is_active: true,
                        matched_at: now,
                        deactivated_at: None,
                    });
            }
            PairChange::Broken => {
                if let Some(m) = state.mutual.get_mut(&pair) {
                    m.is_active = false;
                    m.deactivated_at = Some(now);
                }
            }
            PairChange::Kept | PairChange::Unchanged => {}
        }

        Ok(change)
    }

    async fn get_match_history(
        &self,
        user_id: Uuid,
        status: Option<MatchStatus>,
        window: PageWindow,
    ) -> AppResult<(Vec<HistoryEntry>, i64)> {
        let state = self.read();
        let mut entries: Vec<HistoryEntry> = state
            .actions
            .values()
            .filter(|a| a.user_id == user_id)
            .filter(|a| status.map_or(true, |s| a.status == s))
            .filter_map(|a| {
                state
                    .profile_by_user(a.target_user_id)
                    .filter(|p| !p.is_deleted)
                    .map(|p| HistoryEntry {
                        action: a.clone(),
                        profile: p.clone(),
                    })
            })
            .collect();

        entries.sort_by(|a, b| {
            b.action
                .updated_at
                .cmp(&a.action.updated_at)
                .then_with(|| a.profile.id.cmp(&b.profile.id))
        });
        let total = entries.len() as i64;
        Ok((window.slice(entries), total))
    }

    async fn get_mutual_matches(&self, user_id: Uuid, window: PageWindow) -> AppResult<(Vec<MutualEntry>, i64)> {
        let state = self.read();
        let mut entries: Vec<MutualEntry> = state
            .mutual
            .values()
            .filter(|m| m.is_active && (m.user_a_id == user_id || m.user_b_id == user_id))
            .filter_map(|m| {
                state
                    .profile_by_user(m.pair().other(user_id))
                    .filter(|p| !p.is_deleted)
                    .map(|p| MutualEntry {
                        mutual: m.clone(),
                        profile: p.clone(),
                    })
            })
            .collect();

        entries.sort_by(|a, b| {
            b.mutual
                .matched_at
                .cmp(&a.mutual.matched_at)
                .then_with(|| a.profile.id.cmp(&b.profile.id))
        });
        let total = entries.len() as i64;
        Ok((window.slice(entries), total))
    }
}
