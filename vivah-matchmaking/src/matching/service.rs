use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use vivah_shared::errors::{AppError, AppResult, ErrorCode};

use crate::events::notifier::NotificationDispatcher;
use crate::models::{PairChange, UserProfile};
use crate::repository::{MatchRepository, PreferencesRepository, ProfileRepository};

use super::locks::PairLocker;
use super::scorer::ScoringWeights;

const DEFAULT_RECOMMENDATION_TIMEOUT: Duration = Duration::from_secs(3);

/// Result of a match-action write. At most one flag is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub is_mutual_match: bool,
    pub was_mutual_match_broken: bool,
}

impl From<PairChange> for ActionOutcome {
    fn from(change: PairChange) -> Self {
        Self {
            is_mutual_match: change.is_mutual(),
            was_mutual_match_broken: change == PairChange::Broken,
        }
    }
}

/// The matchmaking engine. Holds no per-request state; everything
/// persistent lives behind the repository ports.
#[derive(Clone)]
pub struct MatchService {
    pub(super) profiles: Arc<dyn ProfileRepository>,
    pub(super) preferences: Arc<dyn PreferencesRepository>,
    pub(super) matches: Arc<dyn MatchRepository>,
    pub(super) locks: Arc<dyn PairLocker>,
    pub(super) notifications: Option<NotificationDispatcher>,
    pub(super) weights: ScoringWeights,
    pub(super) recommendation_timeout: Duration,
}

impl MatchService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        preferences: Arc<dyn PreferencesRepository>,
        matches: Arc<dyn MatchRepository>,
        locks: Arc<dyn PairLocker>,
    ) -> Self {
        Self {
            profiles,
            preferences,
            matches,
            locks,
            notifications: None,
            weights: ScoringWeights::default(),
            recommendation_timeout: DEFAULT_RECOMMENDATION_TIMEOUT,
        }
    }

    /// Wires all three repository ports to one store.
    pub fn from_store<S>(store: Arc<S>, locks: Arc<dyn PairLocker>) -> Self
    where
        S: ProfileRepository + PreferencesRepository + MatchRepository + 'static,
    {
        Self::new(store.clone(), store.clone(), store, locks)
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_recommendation_timeout(mut self, timeout: Duration) -> Self {
        self.recommendation_timeout = timeout;
        self
    }

    pub fn with_notifications(mut self, dispatcher: NotificationDispatcher) -> Self {
        self.notifications = Some(dispatcher);
        self
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    /// The caller's own profile.
    pub(super) async fn own_profile(&self, user_id: Uuid) -> AppResult<UserProfile> {
        self.profiles
            .get_profile_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))
    }
}
